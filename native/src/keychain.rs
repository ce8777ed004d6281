//! `Keychain` JavaScript class.

use crate::convert::{attributes_from_host, password_bytes, HostAttributes, JsKeychainSettings, JsKeychainStatus};
use crate::error::{IntoJs, Result};
use crate::item::JsKeychainItem;
use crate::scope::JsScope;
use keychain_core::{ItemClass, Keychain};
use napi::bindgen_prelude::{Buffer, ClassInstance, Either};
use napi_derive::napi;

/// An open keychain. The native reference is released when the object is
/// garbage collected.
#[napi(js_name = "Keychain")]
pub struct JsKeychain {
    pub(crate) inner: Keychain,
}

impl JsKeychain {
    pub(crate) fn wrap(inner: Keychain) -> Self {
        Self { inner }
    }
}

pub(crate) fn unwrap_all(keychains: &[ClassInstance<JsKeychain>]) -> Vec<Keychain> {
    keychains.iter().map(|k| k.inner.clone()).collect()
}

#[napi]
impl JsKeychain {
    /// The user's default keychain
    #[napi(factory)]
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Result<Self> {
        Keychain::default().map(Self::wrap).into_js()
    }

    /// Opens a keychain file without checking that it exists
    #[napi(factory)]
    pub fn open(path: String) -> Result<Self> {
        Keychain::open(path).map(Self::wrap).into_js()
    }

    /// Creates a keychain file; without a password the OS prompts for one
    #[napi(factory)]
    pub fn create(path: String, password: Option<String>) -> Result<Self> {
        Keychain::create(path, password.as_deref()).map(Self::wrap).into_js()
    }

    /// Searches several keychains for items of `kind` ("generic" or "internet")
    #[napi]
    pub fn search_all(
        keychains: Vec<ClassInstance<JsKeychain>>,
        kind: String,
        attributes: HostAttributes,
    ) -> Result<Vec<JsKeychainItem>> {
        let class = ItemClass::parse(&kind).into_js()?;
        let conditions = attributes_from_host(attributes)?;
        let items = Keychain::search_all(&unwrap_all(&keychains), class, &conditions).into_js()?;
        Ok(items.into_iter().map(JsKeychainItem::wrap).collect())
    }

    #[napi]
    pub fn user_interaction_allowed() -> Result<bool> {
        Keychain::user_interaction_allowed().into_js()
    }

    #[napi]
    pub fn set_user_interaction_allowed(allowed: bool) -> Result<()> {
        Keychain::set_user_interaction_allowed(allowed).into_js()
    }

    #[napi(getter)]
    pub fn path(&self) -> Result<String> {
        let path = self.inner.path().into_js()?;
        Ok(path.to_string_lossy().into_owned())
    }

    #[napi]
    pub fn exists(&self) -> Result<bool> {
        self.inner.exists().into_js()
    }

    #[napi]
    pub fn status(&self) -> Result<JsKeychainStatus> {
        self.inner.status().map(JsKeychainStatus::from).into_js()
    }

    #[napi]
    pub fn is_locked(&self) -> Result<bool> {
        self.inner.is_locked().into_js()
    }

    #[napi]
    pub fn lock(&self) -> Result<()> {
        self.inner.lock().into_js()
    }

    #[napi]
    pub fn unlock(&mut self, password: Option<String>) -> Result<()> {
        self.inner.unlock(password.as_deref()).into_js()
    }

    #[napi]
    pub fn settings(&self) -> Result<JsKeychainSettings> {
        self.inner.settings().map(JsKeychainSettings::from).into_js()
    }

    #[napi]
    pub fn set_settings(&mut self, settings: JsKeychainSettings) -> Result<()> {
        self.inner.set_settings(&settings.into()).into_js()
    }

    #[napi(getter)]
    pub fn lock_on_sleep(&self) -> Result<bool> {
        self.inner.lock_on_sleep().into_js()
    }

    #[napi(setter)]
    pub fn set_lock_on_sleep(&mut self, value: bool) -> Result<()> {
        self.inner.set_lock_on_sleep(value).into_js()
    }

    #[napi(getter)]
    pub fn lock_interval(&self) -> Result<Option<u32>> {
        self.inner.lock_interval().into_js()
    }

    #[napi(setter)]
    pub fn set_lock_interval(&mut self, value: Option<u32>) -> Result<()> {
        self.inner.set_lock_interval(value).into_js()
    }

    /// Deletes the keychain file. The object must not be used afterwards.
    #[napi]
    pub fn delete(&mut self) -> Result<()> {
        self.inner.clone().delete().into_js()
    }

    #[napi]
    pub fn add_generic_password(
        &self,
        service: String,
        account: String,
        password: Either<String, Buffer>,
    ) -> Result<JsKeychainItem> {
        self.inner
            .add_generic_password(&service, &account, &password_bytes(password))
            .map(JsKeychainItem::wrap)
            .into_js()
    }

    #[napi]
    pub fn add_internet_password(
        &self,
        attributes: HostAttributes,
        password: Either<String, Buffer>,
    ) -> Result<JsKeychainItem> {
        let attributes = attributes_from_host(attributes)?;
        self.inner
            .add_internet_password(&attributes, &password_bytes(password))
            .map(JsKeychainItem::wrap)
            .into_js()
    }

    /// First generic password in this keychain matching `attributes`
    #[napi]
    pub fn search(&self, attributes: HostAttributes) -> Result<Option<JsKeychainItem>> {
        let conditions = attributes_from_host(attributes)?;
        let found = self.inner.search(&conditions).into_js()?;
        Ok(found.map(JsKeychainItem::wrap))
    }

    #[napi]
    pub fn generic_passwords(&self) -> JsScope {
        JsScope::wrap(self.inner.generic_passwords())
    }

    #[napi]
    pub fn internet_passwords(&self) -> JsScope {
        JsScope::wrap(self.inner.internet_passwords())
    }

    #[napi]
    pub fn equals(&self, other: &JsKeychain) -> bool {
        self.inner == other.inner
    }

    #[napi(js_name = "toString")]
    pub fn to_js_string(&self) -> String {
        self.inner.to_string()
    }
}
