//! `Scope` JavaScript class.

use crate::convert::{attributes_from_host, password_bytes, HostAttributes};
use crate::error::{IntoJs, Result};
use crate::item::JsKeychainItem;
use crate::keychain::{unwrap_all, JsKeychain};
use keychain_core::{ItemClass, Scope};
use napi::bindgen_prelude::{Buffer, ClassInstance, Either};
use napi_derive::napi;

/// A reusable search. Builder methods return a new scope and leave this
/// one untouched.
#[napi(js_name = "Scope")]
pub struct JsScope {
    inner: Scope,
}

impl JsScope {
    pub(crate) fn wrap(inner: Scope) -> Self {
        Self { inner }
    }
}

#[napi]
impl JsScope {
    /// A scope over the default search list for `kind` ("generic" or "internet")
    #[napi(factory)]
    pub fn of_kind(kind: String) -> Result<Self> {
        let class = ItemClass::parse(&kind).into_js()?;
        Ok(Self::wrap(Scope::new(class)))
    }

    #[napi(getter)]
    pub fn kind(&self) -> String {
        self.inner.class().name().to_string()
    }

    #[napi(js_name = "where")]
    pub fn where_attributes(&self, attributes: HostAttributes) -> Result<JsScope> {
        let conditions = attributes_from_host(attributes)?;
        Ok(Self::wrap(self.inner.clone().conditions(conditions)))
    }

    #[napi]
    pub fn limit(&self, limit: u32) -> JsScope {
        Self::wrap(self.inner.clone().limit(limit))
    }

    #[napi]
    pub fn in_keychains(&self, keychains: Vec<ClassInstance<JsKeychain>>) -> JsScope {
        Self::wrap(self.inner.clone().in_keychains(unwrap_all(&keychains)))
    }

    #[napi]
    pub fn all(&self) -> Result<Vec<JsKeychainItem>> {
        let items = self.inner.all().into_js()?;
        Ok(items.into_iter().map(JsKeychainItem::wrap).collect())
    }

    #[napi]
    pub fn first(&self) -> Result<Option<JsKeychainItem>> {
        let item = self.inner.first().into_js()?;
        Ok(item.map(JsKeychainItem::wrap))
    }

    /// Adds an item carrying this scope's conditions plus `attributes`
    #[napi]
    pub fn create(&self, attributes: HostAttributes, password: Either<String, Buffer>) -> Result<JsKeychainItem> {
        let attributes = attributes_from_host(attributes)?;
        self.inner
            .create(&attributes, &password_bytes(password))
            .map(JsKeychainItem::wrap)
            .into_js()
    }
}
