//! `KeychainItem` JavaScript class.

use crate::convert::{attr_key, attributes_to_host, password_bytes, HostAttributes, HostValue};
use crate::error::{to_js_error, IntoJs, Result};
use crate::keychain::JsKeychain;
use keychain_core::{AttrKey, Item, KeychainError};
use napi::bindgen_prelude::{Buffer, Either};
use napi_derive::napi;

/// A generic or internet password. Attribute getters read the cached
/// attributes; `set` and `setPassword` stage changes until `save`.
#[napi(js_name = "KeychainItem")]
pub struct JsKeychainItem {
    inner: Item,
}

impl JsKeychainItem {
    pub(crate) fn wrap(inner: Item) -> Self {
        Self { inner }
    }

    fn attr(&self, key: AttrKey) -> Option<HostValue> {
        self.inner.get(key).map(HostValue)
    }
}

#[napi]
impl JsKeychainItem {
    /// "generic" or "internet"
    #[napi(getter)]
    pub fn kind(&self) -> String {
        self.inner.class().name().to_string()
    }

    #[napi]
    pub fn attributes(&self) -> HostAttributes {
        attributes_to_host(&self.inner.attributes())
    }

    /// Any attribute by name or four-character code
    #[napi]
    pub fn get(&self, name: String) -> Result<Option<HostValue>> {
        Ok(self.attr(attr_key(&name)?))
    }

    /// Stages attribute changes; nothing is written until `save`
    #[napi]
    pub fn set(&mut self, attributes: HostAttributes) -> Result<()> {
        for (name, value) in attributes {
            let key = attr_key(&name)?;
            self.inner.set(key, value.0).into_js()?;
        }
        Ok(())
    }

    #[napi]
    pub fn password(&self) -> Result<String> {
        self.inner.password_string().into_js()
    }

    #[napi]
    pub fn password_data(&self) -> Result<Buffer> {
        self.inner.password().map(Buffer::from).into_js()
    }

    #[napi]
    pub fn set_password(&mut self, password: Either<String, Buffer>) {
        self.inner.set_password(password_bytes(password));
    }

    #[napi(getter)]
    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.has_unsaved_changes()
    }

    #[napi]
    pub fn save(&mut self) -> Result<()> {
        self.inner.save().into_js()
    }

    #[napi]
    pub fn reload(&mut self) -> Result<()> {
        self.inner.reload().into_js()
    }

    /// Removes the item from its keychain. The object must not be used afterwards.
    #[napi]
    pub fn delete(&mut self) -> Result<()> {
        self.inner.clone().delete().into_js()
    }

    #[napi]
    pub fn keychain(&self) -> Result<JsKeychain> {
        self.inner.keychain().map(JsKeychain::wrap).into_js()
    }

    #[napi(getter)]
    pub fn created_at(&self) -> Option<HostValue> {
        self.attr(AttrKey::CreationDate)
    }

    #[napi(getter)]
    pub fn updated_at(&self) -> Option<HostValue> {
        self.attr(AttrKey::ModDate)
    }

    #[napi(getter)]
    pub fn description(&self) -> Option<HostValue> {
        self.attr(AttrKey::Description)
    }

    #[napi(getter)]
    pub fn comment(&self) -> Option<HostValue> {
        self.attr(AttrKey::Comment)
    }

    #[napi(getter)]
    pub fn label(&self) -> Option<HostValue> {
        self.attr(AttrKey::Label)
    }

    #[napi(getter)]
    pub fn negative(&self) -> Option<HostValue> {
        self.attr(AttrKey::Negative)
    }

    #[napi(getter)]
    pub fn invisible(&self) -> Option<HostValue> {
        self.attr(AttrKey::Invisible)
    }

    #[napi(getter)]
    pub fn account(&self) -> Option<HostValue> {
        self.attr(AttrKey::Account)
    }

    #[napi(getter)]
    pub fn service(&self) -> Option<HostValue> {
        self.attr(AttrKey::Service)
    }

    #[napi(getter)]
    pub fn generic(&self) -> Option<HostValue> {
        self.attr(AttrKey::Generic)
    }

    #[napi(getter)]
    pub fn security_domain(&self) -> Option<HostValue> {
        self.attr(AttrKey::SecurityDomain)
    }

    #[napi(getter)]
    pub fn host(&self) -> Option<HostValue> {
        self.attr(AttrKey::Server)
    }

    #[napi(getter)]
    pub fn port(&self) -> Option<HostValue> {
        self.attr(AttrKey::Port)
    }

    #[napi(getter)]
    pub fn path(&self) -> Option<HostValue> {
        self.attr(AttrKey::Path)
    }

    #[napi(getter)]
    pub fn protocol(&self) -> Option<HostValue> {
        self.attr(AttrKey::Protocol)
    }

    #[napi(getter)]
    pub fn authentication_type(&self) -> Option<HostValue> {
        self.attr(AttrKey::AuthenticationType)
    }

    #[napi(getter)]
    pub fn creator(&self) -> Option<HostValue> {
        self.attr(AttrKey::Creator)
    }

    #[napi(getter, js_name = "type")]
    pub fn item_type(&self) -> Option<HostValue> {
        self.attr(AttrKey::Type)
    }

    #[napi(js_name = "toJSON")]
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self.inner.attributes())
            .map_err(|e| to_js_error(KeychainError::invalid_argument(e.to_string())))
    }
}
