//! Keychain item handles.

use crate::attr::{AttrKey, ItemClass};
use crate::attributes::Attributes;
use crate::error::{KeychainError, Result};
use crate::handle::ItemRef;
use crate::value::AttrValue;
use std::fmt;

/// A stored password item.
///
/// Attributes are read once and cached; `set` and `set_password` stage
/// changes that `save` writes back with `SecItemUpdate`.
#[derive(Clone)]
pub struct Item {
    inner: ItemRef,
    class: ItemClass,
    attributes: Attributes,
    pending: Attributes,
    pending_password: Option<Vec<u8>>,
}

impl Item {
    pub(crate) fn from_parts(inner: ItemRef, class: ItemClass, attributes: Attributes) -> Self {
        Self {
            inner,
            class,
            attributes,
            pending: Attributes::new(),
            pending_password: None,
        }
    }

    pub fn class(&self) -> ItemClass {
        self.class
    }

    /// Stored attributes with unsaved changes applied on top.
    pub fn attributes(&self) -> Attributes {
        let mut merged = self.attributes.clone();
        merged.merge(&self.pending);
        merged
    }

    pub fn get(&self, key: AttrKey) -> Option<AttrValue> {
        self.pending
            .get_host(key)
            .or_else(|| self.attributes.get_host(key))
    }

    /// Stages a change to `key`.
    pub fn set(&mut self, key: AttrKey, value: impl Into<AttrValue>) -> Result<()> {
        if key.is_read_only() {
            return Err(KeychainError::invalid_argument(format!(
                "attribute '{}' is read-only",
                key
            )));
        }
        if !self.class.accepts(key) {
            return Err(KeychainError::invalid_argument(format!(
                "attribute '{}' is not valid for {} passwords",
                key, self.class
            )));
        }
        self.pending.set(key, value)
    }

    pub fn set_password(&mut self, password: impl Into<Vec<u8>>) {
        self.pending_password = Some(password.into());
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.pending.is_empty() || self.pending_password.is_some()
    }

    pub fn password_string(&self) -> Result<String> {
        String::from_utf8(self.password()?)
            .map_err(|_| KeychainError::invalid_argument("password is not valid UTF-8"))
    }

    pub fn account(&self) -> Option<String> {
        self.text(AttrKey::Account)
    }

    pub fn service(&self) -> Option<String> {
        self.text(AttrKey::Service)
    }

    pub fn label(&self) -> Option<String> {
        self.text(AttrKey::Label)
    }

    fn text(&self, key: AttrKey) -> Option<String> {
        self.get(key).and_then(|v| v.as_text().map(str::to_string))
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("class", &self.class)
            .field("attributes", &self.attributes())
            .finish()
    }
}

#[cfg(target_os = "macos")]
mod macos {
    use super::*;
    use crate::error::check;
    use crate::keychain::Keychain;
    use crate::query::Query;
    use crate::secitem;
    use crate::sys;
    use core_foundation::base::TCFType;
    use security_framework::os::macos::keychain::SecKeychain;
    use std::ptr;
    use tracing::debug;

    impl Item {
        /// Wraps a freshly added reference and loads its attributes.
        pub(crate) fn load(inner: ItemRef, class: ItemClass) -> Result<Self> {
            let mut item = Self::from_parts(inner, class, Attributes::new());
            item.reload()?;
            Ok(item)
        }

        /// Refetches the stored attributes, discarding unsaved changes.
        pub fn reload(&mut self) -> Result<()> {
            let query = Query::attributes_of(self.class, &self.inner);
            let (_, attributes) = secitem::find(&query)?
                .into_iter()
                .next()
                .ok_or_else(|| KeychainError::from_status(crate::status::ERR_SEC_ITEM_NOT_FOUND))?;
            self.attributes = attributes;
            self.pending = Attributes::new();
            self.pending_password = None;
            Ok(())
        }

        /// Password data, read from the keychain on every call unless a new
        /// password is staged.
        pub fn password(&self) -> Result<Vec<u8>> {
            if let Some(staged) = &self.pending_password {
                return Ok(staged.clone());
            }
            secitem::find_data(&Query::password_of(self.class, &self.inner))
        }

        /// Writes staged attribute and password changes.
        pub fn save(&mut self) -> Result<()> {
            if !self.has_unsaved_changes() {
                return Ok(());
            }
            let changes = Query::update_changes(
                self.class,
                &self.pending,
                self.pending_password.as_deref(),
            )?;
            secitem::update(&Query::for_item(self.class, &self.inner), &changes)?;
            debug!(class = %self.class, "saved keychain item");
            self.reload()
        }

        pub fn delete(self) -> Result<()> {
            debug!(class = %self.class, "deleting keychain item");
            check(unsafe { sys::SecKeychainItemDelete(self.inner.as_concrete_TypeRef()) })
        }

        /// The keychain holding this item.
        pub fn keychain(&self) -> Result<Keychain> {
            debug!(class = %self.class, "looking up item keychain");
            let mut raw = ptr::null_mut();
            check(unsafe { sys::SecKeychainItemCopyKeychain(self.inner.as_concrete_TypeRef(), &mut raw) })?;
            Ok(Keychain::from_ref(unsafe { SecKeychain::wrap_under_create_rule(raw) }))
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod unsupported {
    use super::*;
    use crate::keychain::Keychain;

    impl Item {
        pub fn reload(&mut self) -> Result<()> {
            Err(KeychainError::unsupported())
        }

        pub fn password(&self) -> Result<Vec<u8>> {
            match &self.pending_password {
                Some(staged) => Ok(staged.clone()),
                None => Err(KeychainError::unsupported()),
            }
        }

        pub fn save(&mut self) -> Result<()> {
            Err(KeychainError::unsupported())
        }

        pub fn delete(self) -> Result<()> {
            Err(KeychainError::unsupported())
        }

        pub fn keychain(&self) -> Result<Keychain> {
            Err(KeychainError::unsupported())
        }
    }
}
