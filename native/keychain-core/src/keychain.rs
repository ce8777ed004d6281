//! Keychain handles.

use crate::attr::{AttrKey, ItemClass};
use crate::attributes::Attributes;
use crate::error::Result;
use crate::handle::KeychainRef;
use crate::item::Item;
use crate::scope::Scope;
use serde::Serialize;
use std::fmt;

/// Lock state and permissions reported by `SecKeychainGetStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeychainStatus {
    pub unlocked: bool,
    pub readable: bool,
    pub writable: bool,
}

impl KeychainStatus {
    #[cfg(any(target_os = "macos", test))]
    pub(crate) fn from_bits(bits: u32) -> Self {
        Self {
            unlocked: bits & 0x1 != 0,
            readable: bits & 0x2 != 0,
            writable: bits & 0x4 != 0,
        }
    }
}

/// Auto-lock behaviour of a keychain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeychainSettings {
    pub lock_on_sleep: bool,
    /// Seconds of inactivity before locking; `None` never locks on a timer.
    pub lock_interval: Option<u32>,
}

/// An open keychain. Cloning retains the native reference; dropping the
/// last clone releases it.
#[derive(Clone)]
pub struct Keychain {
    inner: KeychainRef,
}

impl Keychain {
    #[cfg(target_os = "macos")]
    pub(crate) fn from_ref(inner: KeychainRef) -> Self {
        Self { inner }
    }

    pub(crate) fn as_ref(&self) -> &KeychainRef {
        &self.inner
    }

    pub fn is_locked(&self) -> Result<bool> {
        Ok(!self.status()?.unlocked)
    }

    pub fn lock_on_sleep(&self) -> Result<bool> {
        Ok(self.settings()?.lock_on_sleep)
    }

    pub fn set_lock_on_sleep(&mut self, value: bool) -> Result<()> {
        let mut settings = self.settings()?;
        settings.lock_on_sleep = value;
        self.set_settings(&settings)
    }

    pub fn lock_interval(&self) -> Result<Option<u32>> {
        Ok(self.settings()?.lock_interval)
    }

    pub fn set_lock_interval(&mut self, value: Option<u32>) -> Result<()> {
        let mut settings = self.settings()?;
        settings.lock_interval = value;
        self.set_settings(&settings)
    }

    pub fn generic_passwords(&self) -> Scope {
        Scope::new(ItemClass::GenericPassword).in_keychains(vec![self.clone()])
    }

    pub fn internet_passwords(&self) -> Scope {
        Scope::new(ItemClass::InternetPassword).in_keychains(vec![self.clone()])
    }

    pub fn add_generic_password(&self, service: &str, account: &str, password: &[u8]) -> Result<Item> {
        let mut attributes = Attributes::new();
        attributes.set(AttrKey::Service, service)?;
        attributes.set(AttrKey::Account, account)?;
        self.generic_passwords().create(&attributes, password)
    }

    pub fn add_internet_password(&self, attributes: &Attributes, password: &[u8]) -> Result<Item> {
        self.internet_passwords().create(attributes, password)
    }

    /// First generic password in this keychain matching `conditions`.
    pub fn search(&self, conditions: &Attributes) -> Result<Option<Item>> {
        self.generic_passwords().conditions(conditions.clone()).first()
    }

    /// Searches several keychains at once.
    pub fn search_all(keychains: &[Keychain], class: ItemClass, conditions: &Attributes) -> Result<Vec<Item>> {
        Scope::new(class)
            .in_keychains(keychains.to_vec())
            .conditions(conditions.clone())
            .all()
    }
}

impl fmt::Display for Keychain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path() {
            Ok(path) => write!(f, "<Keychain: {}>", path.display()),
            Err(_) => f.write_str("<Keychain: (unknown path)>"),
        }
    }
}

impl fmt::Debug for Keychain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq for Keychain {
    fn eq(&self, other: &Self) -> bool {
        match (self.path(), other.path()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(target_os = "macos")]
mod macos {
    use super::*;
    use crate::error::{check, KeychainError};
    use crate::status::ErrorKind;
    use crate::sys;
    use core_foundation::base::{Boolean, TCFType};
    use security_framework::os::macos::keychain::{CreateOptions, KeychainSettings as NativeSettings, SecKeychain};
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::path::{Path, PathBuf};
    use tracing::{debug, info};

    fn native_error(err: security_framework::base::Error) -> KeychainError {
        KeychainError::from_status(err.code())
    }

    impl Keychain {
        /// The user's default keychain.
        #[allow(clippy::should_implement_trait)]
        pub fn default() -> Result<Self> {
            debug!("opening default keychain");
            SecKeychain::default().map(Self::from_ref).map_err(native_error)
        }

        /// Opens the keychain at `path`. The file is not checked until the
        /// handle is used; see [`Keychain::exists`].
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            debug!(path = %path.as_ref().display(), "opening keychain");
            SecKeychain::open(path).map(Self::from_ref).map_err(native_error)
        }

        /// Creates a keychain file. With no password the OS prompts the user.
        pub fn create(path: impl AsRef<Path>, password: Option<&str>) -> Result<Self> {
            let mut options = CreateOptions::new();
            match password {
                Some(password) => {
                    options.password(password);
                }
                None => {
                    options.prompt_user(true);
                }
            }
            let keychain = options.create(path.as_ref()).map_err(native_error)?;
            info!(path = %path.as_ref().display(), "created keychain");
            Ok(Self::from_ref(keychain))
        }

        pub fn path(&self) -> Result<PathBuf> {
            debug!("reading keychain path");
            let mut buffer = vec![0 as std::os::raw::c_char; sys::PATH_MAX];
            let mut length = sys::PATH_MAX as u32;
            check(unsafe {
                sys::SecKeychainGetPath(self.inner.as_concrete_TypeRef(), &mut length, buffer.as_mut_ptr())
            })?;
            let bytes: Vec<u8> = buffer[..length as usize].iter().map(|c| *c as u8).collect();
            Ok(PathBuf::from(OsStr::from_bytes(&bytes)))
        }

        fn raw_status(&self) -> Result<u32> {
            let mut bits = 0u32;
            check(unsafe { sys::SecKeychainGetStatus(self.inner.as_concrete_TypeRef(), &mut bits) })?;
            debug!(bits, "read keychain status");
            Ok(bits)
        }

        pub fn status(&self) -> Result<KeychainStatus> {
            self.raw_status().map(KeychainStatus::from_bits)
        }

        pub fn exists(&self) -> Result<bool> {
            match self.raw_status() {
                Ok(_) => Ok(true),
                Err(e) if e.kind() == ErrorKind::NoSuchKeychain => Ok(false),
                Err(e) => Err(e),
            }
        }

        pub fn lock(&self) -> Result<()> {
            debug!("locking keychain");
            check(unsafe { sys::SecKeychainLock(self.inner.as_concrete_TypeRef()) })
        }

        /// Unlocks with `password`, or prompts the user when it is `None`.
        pub fn unlock(&mut self, password: Option<&str>) -> Result<()> {
            debug!(prompt = password.is_none(), "unlocking keychain");
            self.inner.unlock(password).map_err(native_error)
        }

        pub fn settings(&self) -> Result<KeychainSettings> {
            let mut raw = sys::SecKeychainSettings {
                version: sys::SEC_KEYCHAIN_SETTINGS_VERS1,
                ..Default::default()
            };
            check(unsafe { sys::SecKeychainCopySettings(self.inner.as_concrete_TypeRef(), &mut raw) })?;
            debug!(lock_on_sleep = raw.lockOnSleep, lock_interval = raw.lockInterval, "read keychain settings");
            Ok(KeychainSettings {
                lock_on_sleep: raw.lockOnSleep != 0,
                lock_interval: (raw.useLockInterval != 0).then_some(raw.lockInterval),
            })
        }

        pub fn set_settings(&mut self, settings: &KeychainSettings) -> Result<()> {
            debug!(?settings, "updating keychain settings");
            let mut native = NativeSettings::new();
            native.set_lock_on_sleep(settings.lock_on_sleep);
            native.set_lock_interval(settings.lock_interval);
            self.inner.set_settings(&native).map_err(native_error)
        }

        /// Removes the keychain file and invalidates every handle to it.
        pub fn delete(self) -> Result<()> {
            let path = self.path().ok();
            check(unsafe { sys::SecKeychainDelete(self.inner.as_concrete_TypeRef()) })?;
            info!(path = ?path, "deleted keychain");
            Ok(())
        }

        /// Whether the OS may show authentication dialogs for this process.
        pub fn user_interaction_allowed() -> Result<bool> {
            let mut state: Boolean = 0;
            check(unsafe { sys::SecKeychainGetUserInteractionAllowed(&mut state) })?;
            debug!(allowed = state != 0, "read user interaction state");
            Ok(state != 0)
        }

        pub fn set_user_interaction_allowed(allowed: bool) -> Result<()> {
            debug!(allowed, "setting user interaction state");
            check(unsafe { sys::SecKeychainSetUserInteractionAllowed(allowed as Boolean) })
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod unsupported {
    use super::*;
    use crate::error::KeychainError;
    use std::path::{Path, PathBuf};

    impl Keychain {
        #[allow(clippy::should_implement_trait)]
        pub fn default() -> Result<Self> {
            Err(KeychainError::unsupported())
        }

        pub fn open(_path: impl AsRef<Path>) -> Result<Self> {
            Err(KeychainError::unsupported())
        }

        pub fn create(_path: impl AsRef<Path>, _password: Option<&str>) -> Result<Self> {
            Err(KeychainError::unsupported())
        }

        pub fn path(&self) -> Result<PathBuf> {
            Err(KeychainError::unsupported())
        }

        pub fn status(&self) -> Result<KeychainStatus> {
            Err(KeychainError::unsupported())
        }

        pub fn exists(&self) -> Result<bool> {
            Err(KeychainError::unsupported())
        }

        pub fn lock(&self) -> Result<()> {
            Err(KeychainError::unsupported())
        }

        pub fn unlock(&mut self, _password: Option<&str>) -> Result<()> {
            Err(KeychainError::unsupported())
        }

        pub fn settings(&self) -> Result<KeychainSettings> {
            Err(KeychainError::unsupported())
        }

        pub fn set_settings(&mut self, _settings: &KeychainSettings) -> Result<()> {
            Err(KeychainError::unsupported())
        }

        pub fn delete(self) -> Result<()> {
            Err(KeychainError::unsupported())
        }

        pub fn user_interaction_allowed() -> Result<bool> {
            Err(KeychainError::unsupported())
        }

        pub fn set_user_interaction_allowed(_allowed: bool) -> Result<()> {
            Err(KeychainError::unsupported())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bits() {
        let status = KeychainStatus::from_bits(0x1 | 0x4);
        assert!(status.unlocked);
        assert!(!status.readable);
        assert!(status.writable);
        assert_eq!(KeychainStatus::from_bits(0), KeychainStatus {
            unlocked: false,
            readable: false,
            writable: false,
        });
    }

    #[test]
    fn test_settings_default() {
        let settings = KeychainSettings::default();
        assert!(!settings.lock_on_sleep);
        assert_eq!(settings.lock_interval, None);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_unsupported_platform() {
        use crate::status::{ErrorKind, ERR_SEC_UNIMPLEMENTED};

        let err = Keychain::default().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.code(), Some(ERR_SEC_UNIMPLEMENTED));
        assert!(Keychain::open("/tmp/missing.keychain").is_err());
        assert!(Keychain::user_interaction_allowed().is_err());
    }
}
