//! Retained native references.
//!
//! On macOS these are the `security-framework` wrappers: cloning retains,
//! dropping releases. Elsewhere they are placeholders that nothing outside
//! this crate can construct, so every handle-taking call is unreachable.

#[cfg(target_os = "macos")]
pub use security_framework::os::macos::keychain::SecKeychain as KeychainRef;
#[cfg(target_os = "macos")]
pub use security_framework::os::macos::keychain_item::SecKeychainItem as ItemRef;

#[cfg(not(target_os = "macos"))]
#[derive(Clone)]
pub struct KeychainRef {
    _private: (),
}

#[cfg(not(target_os = "macos"))]
#[derive(Clone)]
pub struct ItemRef {
    _private: (),
}

#[cfg(all(test, not(target_os = "macos")))]
impl ItemRef {
    pub(crate) fn placeholder() -> Self {
        Self { _private: () }
    }
}
