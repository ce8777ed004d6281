//! OSStatus codes returned by Keychain Services and their classification.

use serde::Serialize;
use std::fmt;

/// Native status code convention of the Security framework.
pub type OsStatus = i32;

pub const ERR_SEC_SUCCESS: OsStatus = 0;
pub const ERR_SEC_UNIMPLEMENTED: OsStatus = -4;
pub const ERR_SEC_PARAM: OsStatus = -50;
pub const ERR_SEC_ALLOCATE: OsStatus = -108;
pub const ERR_SEC_USER_CANCELED: OsStatus = -128;
pub const ERR_SEC_NOT_AVAILABLE: OsStatus = -25291;
pub const ERR_SEC_READ_ONLY: OsStatus = -25292;
pub const ERR_SEC_AUTH_FAILED: OsStatus = -25293;
pub const ERR_SEC_NO_SUCH_KEYCHAIN: OsStatus = -25294;
pub const ERR_SEC_INVALID_KEYCHAIN: OsStatus = -25295;
pub const ERR_SEC_DUPLICATE_KEYCHAIN: OsStatus = -25296;
pub const ERR_SEC_DUPLICATE_ITEM: OsStatus = -25299;
pub const ERR_SEC_ITEM_NOT_FOUND: OsStatus = -25300;
pub const ERR_SEC_INTERACTION_NOT_ALLOWED: OsStatus = -25308;
pub const ERR_SEC_DECODE: OsStatus = -26275;

/// The four exception kinds surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Generic,
    DuplicateItem,
    NoSuchKeychain,
    AuthFailed,
}

impl ErrorKind {
    pub fn from_status(status: OsStatus) -> Self {
        match status {
            ERR_SEC_DUPLICATE_ITEM => ErrorKind::DuplicateItem,
            ERR_SEC_NO_SUCH_KEYCHAIN => ErrorKind::NoSuchKeychain,
            ERR_SEC_AUTH_FAILED => ErrorKind::AuthFailed,
            _ => ErrorKind::Generic,
        }
    }

    /// Exception class name used on the host side.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Generic => "KeychainError",
            ErrorKind::DuplicateItem => "DuplicateItemError",
            ErrorKind::NoSuchKeychain => "NoSuchKeychainError",
            ErrorKind::AuthFailed => "AuthFailedError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// English text for the codes this crate names, used when the OS has none.
pub fn fallback_message(status: OsStatus) -> String {
    let text = match status {
        ERR_SEC_SUCCESS => "No error.",
        ERR_SEC_UNIMPLEMENTED => "Function or operation not implemented.",
        ERR_SEC_PARAM => "One or more parameters passed to a function were not valid.",
        ERR_SEC_ALLOCATE => "Failed to allocate memory.",
        ERR_SEC_USER_CANCELED => "User canceled the operation.",
        ERR_SEC_NOT_AVAILABLE => "No keychain is available. You may need to restart your computer.",
        ERR_SEC_READ_ONLY => "This keychain cannot be modified.",
        ERR_SEC_AUTH_FAILED => "The user name or passphrase you entered is not correct.",
        ERR_SEC_NO_SUCH_KEYCHAIN => "The specified keychain could not be found.",
        ERR_SEC_INVALID_KEYCHAIN => "The specified keychain is not a valid keychain file.",
        ERR_SEC_DUPLICATE_KEYCHAIN => "A keychain with the same name already exists.",
        ERR_SEC_DUPLICATE_ITEM => "The specified item already exists in the keychain.",
        ERR_SEC_ITEM_NOT_FOUND => "The specified item could not be found in the keychain.",
        ERR_SEC_INTERACTION_NOT_ALLOWED => "User interaction is not allowed.",
        ERR_SEC_DECODE => "Unable to decode the provided data.",
        other => return format!("Unknown keychain error {}", other),
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(ErrorKind::from_status(ERR_SEC_DUPLICATE_ITEM), ErrorKind::DuplicateItem);
        assert_eq!(ErrorKind::from_status(ERR_SEC_NO_SUCH_KEYCHAIN), ErrorKind::NoSuchKeychain);
        assert_eq!(ErrorKind::from_status(ERR_SEC_AUTH_FAILED), ErrorKind::AuthFailed);
        assert_eq!(ErrorKind::from_status(ERR_SEC_ITEM_NOT_FOUND), ErrorKind::Generic);
        assert_eq!(ErrorKind::from_status(12345), ErrorKind::Generic);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Generic.to_string(), "KeychainError");
        assert_eq!(ErrorKind::AuthFailed.name(), "AuthFailedError");
    }

    #[test]
    fn test_fallback_message() {
        assert!(fallback_message(ERR_SEC_DUPLICATE_ITEM).contains("already exists"));
        assert_eq!(fallback_message(-1), "Unknown keychain error -1");
    }
}
