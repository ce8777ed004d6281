//! Keychain errors as JavaScript exceptions.
//!
//! Every thrown error carries `code` set to one of `KeychainError`,
//! `DuplicateItemError`, `NoSuchKeychainError` or `AuthFailedError`, so the
//! JS side can rethrow them as its own exception subclasses.

use keychain_core::status::OsStatus;
use keychain_core::{ErrorKind, KeychainError};
use napi_derive::napi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Keychain,
    DuplicateItem,
    NoSuchKeychain,
    AuthFailed,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Generic => ErrorCode::Keychain,
            ErrorKind::DuplicateItem => ErrorCode::DuplicateItem,
            ErrorKind::NoSuchKeychain => ErrorCode::NoSuchKeychain,
            ErrorKind::AuthFailed => ErrorCode::AuthFailed,
        }
    }
}

// Implement AsRef<str> for NAPI-RS custom status support
impl AsRef<str> for ErrorCode {
    fn as_ref(&self) -> &str {
        match self {
            ErrorCode::Keychain => "KeychainError",
            ErrorCode::DuplicateItem => "DuplicateItemError",
            ErrorCode::NoSuchKeychain => "NoSuchKeychainError",
            ErrorCode::AuthFailed => "AuthFailedError",
        }
    }
}

pub type Error = napi::Error<ErrorCode>;
pub type Result<T> = std::result::Result<T, Error>;

pub fn to_js_error(err: KeychainError) -> Error {
    let message = match err.code() {
        Some(code) => format!("{} (OSStatus {})", err.message(), code),
        None => err.message().to_string(),
    };
    Error::new(ErrorCode::from(err.kind()), message)
}

/// Converts core results into results that throw as JS errors.
pub trait IntoJs<T> {
    fn into_js(self) -> Result<T>;
}

impl<T> IntoJs<T> for keychain_core::Result<T> {
    fn into_js(self) -> Result<T> {
        self.map_err(to_js_error)
    }
}

/// What a status code means, for callers building their own exceptions
#[napi(object)]
pub struct JsErrorInfo {
    pub status: i32,
    pub code: String,
    pub message: String,
}

impl JsErrorInfo {
    fn from_status(status: OsStatus) -> Self {
        let err = KeychainError::from_status(status);
        Self {
            status,
            code: ErrorCode::from(err.kind()).as_ref().to_string(),
            message: err.message().to_string(),
        }
    }
}

#[napi]
pub fn describe_status(status: i32) -> JsErrorInfo {
    JsErrorInfo::from_status(status)
}
