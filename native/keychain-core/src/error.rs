use crate::status::{self, ErrorKind, OsStatus};
use thiserror::Error;

/// A failed Keychain Services call, or a host value that could not be
/// marshalled into one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct KeychainError {
    kind: ErrorKind,
    code: Option<OsStatus>,
    message: String,
}

pub type Result<T> = std::result::Result<T, KeychainError>;

impl KeychainError {
    /// Classifies `code` and fetches the OS description for it.
    pub fn from_status(code: OsStatus) -> Self {
        Self {
            kind: ErrorKind::from_status(code),
            code: Some(code),
            message: os_message(code).unwrap_or_else(|| status::fallback_message(code)),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Generic,
            code: None,
            message: message.into(),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            kind: ErrorKind::Generic,
            code: Some(status::ERR_SEC_UNIMPLEMENTED),
            message: "Keychain Services are only available on macOS".to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> Option<OsStatus> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Some(status::ERR_SEC_ITEM_NOT_FOUND)
    }
}

/// Turns a native status into `Ok(())` or a classified error.
pub fn check(code: OsStatus) -> Result<()> {
    if code == status::ERR_SEC_SUCCESS {
        Ok(())
    } else {
        Err(KeychainError::from_status(code))
    }
}

#[cfg(target_os = "macos")]
fn os_message(code: OsStatus) -> Option<String> {
    security_framework::base::Error::from_code(code)
        .message()
        .filter(|m| !m.is_empty())
}

#[cfg(not(target_os = "macos"))]
fn os_message(_code: OsStatus) -> Option<String> {
    None
}
