// Native module entry point for macOS Keychain Services
//
// Exposes the Keychain, KeychainItem and Scope classes, status constants and
// logging setup. On platforms without Keychain Services the module still
// loads; every keychain call throws a KeychainError.

pub mod convert;
pub mod error;
pub mod item;
pub mod keychain;
pub mod scope;

use keychain_core::status;
use napi_derive::napi;
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use error::{describe_status, ErrorCode, JsErrorInfo};
pub use item::JsKeychainItem;
pub use keychain::JsKeychain;
pub use scope::JsScope;

/// Environment variable holding a tracing filter; overrides `logLevel`
pub const LOG_ENV: &str = "KEYCHAIN_LOG";

const DEFAULT_LOG_LEVEL: &str = "info";

static LOGGING: OnceCell<String> = OnceCell::new();

/// Options accepted by `initKeychain`
#[napi(object)]
pub struct JsKeychainConfig {
    /// Log level: "error", "warn", "info", "debug", "trace", or a full filter
    pub log_level: Option<String>,
}

fn log_filter(env: Option<String>, configured: Option<String>) -> String {
    env.filter(|f| !f.trim().is_empty())
        .or(configured)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Installs the tracing subscriber once; later calls keep the first filter
fn ensure_logging(config: Option<JsKeychainConfig>) -> &'static str {
    LOGGING.get_or_init(|| {
        let filter = log_filter(
            std::env::var(LOG_ENV).ok(),
            config.and_then(|c| c.log_level),
        );
        let env_filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
        info!(filter = %filter, "keychain native module initialized");
        filter
    })
}

/// Set up logging for the native module. Returns the active filter.
#[napi]
pub fn init_keychain(config: Option<JsKeychainConfig>) -> String {
    ensure_logging(config).to_string()
}

#[napi(object)]
pub struct JsPlatformInfo {
    pub platform: String,
    pub arch: String,
    pub keychain_available: bool,
    pub version: String,
}

/// Get platform information
#[napi]
pub fn get_platform_info() -> JsPlatformInfo {
    JsPlatformInfo {
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        keychain_available: keychain_core::is_supported(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Whether Keychain Services can be reached from this build
#[napi]
pub fn is_keychain_available() -> bool {
    keychain_core::is_supported()
}

// Status codes returned by Keychain Services
#[napi]
pub const ERR_SEC_SUCCESS: i32 = status::ERR_SEC_SUCCESS;
#[napi]
pub const ERR_SEC_UNIMPLEMENTED: i32 = status::ERR_SEC_UNIMPLEMENTED;
#[napi]
pub const ERR_SEC_PARAM: i32 = status::ERR_SEC_PARAM;
#[napi]
pub const ERR_SEC_USER_CANCELED: i32 = status::ERR_SEC_USER_CANCELED;
#[napi]
pub const ERR_SEC_NOT_AVAILABLE: i32 = status::ERR_SEC_NOT_AVAILABLE;
#[napi]
pub const ERR_SEC_READ_ONLY: i32 = status::ERR_SEC_READ_ONLY;
#[napi]
pub const ERR_SEC_AUTH_FAILED: i32 = status::ERR_SEC_AUTH_FAILED;
#[napi]
pub const ERR_SEC_NO_SUCH_KEYCHAIN: i32 = status::ERR_SEC_NO_SUCH_KEYCHAIN;
#[napi]
pub const ERR_SEC_INVALID_KEYCHAIN: i32 = status::ERR_SEC_INVALID_KEYCHAIN;
#[napi]
pub const ERR_SEC_DUPLICATE_KEYCHAIN: i32 = status::ERR_SEC_DUPLICATE_KEYCHAIN;
#[napi]
pub const ERR_SEC_DUPLICATE_ITEM: i32 = status::ERR_SEC_DUPLICATE_ITEM;
#[napi]
pub const ERR_SEC_ITEM_NOT_FOUND: i32 = status::ERR_SEC_ITEM_NOT_FOUND;
#[napi]
pub const ERR_SEC_INTERACTION_NOT_ALLOWED: i32 = status::ERR_SEC_INTERACTION_NOT_ALLOWED;
#[napi]
pub const ERR_SEC_DECODE: i32 = status::ERR_SEC_DECODE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_precedence() {
        assert_eq!(log_filter(None, None), "info");
        assert_eq!(log_filter(None, Some("debug".into())), "debug");
        assert_eq!(
            log_filter(Some("keychain_core=trace".into()), Some("debug".into())),
            "keychain_core=trace"
        );
        assert_eq!(log_filter(Some("  ".into()), Some("warn".into())), "warn");
    }

    #[test]
    fn test_platform_info() {
        let info = get_platform_info();
        assert_eq!(info.keychain_available, cfg!(target_os = "macos"));
        assert_eq!(info.keychain_available, is_keychain_available());
        assert!(!info.platform.is_empty());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_default_keychain_unsupported() {
        let err = JsKeychain::default().err().map(|e| (e.status, e.reason));
        let (code, reason) = err.unwrap_or_else(|| panic!("default keychain should be unavailable"));
        assert_eq!(code, ErrorCode::Keychain);
        assert!(reason.ends_with("(OSStatus -4)"));
    }
}
