// Keychain Services bindings core
//
// Handles for keychains and password items, the mapping between host values
// and CoreFoundation attribute values, and construction of the attribute
// dictionaries passed to SecItemAdd, SecItemCopyMatching and SecItemUpdate.
//
// Everything that touches the OS is macOS-only. On other platforms the same
// API compiles and every native operation fails with an "unimplemented"
// keychain error.

pub mod attr;
pub mod attributes;
pub mod error;
pub mod handle;
pub mod item;
pub mod keychain;
pub mod query;
pub mod scope;
pub mod status;
pub mod value;

#[cfg(target_os = "macos")]
mod secitem;
#[cfg(target_os = "macos")]
mod sys;

pub use attr::{AttrKey, ItemClass, Shape};
pub use attributes::Attributes;
pub use error::{KeychainError, Result};
pub use item::Item;
pub use keychain::{Keychain, KeychainSettings, KeychainStatus};
pub use query::{MatchLimit, Query, QueryKey, QueryValue, SearchOptions};
pub use scope::Scope;
pub use status::{ErrorKind, OsStatus};
pub use value::AttrValue;

/// Whether this build can reach Keychain Services.
pub fn is_supported() -> bool {
    cfg!(target_os = "macos")
}
