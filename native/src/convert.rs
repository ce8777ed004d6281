//! JavaScript values to and from attribute values.
//!
//! Strings, numbers, booleans, `Buffer`s and `Date`s map onto
//! [`AttrValue`]; attribute hashes are plain objects keyed by camelCase (or
//! snake_case) attribute names or raw four-character codes.

use crate::error::{IntoJs, Result};
use chrono::{DateTime, Utc};
use keychain_core::attr::to_camel_case;
use keychain_core::{AttrKey, AttrValue, Attributes, KeychainSettings, KeychainStatus};
use napi::bindgen_prelude::{Buffer, Either, FromNapiValue, ToNapiValue, TypeName};
use napi::{sys, JsUnknown, ValueType};
use napi_derive::napi;
use std::collections::HashMap;

/// A single attribute value crossing the JS boundary.
pub struct HostValue(pub AttrValue);

impl TypeName for HostValue {
    fn type_name() -> &'static str {
        "string | number | boolean | Buffer | Date"
    }

    fn value_type() -> ValueType {
        ValueType::Unknown
    }
}

impl FromNapiValue for HostValue {
    unsafe fn from_napi_value(env: sys::napi_env, napi_val: sys::napi_value) -> napi::Result<Self> {
        let unknown = JsUnknown::from_napi_value(env, napi_val)?;
        let value = match unknown.get_type()? {
            ValueType::String => AttrValue::Text(String::from_napi_value(env, napi_val)?),
            ValueType::Boolean => AttrValue::Boolean(bool::from_napi_value(env, napi_val)?),
            ValueType::Number => {
                let number = f64::from_napi_value(env, napi_val)?;
                if number.fract() != 0.0 || !number.is_finite() {
                    return Err(napi::Error::from_reason(format!(
                        "attribute numbers must be integers, got {}",
                        number
                    )));
                }
                AttrValue::Integer(number as i64)
            }
            ValueType::Object if unknown.is_buffer()? => {
                AttrValue::Data(Buffer::from_napi_value(env, napi_val)?.to_vec())
            }
            ValueType::Object if unknown.is_date()? => {
                AttrValue::Date(DateTime::<Utc>::from_napi_value(env, napi_val)?)
            }
            other => {
                return Err(napi::Error::from_reason(format!(
                    "unsupported attribute value type {:?}",
                    other
                )))
            }
        };
        Ok(HostValue(value))
    }
}

impl ToNapiValue for HostValue {
    unsafe fn to_napi_value(env: sys::napi_env, val: Self) -> napi::Result<sys::napi_value> {
        match val.0 {
            AttrValue::Text(text) => String::to_napi_value(env, text),
            AttrValue::Data(bytes) => Buffer::to_napi_value(env, Buffer::from(bytes)),
            AttrValue::Integer(number) => i64::to_napi_value(env, number),
            AttrValue::Boolean(flag) => bool::to_napi_value(env, flag),
            AttrValue::Date(date) => DateTime::<Utc>::to_napi_value(env, date),
        }
    }
}

pub type HostAttributes = HashMap<String, HostValue>;

pub fn attributes_from_host(host: HostAttributes) -> Result<Attributes> {
    Attributes::from_host_pairs(host.into_iter().map(|(name, value)| (name, value.0))).into_js()
}

/// Host form of every attribute, keyed by camelCase name or raw code.
pub fn attributes_to_host(attributes: &Attributes) -> HostAttributes {
    attributes
        .keys()
        .filter_map(|key| {
            attributes
                .get_host(key)
                .map(|value| (host_key(key), HostValue(value)))
        })
        .collect()
}

fn host_key(key: AttrKey) -> String {
    match key.host_name() {
        Some(name) => to_camel_case(name),
        None => key.code().to_string(),
    }
}

pub fn attr_key(name: &str) -> Result<AttrKey> {
    AttrKey::lookup(name).into_js()
}

/// Passwords may be given as a UTF-8 string or raw bytes.
pub fn password_bytes(password: Either<String, Buffer>) -> Vec<u8> {
    match password {
        Either::A(text) => text.into_bytes(),
        Either::B(bytes) => bytes.to_vec(),
    }
}

#[napi(object)]
pub struct JsKeychainStatus {
    pub unlocked: bool,
    pub readable: bool,
    pub writable: bool,
}

impl From<KeychainStatus> for JsKeychainStatus {
    fn from(status: KeychainStatus) -> Self {
        Self {
            unlocked: status.unlocked,
            readable: status.readable,
            writable: status.writable,
        }
    }
}

/// Auto-lock settings. `lockInterval` is in seconds; omit it to never lock on a timer.
#[napi(object)]
pub struct JsKeychainSettings {
    pub lock_on_sleep: bool,
    pub lock_interval: Option<u32>,
}

impl From<KeychainSettings> for JsKeychainSettings {
    fn from(settings: KeychainSettings) -> Self {
        Self {
            lock_on_sleep: settings.lock_on_sleep,
            lock_interval: settings.lock_interval,
        }
    }
}

impl From<JsKeychainSettings> for KeychainSettings {
    fn from(settings: JsKeychainSettings) -> Self {
        Self {
            lock_on_sleep: settings.lock_on_sleep,
            lock_interval: settings.lock_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_keys_are_camel_case() {
        assert_eq!(host_key(AttrKey::SecurityDomain), "securityDomain");
        assert_eq!(host_key(AttrKey::CreationDate), "createdAt");
        assert_eq!(host_key(AttrKey::Volume), "vlme");
    }

    #[test]
    fn test_attributes_round_trip_names() {
        let mut host = HostAttributes::new();
        host.insert("securityDomain".into(), HostValue(AttrValue::from("corp")));
        host.insert("protocol".into(), HostValue(AttrValue::from("https")));

        let attributes = attributes_from_host(host).unwrap();
        assert_eq!(attributes.security_domain(), Some("corp"));

        let back = attributes_to_host(&attributes);
        assert!(matches!(back.get("protocol"), Some(HostValue(AttrValue::Text(p))) if p == "https"));
        assert!(back.contains_key("securityDomain"));
    }

    #[test]
    fn test_unknown_attribute_name() {
        let mut host = HostAttributes::new();
        host.insert("colour".into(), HostValue(AttrValue::from("blue")));
        let err = attributes_from_host(host).err().unwrap();
        assert!(err.reason.contains("colour"));
    }
}
