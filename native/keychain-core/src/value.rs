//! Attribute values and their CoreFoundation counterparts.

use crate::attr::{self, AttrKey, Shape};
use crate::error::{KeychainError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[cfg(target_os = "macos")]
use core_foundation::{
    base::{CFType, TCFType},
    boolean::CFBoolean,
    data::CFData,
    date::CFDate,
    number::CFNumber,
    string::CFString,
};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
pub const CF_ABSOLUTE_TIME_OFFSET: i64 = 978_307_200;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Data(Vec<u8>),
    Integer(i64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AttrValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Data(d) => Some(d),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Text(_) => "string",
            AttrValue::Data(_) => "data",
            AttrValue::Integer(_) => "integer",
            AttrValue::Boolean(_) => "boolean",
            AttrValue::Date(_) => "date",
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(value: Vec<u8>) -> Self {
        AttrValue::Data(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttrValue::Date(value)
    }
}

/// Normalises a host value into the shape stored under `key`.
///
/// Protocols and authentication types are stored as their four-character
/// codes, creator and type codes as packed integers.
pub fn coerce(key: AttrKey, value: AttrValue) -> Result<AttrValue> {
    let mismatch = |value: &AttrValue| {
        KeychainError::invalid_argument(format!(
            "attribute '{}' does not accept a {} value",
            key,
            value.type_name()
        ))
    };

    match (key.shape(), value) {
        (Shape::Text, AttrValue::Text(s)) => match key {
            AttrKey::Protocol => Ok(AttrValue::Text(attr::protocol_code(&s)?)),
            AttrKey::AuthenticationType => {
                Ok(AttrValue::Text(attr::authentication_type_code(&s)?))
            }
            _ => Ok(AttrValue::Text(s)),
        },
        (Shape::Text, AttrValue::Data(bytes)) => String::from_utf8(bytes)
            .map(AttrValue::Text)
            .map_err(|_| {
                KeychainError::invalid_argument(format!("attribute '{}' is not valid UTF-8", key))
            }),
        (Shape::Data, AttrValue::Data(bytes)) => Ok(AttrValue::Data(bytes)),
        (Shape::Data, AttrValue::Text(s)) => Ok(AttrValue::Data(s.into_bytes())),
        (Shape::Integer, AttrValue::Integer(n)) => Ok(AttrValue::Integer(n)),
        (Shape::Integer, AttrValue::Text(s)) => s.trim().parse::<i64>().map(AttrValue::Integer).map_err(|_| {
            KeychainError::invalid_argument(format!("attribute '{}' must be an integer, got '{}'", key, s))
        }),
        (Shape::Boolean, AttrValue::Boolean(b)) => Ok(AttrValue::Boolean(b)),
        (Shape::Boolean, AttrValue::Integer(n)) => Ok(AttrValue::Boolean(n != 0)),
        (Shape::Date, AttrValue::Date(d)) => Ok(AttrValue::Date(d)),
        (Shape::Date, AttrValue::Text(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|d| AttrValue::Date(d.with_timezone(&Utc)))
            .map_err(|_| {
                KeychainError::invalid_argument(format!("attribute '{}' must be a date, got '{}'", key, s))
            }),
        (Shape::FourCc, AttrValue::Integer(n)) => u32::try_from(n).map(|_| AttrValue::Integer(n)).map_err(|_| {
            KeychainError::invalid_argument(format!(
                "attribute '{}' must be a four-character code, got {}",
                key, n
            ))
        }),
        (Shape::FourCc, AttrValue::Text(s)) => Ok(AttrValue::Integer(attr::four_cc_to_u32(&s)? as i64)),
        (_, other) => Err(mismatch(&other)),
    }
}

/// Inverse of [`coerce`] for values handed back to the host.
pub fn to_host(key: AttrKey, value: &AttrValue) -> AttrValue {
    match (key, value) {
        (AttrKey::Protocol, AttrValue::Text(code)) => AttrValue::Text(attr::protocol_name(code)),
        (AttrKey::AuthenticationType, AttrValue::Text(code)) => {
            AttrValue::Text(attr::authentication_type_name(code))
        }
        (AttrKey::Creator | AttrKey::Type, AttrValue::Integer(n)) => match u32::try_from(*n) {
            Ok(code) => AttrValue::Text(attr::u32_to_four_cc(code)),
            Err(_) => value.clone(),
        },
        _ => value.clone(),
    }
}

/// Converts a timestamp to `CFAbsoluteTime`.
pub fn to_absolute_time(date: &DateTime<Utc>) -> f64 {
    (date.timestamp() - CF_ABSOLUTE_TIME_OFFSET) as f64
        + f64::from(date.timestamp_subsec_nanos()) / 1e9
}

pub fn from_absolute_time(time: f64) -> Option<DateTime<Utc>> {
    if !time.is_finite() {
        return None;
    }
    // CFAbsoluteTime is a double; anything finer than a microsecond is noise.
    let mut secs = time.floor() as i64;
    let mut micros = ((time - time.floor()) * 1e6).round() as u32;
    if micros >= 1_000_000 {
        secs += 1;
        micros = 0;
    }
    DateTime::from_timestamp(secs + CF_ABSOLUTE_TIME_OFFSET, micros * 1_000)
}

#[cfg(target_os = "macos")]
pub fn to_cf(value: &AttrValue) -> CFType {
    match value {
        AttrValue::Text(s) => CFString::new(s).as_CFType(),
        AttrValue::Data(bytes) => CFData::from_buffer(bytes).as_CFType(),
        AttrValue::Integer(n) => match i32::try_from(*n) {
            Ok(small) => CFNumber::from(small).as_CFType(),
            Err(_) => CFNumber::from(*n).as_CFType(),
        },
        AttrValue::Boolean(true) => CFBoolean::true_value().as_CFType(),
        AttrValue::Boolean(false) => CFBoolean::false_value().as_CFType(),
        AttrValue::Date(d) => CFDate::new(to_absolute_time(d)).as_CFType(),
    }
}

/// Reads a CF value returned for `key`, or `None` for unsupported CF types.
#[cfg(target_os = "macos")]
pub fn from_cf(key: AttrKey, value: &CFType) -> Option<AttrValue> {
    let raw = if let Some(s) = value.downcast::<CFString>() {
        AttrValue::Text(s.to_string())
    } else if let Some(data) = value.downcast::<CFData>() {
        let bytes = data.bytes().to_vec();
        match key.shape() {
            Shape::Text => match String::from_utf8(bytes) {
                Ok(text) => AttrValue::Text(text),
                Err(e) => AttrValue::Data(e.into_bytes()),
            },
            _ => AttrValue::Data(bytes),
        }
    } else if let Some(b) = value.downcast::<CFBoolean>() {
        AttrValue::Boolean(bool::from(b))
    } else if let Some(n) = value.downcast::<CFNumber>() {
        AttrValue::Integer(n.to_i64().or_else(|| n.to_f64().map(|f| f as i64))?)
    } else if let Some(d) = value.downcast::<CFDate>() {
        AttrValue::Date(from_absolute_time(d.abs_time())?)
    } else {
        return None;
    };

    match coerce(key, raw.clone()) {
        Ok(v) => Some(v),
        Err(_) => Some(raw),
    }
}
