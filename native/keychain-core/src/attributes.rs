use crate::attr::AttrKey;
use crate::error::Result;
use crate::value::{self, AttrValue};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Attribute record of a keychain item, keyed by attribute code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<AttrKey, AttrValue>,
}

macro_rules! text_getters {
    ($( $name:ident => $key:ident ),* $(,)?) => {
        $(
            pub fn $name(&self) -> Option<&str> {
                self.get(AttrKey::$key).and_then(AttrValue::as_text)
            }
        )*
    };
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from host `(name, value)` pairs.
    ///
    /// Names may be host names in snake or camel case, or raw attribute codes.
    pub fn from_host_pairs<I, N>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, AttrValue)>,
        N: AsRef<str>,
    {
        let mut attributes = Self::new();
        for (name, value) in pairs {
            let key = AttrKey::lookup(name.as_ref())?;
            attributes.set(key, value)?;
        }
        Ok(attributes)
    }

    /// Coerces and stores `value` under `key`.
    pub fn set(&mut self, key: AttrKey, value: impl Into<AttrValue>) -> Result<()> {
        let value = value::coerce(key, value.into())?;
        self.values.insert(key, value);
        Ok(())
    }

    /// Stores an already-normalised value, as read back from the keychain.
    #[cfg(target_os = "macos")]
    pub(crate) fn insert_raw(&mut self, key: AttrKey, value: AttrValue) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: AttrKey) -> Option<&AttrValue> {
        self.values.get(&key)
    }

    /// Value of `key` in host form (protocol names, four-character codes as text).
    pub fn get_host(&self, key: AttrKey) -> Option<AttrValue> {
        self.get(key).map(|v| value::to_host(key, v))
    }

    pub fn remove(&mut self, key: AttrKey) -> Option<AttrValue> {
        self.values.remove(&key)
    }

    pub fn contains(&self, key: AttrKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Overwrites entries with those of `other`.
    pub fn merge(&mut self, other: &Attributes) {
        for (key, value) in &other.values {
            self.values.insert(*key, value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, &AttrValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = AttrKey> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    text_getters! {
        account => Account,
        service => Service,
        label => Label,
        description => Description,
        comment => Comment,
        host => Server,
        path => Path,
        security_domain => SecurityDomain,
    }

    pub fn port(&self) -> Option<i64> {
        self.get(AttrKey::Port).and_then(AttrValue::as_integer)
    }

    pub fn protocol(&self) -> Option<String> {
        self.get_host(AttrKey::Protocol)
            .and_then(|v| v.as_text().map(str::to_string))
    }

    pub fn negative(&self) -> Option<bool> {
        self.get(AttrKey::Negative).and_then(AttrValue::as_bool)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get(AttrKey::CreationDate).and_then(AttrValue::as_date)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.get(AttrKey::ModDate).and_then(AttrValue::as_date)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(&key.to_string(), &value::to_host(*key, value))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_host_pairs() {
        let attributes = Attributes::from_host_pairs(vec![
            ("service", AttrValue::from("some-service")),
            ("account", AttrValue::from("some-account")),
            ("port", AttrValue::from("443")),
        ])
        .unwrap();

        assert_eq!(attributes.service(), Some("some-service"));
        assert_eq!(attributes.account(), Some("some-account"));
        assert_eq!(attributes.port(), Some(443));
        assert_eq!(attributes.len(), 3);
    }

    #[test]
    fn test_unknown_name_rejected() {
        let result = Attributes::from_host_pairs(vec![("favourite", AttrValue::from("x"))]);
        assert!(result.is_err());
    }

    #[test]
    fn test_creator_code_must_fit_four_bytes() {
        let mut attributes = Attributes::new();
        assert!(attributes.set(AttrKey::Creator, AttrValue::Integer(-1)).is_err());
        assert!(attributes.get_host(AttrKey::Creator).is_none());
        attributes.set(AttrKey::Creator, "aapl").unwrap();
        assert_eq!(attributes.get_host(AttrKey::Creator), Some(AttrValue::Text("aapl".into())));
    }

    #[test]
    fn test_protocol_round_trip() {
        let mut attributes = Attributes::new();
        attributes.set(AttrKey::Protocol, "https").unwrap();
        assert_eq!(attributes.get(AttrKey::Protocol), Some(&AttrValue::Text("htps".into())));
        assert_eq!(attributes.protocol().as_deref(), Some("https"));
    }

    #[test]
    fn test_merge_overwrites() {
        let mut base = Attributes::from_host_pairs(vec![
            ("label", AttrValue::from("old")),
            ("comment", AttrValue::from("kept")),
        ])
        .unwrap();
        let update = Attributes::from_host_pairs(vec![("label", AttrValue::from("new"))]).unwrap();

        base.merge(&update);
        assert_eq!(base.label(), Some("new"));
        assert_eq!(base.comment(), Some("kept"));
    }

    #[test]
    fn test_json_uses_host_names() {
        let attributes = Attributes::from_host_pairs(vec![
            ("host", AttrValue::from("example.com")),
            ("protocol", AttrValue::from("ssh")),
        ])
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&attributes.to_json()).unwrap();
        assert_eq!(json["host"], "example.com");
        assert_eq!(json["protocol"], "ssh");
    }
}
