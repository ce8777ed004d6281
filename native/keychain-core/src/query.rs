//! Attribute-dictionary queries for `SecItemAdd`, `SecItemCopyMatching` and
//! `SecItemUpdate`.
//!
//! A [`Query`] is an ordered list of entries. It is assembled and validated
//! here without touching the OS, and only turned into a `CFDictionary` at the
//! call site.

use crate::attr::{AttrKey, ItemClass};
use crate::attributes::Attributes;
use crate::error::{KeychainError, Result};
use crate::handle::{ItemRef, KeychainRef};
use crate::value::AttrValue;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKey {
    Class,
    MatchLimit,
    MatchSearchList,
    MatchItemList,
    ReturnAttributes,
    ReturnData,
    ReturnRef,
    ValueData,
    UseKeychain,
    Attr(AttrKey),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchLimit {
    One,
    #[default]
    All,
    Count(u32),
}

#[derive(Clone)]
pub enum QueryValue {
    Class(ItemClass),
    Limit(MatchLimit),
    Flag(bool),
    Value(AttrValue),
    Keychain(KeychainRef),
    Keychains(Vec<KeychainRef>),
    Items(Vec<ItemRef>),
}

impl fmt::Debug for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Class(class) => write!(f, "Class({})", class.code()),
            QueryValue::Limit(limit) => write!(f, "Limit({:?})", limit),
            QueryValue::Flag(flag) => write!(f, "Flag({})", flag),
            QueryValue::Value(AttrValue::Data(bytes)) => write!(f, "Data({} bytes)", bytes.len()),
            QueryValue::Value(value) => write!(f, "{:?}", value),
            QueryValue::Keychain(_) => f.write_str("Keychain"),
            QueryValue::Keychains(list) => write!(f, "Keychains({})", list.len()),
            QueryValue::Items(list) => write!(f, "Items({})", list.len()),
        }
    }
}

/// Where and how many items a find query matches.
#[derive(Clone, Default)]
pub struct SearchOptions {
    pub keychains: Vec<KeychainRef>,
    pub limit: MatchLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Add,
    Find,
    Update,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    entries: Vec<(QueryKey, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any earlier value for it.
    pub fn insert(&mut self, key: QueryKey, value: QueryValue) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: QueryKey) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: QueryKey) -> bool {
        self.get(key).is_some()
    }

    pub fn entries(&self) -> &[(QueryKey, QueryValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn with_attributes(&mut self, class: ItemClass, attributes: &Attributes, purpose: Purpose) -> Result<()> {
        for (key, value) in attributes.iter() {
            if purpose != Purpose::Find && key.is_read_only() {
                return Err(KeychainError::invalid_argument(format!(
                    "attribute '{}' is read-only",
                    key
                )));
            }
            if !class.accepts(key) {
                return Err(KeychainError::invalid_argument(format!(
                    "attribute '{}' is not valid for {} passwords",
                    key, class
                )));
            }
            self.insert(QueryKey::Attr(key), QueryValue::Value(value.clone()));
        }
        Ok(())
    }

    /// Attributes for `SecItemAdd`, returning a reference to the new item.
    pub fn add(
        class: ItemClass,
        attributes: &Attributes,
        password: &[u8],
        keychain: Option<&KeychainRef>,
    ) -> Result<Self> {
        let mut query = Self::new();
        query.insert(QueryKey::Class, QueryValue::Class(class));
        query.with_attributes(class, attributes, Purpose::Add)?;
        query.insert(
            QueryKey::ValueData,
            QueryValue::Value(AttrValue::Data(password.to_vec())),
        );
        if let Some(keychain) = keychain {
            query.insert(QueryKey::UseKeychain, QueryValue::Keychain(keychain.clone()));
        }
        query.insert(QueryKey::ReturnRef, QueryValue::Flag(true));
        Ok(query)
    }

    /// `SecItemCopyMatching` query returning attributes plus item references.
    pub fn find(class: ItemClass, conditions: &Attributes, options: &SearchOptions) -> Result<Self> {
        let mut query = Self::new();
        query.insert(QueryKey::Class, QueryValue::Class(class));
        query.with_attributes(class, conditions, Purpose::Find)?;
        if !options.keychains.is_empty() {
            query.insert(
                QueryKey::MatchSearchList,
                QueryValue::Keychains(options.keychains.clone()),
            );
        }
        query.insert(QueryKey::MatchLimit, QueryValue::Limit(options.limit));
        query.insert(QueryKey::ReturnAttributes, QueryValue::Flag(true));
        query.insert(QueryKey::ReturnRef, QueryValue::Flag(true));
        Ok(query)
    }

    /// Matches exactly `item`.
    pub fn for_item(class: ItemClass, item: &ItemRef) -> Self {
        let mut query = Self::new();
        query.insert(QueryKey::Class, QueryValue::Class(class));
        query.insert(QueryKey::MatchItemList, QueryValue::Items(vec![item.clone()]));
        query
    }

    pub fn attributes_of(class: ItemClass, item: &ItemRef) -> Self {
        let mut query = Self::for_item(class, item);
        query.insert(QueryKey::ReturnAttributes, QueryValue::Flag(true));
        query.insert(QueryKey::ReturnRef, QueryValue::Flag(true));
        query.insert(QueryKey::MatchLimit, QueryValue::Limit(MatchLimit::One));
        query
    }

    pub fn password_of(class: ItemClass, item: &ItemRef) -> Self {
        let mut query = Self::for_item(class, item);
        query.insert(QueryKey::ReturnData, QueryValue::Flag(true));
        query.insert(QueryKey::MatchLimit, QueryValue::Limit(MatchLimit::One));
        query
    }

    /// Change dictionary for `SecItemUpdate`.
    pub fn update_changes(class: ItemClass, changes: &Attributes, password: Option<&[u8]>) -> Result<Self> {
        let mut query = Self::new();
        query.with_attributes(class, changes, Purpose::Update)?;
        if let Some(password) = password {
            query.insert(
                QueryKey::ValueData,
                QueryValue::Value(AttrValue::Data(password.to_vec())),
            );
        }
        if query.is_empty() {
            return Err(KeychainError::invalid_argument("nothing to update"));
        }
        Ok(query)
    }
}

#[cfg(target_os = "macos")]
mod cf {
    use super::*;
    use crate::sys;
    use crate::value::to_cf;
    use core_foundation::array::CFArray;
    use core_foundation::base::{CFType, TCFType};
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::CFDictionary;
    use core_foundation::number::CFNumber;
    use core_foundation::string::{CFString, CFStringRef};

    /// Wraps a framework-owned `kSec*` constant without taking ownership.
    unsafe fn constant(raw: CFStringRef) -> CFString {
        CFString::wrap_under_get_rule(raw)
    }

    impl QueryKey {
        fn to_cf(self) -> CFString {
            unsafe {
                match self {
                    QueryKey::Class => constant(sys::kSecClass),
                    QueryKey::MatchLimit => constant(sys::kSecMatchLimit),
                    QueryKey::MatchSearchList => constant(sys::kSecMatchSearchList),
                    QueryKey::MatchItemList => constant(sys::kSecMatchItemList),
                    QueryKey::ReturnAttributes => constant(sys::kSecReturnAttributes),
                    QueryKey::ReturnData => constant(sys::kSecReturnData),
                    QueryKey::ReturnRef => constant(sys::kSecReturnRef),
                    QueryKey::ValueData => constant(sys::kSecValueData),
                    QueryKey::UseKeychain => constant(sys::kSecUseKeychain),
                    QueryKey::Attr(key) => CFString::from_static_string(key.code()),
                }
            }
        }
    }

    impl QueryValue {
        fn to_cf(&self) -> CFType {
            match self {
                QueryValue::Class(class) => {
                    let code = unsafe {
                        match class {
                            ItemClass::GenericPassword => constant(sys::kSecClassGenericPassword),
                            ItemClass::InternetPassword => constant(sys::kSecClassInternetPassword),
                        }
                    };
                    code.as_CFType()
                }
                QueryValue::Limit(limit) => match limit {
                    MatchLimit::One => unsafe { constant(sys::kSecMatchLimitOne).as_CFType() },
                    MatchLimit::All => unsafe { constant(sys::kSecMatchLimitAll).as_CFType() },
                    MatchLimit::Count(n) => CFNumber::from(*n as i64).as_CFType(),
                },
                QueryValue::Flag(true) => CFBoolean::true_value().as_CFType(),
                QueryValue::Flag(false) => CFBoolean::false_value().as_CFType(),
                QueryValue::Value(value) => to_cf(value),
                QueryValue::Keychain(keychain) => keychain.as_CFType(),
                QueryValue::Keychains(list) => CFArray::from_CFTypes(list).as_CFType(),
                QueryValue::Items(list) => CFArray::from_CFTypes(list).as_CFType(),
            }
        }
    }

    impl Query {
        pub fn to_cf_dictionary(&self) -> CFDictionary<CFString, CFType> {
            let pairs: Vec<(CFString, CFType)> = self
                .entries
                .iter()
                .map(|(key, value)| (key.to_cf(), value.to_cf()))
                .collect();
            CFDictionary::from_CFType_pairs(&pairs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic_attributes() -> Attributes {
        Attributes::from_host_pairs(vec![
            ("service", AttrValue::from("some-service")),
            ("account", AttrValue::from("some-account")),
        ])
        .unwrap()
    }

    #[test]
    fn test_add_query() {
        let query = Query::add(ItemClass::GenericPassword, &generic_attributes(), b"secret", None).unwrap();

        assert!(matches!(
            query.get(QueryKey::Class),
            Some(QueryValue::Class(ItemClass::GenericPassword))
        ));
        assert!(matches!(
            query.get(QueryKey::ValueData),
            Some(QueryValue::Value(AttrValue::Data(d))) if d == b"secret"
        ));
        assert!(matches!(
            query.get(QueryKey::Attr(AttrKey::Service)),
            Some(QueryValue::Value(AttrValue::Text(s))) if s == "some-service"
        ));
        assert!(matches!(query.get(QueryKey::ReturnRef), Some(QueryValue::Flag(true))));
        assert!(!query.contains(QueryKey::UseKeychain));
    }

    #[test]
    fn test_add_rejects_read_only() {
        let mut attributes = generic_attributes();
        attributes
            .set(AttrKey::CreationDate, AttrValue::Date(chrono::Utc::now()))
            .unwrap();
        let err = Query::add(ItemClass::GenericPassword, &attributes, b"x", None).unwrap_err();
        assert!(err.message().contains("read-only"));
    }

    #[test]
    fn test_add_rejects_foreign_attributes() {
        let attributes = Attributes::from_host_pairs(vec![("host", AttrValue::from("example.com"))]).unwrap();
        assert!(Query::add(ItemClass::GenericPassword, &attributes, b"x", None).is_err());
        assert!(Query::add(ItemClass::InternetPassword, &attributes, b"x", None).is_ok());
    }

    #[test]
    fn test_find_query() {
        let options = SearchOptions {
            keychains: Vec::new(),
            limit: MatchLimit::One,
        };
        let query = Query::find(ItemClass::GenericPassword, &generic_attributes(), &options).unwrap();

        assert!(matches!(
            query.get(QueryKey::MatchLimit),
            Some(QueryValue::Limit(MatchLimit::One))
        ));
        assert!(matches!(query.get(QueryKey::ReturnAttributes), Some(QueryValue::Flag(true))));
        assert!(!query.contains(QueryKey::MatchSearchList));
        assert!(!query.contains(QueryKey::ValueData));
    }

    #[test]
    fn test_find_defaults_to_all_matches() {
        assert_eq!(MatchLimit::default(), MatchLimit::All);
        let query = Query::find(ItemClass::GenericPassword, &generic_attributes(), &SearchOptions::default()).unwrap();
        assert!(matches!(
            query.get(QueryKey::MatchLimit),
            Some(QueryValue::Limit(MatchLimit::All))
        ));
    }

    #[test]
    fn test_find_allows_dates() {
        let mut conditions = Attributes::new();
        conditions
            .set(AttrKey::ModDate, AttrValue::Date(chrono::Utc::now()))
            .unwrap();
        assert!(Query::find(ItemClass::InternetPassword, &conditions, &SearchOptions::default()).is_ok());
    }

    #[test]
    fn test_update_changes() {
        let changes = Attributes::from_host_pairs(vec![("comment", AttrValue::from("rotated"))]).unwrap();
        let query = Query::update_changes(ItemClass::GenericPassword, &changes, Some(b"new")).unwrap();

        assert!(!query.contains(QueryKey::Class));
        assert!(query.contains(QueryKey::ValueData));
        assert_eq!(query.len(), 2);

        let empty = Query::update_changes(ItemClass::GenericPassword, &Attributes::new(), None);
        assert!(empty.is_err());
    }

    #[test]
    fn test_insert_replaces() {
        let mut query = Query::new();
        query.insert(QueryKey::MatchLimit, QueryValue::Limit(MatchLimit::One));
        query.insert(QueryKey::MatchLimit, QueryValue::Limit(MatchLimit::Count(5)));
        assert_eq!(query.len(), 1);
        assert!(matches!(
            query.get(QueryKey::MatchLimit),
            Some(QueryValue::Limit(MatchLimit::Count(5)))
        ));
    }
}
