//! Search scopes: a class of item, a set of keychains and match conditions.

use crate::attr::{AttrKey, ItemClass};
use crate::attributes::Attributes;
use crate::error::Result;
use crate::item::Item;
use crate::keychain::Keychain;
use crate::query::{MatchLimit, Query, SearchOptions};
use crate::value::AttrValue;

#[derive(Debug, Clone)]
pub struct Scope {
    class: ItemClass,
    keychains: Vec<Keychain>,
    conditions: Attributes,
    limit: Option<u32>,
}

impl Scope {
    /// Searches every keychain in the user's search list.
    pub fn new(class: ItemClass) -> Self {
        Self {
            class,
            keychains: Vec::new(),
            conditions: Attributes::new(),
            limit: None,
        }
    }

    pub fn class(&self) -> ItemClass {
        self.class
    }

    pub fn in_keychains(mut self, keychains: Vec<Keychain>) -> Self {
        self.keychains = keychains;
        self
    }

    /// Adds the match conditions in `conditions`, replacing earlier ones for the same keys.
    pub fn conditions(mut self, conditions: Attributes) -> Self {
        self.conditions.merge(&conditions);
        self
    }

    pub fn where_attr(mut self, key: AttrKey, value: impl Into<AttrValue>) -> Result<Self> {
        self.conditions.set(key, value)?;
        Ok(self)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn current_conditions(&self) -> &Attributes {
        &self.conditions
    }

    fn query(&self, limit: MatchLimit) -> Result<Query> {
        let options = SearchOptions {
            keychains: self.keychains.iter().map(|k| k.as_ref().clone()).collect(),
            limit,
        };
        Query::find(self.class, &self.conditions, &options)
    }

    fn match_limit(&self) -> MatchLimit {
        match self.limit {
            Some(1) => MatchLimit::One,
            Some(n) => MatchLimit::Count(n),
            None => MatchLimit::All,
        }
    }

    /// Every matching item; an empty list when nothing matches.
    pub fn all(&self) -> Result<Vec<Item>> {
        let query = self.query(self.match_limit())?;
        match platform::find(&query) {
            Ok(found) => Ok(found
                .into_iter()
                .map(|(inner, attributes)| Item::from_parts(inner, self.class, attributes))
                .collect()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub fn first(&self) -> Result<Option<Item>> {
        let query = self.query(MatchLimit::One)?;
        match platform::find(&query) {
            Ok(found) => Ok(found
                .into_iter()
                .next()
                .map(|(inner, attributes)| Item::from_parts(inner, self.class, attributes))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Adds an item built from the scope's conditions plus `attributes`, in
    /// the scope's first keychain or the default keychain.
    pub fn create(&self, attributes: &Attributes, password: &[u8]) -> Result<Item> {
        let mut merged = self.conditions.clone();
        merged.merge(attributes);
        let keychain = self.keychains.first().map(Keychain::as_ref);
        let query = Query::add(self.class, &merged, password, keychain)?;
        platform::add(&query, self.class)
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use crate::attr::ItemClass;
    use crate::attributes::Attributes;
    use crate::error::Result;
    use crate::handle::ItemRef;
    use crate::item::Item;
    use crate::query::Query;
    use crate::secitem;

    pub(super) fn find(query: &Query) -> Result<Vec<(ItemRef, Attributes)>> {
        secitem::find(query)
    }

    pub(super) fn add(query: &Query, class: ItemClass) -> Result<Item> {
        let inner = secitem::add(query)?;
        Item::load(inner, class)
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use crate::attr::ItemClass;
    use crate::attributes::Attributes;
    use crate::error::{KeychainError, Result};
    use crate::handle::ItemRef;
    use crate::item::Item;
    use crate::query::Query;

    pub(super) fn find(_query: &Query) -> Result<Vec<(ItemRef, Attributes)>> {
        Err(KeychainError::unsupported())
    }

    pub(super) fn add(_query: &Query, _class: ItemClass) -> Result<Item> {
        Err(KeychainError::unsupported())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryKey, QueryValue};

    #[test]
    fn test_builder() {
        let scope = Scope::new(ItemClass::InternetPassword)
            .where_attr(AttrKey::Server, "example.com")
            .unwrap()
            .where_attr(AttrKey::Protocol, "https")
            .unwrap()
            .limit(10);

        assert_eq!(scope.class(), ItemClass::InternetPassword);
        assert_eq!(scope.current_conditions().host(), Some("example.com"));
        assert_eq!(scope.match_limit(), MatchLimit::Count(10));

        let query = scope.query(scope.match_limit()).unwrap();
        assert!(matches!(
            query.get(QueryKey::Attr(AttrKey::Protocol)),
            Some(QueryValue::Value(AttrValue::Text(code))) if code == "htps"
        ));
        assert!(!query.contains(QueryKey::MatchSearchList));
    }

    #[test]
    fn test_limit_one() {
        let scope = Scope::new(ItemClass::GenericPassword).limit(1);
        assert_eq!(scope.match_limit(), MatchLimit::One);
        assert_eq!(Scope::new(ItemClass::GenericPassword).match_limit(), MatchLimit::All);
    }

    #[test]
    fn test_conditions_merge() {
        let first = Attributes::from_host_pairs(vec![("service", AttrValue::from("a"))]).unwrap();
        let second = Attributes::from_host_pairs(vec![
            ("service", AttrValue::from("b")),
            ("account", AttrValue::from("me")),
        ])
        .unwrap();
        let scope = Scope::new(ItemClass::GenericPassword)
            .conditions(first)
            .conditions(second);
        assert_eq!(scope.current_conditions().service(), Some("b"));
        assert_eq!(scope.current_conditions().account(), Some("me"));
    }

    #[test]
    fn test_invalid_condition_surfaces_on_search() {
        let scope = Scope::new(ItemClass::GenericPassword)
            .where_attr(AttrKey::Server, "example.com")
            .unwrap();
        let err = scope.all().unwrap_err();
        assert!(err.message().contains("not valid for generic passwords"));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_unsupported_platform() {
        assert!(Scope::new(ItemClass::GenericPassword).all().is_err());
        assert!(Scope::new(ItemClass::GenericPassword).first().is_err());
    }
}
