// SecItem calls: run a built `Query` and decode what comes back.

use crate::attr::AttrKey;
use crate::attributes::Attributes;
use crate::error::{check, KeychainError, Result};
use crate::handle::ItemRef;
use crate::query::Query;
use crate::status::ERR_SEC_ITEM_NOT_FOUND;
use crate::sys;
use crate::value::from_cf;
use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::data::CFData;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::{CFString, CFStringRef};
use std::ptr;
use tracing::debug;

pub(crate) fn add(query: &Query) -> Result<ItemRef> {
    debug!(?query, "SecItemAdd");
    let dict = query.to_cf_dictionary();
    let mut result: CFTypeRef = ptr::null();
    check(unsafe { sys::SecItemAdd(dict.as_concrete_TypeRef(), &mut result) })?;

    if result.is_null() {
        return Err(KeychainError::invalid_argument(
            "SecItemAdd did not return an item reference",
        ));
    }
    let value = unsafe { CFType::wrap_under_create_rule(result) };
    value
        .downcast_into::<ItemRef>()
        .ok_or_else(|| KeychainError::invalid_argument("SecItemAdd returned an unexpected type"))
}

fn copy_matching(query: &Query) -> Result<CFType> {
    debug!(?query, "SecItemCopyMatching");
    let dict = query.to_cf_dictionary();
    let mut result: CFTypeRef = ptr::null();
    check(unsafe { sys::SecItemCopyMatching(dict.as_concrete_TypeRef(), &mut result) })?;

    if result.is_null() {
        return Err(KeychainError::from_status(ERR_SEC_ITEM_NOT_FOUND));
    }
    Ok(unsafe { CFType::wrap_under_create_rule(result) })
}

/// Runs a find query that returns attributes and references.
pub(crate) fn find(query: &Query) -> Result<Vec<(ItemRef, Attributes)>> {
    let value = copy_matching(query)?;

    if value.instance_of::<CFArray<CFType>>() {
        let array: CFArray<CFType> =
            unsafe { CFArray::wrap_under_get_rule(value.as_CFTypeRef() as CFArrayRef) };
        array.iter().map(|entry| record(&entry)).collect()
    } else {
        Ok(vec![record(&value)?])
    }
}

/// Reads back the password of a single item.
pub(crate) fn find_data(query: &Query) -> Result<Vec<u8>> {
    let value = copy_matching(query)?;
    value
        .downcast::<CFData>()
        .map(|data| data.bytes().to_vec())
        .ok_or_else(|| KeychainError::invalid_argument("keychain returned no password data"))
}

pub(crate) fn update(query: &Query, changes: &Query) -> Result<()> {
    debug!(?query, ?changes, "SecItemUpdate");
    let query = query.to_cf_dictionary();
    let changes = changes.to_cf_dictionary();
    check(unsafe { sys::SecItemUpdate(query.as_concrete_TypeRef(), changes.as_concrete_TypeRef()) })
}

fn record(value: &CFType) -> Result<(ItemRef, Attributes)> {
    if !value.instance_of::<CFDictionary>() {
        return Err(KeychainError::invalid_argument(
            "keychain search returned an unexpected type",
        ));
    }
    let dict: CFDictionary =
        unsafe { CFDictionary::wrap_under_get_rule(value.as_CFTypeRef() as CFDictionaryRef) };
    let value_ref = unsafe { CFString::wrap_under_get_rule(sys::kSecValueRef) };

    let mut item = None;
    let mut attributes = Attributes::new();
    let (keys, values) = dict.get_keys_and_values();
    for (key, value) in keys.into_iter().zip(values) {
        let key = unsafe { CFString::wrap_under_get_rule(key as CFStringRef) };
        let value = unsafe { CFType::wrap_under_get_rule(value as CFTypeRef) };

        if key == value_ref {
            item = value.downcast_into::<ItemRef>();
        } else if let Some(attr) = AttrKey::from_code(&key.to_string()) {
            if let Some(decoded) = from_cf(attr, &value) {
                attributes.insert_raw(attr, decoded);
            }
        }
    }

    let item = item.ok_or_else(|| {
        KeychainError::invalid_argument("keychain search result is missing the item reference")
    })?;
    Ok((item, attributes))
}
