// Raw Security framework entry points and query keys.
//
// `security-framework` wraps the handle types; the calls below are the ones
// it does not expose (path, lock, status, settings readback, the SecItem
// query API with keychain search lists).

#![allow(non_upper_case_globals, non_snake_case)]

use core_foundation::base::{Boolean, CFTypeRef, OSStatus};
use core_foundation::dictionary::CFDictionaryRef;
use core_foundation::string::CFStringRef;
use security_framework_sys::base::{SecKeychainItemRef, SecKeychainRef};
use std::os::raw::c_char;

pub const SEC_KEYCHAIN_SETTINGS_VERS1: u32 = 1;

/// Maximum path length accepted by `SecKeychainGetPath`.
pub const PATH_MAX: usize = 1024;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SecKeychainSettings {
    pub version: u32,
    pub lockOnSleep: Boolean,
    pub useLockInterval: Boolean,
    pub lockInterval: u32,
}

#[link(name = "Security", kind = "framework")]
extern "C" {
    pub static kSecClass: CFStringRef;
    pub static kSecClassGenericPassword: CFStringRef;
    pub static kSecClassInternetPassword: CFStringRef;

    pub static kSecMatchLimit: CFStringRef;
    pub static kSecMatchLimitOne: CFStringRef;
    pub static kSecMatchLimitAll: CFStringRef;
    pub static kSecMatchSearchList: CFStringRef;
    pub static kSecMatchItemList: CFStringRef;

    pub static kSecReturnAttributes: CFStringRef;
    pub static kSecReturnData: CFStringRef;
    pub static kSecReturnRef: CFStringRef;

    pub static kSecValueData: CFStringRef;
    pub static kSecValueRef: CFStringRef;
    pub static kSecUseKeychain: CFStringRef;

    pub fn SecItemAdd(attributes: CFDictionaryRef, result: *mut CFTypeRef) -> OSStatus;
    pub fn SecItemCopyMatching(query: CFDictionaryRef, result: *mut CFTypeRef) -> OSStatus;
    pub fn SecItemUpdate(query: CFDictionaryRef, attributesToUpdate: CFDictionaryRef) -> OSStatus;

    pub fn SecKeychainGetPath(
        keychain: SecKeychainRef,
        ioPathLength: *mut u32,
        pathName: *mut c_char,
    ) -> OSStatus;
    pub fn SecKeychainDelete(keychainOrArray: SecKeychainRef) -> OSStatus;
    pub fn SecKeychainLock(keychain: SecKeychainRef) -> OSStatus;
    pub fn SecKeychainGetStatus(keychain: SecKeychainRef, keychainStatus: *mut u32) -> OSStatus;
    pub fn SecKeychainCopySettings(
        keychain: SecKeychainRef,
        outSettings: *mut SecKeychainSettings,
    ) -> OSStatus;
    pub fn SecKeychainGetUserInteractionAllowed(state: *mut Boolean) -> OSStatus;
    pub fn SecKeychainSetUserInteractionAllowed(state: Boolean) -> OSStatus;

    pub fn SecKeychainItemCopyKeychain(
        itemRef: SecKeychainItemRef,
        keychainRef: *mut SecKeychainRef,
    ) -> OSStatus;
    pub fn SecKeychainItemDelete(itemRef: SecKeychainItemRef) -> OSStatus;
}
