#![cfg(target_os = "macos")]

use keychain_core::*;
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

const PASSWORD: &str = "correct horse battery staple";

fn setup_test_environment() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("keychain_core=debug")
            .with_test_writer()
            .try_init();
        Keychain::set_user_interaction_allowed(false).unwrap();
    });
}

/// A throwaway keychain in a temporary directory, deleted on drop.
struct TestKeychain {
    keychain: Keychain,
    _dir: TempDir,
}

impl TestKeychain {
    fn new() -> Self {
        setup_test_environment();
        let dir = TempDir::new().unwrap();
        let keychain = Keychain::create(dir.path().join("test.keychain"), Some(PASSWORD)).unwrap();
        Self { keychain, _dir: dir }
    }
}

impl Drop for TestKeychain {
    fn drop(&mut self) {
        let _ = self.keychain.clone().delete();
    }
}

#[test]
fn test_open_by_path_is_equal() {
    let test = TestKeychain::new();
    let path = test.keychain.path().unwrap();
    assert!(path.ends_with("test.keychain"));

    let reopened = Keychain::open(&path).unwrap();
    assert_eq!(reopened, test.keychain);
    assert!(reopened.exists().unwrap());
    assert!(test.keychain.to_string().contains("test.keychain"));
}

#[test]
fn test_user_interaction_disabled_for_tests() {
    setup_test_environment();
    assert!(!Keychain::user_interaction_allowed().unwrap());
}

#[test]
fn test_open_missing_keychain() {
    setup_test_environment();
    let dir = TempDir::new().unwrap();
    let keychain = Keychain::open(dir.path().join("missing.keychain")).unwrap();
    assert!(!keychain.exists().unwrap());
}

#[test]
fn test_add_and_search_generic_password() {
    let test = TestKeychain::new();
    let item = test
        .keychain
        .add_generic_password("some-service", "some-account", b"s3cret")
        .unwrap();

    assert_eq!(item.class(), ItemClass::GenericPassword);
    assert_eq!(item.service().as_deref(), Some("some-service"));
    assert_eq!(item.account().as_deref(), Some("some-account"));
    assert_eq!(item.password_string().unwrap(), "s3cret");
    assert!(item.attributes().created_at().is_some());
    assert_eq!(item.keychain().unwrap(), test.keychain);

    let conditions = Attributes::from_host_pairs(vec![("service", AttrValue::from("some-service"))]).unwrap();
    let found = test.keychain.search(&conditions).unwrap().unwrap();
    assert_eq!(found.account().as_deref(), Some("some-account"));
    assert_eq!(found.password().unwrap(), b"s3cret".to_vec());

    let missing = Attributes::from_host_pairs(vec![("service", AttrValue::from("nope"))]).unwrap();
    assert!(test.keychain.search(&missing).unwrap().is_none());
}

#[test]
fn test_duplicate_item() {
    let test = TestKeychain::new();
    test.keychain.add_generic_password("dup", "me", b"one").unwrap();

    let err = test.keychain.add_generic_password("dup", "me", b"two").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateItem);
    assert_eq!(err.code(), Some(status::ERR_SEC_DUPLICATE_ITEM));
}

#[test]
fn test_lock_and_unlock() {
    let mut test = TestKeychain::new();
    test.keychain.lock().unwrap();
    assert!(test.keychain.is_locked().unwrap());

    let err = test.keychain.unlock(Some("wrong password")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthFailed);

    test.keychain.unlock(Some(PASSWORD)).unwrap();
    let status = test.keychain.status().unwrap();
    assert!(status.unlocked);
    assert!(status.readable);
    assert!(status.writable);
}

#[test]
fn test_settings() {
    let mut test = TestKeychain::new();
    test.keychain
        .set_settings(&KeychainSettings {
            lock_on_sleep: true,
            lock_interval: Some(300),
        })
        .unwrap();
    assert!(test.keychain.lock_on_sleep().unwrap());
    assert_eq!(test.keychain.lock_interval().unwrap(), Some(300));

    test.keychain.set_lock_on_sleep(false).unwrap();
    let settings = test.keychain.settings().unwrap();
    assert!(!settings.lock_on_sleep);
    assert_eq!(settings.lock_interval, Some(300));
}

#[test]
fn test_update_item() {
    let test = TestKeychain::new();
    let mut item = test.keychain.add_generic_password("svc", "before", b"old").unwrap();

    item.set(AttrKey::Account, "after").unwrap();
    item.set(AttrKey::Comment, "rotated").unwrap();
    item.set_password("new");
    assert!(item.has_unsaved_changes());
    item.save().unwrap();

    assert!(!item.has_unsaved_changes());
    assert_eq!(item.account().as_deref(), Some("after"));
    assert_eq!(item.attributes().comment(), Some("rotated"));
    assert_eq!(item.password_string().unwrap(), "new");

    let conditions = Attributes::from_host_pairs(vec![("account", AttrValue::from("after"))]).unwrap();
    let found = test.keychain.search(&conditions).unwrap().unwrap();
    assert_eq!(found.password_string().unwrap(), "new");
}

#[test]
fn test_delete_item() {
    let test = TestKeychain::new();
    let item = test.keychain.add_generic_password("gone", "me", b"x").unwrap();
    item.delete().unwrap();
    assert!(test.keychain.generic_passwords().all().unwrap().is_empty());
}

#[test]
fn test_internet_password() {
    let test = TestKeychain::new();
    let attributes = Attributes::from_host_pairs(vec![
        ("host", AttrValue::from("example.com")),
        ("account", AttrValue::from("me")),
        ("protocol", AttrValue::from("https")),
        ("port", AttrValue::from(8443i64)),
        ("path", AttrValue::from("/login")),
    ])
    .unwrap();
    let item = test.keychain.add_internet_password(&attributes, b"pw").unwrap();

    assert_eq!(item.class(), ItemClass::InternetPassword);
    assert_eq!(item.get(AttrKey::Protocol), Some(AttrValue::from("https")));
    assert_eq!(item.attributes().port(), Some(8443));
    assert_eq!(item.attributes().host(), Some("example.com"));

    let found = test
        .keychain
        .internet_passwords()
        .where_attr(AttrKey::Protocol, "https")
        .unwrap()
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(found.password_string().unwrap(), "pw");
}

#[test]
fn test_scope_all_and_limit() {
    let test = TestKeychain::new();
    for account in ["a", "b", "c"] {
        test.keychain.add_generic_password("shared", account, b"pw").unwrap();
    }
    test.keychain.add_generic_password("other", "d", b"pw").unwrap();

    let scope = test
        .keychain
        .generic_passwords()
        .where_attr(AttrKey::Service, "shared")
        .unwrap();
    let mut accounts: Vec<String> = scope.all().unwrap().iter().filter_map(Item::account).collect();
    accounts.sort();
    assert_eq!(accounts, vec!["a", "b", "c"]);

    assert_eq!(scope.clone().limit(2).all().unwrap().len(), 2);

    let everywhere =
        Keychain::search_all(&[test.keychain.clone()], ItemClass::GenericPassword, &Attributes::new()).unwrap();
    assert_eq!(everywhere.len(), 4);
}

#[test]
fn test_create_rejects_read_only_attribute() {
    let test = TestKeychain::new();
    let mut attributes = Attributes::new();
    attributes.set(AttrKey::Server, "example.com").unwrap();
    attributes.set(AttrKey::CreationDate, chrono::Utc::now()).unwrap();

    let err = test.keychain.add_internet_password(&attributes, b"pw").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Generic);
    assert!(err.message().contains("read-only"));
}
