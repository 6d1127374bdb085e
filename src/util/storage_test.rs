use super::*;

#[test]
fn memory_storage_set_get_remove() {
    let store = MemoryStorage::default();
    assert!(store.is_empty());
    store.set("token", "abc");
    store.set("token", "def");
    assert_eq!(store.get("token").as_deref(), Some("def"));
    assert_eq!(store.len(), 1);
    assert!(store.remove("token"));
    assert_eq!(store.get("token"), None);
    assert!(store.remove("missing"));
    assert!(store.is_empty());
}

#[cfg(not(feature = "hydrate"))]
#[test]
fn browser_storage_is_inert_natively() {
    let store = BrowserStorage;
    store.set("token", "abc");
    assert_eq!(store.get("token"), None);
}
