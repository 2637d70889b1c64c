// Phase 8: Cache integration tests
//
// Tests for cache key computation (hash.rs) and file-system cache store (store.rs).
// Each test verifies a specific aspect of the caching layer.

use gait_report::cache::hash::{CacheSettings, compute_cache_key};
use gait_report::cache::store::CacheStore;
use gait_report::config::layout::{DynamicVariable, KinematicVariable, builtin_layout};
use gait_report::record::{Extraction, Sex};
use tempfile::tempdir;

fn sample_extraction() -> Extraction {
    let mut extraction = Extraction::default();
    extraction.demographics.sex = Some(Sex::F);
    extraction.demographics.height = Some(1.70);
    extraction.spatio_temporal.speed = Some(1.12);
    extraction
        .charts
        .kinematics
        .set(KinematicVariable::KneeRight, Some(58.5));
    extraction
        .charts
        .dynamics
        .set(DynamicVariable::AnklePower, Some(2.64));
    extraction
}

// ---- hash.rs tests ----

/// Test that the same inputs always produce the same cache key.
#[test]
fn test_cache_key_deterministic() {
    let layout = builtin_layout();
    let settings = CacheSettings { layout: &layout };

    let key1 = compute_cache_key(b"%PDF-1.7 same", &settings).unwrap();
    let key2 = compute_cache_key(b"%PDF-1.7 same", &settings).unwrap();

    assert_eq!(key1, key2, "Same inputs should produce the same cache key");
}

/// Test that different document bytes produce a different cache key.
#[test]
fn test_cache_key_differs_with_different_content() {
    let layout = builtin_layout();
    let settings = CacheSettings { layout: &layout };

    let key1 = compute_cache_key(b"%PDF-1.7 one", &settings).unwrap();
    let key2 = compute_cache_key(b"%PDF-1.7 two", &settings).unwrap();

    assert_ne!(key1, key2);
}

/// Test that the layout takes part in the key.
#[test]
fn test_cache_key_differs_with_layout() {
    let layout = builtin_layout();
    let mut shifted = layout.as_ref().clone();
    shifted.rom_scale = 0.25;

    let base = compute_cache_key(b"%PDF", &CacheSettings { layout: &layout }).unwrap();
    let other_layout = compute_cache_key(b"%PDF", &CacheSettings { layout: &shifted }).unwrap();

    assert_ne!(base, other_layout);
}

// ---- store.rs tests ----

fn valid_key(c: char) -> String {
    std::iter::repeat_n(c, 64).collect()
}

#[test]
fn test_cache_store_and_retrieve() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = valid_key('a');
    let extraction = sample_extraction();

    store.store(&key, &extraction, None).unwrap();
    assert!(store.contains(&key));

    let cached = store.retrieve(&key).unwrap().expect("cache hit");
    assert_eq!(cached, extraction);
}

#[test]
fn test_cache_miss_returns_none() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = valid_key('b');

    assert!(!store.contains(&key));
    assert!(store.retrieve(&key).unwrap().is_none());
}

#[test]
fn test_cache_entry_layout_on_disk() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = valid_key('c');

    store
        .store(&key, &sample_extraction(), Some(std::path::Path::new("/reports/p1.pdf")))
        .unwrap();

    let entry = dir.path().join(&key);
    assert!(entry.join("metadata.json").is_file());
    assert!(entry.join("extraction.json").is_file());
    assert!(!dir.path().join(format!("{key}.tmp")).exists());

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(entry.join("metadata.json")).unwrap())
            .unwrap();
    assert_eq!(metadata["cache_key"], key.as_str());
    assert_eq!(metadata["source"], "/reports/p1.pdf");
}

#[test]
fn test_cache_overwrite_replaces_entry() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = valid_key('d');

    store.store(&key, &Extraction::default(), None).unwrap();
    store.store(&key, &sample_extraction(), None).unwrap();

    assert_eq!(store.retrieve(&key).unwrap(), Some(sample_extraction()));
}

#[test]
fn test_cache_rejects_invalid_key() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());

    assert!(store.store("../escape", &Extraction::default(), None).is_err());
    assert!(store.retrieve("not-a-key").is_err());
    assert!(!store.contains("not-a-key"));
}

#[test]
fn test_cache_key_mismatch_in_metadata() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = valid_key('e');
    store.store(&key, &Extraction::default(), None).unwrap();

    // 別キーのメタデータに差し替える
    let metadata_path = dir.path().join(&key).join("metadata.json");
    let tampered = format!(
        "{{\"cache_key\":\"{}\",\"created_at\":\"2024-01-01T00:00:00Z\"}}",
        valid_key('f')
    );
    std::fs::write(&metadata_path, tampered).unwrap();

    assert!(store.retrieve(&key).is_err());
}
