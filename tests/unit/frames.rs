use super::*;

use serde_json::json;

#[test]
fn test_add_assigns_distinct_ids() {
    let cache = FrameCache::new();
    let first = cache.add(json!({"width": 1}));
    let second = cache.add(json!({"width": 2}));

    assert_ne!(first, second);
    assert_eq!(cache.get(&first), Some(json!({"width": 1})));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_insert_replaces() {
    let cache = FrameCache::new();
    cache.insert("frame-1", json!(1));
    cache.insert("frame-1", json!(2));
    assert_eq!(cache.get("frame-1"), Some(json!(2)));
    assert_eq!(cache.remove("frame-1"), Some(json!(2)));
    assert!(cache.is_empty());
}

#[test]
fn test_release_clears_but_keeps_counting() {
    let cache = FrameCache::new();
    let before = cache.add(json!({}));
    cache.release();

    assert!(cache.get(&before).is_none());
    let after = cache.add(json!({}));
    assert_ne!(before, after);
}

#[test]
fn test_configuration_round_trip() {
    let cache = FrameCache::new();
    assert_eq!(cache.configuration(), FramesHandlingConfiguration::default());

    let configuration = FramesHandlingConfiguration {
        is_file_system_cache_enabled: true,
        image_quality: 80,
        auto_rotate_images: true,
    };
    cache.configure(configuration.clone());
    cache.release();
    assert_eq!(cache.configuration(), configuration);
}
