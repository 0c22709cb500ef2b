// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for history storage with image persistence.

use spectre_config::SpectreConfig;
use spectre_core::{ConversationKey, Segment, StoredMessage};
use spectre_storage::{HistoryStore, is_enabled};

fn config_in(root: &std::path::Path) -> SpectreConfig {
    let mut config = SpectreConfig::default();
    config.storage.history_dir = root.join("history").display().to_string();
    config.storage.images_dir = Some(root.join("images").display().to_string());
    config
}

#[tokio::test]
async fn stored_images_point_into_the_vault() {
    let root = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let cached = cache.path().join("qq_cache_123.gif");
    std::fs::write(&cached, b"GIF89a").unwrap();

    let store = HistoryStore::from_config(&config_in(root.path()));
    let key = ConversationKey::group("qq", "100");
    let message = StoredMessage::new(
        "42",
        None,
        1_700_000_000,
        vec![Segment::image(cached.display().to_string())],
    );
    assert!(store.append(&key, message).await);

    // The cache may be purged by the platform at any time.
    drop(cache);

    let log = store.read(&key).await;
    let refs: Vec<&str> = log[0].image_refs().collect();
    assert_eq!(refs.len(), 1);
    let path = refs[0].strip_prefix("file://").expect("file url");
    assert!(path.ends_with(".gif"));
    assert_eq!(std::fs::read(path).unwrap(), b"GIF89a");
    assert_eq!(log[0].sender_name, "42");
}

#[tokio::test]
async fn persistence_can_be_disabled() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_in(root.path());
    config.image_processing.enable_image_persistence = false;
    let store = HistoryStore::from_config(&config);
    assert!(store.vault().is_none());

    let key = ConversationKey::private("qq", "1");
    let message = StoredMessage::new("1", None, 0, vec![Segment::image("/tmp/cache/x.png")]);
    assert!(store.append(&key, message).await);
    assert_eq!(
        store.read(&key).await[0].image_refs().collect::<Vec<_>>(),
        vec!["/tmp/cache/x.png"]
    );
}

#[tokio::test]
async fn read_returns_min_of_appends_and_cap() {
    let root = tempfile::tempdir().unwrap();
    let store = HistoryStore::from_config(&config_in(root.path()));
    for n in [1usize, 37] {
        let key = ConversationKey::group("qq", format!("g{n}"));
        for i in 0..n {
            let m = StoredMessage::new("u", None, i as i64, vec![Segment::text(i.to_string())]);
            assert!(store.append(&key, m).await);
        }
        let log = store.read(&key).await;
        assert_eq!(log.len(), n);
        assert!(log.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}

#[test]
fn enable_gate_follows_config() {
    let mut config = SpectreConfig::default();
    config.enabled_groups = vec!["100".into()];
    assert!(is_enabled(&ConversationKey::group("qq", "100"), &config));
    assert!(!is_enabled(&ConversationKey::group("qq", "200"), &config));
    assert!(!is_enabled(&ConversationKey::private("qq", "1"), &config));
}
