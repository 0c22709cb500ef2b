// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete Spectre pipeline.
//!
//! Each test builds an isolated TestHarness with a temp history directory
//! and mock collaborators. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use spectre_agent::Outcome;
use spectre_context::NO_HISTORY_NOTE;
use spectre_core::{ChatKind, ContextTurn, Persona, Role, Segment};
use spectre_storage::ImageVault;
use spectre_test_utils::harness::GROUP_ID;
use spectre_test_utils::{MockCaptioner, MockDirectory, TestHarness};

// ---- Prompt contents across an exchange ----

#[tokio::test]
async fn first_prompt_has_only_the_trigger_message() {
    let harness = TestHarness::builder()
        .always_reply()
        .configure(|c| c.group_msg_history = 10)
        .with_mock_responses(vec!["hi!".into(), "again!".into()])
        .build()
        .unwrap();

    harness.send(&TestHarness::group_event("42", "first")).await;
    let requests = harness.mock_provider.requests().await;
    assert!(!requests[0].prompt.contains(NO_HISTORY_NOTE));
    assert_eq!(requests[0].prompt.matches("Sender:").count(), 1);
}

#[tokio::test]
async fn window_limits_what_the_model_sees() {
    let harness = TestHarness::builder()
        .configure(|c| {
            c.group_msg_history = 2;
            c.model_frequency.keywords = vec!["bot".into()];
        })
        .build()
        .unwrap();

    for i in 0..5 {
        harness
            .send(&TestHarness::group_event("42", &format!("chatter {i}")))
            .await;
    }
    harness.send(&TestHarness::group_event("42", "bot?")).await;

    let prompt = &harness.mock_provider.requests().await[0].prompt;
    assert_eq!(prompt.matches("Sender:").count(), 2);
    assert!(prompt.contains("Content: chatter 4"));
    assert!(prompt.contains("Content: bot?"));
}

// ---- Scene, persona and images ----

#[tokio::test]
async fn scene_and_persona_reach_the_request() {
    let persona = Persona {
        name: "cat".into(),
        prompt: "You are a cat.".into(),
        mood_dialogs: None,
        begin_dialogs: vec![ContextTurn {
            role: Role::Assistant,
            content: "meow".into(),
        }],
    };
    let harness = TestHarness::builder()
        .always_reply()
        .configure(|c| c.persona = "cat".into())
        .with_persona(persona)
        .with_directory(MockDirectory::new().with_group(GROUP_ID, "Cat Lovers"))
        .build()
        .unwrap();

    harness.send(&TestHarness::group_event("42", "hello")).await;
    let request = &harness.mock_provider.requests().await[0];
    assert!(request.prompt.contains(&format!("Cat Lovers({GROUP_ID})")));
    assert!(request.system_prompt.contains("You are a cat."));
    assert_eq!(request.contexts.len(), 1);
}

#[tokio::test]
async fn images_are_persisted_captioned_and_attached() {
    let source_dir = tempfile::tempdir().unwrap();
    let local = source_dir.path().join("photo.jpg");
    std::fs::write(&local, b"jpeg").unwrap();
    let remote = "https://img.example.com/cat.png";

    let harness = TestHarness::builder()
        .always_reply()
        .configure(|c| c.image_processing.image_count = 5)
        .with_captioner(Arc::new(MockCaptioner::new().with_caption(remote, "a cat")))
        .build()
        .unwrap();

    let event = TestHarness::event(
        ChatKind::Group,
        GROUP_ID,
        "42",
        vec![
            Segment::text("look"),
            Segment::image(local.display().to_string()),
            Segment::image(remote),
        ],
    );
    harness.send(&event).await;

    let stored = &harness.history(&TestHarness::group_key()).await[0];
    let refs: Vec<&str> = stored.image_refs().collect();
    assert!(refs[0].starts_with("file://"));
    assert!(!refs[0].contains("photo.jpg"));
    assert_eq!(refs[1], remote);

    let request = &harness.mock_provider.requests().await[0];
    assert!(request.prompt.contains("Content: look[Image][Image: a cat]"));
    assert_eq!(request.image_urls.len(), 2);
    assert!(request.prompt.contains("2 image(s)"));

    // The copy outlives the original.
    std::fs::remove_file(&local).unwrap();
    let copy = refs[0].trim_start_matches("file://");
    assert!(std::path::Path::new(copy).exists());
}

#[tokio::test]
async fn sweep_removes_only_expired_images() {
    let harness = TestHarness::builder().build().unwrap();
    let vault = harness.store().vault().unwrap().clone();
    std::fs::create_dir_all(vault.dir()).unwrap();
    std::fs::write(vault.dir().join("a.jpg"), b"x").unwrap();

    let now = SystemTime::now();
    let week = Duration::from_secs(7 * 24 * 3600);
    assert_eq!(vault.sweep_at(now, week).await.unwrap(), 0);
    assert_eq!(vault.sweep_at(now + week * 2, week).await.unwrap(), 1);
    assert!(!vault.dir().join("a.jpg").exists());

    let empty = ImageVault::new(vault.dir().join("missing"));
    assert_eq!(empty.sweep(week).await.unwrap(), 0);
}

// ---- Isolation ----

#[tokio::test]
async fn private_and_group_logs_never_mix() {
    let harness = TestHarness::builder().build().unwrap();
    harness.send(&TestHarness::group_event("42", "in group")).await;
    harness.send(&TestHarness::private_event("42", "in private")).await;

    let group = harness.history(&TestHarness::group_key()).await;
    let private = harness
        .history(&TestHarness::private_event("42", "").key())
        .await;
    assert_eq!(group.len(), 1);
    assert_eq!(private.len(), 1);
    assert_eq!(private[0].outline(), "in private");
}

#[tokio::test]
async fn ambient_mode_sentinel_is_never_delivered() {
    let harness = TestHarness::builder()
        .always_reply()
        .configure(|c| c.read_air = true)
        .with_mock_responses(vec!["Nothing to add. <NO_RESPONSE>".into()])
        .build()
        .unwrap();

    let outcome = harness.send(&TestHarness::group_event("42", "hmm")).await;
    assert_eq!(outcome, Outcome::Suppressed);
    assert!(harness.mock_sink.sent().await.is_empty());
}
