// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the reply pipeline over mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use spectre_agent::{Outcome, SkipReason};
use spectre_core::ConversationKey;
use spectre_test_utils::harness::{GROUP_ID, SELF_ID};
use spectre_test_utils::{MockProvider, TestHarness};
use tokio::sync::Notify;

fn keyword_harness(responses: &[&str]) -> TestHarness {
    TestHarness::builder()
        .with_mock_responses(responses.iter().map(|s| s.to_string()).collect())
        .configure(|c| c.model_frequency.keywords = vec!["spectre".into()])
        .build()
        .unwrap()
}

#[tokio::test]
async fn keyword_message_gets_reply_and_both_turns_are_stored() {
    let h = keyword_harness(&["hello there"]);
    let event = TestHarness::group_event("42", "hey spectre, you up?");

    let outcome = h.send(&event).await;
    assert_eq!(outcome, Outcome::Replied("hello there".into()));
    assert_eq!(
        h.mock_sink.sent().await,
        vec![(TestHarness::group_key(), "hello there".to_string())]
    );

    let history = h.history(&TestHarness::group_key()).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender_id, "42");
    assert!(!history[0].bot_authored);
    assert_eq!(history[1].sender_id, SELF_ID);
    assert_eq!(history[1].sender_name, "Spectre");
    assert!(history[1].bot_authored);
    assert!(!h.pipeline.tracker().is_in_progress(&TestHarness::group_key()));
    assert!(h.pipeline.tracker().last_call_time(&TestHarness::group_key()).is_some());
}

#[tokio::test]
async fn policy_skip_still_records_the_message() {
    let h = keyword_harness(&[]);
    let outcome = h.send(&TestHarness::group_event("42", "just chatting")).await;

    assert_eq!(outcome, Outcome::Skipped(SkipReason::Policy("probability".into())));
    assert_eq!(h.mock_provider.call_count().await, 0);
    assert_eq!(h.history(&TestHarness::group_key()).await.len(), 1);
    assert!(h.mock_sink.sent().await.is_empty());
}

#[tokio::test]
async fn disabled_group_is_neither_stored_nor_answered() {
    let h = keyword_harness(&[]);
    let mut event = TestHarness::group_event("42", "spectre?");
    event.chat_id = "999".into();

    assert_eq!(h.send(&event).await, Outcome::Skipped(SkipReason::Disabled));
    assert!(h.history(&event.key()).await.is_empty());
}

#[tokio::test]
async fn blacklist_beats_keyword() {
    let h = TestHarness::builder()
        .always_reply()
        .configure(|c| {
            c.model_frequency.keywords = vec!["spectre".into()];
            c.model_frequency.blacklist_keywords = vec!["secret".into()];
        })
        .build()
        .unwrap();

    let outcome = h.send(&TestHarness::group_event("42", "spectre, the secret")).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Blacklisted("secret".into())));
}

#[tokio::test]
async fn no_response_sentinel_suppresses_reply() {
    let h = TestHarness::builder()
        .always_reply()
        .with_mock_responses(vec!["<think>not for me</think><NO_RESPONSE>".into()])
        .configure(|c| c.read_air = true)
        .build()
        .unwrap();

    let outcome = h.send(&TestHarness::group_event("42", "talking to bob")).await;
    assert_eq!(outcome, Outcome::Suppressed);
    assert!(h.mock_sink.sent().await.is_empty());
    assert_eq!(h.history(&TestHarness::group_key()).await.len(), 1);
    assert!(!h.pipeline.tracker().is_in_progress(&TestHarness::group_key()));

    let request = &h.mock_provider.requests().await[0];
    assert!(request.prompt.contains("<NO_RESPONSE>"));
}

#[tokio::test]
async fn reasoning_block_is_stripped_before_sending() {
    let h = TestHarness::builder()
        .always_reply()
        .with_mock_responses(vec!["<think>plan the joke</think>\nwhy not".into()])
        .build()
        .unwrap();

    let outcome = h.send(&TestHarness::private_event("7", "tell me a joke")).await;
    assert_eq!(outcome, Outcome::Replied("why not".into()));
    let history = h.history(&ConversationKey::private("test", "7")).await;
    assert_eq!(history.last().unwrap().outline(), "why not");
}

#[tokio::test]
async fn provider_failure_releases_the_conversation() {
    let provider = MockProvider::new();
    provider.add_failure("upstream down").await;
    provider.add_response("back again").await;
    let h = TestHarness::builder()
        .always_reply()
        .with_provider(provider)
        .build()
        .unwrap();

    let first = h.send(&TestHarness::group_event("42", "one")).await;
    assert!(matches!(first, Outcome::Failed(ref m) if m.contains("upstream down")));
    assert!(!h.pipeline.tracker().is_in_progress(&TestHarness::group_key()));

    let second = h.send(&TestHarness::group_event("42", "two")).await;
    assert_eq!(second, Outcome::Replied("back again".into()));
}

#[tokio::test]
async fn undelivered_reply_is_not_recorded() {
    let h = TestHarness::builder()
        .always_reply()
        .with_mock_responses(vec!["lost words".into()])
        .build()
        .unwrap();
    h.mock_sink.set_failing(true);

    let outcome = h.send(&TestHarness::group_event("42", "hi")).await;
    assert!(matches!(outcome, Outcome::Failed(_)));
    let history = h.history(&TestHarness::group_key()).await;
    assert_eq!(history.len(), 1);
    assert!(!history[0].bot_authored);
}

#[tokio::test]
async fn overlapping_message_is_skipped_while_model_runs() {
    let gate = Arc::new(Notify::new());
    let provider = MockProvider::with_responses(vec!["first answer".into()]).gated(gate.clone());
    let h = Arc::new(
        TestHarness::builder()
            .always_reply()
            .with_provider(provider)
            .build()
            .unwrap(),
    );

    let runner = h.clone();
    let first = tokio::spawn(async move {
        runner.send(&TestHarness::group_event("42", "first")).await
    });

    for _ in 0..200 {
        if h.mock_provider.call_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(h.pipeline.tracker().is_in_progress(&TestHarness::group_key()));

    let second = h.send(&TestHarness::group_event("43", "second")).await;
    assert_eq!(second, Outcome::Skipped(SkipReason::InProgress));

    gate.notify_one();
    assert_eq!(first.await.unwrap(), Outcome::Replied("first answer".into()));
    assert_eq!(h.mock_provider.call_count().await, 1);
    // Both inbound messages and the reply.
    assert_eq!(h.history(&TestHarness::group_key()).await.len(), 3);
}

#[tokio::test]
async fn second_request_sees_the_first_exchange() {
    let h = TestHarness::builder()
        .always_reply()
        .with_mock_responses(vec!["reply one".into(), "reply two".into()])
        .build()
        .unwrap();

    h.send(&TestHarness::group_event("42", "first")).await;
    h.send(&TestHarness::group_event("42", "second")).await;

    let requests = h.mock_provider.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].prompt.matches("Sender:").count(), 1);
    assert_eq!(requests[1].prompt.matches("Sender:").count(), 3);
    assert!(requests[1].prompt.contains("Content: reply one"));
}

#[tokio::test]
async fn commands_are_answered_and_not_stored() {
    let h = keyword_harness(&[]);
    h.send(&TestHarness::group_event("42", "hello")).await;

    let outcome = h.send(&TestHarness::group_event("42", "/sc history")).await;
    let Outcome::Command(text) = outcome else {
        panic!("expected command outcome, got {outcome:?}");
    };
    assert!(text.starts_with(&format!("Last message of the group chat ({GROUP_ID}):")));
    assert_eq!(h.history(&TestHarness::group_key()).await.len(), 1);

    let outcome = h.send(&TestHarness::group_event("42", "/sc reset")).await;
    assert_eq!(
        outcome,
        Outcome::Command(format!("History of the group chat ({GROUP_ID}) has been reset."))
    );
    assert!(h.history(&TestHarness::group_key()).await.is_empty());

    let outcome = h.send(&TestHarness::group_event("42", "sc help")).await;
    assert!(matches!(outcome, Outcome::Command(t) if t.starts_with("Spectre help")));
}

#[tokio::test]
async fn callllm_bypasses_the_decision_engine() {
    let h = keyword_harness(&["forced"]);
    h.send(&TestHarness::group_event("42", "quiet chat")).await;

    let outcome = h.send(&TestHarness::group_event("42", "/sc callllm")).await;
    assert_eq!(outcome, Outcome::Replied("forced".into()));
    assert_eq!(h.mock_provider.call_count().await, 1);
}

#[tokio::test]
async fn callllm_failure_sends_a_notice() {
    let provider = MockProvider::new();
    provider.add_failure("quota exceeded").await;
    let h = TestHarness::builder().with_provider(provider).build().unwrap();

    let outcome = h.send(&TestHarness::group_event("42", "/sc callllm")).await;
    assert!(matches!(outcome, Outcome::Failed(_)));
    let texts = h.mock_sink.texts().await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Failed to trigger a model reply:"));
}

#[tokio::test]
async fn reset_clears_history_and_call_state() {
    let h = keyword_harness(&["ok"]);
    h.send(&TestHarness::group_event("42", "spectre hi")).await;
    let key = TestHarness::group_key();
    assert!(h.pipeline.tracker().state(&key).is_some());

    assert!(h.pipeline.reset(&key).await);
    assert!(h.history(&key).await.is_empty());
    assert!(h.pipeline.tracker().state(&key).is_none());
}
