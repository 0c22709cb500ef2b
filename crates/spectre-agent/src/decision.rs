// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whether an inbound message should get a model reply.
//!
//! Checks run in a fixed order and the first conclusive one wins:
//! 1. a call already in flight for the conversation skips
//! 2. a blacklist keyword skips
//! 3. a conversation without history enabled skips
//! 4. a trigger keyword replies
//! 5. otherwise the configured [`ReplyPolicy`] decides
//!
//! Keywords are matched as substrings of the message outline, so
//! placeholders such as `[Image]` can be matched too.

use std::fmt;
use std::sync::Arc;

use spectre_config::{ReplyMethod, SpectreConfig};
use spectre_core::InboundEvent;
use tracing::debug;

use crate::call_state::CallStateTracker;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyReason {
    Keyword(String),
    Policy(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InProgress,
    Blacklisted(String),
    Disabled,
    Policy(String),
}

impl fmt::Display for ReplyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyReason::Keyword(word) => write!(f, "keyword `{word}`"),
            ReplyReason::Policy(name) => write!(f, "{name} policy"),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InProgress => write!(f, "a model call is already in progress"),
            SkipReason::Blacklisted(word) => write!(f, "blacklisted keyword `{word}`"),
            SkipReason::Disabled => write!(f, "conversation not enabled"),
            SkipReason::Policy(name) => write!(f, "{name} policy declined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Reply(ReplyReason),
    Skip(SkipReason),
}

impl Decision {
    pub fn is_reply(&self) -> bool {
        matches!(self, Decision::Reply(_))
    }
}

/// Fallback policy consulted when no keyword decided.
pub trait ReplyPolicy: Send + Sync {
    fn name(&self) -> &str;

    fn should_reply(&self, event: &InboundEvent) -> bool;
}

/// Replies to a fixed share of messages.
pub struct ProbabilityPolicy {
    probability: f64,
    roll: Box<dyn Fn() -> f64 + Send + Sync>,
}

impl ProbabilityPolicy {
    pub fn new(probability: f64) -> Self {
        Self::with_roll(probability, rand::random::<f64>)
    }

    /// Use `roll` instead of the thread RNG; it must return values in `[0, 1)`.
    pub fn with_roll(probability: f64, roll: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        Self {
            probability,
            roll: Box::new(roll),
        }
    }
}

impl ReplyPolicy for ProbabilityPolicy {
    fn name(&self) -> &str {
        "probability"
    }

    fn should_reply(&self, _event: &InboundEvent) -> bool {
        let roll = (self.roll)();
        let hit = roll < self.probability;
        debug!(roll, probability = self.probability, hit, "probability roll");
        hit
    }
}

/// Policy implementing the configured reply method.
pub fn policy_for(config: &SpectreConfig) -> Box<dyn ReplyPolicy> {
    match config.model_frequency.method {
        ReplyMethod::Probability => Box::new(ProbabilityPolicy::new(
            config.model_frequency.probability.probability,
        )),
    }
}

pub struct DecisionEngine {
    config: Arc<SpectreConfig>,
    tracker: Arc<CallStateTracker>,
    policy: Box<dyn ReplyPolicy>,
}

impl DecisionEngine {
    pub fn new(config: Arc<SpectreConfig>, tracker: Arc<CallStateTracker>) -> Self {
        let policy = policy_for(&config);
        Self::with_policy(config, tracker, policy)
    }

    pub fn with_policy(
        config: Arc<SpectreConfig>,
        tracker: Arc<CallStateTracker>,
        policy: Box<dyn ReplyPolicy>,
    ) -> Self {
        Self {
            config,
            tracker,
            policy,
        }
    }

    pub fn evaluate(&self, event: &InboundEvent) -> Decision {
        let key = event.key();
        let decision = self.decide(event);
        debug!(conversation = %key, ?decision, "reply decision");
        decision
    }

    pub fn should_reply(&self, event: &InboundEvent) -> bool {
        self.evaluate(event).is_reply()
    }

    fn decide(&self, event: &InboundEvent) -> Decision {
        let key = event.key();
        if self.tracker.is_in_progress(&key) {
            return Decision::Skip(SkipReason::InProgress);
        }

        let text = event.outline();
        let frequency = &self.config.model_frequency;
        if let Some(word) = first_match(&text, &frequency.blacklist_keywords) {
            return Decision::Skip(SkipReason::Blacklisted(word));
        }
        if !self.config.is_enabled(&key) {
            return Decision::Skip(SkipReason::Disabled);
        }
        if let Some(word) = first_match(&text, &frequency.keywords) {
            return Decision::Reply(ReplyReason::Keyword(word));
        }

        let name = self.policy.name().to_string();
        if self.policy.should_reply(event) {
            Decision::Reply(ReplyReason::Policy(name))
        } else {
            Decision::Skip(SkipReason::Policy(name))
        }
    }
}

/// First non-empty keyword contained in `text`.
fn first_match(text: &str, keywords: &[String]) -> Option<String> {
    keywords
        .iter()
        .find(|k| !k.is_empty() && text.contains(k.as_str()))
        .cloned()
}
