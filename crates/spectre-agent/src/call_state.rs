// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation guard against overlapping model calls.
//!
//! One mutex guards the whole map and is held only while a flag is read or
//! flipped, never across a model call. [`CallGuard`] releases its
//! conversation when dropped, so the flag is cleared on every exit path,
//! including early returns, errors and panics. Each start bumps a
//! per-conversation generation, and a guard only releases the generation it
//! started, so a guard that outlives [`CallStateTracker::clear`] cannot free
//! a later call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use spectre_core::ConversationKey;
use tracing::debug;

/// State of one conversation. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallState {
    pub in_progress: bool,
    pub last_call_time: Option<DateTime<Utc>>,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct CallStateTracker {
    entries: Mutex<HashMap<ConversationKey, CallState>>,
    // Survives `clear`, so generations never repeat for a key.
    next_generation: AtomicU64,
}

impl CallStateTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ConversationKey, CallState>> {
        // The map only holds plain flags, so a panicked holder cannot leave it torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a call as started, unconditionally.
    pub fn acquire(self: &Arc<Self>, key: &ConversationKey) -> CallGuard {
        let generation = self.mark_started(&mut self.entries(), key);
        self.guard(key, generation)
    }

    /// Mark a call as started unless one is already running.
    pub fn try_acquire(self: &Arc<Self>, key: &ConversationKey) -> Option<CallGuard> {
        let mut entries = self.entries();
        if entries.get(key).is_some_and(|s| s.in_progress) {
            return None;
        }
        let generation = self.mark_started(&mut entries, key);
        drop(entries);
        Some(self.guard(key, generation))
    }

    /// Mark the conversation idle if `generation` is still its current call.
    /// Does nothing for a cleared entry or one restarted since.
    pub fn release(&self, key: &ConversationKey, generation: u64) {
        match self.entries().get_mut(key) {
            Some(state) if state.generation == generation => {
                state.in_progress = false;
                debug!(conversation = %key, "model call finished");
            }
            Some(_) => {
                debug!(conversation = %key, generation, "stale call guard ignored");
            }
            None => {}
        }
    }

    /// Whether a call is in flight. Creates the entry on first use.
    pub fn is_in_progress(&self, key: &ConversationKey) -> bool {
        self.entries().entry(key.clone()).or_default().in_progress
    }

    pub fn last_call_time(&self, key: &ConversationKey) -> Option<DateTime<Utc>> {
        self.entries().get(key).and_then(|s| s.last_call_time)
    }

    pub fn state(&self, key: &ConversationKey) -> Option<CallState> {
        self.entries().get(key).copied()
    }

    /// Forget the conversation entirely.
    pub fn clear(&self, key: &ConversationKey) {
        self.entries().remove(key);
    }

    fn mark_started(
        &self,
        entries: &mut HashMap<ConversationKey, CallState>,
        key: &ConversationKey,
    ) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let state = entries.entry(key.clone()).or_default();
        state.in_progress = true;
        state.last_call_time = Some(Utc::now());
        state.generation = generation;
        debug!(conversation = %key, generation, "model call started");
        generation
    }

    fn guard(self: &Arc<Self>, key: &ConversationKey, generation: u64) -> CallGuard {
        CallGuard {
            tracker: Arc::clone(self),
            key: key.clone(),
            generation,
        }
    }
}

/// Releases its conversation on drop.
#[must_use = "the call is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct CallGuard {
    tracker: Arc<CallStateTracker>,
    key: ConversationKey,
    generation: u64,
}

impl CallGuard {
    pub fn key(&self) -> &ConversationKey {
        &self.key
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.key, self.generation);
    }
}
