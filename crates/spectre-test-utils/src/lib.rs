// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Spectre integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic
//! tests without a chat platform or a model endpoint.
//!
//! # Components
//!
//! - [`MockProvider`] - Model provider with queued responses
//! - [`MockCaptioner`] - Image captioner with fixed captions
//! - [`MockSink`] / [`MockDirectory`] - Host platform stand-ins
//! - [`TestHarness`] - A full reply pipeline over a temp directory

pub mod harness;
pub mod mock_platform;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_platform::{MockDirectory, MockSink};
pub use mock_provider::{MockCaptioner, MockProvider};
