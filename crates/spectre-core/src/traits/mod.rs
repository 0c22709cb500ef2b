// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the reply pipeline.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects.

pub mod captioner;
pub mod directory;
pub mod persona;
pub mod provider;
pub mod sink;

pub use captioner::ImageCaptioner;
pub use directory::{ChatDirectory, NullDirectory};
pub use persona::{PersonaRegistry, StaticPersonas};
pub use provider::ModelProvider;
pub use sink::ReplySink;
