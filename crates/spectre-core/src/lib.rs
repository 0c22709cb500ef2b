// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Spectre, a proactive group-chat reply engine.
//!
//! This crate provides the domain types (conversation keys, message segments,
//! the persisted message schema), the error type, and the collaborator traits
//! the reply pipeline consumes: model invocation, image captioning, persona
//! lookup, platform directory queries and reply delivery.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SpectreError;
pub use types::{
    ChatKind, ContextTurn, ConversationKey, IMAGE_PLACEHOLDER, InboundEvent, ModelRequest,
    NO_RESPONSE, Persona, Role, Segment, StoredMessage,
};

pub use traits::{
    ChatDirectory, ImageCaptioner, ModelProvider, NullDirectory, PersonaRegistry, ReplySink,
    StaticPersonas,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectre_error_has_all_variants() {
        let _config = SpectreError::Config("test".into());
        let _storage = SpectreError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _serde = SpectreError::from(serde_json::from_str::<u8>("x").unwrap_err());
        let _provider = SpectreError::Provider {
            message: "test".into(),
            source: None,
        };
        let _captioner = SpectreError::Captioner {
            message: "test".into(),
            source: None,
        };
        let _directory = SpectreError::Directory {
            message: "test".into(),
            source: None,
        };
        let _internal = SpectreError::Internal("test".into());
    }

    #[test]
    fn io_errors_become_storage_errors() {
        let err: SpectreError = std::io::Error::other("disk full").into();
        assert!(matches!(err, SpectreError::Storage { .. }));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn static_personas_lookup() {
        let registry = StaticPersonas::new([Persona {
            name: "cat".into(),
            prompt: "You are a cat.".into(),
            ..Default::default()
        }]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.persona("cat").unwrap().prompt, "You are a cat.");
        assert!(registry.persona("dog").is_none());
    }

    #[tokio::test]
    async fn null_directory_knows_nothing() {
        let dir = NullDirectory;
        assert!(dir.group_name("qq", "1").await.unwrap().is_none());
        assert!(dir.self_name("qq").await.unwrap().is_none());
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _provider(_: &dyn ModelProvider) {}
        fn _captioner(_: &dyn ImageCaptioner) {}
        fn _personas(_: &dyn PersonaRegistry) {}
        fn _directory(_: &dyn ChatDirectory) {}
        fn _sink(_: &dyn ReplySink) {}
    }
}
