// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona zone: system prompt and seed turns from the configured persona.

use spectre_core::{ContextTurn, PersonaRegistry};
use tracing::{debug, warn};

const STYLE_IMITATION_HEADER: &str = "\nImitate the conversational style of the following examples when you respond (in the examples, a is the user and b is you)\n";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaZone {
    pub system_prompt: String,
    pub contexts: Vec<ContextTurn>,
}

impl PersonaZone {
    /// Resolve `name` against the registry. An empty name or an unknown
    /// persona yields an empty zone.
    pub fn resolve(registry: &dyn PersonaRegistry, name: &str) -> Self {
        if name.is_empty() {
            return Self::default();
        }
        let Some(persona) = registry.persona(name) else {
            warn!(persona = name, "persona not found");
            return Self::default();
        };
        debug!(persona = name, "persona found");

        let mut system_prompt = persona.prompt;
        if let Some(dialogs) = persona.mood_dialogs {
            system_prompt.push_str(STYLE_IMITATION_HEADER);
            system_prompt.push_str(&dialogs);
        }
        Self {
            system_prompt,
            contexts: persona.begin_dialogs,
        }
    }
}
