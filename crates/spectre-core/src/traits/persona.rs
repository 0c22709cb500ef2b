// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona lookup.

use std::collections::HashMap;

use crate::types::Persona;

/// Read-only persona lookup by name.
pub trait PersonaRegistry: Send + Sync {
    fn persona(&self, name: &str) -> Option<Persona>;
}

/// Registry over a fixed set of personas, typically from configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticPersonas {
    personas: HashMap<String, Persona>,
}

impl StaticPersonas {
    pub fn new(personas: impl IntoIterator<Item = Persona>) -> Self {
        Self {
            personas: personas
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl PersonaRegistry for StaticPersonas {
    fn persona(&self, name: &str) -> Option<Persona> {
        self.personas.get(name).cloned()
    }
}
