//! Prompt pair type
//!
//! A prompt pair fully determines one completion call. It is immutable once
//! built; the completion adapter turns it into the system+user message list.

use serde::{Deserialize, Serialize};

/// System instructions plus user content for one completion call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}
