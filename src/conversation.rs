//! Conversation store
//!
//! An append-only, chronologically ordered list of turns. The first turns are
//! the system context the conversation was created with; everything after is
//! user input and, when reply recording is on, model replies.

#[cfg(test)]
mod proptests;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Who authored a turn. Serialized with the endpoint's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One text part of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of all parts
    #[cfg(test)]
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// How user input is normalized before it is stored and sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputCase {
    /// Lower-case the message. Case is lost before the model sees it.
    #[default]
    Lowercase,
    /// Store the message as typed
    Preserve,
}

impl InputCase {
    pub fn apply(self, text: &str) -> String {
        match self {
            InputCase::Lowercase => text.to_lowercase(),
            InputCase::Preserve => text.to_string(),
        }
    }
}

impl FromStr for InputCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowercase" | "lower" => Ok(InputCase::Lowercase),
            "preserve" | "none" => Ok(InputCase::Preserve),
            other => Err(format!("unknown input case policy: {other}")),
        }
    }
}

/// Ordered turn history of one chat session
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
    seed_len: usize,
    input_case: InputCase,
}

impl Conversation {
    /// Create a conversation whose opening turns are `context`, each as a
    /// user turn.
    pub fn new(context: Vec<String>, input_case: InputCase) -> Self {
        let turns: Vec<Turn> = context.into_iter().map(Turn::user).collect();
        Self {
            seed_len: turns.len(),
            turns,
            input_case,
        }
    }

    #[cfg(test)]
    pub fn with_default_context() -> Self {
        Self::new(crate::system_prompt::default_context(), InputCase::default())
    }

    /// Append the next user message after applying the input case policy.
    /// No length or content validation happens here.
    pub fn append_user_turn(&mut self, text: &str) -> &Turn {
        let text = self.input_case.apply(text);
        self.push(Turn::user(text))
    }

    /// Append a model reply, stored as the raw text the model returned
    pub fn append_model_turn(&mut self, text: &str) -> &Turn {
        self.push(Turn::model(text))
    }

    fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns added after the seeded context
    #[cfg(test)]
    pub fn exchanged(&self) -> &[Turn] {
        &self.turns[self.seed_len..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
