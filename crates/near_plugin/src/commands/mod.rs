//! Command handlers for `/near` and `/nm`.

pub mod near;
pub mod nm;

use near_core::PlayerId;

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Console,
    Player(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Near,
    Nm,
}

impl Command {
    /// Plain and namespaced labels, case-insensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim_start_matches('/').to_ascii_lowercase();
        match label.as_str() {
            "near" | "nearmanager:near" => Some(Command::Near),
            "nm" | "nearmanager:nm" => Some(Command::Nm),
            _ => None,
        }
    }

    pub fn labels(&self) -> [&'static str; 2] {
        match self {
            Command::Near => ["near", "nearmanager:near"],
            Command::Nm => ["nm", "nearmanager:nm"],
        }
    }
}
