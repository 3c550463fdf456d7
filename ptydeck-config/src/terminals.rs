use serde::{Deserialize, Serialize};

/// A named terminal slot. The id doubles as the session id sent to the registry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TerminalSlot {
    pub id: String,
    pub label: String,
}

impl TerminalSlot {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

pub fn default_terminal_slots() -> Vec<TerminalSlot> {
    (1..=3)
        .map(|index| TerminalSlot::new(format!("TERMINAL_{index}"), format!("Terminal {index}")))
        .collect()
}
