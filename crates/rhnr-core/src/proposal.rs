use std::fmt;

use serde::{Deserialize, Serialize};

/// What the revision proposes for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposedAction {
    #[serde(rename = "Transferir")]
    Transfer,
    #[serde(rename = "Manter")]
    Keep,
    #[serde(rename = "Desativar")]
    Deactivate,
    #[serde(rename = "Instalar")]
    Install,
}

impl ProposedAction {
    pub const ALL: [ProposedAction; 4] = [
        ProposedAction::Transfer,
        ProposedAction::Keep,
        ProposedAction::Deactivate,
        ProposedAction::Install,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposedAction::Transfer => "Transferir",
            ProposedAction::Keep => "Manter",
            ProposedAction::Deactivate => "Desativar",
            ProposedAction::Install => "Instalar",
        }
    }

    /// Normalizes the free-text action found in survey spreadsheets
    /// ("Manter", "manter estação", "Transferência para ...").
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        if lowered.starts_with("transf") {
            Some(ProposedAction::Transfer)
        } else if lowered.starts_with("mant") {
            Some(ProposedAction::Keep)
        } else if lowered.starts_with("desativ") {
            Some(ProposedAction::Deactivate)
        } else if lowered.starts_with("instal") {
            Some(ProposedAction::Install)
        } else {
            None
        }
    }
}

impl fmt::Display for ProposedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
