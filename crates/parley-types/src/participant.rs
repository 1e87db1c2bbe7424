//! Tagged participant references.
//!
//! Clients address a conversation member either as an account or as a
//! persona. The reference is resolved to an `AccountId` by the Identity
//! Bridge and is never persisted in this form.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::persona::{Persona, PersonaId};

/// Reference to a participant: a human account or a persona profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ParticipantRef {
    Account(AccountId),
    Persona(PersonaId),
}

/// What an identity turned out to be after a bridge lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A plain human account.
    Human,
    /// The shadow identity of the given persona.
    Persona(Persona),
}

impl Classification {
    pub fn is_persona(&self) -> bool {
        matches!(self, Classification::Persona(_))
    }
}
