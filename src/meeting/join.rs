//! Join form: who is joining which meeting, in which role.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    #[default]
    Participant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Host => write!(f, "Host"),
            Role::Participant => write!(f, "Participant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("name is required")]
    MissingName,
    #[error("meeting id is required")]
    MissingMeetingId,
    #[error("roll number is required for participants")]
    MissingRoll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub roll: Option<String>,
    pub meeting_id: String,
}

impl JoinRequest {
    /// Trim the fields and check the ones the role requires.
    pub fn validate(mut self) -> Result<Self, JoinError> {
        self.name = self.name.trim().to_string();
        self.meeting_id = self.meeting_id.trim().to_string();
        self.roll = self
            .roll
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        if self.name.is_empty() {
            return Err(JoinError::MissingName);
        }
        if self.meeting_id.is_empty() {
            return Err(JoinError::MissingMeetingId);
        }
        if self.role == Role::Participant && self.roll.is_none() {
            return Err(JoinError::MissingRoll);
        }
        Ok(self)
    }
}

const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Six upper-case base-36 characters.
pub fn generate_meeting_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..6)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
