//! Draft for the group-creation modal.
//!
//! The draft only exists while the modal is open; closing it drops the draft
//! and everything typed into it.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use crate::error::ClientError;

pub const EMPTY_MEMBER_MESSAGE: &str = "Enter a member email.";
pub const DUPLICATE_MEMBER_MESSAGE: &str = "That member is already in the list.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupDraft {
    pub name: String,
    pub description: String,
    /// Member identities (emails) in the order they were added.
    pub members: Vec<String>,
    /// Inline validation or submit error.
    pub error: Option<String>,
    pub submitting: bool,
}

impl GroupDraft {
    /// Case-insensitive membership check.
    pub fn contains(&self, member: &str) -> bool {
        let member = member.to_lowercase();
        self.members.iter().any(|m| m.to_lowercase() == member)
    }

    /// Add one member.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` for an empty entry or a duplicate. The same
    /// message is stored in [`error`](Self::error).
    pub fn add_member(&mut self, raw: &str) -> Result<(), ClientError> {
        let member = raw.trim();
        let rejection = if member.is_empty() {
            Some(EMPTY_MEMBER_MESSAGE)
        } else if self.contains(member) {
            Some(DUPLICATE_MEMBER_MESSAGE)
        } else {
            None
        };
        if let Some(message) = rejection {
            self.error = Some(message.to_owned());
            return Err(ClientError::Validation(message.to_owned()));
        }
        self.members.push(member.to_owned());
        self.error = None;
        Ok(())
    }

    /// Add every entry of a comma-separated list, skipping blanks and
    /// duplicates. Returns how many were added.
    pub fn add_members_from_list(&mut self, raw: &str) -> usize {
        let mut added = 0;
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if self.add_member(part).is_ok() {
                added += 1;
            }
        }
        if added > 0 {
            self.error = None;
        }
        added
    }

    pub fn remove_member(&mut self, member: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != member);
        self.members.len() != before
    }

    /// Mark a submit as started. Returns `false` if one is already running.
    pub fn begin_submit(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        self.submitting = true;
        self.error = None;
        true
    }

    /// The submit failed; show why and allow another attempt.
    pub fn fail_submit(&mut self, error: &ClientError) {
        self.submitting = false;
        self.error = Some(error.user_message());
    }
}
