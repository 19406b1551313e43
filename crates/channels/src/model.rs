//! The channel aggregate and its construction rules.

use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// Minimum channel name length, counted in characters.
pub const MIN_NAME_LEN: usize = 5;

/// A channel: a named space with a creator, a fixed member set, and an
/// optional image in the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Content-store reference, never raw image bytes.
    pub image_ref: Option<String>,
    pub creator_id: String,
    /// Always contains `creator_id`.
    pub members: BTreeSet<String>,
    pub created_at: i64,
}

impl Channel {
    /// Build a new channel. The member set is the union of the requested ids
    /// and the creator, so the creator is enrolled exactly once no matter
    /// what the request contained.
    pub fn new(
        name: String,
        description: Option<String>,
        image_ref: Option<String>,
        creator_id: String,
        member_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        let members = member_set(member_ids, &creator_id);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            image_ref,
            creator_id,
            members,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Union of the requested member ids and the creator.
pub fn member_set(
    requested: impl IntoIterator<Item = String>,
    creator_id: &str,
) -> BTreeSet<String> {
    let mut members: BTreeSet<String> = requested.into_iter().collect();
    members.insert(creator_id.to_string());
    members
}

/// Reject names shorter than [`MIN_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<()> {
    if name.chars().count() < MIN_NAME_LEN {
        return Err(Error::invalid_input(format!(
            "channel name must be at least {MIN_NAME_LEN} characters long"
        )));
    }
    Ok(())
}

/// Image payload carried through create and edit.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Payload for creating a channel.
#[derive(Debug, Clone)]
pub struct CreateChannel {
    pub name: String,
    pub description: Option<String>,
    pub member_ids: Vec<String>,
    pub image: Option<ImageUpload>,
}

/// Partial edit payload. `None` keeps the current value; `Some` replaces it.
/// Membership is deliberately absent: the member set is fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct EditChannel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
}
