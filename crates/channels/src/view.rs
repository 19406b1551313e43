//! Read-side projections returned to callers.

use serde::{Deserialize, Serialize};

use wheelhouse_identity::Subject;

use crate::model::Channel;

/// Public slice of a subject, safe to embed in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectView {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl From<&Subject> for SubjectView {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.id.clone(),
            name: subject.name.clone(),
            surname: subject.surname.clone(),
            email: subject.email.clone(),
        }
    }
}

/// Full channel projection with its members resolved to profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub creator_id: String,
    pub members: Vec<SubjectView>,
    pub created_at: i64,
}

impl ChannelView {
    /// Assemble the view from the aggregate and its resolved members,
    /// ordered by surname then name.
    pub fn assemble(channel: Channel, mut members: Vec<SubjectView>) -> Self {
        members.sort_by(|a, b| {
            (a.surname.as_str(), a.name.as_str(), a.id.as_str()).cmp(&(
                b.surname.as_str(),
                b.name.as_str(),
                b.id.as_str(),
            ))
        });
        Self {
            id: channel.id,
            name: channel.name,
            description: channel.description,
            image_ref: channel.image_ref,
            creator_id: channel.creator_id,
            members,
            created_at: channel.created_at,
        }
    }
}

/// Compact entry for membership listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl From<&Channel> for ChannelSummary {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            image_ref: channel.image_ref.clone(),
        }
    }
}
