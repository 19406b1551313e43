//! Channel lifecycle and membership.
//!
//! A channel is a named collaboration space with a creator, a member set,
//! and an optional image held in the content store. The creator is always a
//! member; membership is fixed at creation and scopes listing, nothing else.
//!
//! [`ChannelService`] is the entry point. It takes the acting subject id as
//! an explicit argument; token handling happens at the HTTP boundary, never
//! here.

pub mod error;
pub mod model;
pub mod service;
pub mod store;
pub mod view;

pub use {
    error::{Error, Result},
    model::{Channel, CreateChannel, EditChannel, ImageUpload, MIN_NAME_LEN, member_set},
    service::ChannelService,
    store::{ChannelStore, SqliteChannelStore},
    view::{ChannelSummary, ChannelView, SubjectView},
};
