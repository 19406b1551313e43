//! Subject identity: directory storage, password hashing, and signed bearer
//! tokens.
//!
//! This crate owns who a subject is. Channel membership only ever stores
//! subject ids; everything profile-shaped is resolved through
//! [`SubjectStore`].

pub mod error;
pub mod password;
pub mod service;
pub mod subject;
pub mod token;

pub use {
    error::{Error, Result},
    service::{Identity, LoginOutcome},
    subject::{NewSubject, SqliteSubjectStore, Subject, SubjectStore},
    token::{IssuedToken, TokenSigner, strip_bearer},
};
