//! Identity service: registration, login, token refresh, profile lookup.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    password,
    subject::{NewSubject, Subject, SubjectStore},
    token::TokenSigner,
};

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LEN: usize = 8;

/// Result of a successful login or refresh.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub subject_id: String,
    pub token: String,
    pub expires_at: i64,
}

/// Identity operations over a subject directory and a token signer.
#[derive(Clone)]
pub struct Identity {
    subjects: Arc<dyn SubjectStore>,
    signer: TokenSigner,
}

impl Identity {
    pub fn new(subjects: Arc<dyn SubjectStore>, signer: TokenSigner) -> Self {
        Self { subjects, signer }
    }

    /// The directory this service resolves subjects against.
    pub fn subjects(&self) -> Arc<dyn SubjectStore> {
        self.subjects.clone()
    }

    /// Register a new subject. Emails are normalized to lowercase.
    pub async fn register(&self, new: NewSubject) -> Result<Subject> {
        if new.name.trim().is_empty() || new.surname.trim().is_empty() {
            return Err(Error::invalid_input("name and surname must not be empty"));
        }
        let email = new.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(Error::invalid_input("email is not valid"));
        }
        if new.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::invalid_input(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        if self
            .subjects
            .get_by_email(&email)
            .await
            .map_err(|e| Error::store("lookup subject by email", e))?
            .is_some()
        {
            return Err(Error::email_taken(email));
        }

        let subject = Subject {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            surname: new.surname.trim().to_string(),
            email,
            phone: new.phone,
            password_hash: password::hash_password(&new.password)?,
            active: true,
            created_at: chrono::Utc::now().timestamp(),
        };
        self.subjects
            .insert(&subject)
            .await
            .map_err(|e| Error::store("insert subject", e))?;

        info!(subject_id = %subject.id, "subject registered");
        Ok(subject)
    }

    /// Authenticate by email and password, returning a signed token.
    ///
    /// Unknown emails and wrong passwords fail identically so the response
    /// does not reveal which part was wrong.
    pub async fn login(&self, email: &str, password_plain: &str) -> Result<LoginOutcome> {
        let email = email.trim().to_lowercase();
        let Some(subject) = self
            .subjects
            .get_by_email(&email)
            .await
            .map_err(|e| Error::store("lookup subject by email", e))?
        else {
            debug!("login rejected: unknown email");
            return Err(Error::unauthorized("invalid credentials"));
        };

        if !password::verify_password(password_plain, &subject.password_hash) {
            debug!(subject_id = %subject.id, "login rejected: bad password");
            return Err(Error::unauthorized("invalid credentials"));
        }
        if !subject.active {
            debug!(subject_id = %subject.id, "login rejected: deactivated");
            return Err(Error::unauthorized("account is deactivated"));
        }

        let issued = self.signer.issue(&subject.id)?;
        info!(subject_id = %subject.id, "login succeeded");
        Ok(LoginOutcome {
            subject_id: subject.id,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Exchange a still-valid token for a fresh one.
    pub async fn refresh(&self, token: &str) -> Result<LoginOutcome> {
        let subject_id = self.signer.verify(token)?;
        let Some(subject) = self
            .subjects
            .get(&subject_id)
            .await
            .map_err(|e| Error::store("lookup subject", e))?
        else {
            return Err(Error::unauthorized("subject no longer exists"));
        };
        if !subject.active {
            return Err(Error::unauthorized("account is deactivated"));
        }

        let issued = self.signer.issue(&subject.id)?;
        Ok(LoginOutcome {
            subject_id: subject.id,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Resolve a bearer token to the embedded subject id.
    ///
    /// Purely a signature + expiry check; the directory is not consulted.
    pub fn resolve_token(&self, token: &str) -> Result<String> {
        self.signer.verify(token)
    }

    /// Fetch a subject's profile by id.
    pub async fn profile(&self, subject_id: &str) -> Result<Subject> {
        self.subjects
            .get(subject_id)
            .await
            .map_err(|e| Error::store("lookup subject", e))?
            .ok_or_else(|| Error::unknown_subject(subject_id))
    }

    /// Activate or deactivate a subject.
    pub async fn set_active(&self, subject_id: &str, active: bool) -> Result<()> {
        let changed = self
            .subjects
            .set_active(subject_id, active)
            .await
            .map_err(|e| Error::store("update subject", e))?;
        if !changed {
            return Err(Error::unknown_subject(subject_id));
        }
        info!(subject_id, active, "subject activation changed");
        Ok(())
    }
}
