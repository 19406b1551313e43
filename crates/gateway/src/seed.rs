//! First-run seeding of the subject directory.

use {secrecy::ExposeSecret, tracing::info};

use {
    wheelhouse_config::SeedConfig,
    wheelhouse_identity::{Identity, NewSubject, password},
};

/// Insert the configured seed subject when the directory is empty.
///
/// Never touches a non-empty directory. Returns the seeded subject id, if
/// one was created.
pub async fn seed_first_subject(
    identity: &Identity,
    seed: &SeedConfig,
) -> anyhow::Result<Option<String>> {
    if !seed.enabled {
        return Ok(None);
    }
    if identity.subjects().count().await? > 0 {
        return Ok(None);
    }

    let plain = match &seed.password {
        Some(secret) => secret.expose_secret().clone(),
        None => {
            let generated = password::generate_password();
            // Logged exactly once; there is no way to recover it later.
            info!(email = %seed.email, password = %generated, "generated seed password");
            generated
        },
    };

    let subject = identity
        .register(NewSubject {
            name: seed.name.clone(),
            surname: seed.surname.clone(),
            email: seed.email.clone(),
            phone: None,
            password: plain,
        })
        .await?;
    info!(subject_id = %subject.id, email = %subject.email, "seeded first subject");
    Ok(Some(subject.id))
}
