//! Config schema types (server, auth, seeding).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelhouseConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub seed: SeedConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 8080.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for bearer tokens. When unset, a random ephemeral secret
    /// is generated at startup and issued tokens do not survive restarts.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_secret: Option<Secret<String>>,
    /// Token lifetime in seconds. Defaults to 86400 (24h).
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: 86_400,
        }
    }
}

/// First-run seeding of the subject directory.
///
/// Applied only when the subject table is empty, so an existing deployment is
/// never touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Whether to create an initial subject on first run. Defaults to true.
    pub enabled: bool,
    /// Email of the seeded subject.
    pub email: String,
    /// First name of the seeded subject.
    pub name: String,
    /// Surname of the seeded subject.
    pub surname: String,
    /// Password for the seeded subject. When unset, a random password is
    /// generated and logged once at startup.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret<String>>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            email: "admin@wheelhouse.dev".into(),
            name: "Admin".into(),
            surname: "Wheelhouse".into(),
            password: None,
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = WheelhouseConfig::default();
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.token_ttl_secs, 86_400);
        assert!(cfg.auth.token_secret.is_none());
        assert!(cfg.seed.enabled);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: WheelhouseConfig = toml::from_str("[server]\nport = 9999\n").unwrap();
        assert_eq!(cfg.server.port, 9999);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.auth.token_ttl_secs, 86_400);
    }

    #[test]
    fn secret_fields_deserialize_and_reserialize() {
        let cfg: WheelhouseConfig = toml::from_str("[auth]\ntoken_secret = \"s3cret\"\n").unwrap();
        assert_eq!(
            cfg.auth.token_secret.as_ref().unwrap().expose_secret(),
            "s3cret"
        );
        // Round-trips through the custom serializer rather than being dropped.
        let out = toml::to_string(&cfg).unwrap();
        assert!(out.contains("s3cret"));
    }

    #[test]
    fn debug_never_prints_secrets() {
        let cfg: WheelhouseConfig = toml::from_str("[auth]\ntoken_secret = \"hunter2\"\n").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
    }
}
