use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::{debug, warn};

use crate::schema::WheelhouseConfig;

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "wheelhouse.toml",
    "wheelhouse.yaml",
    "wheelhouse.yml",
    "wheelhouse.json",
];

// Process-wide directory overrides, set once by the CLI before anything else
// touches config or data paths.
static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);
static DATA_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Override the config directory for this process.
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = Some(dir);
    }
}

/// Remove a previously set config directory override.
pub fn clear_config_dir() {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = None;
    }
}

/// Override the data directory for this process.
pub fn set_data_dir(dir: PathBuf) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.write() {
        *guard = Some(dir);
    }
}

/// Remove a previously set data directory override.
pub fn clear_data_dir() {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.write() {
        *guard = None;
    }
}

/// Returns the config directory: the override when set, otherwise the
/// platform config dir (`~/.config/wheelhouse/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(guard) = CONFIG_DIR_OVERRIDE.read()
        && let Some(dir) = guard.as_ref()
    {
        return Some(dir.clone());
    }
    directories::ProjectDirs::from("", "", "wheelhouse").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory: the override when set, otherwise the platform
/// data dir (`~/.local/share/wheelhouse/` on Linux), falling back to the
/// current directory.
pub fn data_dir() -> PathBuf {
    if let Ok(guard) = DATA_DIR_OVERRIDE.read()
        && let Some(dir) = guard.as_ref()
    {
        return dir.clone();
    }
    directories::ProjectDirs::from("", "", "wheelhouse")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Path of the SQLite database file inside the data directory.
pub fn database_path() -> PathBuf {
    data_dir().join("wheelhouse.db")
}

/// Directory where the content store keeps uploaded files.
pub fn uploads_dir() -> PathBuf {
    data_dir().join("uploads")
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<WheelhouseConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. the config dir override, when one is set (explicit wins, cwd skipped)
/// 2. `./wheelhouse.{toml,yaml,yml,json}` (project-local)
/// 3. the platform config dir
///
/// Returns `WheelhouseConfig::default()` if no config file is found.
pub fn discover_and_load() -> WheelhouseConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    WheelhouseConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let overridden = CONFIG_DIR_OVERRIDE
        .read()
        .ok()
        .and_then(|g| g.as_ref().cloned());
    if let Some(dir) = overridden {
        return CONFIG_FILENAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists());
    }

    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global
    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wheelhouse.toml")
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<WheelhouseConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

/// Replace `${ENV_VAR}` placeholders in the raw config text.
///
/// Unresolvable or malformed placeholders are left as-is.
fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(val) => out.push_str(&val),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                // No closing brace (or empty name): emit literally and stop
                // scanning this placeholder.
                out.push_str("${");
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}
