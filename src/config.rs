//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--host`, `--user-id`, `--token`, etc.)
//! 2. `$TGDRIVE_CONFIG` environment variable (path to config file)
//! 3. Project-local `.tgdrive.toml` in the current working directory
//! 4. Global `~/.config/tgdrive/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, Result};

// ── Section configs ──────────────────────────────────────────────────────────

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the drive backend, e.g. `https://tgdrive.example.com`.
    pub host: Option<String>,
    /// Drive owner id (the Telegram user id the bot stores files for).
    pub user_id: Option<String>,
    /// Static access token sent with every request.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Tree view settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Folders always listed before files.
    pub folders_first: Option<bool>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Sync behavior settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Emit placeholder records for empty folders so they survive reloads.
    pub keep_empty_folders: Option<bool>,
    /// Confirm before delete operations.
    pub confirm_delete: Option<bool>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark" or "light".
    pub scheme: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub tree: TreeConfig,
    pub sync: SyncConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path — that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. $TGDRIVE_CONFIG environment variable
    if let Ok(env_path) = std::env::var("TGDRIVE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. Project-local `.tgdrive.toml` in CWD
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".tgdrive.toml"));
    }

    // 3. Global `~/.config/tgdrive/config.toml`
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tgdrive").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            api: ApiConfig {
                host: other.api.host.clone().or(self.api.host),
                user_id: other.api.user_id.clone().or(self.api.user_id),
                token: other.api.token.clone().or(self.api.token),
                timeout_secs: other.api.timeout_secs.or(self.api.timeout_secs),
            },
            tree: TreeConfig {
                folders_first: other.tree.folders_first.or(self.tree.folders_first),
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
            },
            sync: SyncConfig {
                keep_empty_folders: other
                    .sync
                    .keep_empty_folders
                    .or(self.sync.keep_empty_folders),
                confirm_delete: other.sync.confirm_delete.or(self.sync.confirm_delete),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        // Start with built-in defaults (all None — the struct Default).
        let mut config = AppConfig::default();

        // Load from candidate files (lowest priority first so higher overwrites).
        let paths = candidate_paths();
        for path in paths.iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        // Explicit --config file has higher priority than candidates.
        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        // CLI flag overrides are highest priority.
        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────

    /// Backend base URL; required, so absence is an error at startup.
    pub fn host(&self) -> Result<&str> {
        self.api
            .host
            .as_deref()
            .ok_or_else(|| AppError::InvalidConfig("api.host is not set".into()))
    }

    /// Drive owner id; required.
    pub fn user_id(&self) -> Result<&str> {
        self.api
            .user_id
            .as_deref()
            .ok_or_else(|| AppError::InvalidConfig("api.user_id is not set".into()))
    }

    /// Access token; required.
    pub fn token(&self) -> Result<&str> {
        self.api
            .token
            .as_deref()
            .ok_or_else(|| AppError::InvalidConfig("api.token is not set".into()))
    }

    /// Request timeout in seconds.
    pub fn timeout_secs(&self) -> u64 {
        self.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Whether folders are listed before files.
    pub fn folders_first(&self) -> bool {
        self.tree.folders_first.unwrap_or(true)
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    /// Whether empty folders are written back as placeholder records.
    pub fn keep_empty_folders(&self) -> bool {
        self.sync.keep_empty_folders.unwrap_or(false)
    }

    /// Whether to confirm before delete.
    pub fn confirm_delete(&self) -> bool {
        self.sync.confirm_delete.unwrap_or(true)
    }

    /// Theme scheme: "dark" or "light".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
