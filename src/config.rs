// Configuration loading and parsing (config/draft.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub bots: BotConfig,
    pub ws_port: u16,
    pub db_path: String,
    pub players_path: String,
}

// ---------------------------------------------------------------------------
// draft.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire draft.toml file.
#[derive(Debug, Clone, Deserialize)]
struct DraftFile {
    league: LeagueConfig,
    #[serde(default)]
    bots: BotConfig,
    websocket: WebsocketSection,
    database: DatabaseSection,
    data: DataSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// Required team count; the draft cannot start with fewer or more.
    pub num_teams: usize,
    pub total_rounds: u32,
    /// The user allowed to start/reset/cancel the draft. Authentication is
    /// the transport's concern; this is only compared against the claimed
    /// identity on privileged commands.
    pub commissioner: String,
    /// Human entrants as `name = owner` pairs, in registration order.
    /// Remaining seats up to `num_teams` are filled with bot teams at
    /// startup.
    #[serde(default)]
    pub teams: Vec<TeamEntry>,
    /// Display-name prefix for generated bot teams.
    #[serde(default = "default_bot_prefix")]
    pub bot_name_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    pub owner: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Milliseconds a bot "thinks" before each automated pick. Pacing only.
    #[serde(default = "default_think_delay_ms")]
    pub think_delay_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            think_delay_ms: default_think_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WebsocketSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSection {
    players: String,
}

fn default_bot_prefix() -> String {
    "Bot".to_string()
}

fn default_think_delay_ms() -> u64 {
    1500
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/draft.toml` relative to the
/// given `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("draft.toml");
    let text = read_file(&path)?;
    let file: DraftFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        league: file.league,
        bots: file.bots,
        ws_port: file.websocket.port,
        db_path: file.database.path,
        players_path: file.data.players,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working
/// directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;

    if league.num_teams < 2 {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: format!("must be at least 2, got {}", league.num_teams),
        });
    }

    if league.total_rounds == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.total_rounds".into(),
            message: "must be greater than 0".into(),
        });
    }

    if league.commissioner.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.commissioner".into(),
            message: "must not be empty".into(),
        });
    }

    if league.teams.len() > league.num_teams {
        return Err(ConfigError::ValidationError {
            field: "league.teams".into(),
            message: format!(
                "{} human teams configured but the league holds {}",
                league.teams.len(),
                league.num_teams
            ),
        });
    }

    // Duplicate human team names would violate per-draft uniqueness later;
    // reject them at load time with a clear message.
    for (i, entry) in league.teams.iter().enumerate() {
        if entry.name.is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("league.teams[{i}].name"),
                message: "must not be empty".into(),
            });
        }
        if league.teams[..i].iter().any(|other| other.name == entry.name) {
            return Err(ConfigError::ValidationError {
                field: format!("league.teams[{i}].name"),
                message: format!("duplicate team name `{}`", entry.name),
            });
        }
    }

    if league.bot_name_prefix.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.bot_name_prefix".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
