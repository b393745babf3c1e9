use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use log::{debug, warn};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub pixoo: Option<PixooConfig>,
    pub spotify: Option<SpotifyConfig>,
    pub poll: Option<PollConfig>,
    pub clock: Option<ClockConfig>,
    pub artwork: Option<ArtworkConfig>,
    /// picture shown while a podcast episode plays
    pub podcast_image: Option<PathBuf>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct PixooConfig {
    pub address: Option<String>,    // IP or host, optionally with http:// prefix
    pub size: Option<u32>,          // 16 | 32 | 64
    pub brightness: Option<u8>,     // 0-100
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub refresh_token: Option<String>,
    pub api_base: Option<String>,
    pub accounts_base: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct PollConfig {
    pub active_secs: Option<u64>,
    pub idle_secs: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct ClockConfig {
    pub interval_secs: Option<u64>,
    /// minutes east of UTC; unset means the host's local zone
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct ArtworkConfig {
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub backoff_secs: Option<u64>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML;
/// the `env` fallbacks make the environment the middle layer.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "spotpix", version, about = "Spotify now playing on a Pixoo")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, env = "PIXOO64_IP_ADDRESS")]
    pub pixoo_address: Option<String>,
    #[arg(long, env = "PIXOO_SIZE")]
    pub pixoo_size: Option<u32>,
    #[arg(long, env = "PIXOO_BRIGHTNESS")]
    pub pixoo_brightness: Option<u8>,
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,
    #[arg(long, env = "SPOTIFY_CLIENT_URI")]
    pub spotify_redirect_uri: Option<String>,
    #[arg(long, env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
    pub spotify_refresh_token: Option<String>,
    #[arg(long, env = "SPOTPIX_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub podcast_image: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read .env, parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    report_dotenv(dotenvy::dotenv());
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;
    Ok((cfg, cli))
}

/// A missing .env is the normal case; an unreadable or malformed one is not.
/// Returns the error that was warned about.
fn report_dotenv<T: std::fmt::Debug>(result: Result<T, dotenvy::Error>) -> Option<dotenvy::Error> {
    match result {
        Ok(loaded) => {
            debug!("environment file loaded: {:?}", loaded);
            None
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!(".env not loaded: {}", e);
            Some(e)
        }
    }
}

/// Layer an already-parsed command line over defaults and YAML.
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) environment + CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Pretty YAML of the effective config with secrets masked
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    let mut shown = cfg.clone();
    if let Some(sp) = shown.spotify.as_mut() {
        if sp.client_secret.is_some() { sp.client_secret = Some("********".into()); }
        if sp.refresh_token.is_some() { sp.refresh_token = Some("********".into()); }
    }
    Ok(serde_yaml::to_string(&shown)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/spotpix/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/spotpix/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/spotpix.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["spotpix.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.podcast_image.is_some()  { dst.podcast_image = src.podcast_image; }
    if src.pixoo.is_some()          { dst.pixoo = src.pixoo; }
    if src.spotify.is_some()        { dst.spotify = src.spotify; }
    if src.poll.is_some()           { dst.poll = src.poll; }
    if src.clock.is_some()          { dst.clock = src.clock; }
    if src.artwork.is_some()        { dst.artwork = src.artwork; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()      { cfg.log_level = cli.log_level.clone(); }
    if cli.podcast_image.is_some()  { cfg.podcast_image = cli.podcast_image.clone(); }

    let pixoo = cfg.pixoo.get_or_insert_with(PixooConfig::default);
    if cli.pixoo_address.is_some()     { pixoo.address = cli.pixoo_address.clone(); }
    if cli.pixoo_size.is_some()        { pixoo.size = cli.pixoo_size; }
    if cli.pixoo_brightness.is_some()  { pixoo.brightness = cli.pixoo_brightness; }

    let spotify = cfg.spotify.get_or_insert_with(SpotifyConfig::default);
    if cli.spotify_client_id.is_some()      { spotify.client_id = cli.spotify_client_id.clone(); }
    if cli.spotify_client_secret.is_some()  { spotify.client_secret = cli.spotify_client_secret.clone(); }
    if cli.spotify_redirect_uri.is_some()   { spotify.redirect_uri = cli.spotify_redirect_uri.clone(); }
    if cli.spotify_refresh_token.is_some()  { spotify.refresh_token = cli.spotify_refresh_token.clone(); }

    if cli.utc_offset_minutes.is_some() {
        cfg.clock.get_or_insert_with(ClockConfig::default).utc_offset_minutes = cli.utc_offset_minutes;
    }
}

fn require(value: &Option<String>, what: &str) -> Result<(), ConfigError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Validation(format!("{} is required", what))),
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let pixoo = cfg.pixoo.clone().unwrap_or_default();
    require(&pixoo.address, "pixoo address (PIXOO64_IP_ADDRESS)")?;
    if let Some(size) = pixoo.size {
        if !matches!(size, 16 | 32 | 64) {
            return Err(ConfigError::Validation("pixoo size must be 16|32|64".into()));
        }
    }
    if let Some(b) = pixoo.brightness {
        if b > 100 {
            return Err(ConfigError::Validation("pixoo brightness must be 0..=100".into()));
        }
    }

    let spotify = cfg.spotify.clone().unwrap_or_default();
    require(&spotify.client_id, "spotify client id (SPOTIFY_CLIENT_ID)")?;
    require(&spotify.client_secret, "spotify client secret (SPOTIFY_CLIENT_SECRET)")?;
    require(&spotify.refresh_token, "spotify refresh token (SPOTIFY_REFRESH_TOKEN)")?;

    if let Some(poll) = cfg.poll.as_ref() {
        if poll.active_secs == Some(0) || poll.idle_secs == Some(0) {
            return Err(ConfigError::Validation("poll intervals must be > 0".into()));
        }
    }
    if let Some(clock) = cfg.clock.as_ref() {
        if clock.interval_secs == Some(0) {
            return Err(ConfigError::Validation("clock interval must be > 0".into()));
        }
        if let Some(m) = clock.utc_offset_minutes {
            if m.abs() >= 24 * 60 {
                return Err(ConfigError::Validation("utc offset must be within +/- 24h".into()));
            }
        }
    }
    if let Some(art) = cfg.artwork.as_ref() {
        if art.max_attempts == Some(0) {
            return Err(ConfigError::Validation("artwork max_attempts must be >= 1".into()));
        }
        if art.timeout_secs == Some(0) {
            return Err(ConfigError::Validation("artwork timeout must be > 0".into()));
        }
    }
    Ok(())
}
