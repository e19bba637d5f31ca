use std::collections::BTreeMap;

use chrono::NaiveDate;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

// Session protocol constants
pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_FRONTEND_PORT: u16 = 5000;
pub const DEFAULT_PLOT_SERVER_PORT: u16 = 5006;
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024; // client frames are tiny: slider moves and pings
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30; // tick event cadence

pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;
pub const DEFAULT_REWARD_CADENCE_MINUTES: u32 = 10;
pub const DEFAULT_NIGHT: &str = "2023-10-04";
pub const DEFAULT_TIMEZONE: &str = "Chile/Continental";

/// Top-level config (prenight.toml + PRENIGHT_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PrenightConfig {
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub plot_server: PlotServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub night: NightConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub bands: BandConfig,
}

/// The HTML page that embeds the plot server documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_frontend_port")]
    pub port: u16,
    /// Base URL the browser uses to reach the plot server.
    #[serde(default = "default_plot_server_url")]
    pub plot_server_url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: DEFAULT_FRONTEND_PORT,
            plot_server_url: default_plot_server_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_plot_server_port")]
    pub port: u16,
    /// `host:port` origins allowed to open plot sessions. Empty allows any.
    #[serde(default = "default_allowed_origins")]
    pub allow_websocket_origin: Vec<String>,
}

impl Default for PlotServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: DEFAULT_PLOT_SERVER_PORT,
            allow_websocket_origin: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Scheduler/conditions snapshot; gzip-compressed when it ends in `.gz`.
    #[serde(default = "default_scheduler_path")]
    pub scheduler_path: String,
    /// SQLite visit history with an `observations` table.
    #[serde(default = "default_visits_path")]
    pub visits_path: String,
    /// Only plot visits this many days before the night. Unset plots all.
    #[serde(default)]
    pub visit_lookback_days: Option<f64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            scheduler_path: default_scheduler_path(),
            visits_path: default_visits_path(),
            visit_lookback_days: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightConfig {
    /// Calendar date (UTC) of the night to display.
    #[serde(default = "default_night")]
    pub date: NaiveDate,
    /// IANA timezone used for civil times in the events table.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Simulate the night instead of replaying it. Recognised but not used
    /// by figure generation.
    #[serde(default)]
    pub simulate: bool,
}

impl Default for NightConfig {
    fn default() -> Self {
        Self {
            date: default_night(),
            timezone: default_timezone(),
            simulate: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Permits in the shared builder pool.
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    /// Sampling cadence of the reward curves.
    #[serde(default = "default_reward_cadence_minutes")]
    pub reward_cadence_minutes: u32,
    /// Regenerate every N seconds. Unset regenerates once at startup.
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            reward_cadence_minutes: DEFAULT_REWARD_CADENCE_MINUTES,
            refresh_interval_secs: None,
        }
    }
}

/// Display colours per passband, as `#rrggbb`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandConfig {
    #[serde(default = "default_band_colours")]
    pub colours: BTreeMap<String, String>,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            colours: default_band_colours(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_frontend_port() -> u16 {
    DEFAULT_FRONTEND_PORT
}
fn default_plot_server_port() -> u16 {
    DEFAULT_PLOT_SERVER_PORT
}
fn default_plot_server_url() -> String {
    format!("http://{}:{}", DEFAULT_BIND, DEFAULT_PLOT_SERVER_PORT)
}
fn default_allowed_origins() -> Vec<String> {
    vec![format!("{}:{}", DEFAULT_BIND, DEFAULT_FRONTEND_PORT)]
}
fn default_scheduler_path() -> String {
    format!("{}/.prenight/scheduler.json.gz", home_dir())
}
fn default_visits_path() -> String {
    format!("{}/.prenight/baseline.db", home_dir())
}
fn default_night() -> NaiveDate {
    // a constant literal, checked by `default_config_is_consistent`
    NaiveDate::parse_from_str(DEFAULT_NIGHT, "%Y-%m-%d").unwrap_or_default()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_worker_pool_size() -> usize {
    DEFAULT_WORKER_POOL_SIZE
}
fn default_reward_cadence_minutes() -> u32 {
    DEFAULT_REWARD_CADENCE_MINUTES
}

fn default_band_colours() -> BTreeMap<String, String> {
    [
        ("u", "#56b4e9"),
        ("g", "#008060"),
        ("r", "#ff4000"),
        ("i", "#850000"),
        ("z", "#6600cc"),
        ("y", "#000000"),
    ]
    .into_iter()
    .map(|(band, colour)| (band.to_string(), colour.to_string()))
    .collect()
}

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
}

impl PrenightConfig {
    /// Load config from a TOML file with PRENIGHT_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `PRENIGHT_NIGHT__DATE=2023-10-05`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "loading config");

        let defaults = Serialized::defaults(PrenightConfig::default());
        let config: PrenightConfig = Figment::from(defaults)
            .merge(Toml::file(&path))
            .merge(Env::prefixed("PRENIGHT_").split("__"))
            .extract()
            .map_err(|e| crate::error::PrenightError::Config(e.to_string()))?;

        if config.generation.worker_pool_size == 0 {
            return Err(crate::error::PrenightError::Config(
                "generation.worker_pool_size must be at least 1".to_string(),
            ));
        }
        if config.generation.reward_cadence_minutes == 0 {
            return Err(crate::error::PrenightError::Config(
                "generation.reward_cadence_minutes must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}

fn default_config_path() -> String {
    format!("{}/.prenight/prenight.toml", home_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_consistent() {
        let config = PrenightConfig::default();
        assert_eq!(config.night.date.to_string(), DEFAULT_NIGHT);
        assert_eq!(config.plot_server.port, 5006);
        assert_eq!(config.plot_server.allow_websocket_origin, vec!["127.0.0.1:5000"]);
        assert_eq!(config.bands.colours.len(), 6);
        assert_eq!(config.bands.colours["r"], "#ff4000");
        assert!(config.generation.refresh_interval_secs.is_none());
    }

    #[test]
    fn load_merges_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
[night]
date = "2024-01-15"
timezone = "UTC"

[generation]
worker_pool_size = 2
refresh_interval_secs = 3600

[bands.colours]
u = "#111111"
"##
        )
        .unwrap();

        let config = PrenightConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.night.date.to_string(), "2024-01-15");
        assert_eq!(config.night.timezone, "UTC");
        assert_eq!(config.generation.worker_pool_size, 2);
        assert_eq!(config.generation.reward_cadence_minutes, 10);
        assert_eq!(config.generation.refresh_interval_secs, Some(3600));
        assert_eq!(config.frontend.port, DEFAULT_FRONTEND_PORT);
        assert_eq!(config.bands.colours["u"], "#111111");
    }

    #[test]
    fn partial_band_table_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bands.colours]
g = \"#00ff00\"").unwrap();

        let config = PrenightConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.bands.colours.len(), 6);
        assert_eq!(config.bands.colours["g"], "#00ff00");
        assert_eq!(config.bands.colours["r"], "#ff4000");
        assert!(config.bands.colours.contains_key("u"));
    }

    #[test]
    fn load_rejects_empty_pool() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation]\nworker_pool_size = 0").unwrap();
        let err = PrenightConfig::load(file.path().to_str()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
