use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::connection::{ConnectionConfig, DEFAULT_ENDPOINT, DEFAULT_RECONNECT_MS};
use crate::display::DEFAULT_METER_FRACTION;
use crate::meter::{ConfigurationError, MeterConfig};

pub const DEFAULT_WIDTH: u32 = 320;
pub const DEFAULT_HEIGHT: u32 = 240;
pub const DEFAULT_FPS: u32 = 30;
pub const MAX_FPS: u32 = 240;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Meter error: {0}")]
    Meter(#[from] ConfigurationError),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// General options
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// link to the controller
    pub connection: Option<ConnectionSection>,
    /// where and how fast the panel is painted
    pub surface: Option<SurfaceSection>,
    /// meter tuning, replaces the defaults field by field
    pub meter: Option<MeterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConnectionSection {
    pub endpoint: Option<String>,      // e.g. "ws://192.168.4.1/ws"
    pub reconnect_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SurfaceSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub snapshot: Option<PathBuf>,     // PPM file, headless when absent
    pub meter_height_fraction: Option<f32>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "swrpanel", about = "Remote panel for the ESP32 SWR controller", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Controller websocket, ws://host[:port]/path
    #[arg(long, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,
    #[arg(long)]
    pub reconnect_ms: Option<u64>,
    #[arg(long)]
    pub fps: Option<u32>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    /// Mirror the panel into this PPM image
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
    /// Send this action once connected (repeatable)
    #[arg(long = "action", action = ArgAction::Append)]
    pub actions: Vec<String>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Quit when stdin closes instead of only stopping click input
    #[arg(long, action = ArgAction::SetTrue)]
    pub exit_on_eof: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge, apply `cli`, validate.
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

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // project local
    for candidate in &["swrpanel.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    // XDG-style: ~/.config/swrpanel/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/swrpanel/config.yaml");
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
    // top-level
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.meter.is_some()          { dst.meter = src.meter; }
    // connection
    match (&mut dst.connection, src.connection) {
        (None, Some(c)) => dst.connection = Some(c),
        (Some(d), Some(s)) => merge_connection(d, s),
        _ => {}
    }
    // surface
    match (&mut dst.surface, src.surface) {
        (None, Some(c)) => dst.surface = Some(c),
        (Some(d), Some(s)) => merge_surface(d, s),
        _ => {}
    }
}

fn merge_connection(dst: &mut ConnectionSection, src: ConnectionSection) {
    if src.endpoint.is_some()       { dst.endpoint = src.endpoint; }
    if src.reconnect_ms.is_some()   { dst.reconnect_ms = src.reconnect_ms; }
}

fn merge_surface(dst: &mut SurfaceSection, src: SurfaceSection) {
    if src.width.is_some()          { dst.width = src.width; }
    if src.height.is_some()         { dst.height = src.height; }
    if src.fps.is_some()            { dst.fps = src.fps; }
    if src.snapshot.is_some()       { dst.snapshot = src.snapshot; }
    if src.meter_height_fraction.is_some() { dst.meter_height_fraction = src.meter_height_fraction; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }

    if (cli.endpoint.is_some() || cli.reconnect_ms.is_some()) && cfg.connection.is_none() {
        cfg.connection = Some(ConnectionSection::default());
    }
    if let Some(conn) = cfg.connection.as_mut() {
        if cli.endpoint.is_some()      { conn.endpoint = cli.endpoint.clone(); }
        if cli.reconnect_ms.is_some()  { conn.reconnect_ms = cli.reconnect_ms; }
    }

    let any_surface = cli.width.is_some()
        || cli.height.is_some()
        || cli.fps.is_some()
        || cli.snapshot.is_some();

    if any_surface && cfg.surface.is_none() {
        cfg.surface = Some(SurfaceSection::default());
    }
    if let Some(surface) = cfg.surface.as_mut() {
        if cli.width.is_some()       { surface.width = cli.width; }
        if cli.height.is_some()      { surface.height = cli.height; }
        if cli.fps.is_some()         { surface.fps = cli.fps; }
        if cli.snapshot.is_some()    { surface.snapshot = cli.snapshot.clone(); }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(conn) = cfg.connection.as_ref() {
        if let Some(endpoint) = conn.endpoint.as_deref() {
            let host = endpoint.strip_prefix("ws://").unwrap_or_default();
            if host.is_empty() || host.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "connection endpoint must look like ws://host/path (got {endpoint:?})"
                )));
            }
        }
        if conn.reconnect_ms == Some(0) {
            return Err(ConfigError::Validation("connection reconnect_ms must be > 0".into()));
        }
    }
    if let Some(surface) = cfg.surface.as_ref() {
        if surface.width == Some(0) || surface.height == Some(0) {
            return Err(ConfigError::Validation("surface width/height must be > 0".into()));
        }
        if let Some(fps) = surface.fps {
            if fps == 0 || fps > MAX_FPS {
                return Err(ConfigError::Validation(format!("surface fps must be 1..={MAX_FPS}")));
            }
        }
        if let Some(f) = surface.meter_height_fraction {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ConfigError::Validation("surface meter_height_fraction must be in (0, 1]".into()));
            }
        }
    }
    if let Some(meter) = cfg.meter.as_ref() {
        meter.validate()?;
    }
    Ok(())
}

// resolved values, defaults filled in
impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        let conn = self.connection.clone().unwrap_or_default();
        ConnectionConfig {
            endpoint: conn.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            reconnect_delay: Duration::from_millis(conn.reconnect_ms.unwrap_or(DEFAULT_RECONNECT_MS)),
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        let s = self.surface.as_ref();
        (
            s.and_then(|s| s.width).unwrap_or(DEFAULT_WIDTH),
            s.and_then(|s| s.height).unwrap_or(DEFAULT_HEIGHT),
        )
    }

    pub fn fps(&self) -> u32 {
        self.surface.as_ref().and_then(|s| s.fps).unwrap_or(DEFAULT_FPS).clamp(1, MAX_FPS)
    }

    pub fn snapshot(&self) -> Option<&Path> {
        self.surface.as_ref().and_then(|s| s.snapshot.as_deref())
    }

    pub fn meter_fraction(&self) -> f32 {
        self.surface
            .as_ref()
            .and_then(|s| s.meter_height_fraction)
            .unwrap_or(DEFAULT_METER_FRACTION)
    }

    pub fn meter_config(&self) -> MeterConfig {
        self.meter.clone().unwrap_or_default()
    }

    /// Pretty YAML of effective config (nice for debugging)
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml_file(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    fn cli_for(file: &tempfile::NamedTempFile, extra: &[&str]) -> Cli {
        let mut args = vec!["swrpanel".to_string(), "--config".into(), file.path().display().to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.log_level(), "info");
        assert_eq!(cfg.surface_size(), (320, 240));
        assert_eq!(cfg.fps(), 30);
        assert_eq!(cfg.snapshot(), None);
        assert_eq!(cfg.meter_fraction(), 0.25);
        assert_eq!(cfg.meter_config(), MeterConfig::default());
        assert_eq!(cfg.connection_config(), ConnectionConfig::default());
    }

    #[test]
    fn test_yaml_then_cli() {
        let file = yaml_file(
            "log_level: debug\n\
             connection:\n  endpoint: ws://10.0.0.7/ws\n  reconnect_ms: 500\n\
             surface:\n  width: 480\n  fps: 20\n\
             meter:\n  segment_count: 20\n",
        );
        let cli = cli_for(&file, &["--fps", "10", "--snapshot", "/tmp/panel.ppm", "--action", "toggle", "--action", "toggle"]);
        let cfg = load_with(&cli).unwrap();

        assert_eq!(cfg.log_level(), "debug");
        let conn = cfg.connection_config();
        assert_eq!(conn.endpoint, "ws://10.0.0.7/ws");
        assert_eq!(conn.reconnect_delay, Duration::from_millis(500));
        assert_eq!(cfg.surface_size(), (480, 240));
        assert_eq!(cfg.fps(), 10);
        assert_eq!(cfg.snapshot(), Some(Path::new("/tmp/panel.ppm")));

        let meter = cfg.meter_config();
        assert_eq!(meter.segment_count, 20);
        assert_eq!(meter.red_segment_count, 2);
        assert_eq!(meter.maximum, 4095.0);

        assert_eq!(cli.actions, vec!["toggle", "toggle"]);
    }

    #[test]
    fn test_cli_endpoint_without_yaml_section() {
        let file = yaml_file("log_level: warn\n");
        let cli = cli_for(&file, &["--endpoint", "ws://panel.local:81/ws"]);
        let cfg = load_with(&cli).unwrap();
        assert_eq!(cfg.connection_config().endpoint, "ws://panel.local:81/ws");
        assert_eq!(cfg.connection_config().reconnect_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_stdin_eof_keeps_running_by_default() {
        let cli = Cli::try_parse_from(["swrpanel"]).unwrap();
        assert!(!cli.exit_on_eof);
        let cli = Cli::try_parse_from(["swrpanel", "--exit-on-eof"]).unwrap();
        assert!(cli.exit_on_eof);
    }

    #[test]
    fn test_missing_explicit_file() {
        let cli = Cli::try_parse_from(["swrpanel", "--config", "/nonexistent/swrpanel.yaml"]).unwrap();
        assert!(matches!(load_with(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_failures() {
        let file = yaml_file("surface:\n  fps: 0\n");
        assert!(matches!(load_with(&cli_for(&file, &[])), Err(ConfigError::Validation(_))));

        let file = yaml_file("connection:\n  endpoint: http://192.168.4.1/ws\n");
        assert!(matches!(load_with(&cli_for(&file, &[])), Err(ConfigError::Validation(_))));

        let file = yaml_file("meter:\n  maximum: 0\n");
        assert!(matches!(
            load_with(&cli_for(&file, &[])),
            Err(ConfigError::Meter(ConfigurationError::Maximum(_)))
        ));

        let file = yaml_file("meter:\n  red_segment_count: 10\n  yellow_segment_count: 10\n");
        assert!(matches!(load_with(&cli_for(&file, &[])), Err(ConfigError::Meter(_))));

        let file = yaml_file("surface:\n  meter_height_fraction: 1.5\n");
        assert!(matches!(load_with(&cli_for(&file, &[])), Err(ConfigError::Validation(_))));

        let file = yaml_file("surface: [1, 2\n");
        assert!(matches!(load_with(&cli_for(&file, &[])), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_dump_round_trips() {
        let file = yaml_file("surface:\n  width: 200\n  height: 100\n");
        let cfg = load_with(&cli_for(&file, &[])).unwrap();
        let back: Config = serde_yaml::from_str(&cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }
}
