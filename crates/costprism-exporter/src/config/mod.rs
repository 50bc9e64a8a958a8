//! Exporter config loader.
//!
//! Layers, later wins: built-in defaults, an optional YAML file (strict
//! parsing), then environment variables. Validation runs once on the merged
//! result; any error is fatal at startup.

pub mod schema;

use std::fs;

use costprism_core::error::{ExporterError, Result};
use costprism_core::metric::MetricId;

pub use schema::{ExporterConfig, MetricsSection, RefreshSection, ServerSection};

/// Env var naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "COSTPRISM_CONFIG";

const QUERY_PERIOD_ENV: &str = "QUERY_PERIOD";
const INITIAL_DELAY_ENV: &str = "INITIAL_DELAY";
const QUERY_TIMEOUT_ENV: &str = "QUERY_TIMEOUT";
const LISTEN_ADDR_ENV: &str = "LISTEN_ADDR";
const SELF_METRICS_ENV: &str = "EXPORTER_SELF_METRICS";

/// Load from the process environment.
pub fn load() -> Result<ExporterConfig> {
    load_from_vars(std::env::vars())
}

/// Load from an explicit set of environment-style pairs.
pub fn load_from_vars<I>(vars: I) -> Result<ExporterConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars.into_iter().collect();
    let mut cfg = match lookup(&vars, CONFIG_PATH_ENV) {
        Some(path) => parse_file(path)?,
        None => ExporterConfig::default(),
    };
    apply_env(&mut cfg, &vars)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let cfg = parse_file(path)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ExporterError::Configuration(format!("read config {path} failed: {e}")))?;
    parse_str(&s)
}

fn parse_str(s: &str) -> Result<ExporterConfig> {
    serde_yaml::from_str(s).map_err(|e| ExporterError::Configuration(format!("invalid yaml: {e}")))
}

/// Overlay environment values onto `cfg`. Metric flags are presence flags:
/// a non-empty value turns the gauge on, an empty or missing one leaves it.
pub fn apply_env(cfg: &mut ExporterConfig, vars: &[(String, String)]) -> Result<()> {
    if let Some(v) = lookup(vars, QUERY_PERIOD_ENV) {
        cfg.refresh.query_period_secs = parse_secs(QUERY_PERIOD_ENV, v)?;
    }
    if let Some(v) = lookup(vars, INITIAL_DELAY_ENV) {
        cfg.refresh.initial_delay_secs = parse_secs(INITIAL_DELAY_ENV, v)?;
    }
    if let Some(v) = lookup(vars, QUERY_TIMEOUT_ENV) {
        cfg.refresh.query_timeout_secs = parse_secs(QUERY_TIMEOUT_ENV, v)?;
    }
    if let Some(v) = lookup(vars, LISTEN_ADDR_ENV) {
        cfg.server.listen = v.to_string();
    }
    if lookup(vars, SELF_METRICS_ENV).is_some() {
        cfg.server.self_metrics = true;
    }
    for id in MetricId::ALL {
        if lookup(vars, id.env_key()).is_some() {
            cfg.metrics.enable(id);
        }
    }
    Ok(())
}

/// Last non-empty value for `key`.
fn lookup<'a>(vars: &'a [(String, String)], key: &str) -> Option<&'a str> {
    vars.iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_secs(key: &str, v: &str) -> Result<u64> {
    v.parse::<u64>().map_err(|e| {
        ExporterError::Configuration(format!("{key} must be a whole number of seconds, got {v:?}: {e}"))
    })
}
