use std::path::Path;

use tracing::warn;

use super::types::HuntsmanConfig;
use crate::errors::HuntsmanError;

/// Parse a YAML configuration file into a typed config.
pub async fn parse_config(path: &Path) -> Result<HuntsmanConfig, HuntsmanError> {
    if !path.exists() {
        return Err(HuntsmanError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(HuntsmanError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: HuntsmanConfig = serde_yaml::from_str(&content)?;

    for issue in config.validate() {
        warn!(issue = %issue, "Config warning");
    }

    Ok(config)
}

/// Load configuration: the file if given, defaults otherwise, then
/// environment overrides on top in either case.
pub async fn load_config(path: Option<&Path>) -> Result<HuntsmanConfig, HuntsmanError> {
    let mut config = match path {
        Some(p) => parse_config(p).await?,
        None => HuntsmanConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply HUNTSMAN_* environment variable overrides. Unparseable values are
/// ignored with a warning rather than failing startup.
fn apply_env_overrides(config: &mut HuntsmanConfig) {
    if let Some(dir) = env_var("HUNTSMAN_DATA_DIR") {
        config.storage.data_dir = dir.into();
    }
    if let Some(v) = env_parse::<u64>("HUNTSMAN_MIN_BOUNTY") {
        config.discovery.min_bounty = v;
    }
    if let Some(v) = env_parse::<f64>("HUNTSMAN_MIN_TVL") {
        config.discovery.min_tvl = v;
    }
    if let Some(v) = env_parse::<usize>("HUNTSMAN_MAX_CONCURRENT") {
        config.dispatch.max_concurrent = v;
    }
    if let Some(url) = env_var("HUNTSMAN_BACKEND_URL") {
        config.dispatch.base_url = url;
    }
    if let Some(url) = env_var("HUNTSMAN_WEBHOOK_URL") {
        config.notify.webhook_url = Some(url);
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_var(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}
