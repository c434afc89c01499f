//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [output]
//! path = "live_streams.json"
//! log_format = "json"
//!
//! [resolver]
//! max_results = 5
//! min_viewers_untrusted = 50
//! exclude_title_keywords = ["recorded", "replay"]
//! selection = "rank_order"
//!
//! [[source]]
//! id = "tirupati"
//! name = "Tirumala Tirupati"
//! query = "Tirumala live darshan"
//! trusted_channels = ["UCo5dX9eXM2x7Q3bTNpPmf5Q"]
//!
//! [[source]]
//! id = "shirdi"
//! name = "Shirdi Sai Baba"
//! query = "Shirdi Sai Baba live darshan"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use darshan_core::{validate_sources, ResolverConfig, SelectionPolicy, SourceConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub resolver: ResolverDefaults,

    #[serde(default)]
    pub source: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            log_format: default_log_format(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("live_streams.json")
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverDefaults {
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub min_viewers_untrusted: u64,

    #[serde(default)]
    pub exclude_title_keywords: Vec<String>,

    #[serde(default)]
    pub selection: SelectionPolicy,

    #[serde(default = "default_max_concurrent_searches")]
    pub max_concurrent_searches: usize,
}

impl Default for ResolverDefaults {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            request_timeout_ms: default_request_timeout_ms(),
            min_viewers_untrusted: 0,
            exclude_title_keywords: Vec::new(),
            selection: SelectionPolicy::default(),
            max_concurrent_searches: default_max_concurrent_searches(),
        }
    }
}

fn default_max_results() -> u32 {
    5
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrent_searches() -> usize {
    1
}

impl ResolverDefaults {
    pub fn to_resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_max_results(self.max_results)
            .with_request_timeout(self.request_timeout_ms)
            .with_min_viewers_untrusted(self.min_viewers_untrusted)
            .with_exclude_title_keywords(self.exclude_title_keywords.clone())
            .with_selection(self.selection)
            .with_max_concurrent_searches(self.max_concurrent_searches)
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.source.is_empty() {
            return Err("No sources configured".into());
        }

        validate_sources(&self.source).map_err(|e| e.to_string())?;

        match self.output.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[[source]]
id = "tirupati"
name = "Tirumala Tirupati"
query = "Tirumala live darshan"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.source.len(), 1);
        assert_eq!(config.source[0].id, "tirupati");
        assert!(config.source[0].trusted_channels.is_empty());
        assert_eq!(config.output.path, PathBuf::from("live_streams.json"));
        assert_eq!(config.output.log_format, "pretty");
        assert_eq!(config.resolver.max_results, 5);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[output]
path = "docs/live_streams.json"
log_format = "json"

[resolver]
max_results = 10
request_timeout_ms = 15000
min_viewers_untrusted = 50
exclude_title_keywords = ["recorded", "replay"]
selection = "most_viewers"
max_concurrent_searches = 4

[[source]]
id = "tirupati"
name = "Tirumala Tirupati"
query = "Tirumala live darshan"
trusted_channels = ["UCttd"]

[[source]]
id = "shirdi"
name = "Shirdi Sai Baba"
query = "Shirdi live darshan"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.output.path, PathBuf::from("docs/live_streams.json"));
        assert_eq!(config.output.log_format, "json");
        assert_eq!(config.source.len(), 2);
        assert_eq!(config.source[0].trusted_channels, vec!["UCttd"]);

        let rc = config.resolver.to_resolver_config();
        assert_eq!(rc.max_results, 10);
        assert_eq!(rc.request_timeout.as_millis(), 15000);
        assert_eq!(rc.min_viewers_untrusted, 50);
        assert_eq!(rc.selection, SelectionPolicy::MostViewers);
        assert_eq!(rc.max_concurrent_searches, 4);
    }

    #[test]
    fn validate_rejects_duplicate_source_ids() {
        let toml = r#"
[[source]]
id = "same"
name = "A"
query = "a live"

[[source]]
id = "same"
name = "B"
query = "b live"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Duplicate source id"), "{}", err);
    }

    #[test]
    fn validate_rejects_empty_source_list() {
        let config: AppConfig = toml::from_str("").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("No sources"), "{}", err);
    }

    #[test]
    fn validate_rejects_empty_query() {
        let toml = r#"
[[source]]
id = "kashi"
name = "Kashi Vishwanath"
query = ""
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("empty search query"), "{}", err);
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let toml = r#"
[output]
log_format = "xml"

[[source]]
id = "ok"
name = "Ok"
query = "ok live"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log_format"), "{}", err);
    }
}
