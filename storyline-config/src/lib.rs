//! Loader for Storyline configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (every field has one, an empty file is valid)
//! 2. YAML files and inline snippets, in the order they were attached
//! 3. `STORYLINE_`-prefixed environment variables, nested with `__`
//!    (`STORYLINE_EXTRACT__LIMIT=4` sets `extract.limit`)
//!
//! String values may reference other environment variables as `${VAR}`;
//! they are expanded recursively before the typed structs are built.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use storyline_common::StorylineError;
use storyline_common::observability::{LogConfig, LogFormat};
use url::Url;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "STORYLINE";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorylineConfig {
    pub source: SourceConfig,
    pub extract: ExtractConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Where the page comes from and how hard we try to get it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site root; relative story links are resolved against it.
    pub base_url: String,
    /// Page to fetch, relative to `base_url`.
    pub path: String,
    pub timeout_secs: u64,
    pub retries: usize,
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://time.com".into(),
            path: "/".into(),
            timeout_secs: 15,
            retries: 2,
            user_agent: None,
        }
    }
}

impl SourceConfig {
    pub fn base(&self) -> Result<Url, StorylineError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            StorylineError::Config(format!("source.base_url {:?}: {e}", self.base_url))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(StorylineError::Config(format!(
                "source.base_url must be http or https, got {other}"
            ))),
        }
    }
}

/// Knobs for the heading/anchor scanner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub heading_tag: String,
    pub label_tag: String,
    pub limit: usize,
    pub min_title_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            heading_tag: "h3".into(),
            label_tag: "span".into(),
            limit: 6,
            min_title_chars: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub page_file: PathBuf,
    pub stories_file: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_file: "site.txt".into(),
            stories_file: "stories.json".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".into(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, StorylineError> {
        self.bind
            .parse()
            .map_err(|e| StorylineError::Config(format!("server.bind {:?}: {e}", self.bind)))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub stderr: bool,
    pub dir: Option<PathBuf>,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            stderr: true,
            dir: None,
            filter: "info".into(),
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

impl StorylineConfig {
    /// Reject settings the scanner or server cannot work with.
    ///
    /// ```
    /// use storyline_config::StorylineConfig;
    ///
    /// let mut cfg = StorylineConfig::default();
    /// assert!(cfg.validate().is_ok());
    ///
    /// cfg.extract.limit = 0;
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), StorylineError> {
        self.source.base()?;
        self.server.addr()?;
        if self.extract.limit == 0 {
            return Err(StorylineError::Config(
                "extract.limit must be at least 1".into(),
            ));
        }
        for (key, tag) in [
            ("extract.heading_tag", &self.extract.heading_tag),
            ("extract.label_tag", &self.extract.label_tag),
        ] {
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(StorylineError::Config(format!(
                    "{key} must be a plain tag name, got {tag:?}"
                )));
            }
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct StorylineConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for StorylineConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl StorylineConfigLoader {
    /// Start from the built-in defaults.
    ///
    /// ```
    /// use storyline_config::StorylineConfigLoader;
    ///
    /// let config = StorylineConfigLoader::new()
    ///     .with_yaml_str("extract:\n  limit: 4")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.extract.limit, 4);
    /// assert_eq!(config.extract.heading_tag, "h3");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the `config` crate infers
    /// format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing, so deployments can rely
    /// purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use storyline_config::StorylineConfigLoader;
    ///
    /// let cfg = StorylineConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// source:
    ///   base_url: "https://example.com"
    /// extract:
    ///   heading_tag: "h2"
    ///   limit: 10
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.source.base_url, "https://example.com");
    /// assert_eq!(cfg.extract.heading_tag, "h2");
    /// assert_eq!(cfg.extract.limit, 10);
    /// assert_eq!(cfg.cache.page_file.to_str(), Some("site.txt"));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Environment overrides are attached last so they win over files, and
    /// `${VAR}` placeholders are expanded before the structs are materialised.
    ///
    /// ```
    /// use storyline_config::StorylineConfigLoader;
    ///
    /// unsafe { std::env::set_var("NEWS_SITE", "https://news.example.org"); }
    ///
    /// let config = StorylineConfigLoader::new()
    ///     .with_yaml_str("source:\n  base_url: \"${NEWS_SITE}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.source.base_url, "https://news.example.org");
    ///
    /// unsafe { std::env::remove_var("NEWS_SITE"); }
    /// ```
    pub fn load(self) -> Result<StorylineConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: StorylineConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn defaults_match_the_home_page_shape() {
        let cfg = StorylineConfig::default();
        assert_eq!(cfg.source.base_url, "https://time.com");
        assert_eq!(cfg.extract.heading_tag, "h3");
        assert_eq!(cfg.extract.label_tag, "span");
        assert_eq!(cfg.extract.limit, 6);
        assert_eq!(cfg.extract.min_title_chars, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_base() {
        let mut cfg = StorylineConfig::default();
        cfg.source.base_url = "ftp://time.com".into();
        assert!(matches!(cfg.validate(), Err(StorylineError::Config(_))));
    }

    #[test]
    fn rejects_tag_names_with_markup() {
        let mut cfg = StorylineConfig::default();
        cfg.extract.heading_tag = "<h3>".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unparsable_bind() {
        let mut cfg = StorylineConfig::default();
        cfg.server.bind = "localhost".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn logging_section_maps_onto_log_config() {
        let logging = LoggingConfig {
            format: LogFormat::Json,
            stderr: false,
            dir: Some("/tmp/storyline-logs".into()),
            filter: "debug".into(),
        };
        let log = logging.to_log_config("storyline-tests");
        assert_eq!(log.app_name, "storyline-tests");
        assert_eq!(log.format, LogFormat::Json);
        assert!(!log.emit_stderr);
        assert_eq!(log.default_filter, "debug");
    }
}
