use dirs::Dirs;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

static CONFIG: OnceCell<ConfigInner> = OnceCell::new();

#[derive(Debug)]
struct ConfigInner {
    config: Config,
    file_path: Option<PathBuf>,
}

struct LoadedConfig {
    config: Config,
    file_path: Option<PathBuf>,
    maybe_error: Option<toml::de::Error>,
}

fn load_config(specified_config_file: Option<PathBuf>) -> LoadedConfig {
    // Linux: ~/.config/wordmark/config.toml
    // macOS: ~/Library/Application\ Support/org.wordmark.Wordmark/config.toml
    let Some(config_file) = specified_config_file.or_else(Dirs::config_file) else {
        return LoadedConfig {
            config: Config::default(),
            file_path: None,
            maybe_error: None,
        };
    };

    let mut maybe_error = None;
    let config = match std::fs::read_to_string(&config_file) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            maybe_error.replace(err);
            Config::default()
        }),
        Err(err) => {
            tracing::debug!(?err, ?config_file, "Config file unreadable, using the defaults");
            Config::default()
        }
    };

    LoadedConfig {
        config,
        file_path: Some(config_file),
        maybe_error,
    }
}

/// Initializes the global [`Config`], a later call returns the config loaded first.
///
/// The parse error, if any, is returned so that the caller can surface it.
pub fn load_config_on_startup(
    specified_config_file: Option<PathBuf>,
) -> (&'static Config, Option<toml::de::Error>) {
    let mut maybe_error = None;

    let inner = CONFIG.get_or_init(|| {
        let LoadedConfig {
            config,
            file_path,
            maybe_error: error,
        } = load_config(specified_config_file);
        maybe_error = error;
        ConfigInner { config, file_path }
    });

    (&inner.config, maybe_error)
}

/// [`Config`] is a global singleton, initialized explicitly with [`load_config_on_startup`].
/// When read before that, it is loaded from the default config file location.
pub fn config() -> &'static Config {
    &CONFIG
        .get_or_init(|| {
            let LoadedConfig {
                config, file_path, ..
            } = load_config(None);
            ConfigInner { config, file_path }
        })
        .config
}

pub fn config_file() -> Option<&'static PathBuf> {
    CONFIG.get().and_then(|inner| inner.file_path.as_ref())
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LogConfig {
    /// Specify the log file path.
    ///
    /// This path must be an absolute path, no log is written if unset.
    pub log_file: Option<String>,

    /// Specify the max log level.
    pub max_level: String,

    /// Specify the log target to enable more detailed logging.
    ///
    /// ```toml
    /// [log]
    /// log-target = "wordmark_core::service=trace,mark_store=debug"
    /// ```
    pub log_target: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            max_level: "debug".into(),
            log_target: "".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HighlightConfig {
    /// Base color of the highlight palette, used until the user picks one.
    pub base_color: String,

    /// Delay in milliseconds between the end of a selection and the highlight.
    pub debounce_ms: u64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            base_color: "yellow".into(),
            debounce_ms: 250,
        }
    }
}

impl HighlightConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Specify the file the word marks are persisted to.
    ///
    /// Defaults to `word_marks.json` in the project data directory.
    pub data_file: Option<String>,
}

impl StorageConfig {
    pub fn data_file_path(&self) -> Option<PathBuf> {
        self.data_file
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Log configuration.
    pub log: LogConfig,

    /// Highlight configuration.
    pub highlight: HighlightConfig,

    /// Persistence configuration.
    pub storage: StorageConfig,
}
