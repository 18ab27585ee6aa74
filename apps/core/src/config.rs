use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::Category;

pub const CONFIG_FILE_NAME: &str = "config.json5";
pub const LEARNING_DB_FILE_NAME: &str = "learning.sqlite3";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_results: u16,
    pub search_apps: bool,
    pub search_documents: bool,
    pub search_settings: bool,
    pub search_folders: bool,
    pub document_search_enabled: bool,
    pub searched_folders: Vec<PathBuf>,
    pub content_search_enabled: bool,
    pub max_content_search_bytes: u64,
    pub per_directory_cap: usize,
    pub min_document_query_len: usize,
    pub directory_batch_size: usize,
    pub debounce_ms: u64,
    pub learning_db_path: PathBuf,
    // Tables must follow plain values for TOML output.
    pub synonyms: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            max_results: 20,
            search_apps: true,
            search_documents: true,
            search_settings: true,
            search_folders: true,
            document_search_enabled: true,
            searched_folders: default_searched_folders(),
            content_search_enabled: false,
            max_content_search_bytes: 1024 * 1024,
            per_directory_cap: 5,
            min_document_query_len: 2,
            directory_batch_size: 50,
            debounce_ms: 150,
            learning_db_path: base.join(LEARNING_DB_FILE_NAME),
            synonyms: crate::synonyms::default_table(),
            config_path: base.join(CONFIG_FILE_NAME),
        }
    }
}

/// Individually observable configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    MaxResults,
    CategoryFlags,
    DocumentSearch,
    SearchedFolders,
    ContentSearch,
    MaxContentSearchBytes,
    ScanLimits,
    Debounce,
    Synonyms,
    LearningDbPath,
}

impl Config {
    pub fn category_enabled(&self, category: Category) -> bool {
        match category {
            Category::All => true,
            Category::Apps => self.search_apps,
            Category::Documents => self.search_documents,
            Category::Settings => self.search_settings,
            Category::Folders => self.search_folders,
        }
    }

    pub fn changed_keys(&self, other: &Config) -> Vec<ConfigKey> {
        let mut changed = Vec::new();
        if self.max_results != other.max_results {
            changed.push(ConfigKey::MaxResults);
        }
        if (
            self.search_apps,
            self.search_documents,
            self.search_settings,
            self.search_folders,
        ) != (
            other.search_apps,
            other.search_documents,
            other.search_settings,
            other.search_folders,
        ) {
            changed.push(ConfigKey::CategoryFlags);
        }
        if self.document_search_enabled != other.document_search_enabled {
            changed.push(ConfigKey::DocumentSearch);
        }
        if self.searched_folders != other.searched_folders {
            changed.push(ConfigKey::SearchedFolders);
        }
        if self.content_search_enabled != other.content_search_enabled {
            changed.push(ConfigKey::ContentSearch);
        }
        if self.max_content_search_bytes != other.max_content_search_bytes {
            changed.push(ConfigKey::MaxContentSearchBytes);
        }
        if (
            self.per_directory_cap,
            self.min_document_query_len,
            self.directory_batch_size,
        ) != (
            other.per_directory_cap,
            other.min_document_query_len,
            other.directory_batch_size,
        ) {
            changed.push(ConfigKey::ScanLimits);
        }
        if self.debounce_ms != other.debounce_ms {
            changed.push(ConfigKey::Debounce);
        }
        if self.synonyms != other.synonyms {
            changed.push(ConfigKey::Synonyms);
        }
        if self.learning_db_path != other.learning_db_path {
            changed.push(ConfigKey::LearningDbPath);
        }
        changed
    }
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.max_results < 5 || cfg.max_results > 100 {
        return Err(ConfigError::Invalid(
            "max_results must be between 5 and 100".into(),
        ));
    }

    if cfg.per_directory_cap == 0 {
        return Err(ConfigError::Invalid("per_directory_cap must be positive".into()));
    }

    if cfg.directory_batch_size == 0 {
        return Err(ConfigError::Invalid(
            "directory_batch_size must be positive".into(),
        ));
    }

    if cfg.debounce_ms > 2_000 {
        return Err(ConfigError::Invalid("debounce_ms must be at most 2000".into()));
    }

    if cfg.learning_db_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("learning_db_path is required".into()));
    }

    Ok(())
}

/// Reads the config file (TOML for `.toml`, JSON5 otherwise). A missing file
/// yields defaults bound to that path.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stable_app_data_dir().join(CONFIG_FILE_NAME));

    let mut config = match std::fs::read_to_string(&config_path) {
        Ok(raw) => parse(&raw, &config_path)?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_path,
                source,
            })
        }
    };
    config.config_path = config_path;
    validate(&config)?;
    Ok(config)
}

pub fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    let parsed = if is_toml(path) {
        toml::from_str::<Config>(raw).map_err(|error| error.to_string())
    } else {
        json5::from_str::<Config>(raw).map_err(|error| error.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg)?;
    let rendered = if is_toml(&cfg.config_path) {
        toml::to_string_pretty(cfg).map_err(|error| ConfigError::Serialize(error.to_string()))?
    } else {
        serde_json::to_string_pretty(cfg)
            .map_err(|error| ConfigError::Serialize(error.to_string()))?
    };

    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&cfg.config_path, rendered).map_err(|source| ConfigError::Write {
        path: cfg.config_path.clone(),
        source,
    })
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

pub fn stable_app_data_dir() -> PathBuf {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(config_home).join("lumen");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".config").join("lumen");
    }
    std::env::temp_dir().join("lumen")
}

fn default_searched_folders() -> Vec<PathBuf> {
    match std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        Some(home) => {
            let home = PathBuf::from(home);
            vec![home.join("Documents"), home.join("Desktop")]
        }
        None => Vec::new(),
    }
}
