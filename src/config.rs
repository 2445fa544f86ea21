use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding the database and the audio blob tree.
    pub data_dir: PathBuf,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Transcription API base URL.
    pub endpoint: String,
    /// API key (or set SPEAKERSPLIT_API_KEY environment variable).
    pub api_key: String,
    /// Seconds between transcript status polls.
    pub poll_interval_secs: u64,
    /// Overall deadline for one transcription job, in seconds.
    pub deadline_secs: u64,
}

impl fmt::Debug for TranscriptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("deadline_secs", &self.deadline_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Default expected speaker count when --speakers is not given.
    pub default_speakers: u32,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            transcription: TranscriptionConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("speakersplit");
        Self { data_dir }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.assemblyai.com".to_string(),
            api_key: String::new(),
            poll_interval_secs: 3,
            deadline_secs: 600,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            default_speakers: 2,
        }
    }
}

// --- Derived paths ---

impl Config {
    /// SQLite database file location.
    pub fn db_path(&self) -> PathBuf {
        self.storage.data_dir.join("conversations.db")
    }

    /// Root of the audio blob tree.
    pub fn blob_root(&self) -> PathBuf {
        self.storage.data_dir.join("audio_storage")
    }
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Check explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Check beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            let beside_exe = exe_path.parent().map(|p| p.join("speakersplit.toml"));
            if let Some(p) = beside_exe {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Check platform config directory
        if let Some(config_dir) = dirs::config_dir() {
            let platform_config = config_dir.join("speakersplit").join("config.toml");
            if platform_config.exists() {
                let content = std::fs::read_to_string(&platform_config)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(platform_config)));
            }
        }

        // 4. Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        let default_data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("speakersplit");
        let data_dir_str = default_data_dir.to_string_lossy().replace('\\', "\\\\");

        format!(
            r#"# speakersplit configuration
# Edit this file to customize storage and transcription settings.

[storage]
# Root directory for the conversation database and audio blob tree.
data_dir = "{data_dir}"

[transcription]
# Transcription API base URL.
endpoint = "https://api.assemblyai.com"
# API key (or set SPEAKERSPLIT_API_KEY environment variable).
# api_key = ""
# Seconds between transcript status polls.
poll_interval_secs = 3
# Overall deadline for one transcription job, in seconds.
deadline_secs = 600

[processing]
# Default expected speaker count when --speakers is not given.
default_speakers = 2
"#,
            data_dir = data_dir_str
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.transcription.endpoint, "https://api.assemblyai.com");
        assert_eq!(config.transcription.poll_interval_secs, 3);
        assert_eq!(config.transcription.deadline_secs, 600);
        assert_eq!(config.processing.default_speakers, 2);
        assert!(config.db_path().ends_with("conversations.db"));
        assert!(config.blob_root().ends_with("audio_storage"));
    }

    #[test]
    fn test_parse_toml_config_applies_defaults() {
        let toml_str = r#"
            [transcription]
            poll_interval_secs = 10
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.transcription.poll_interval_secs, 10);
        // Defaults still applied for unspecified fields
        assert_eq!(config.transcription.deadline_secs, 600);
        assert_eq!(config.processing.default_speakers, 2);
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_str = r#"
            [storage]
            data_dir = "/tmp/speakersplit"

            [transcription]
            endpoint = "https://api.example.com"
            api_key = "test-key"
            poll_interval_secs = 1
            deadline_secs = 120

            [processing]
            default_speakers = 3
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/speakersplit"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/speakersplit/conversations.db"));
        assert_eq!(config.transcription.api_key, "test-key");
        assert_eq!(config.processing.default_speakers, 3);
    }

    #[test]
    fn test_load_nonexistent_path_errors() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_path_returns_resolved_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config_file = tmp.path().join("speakersplit.toml");
        std::fs::write(&config_file, "[processing]\ndefault_speakers = 4\n").unwrap();

        let (config, resolved) = Config::load_with_path(Some(config_file.as_path())).unwrap();
        assert_eq!(config.processing.default_speakers, 4);
        assert_eq!(resolved, Some(config_file));
    }

    #[test]
    fn test_generate_default_commented_is_valid_toml() {
        let content = Config::generate_default_commented();
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.transcription.poll_interval_secs, 3);
        assert_eq!(config.processing.default_speakers, 2);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = TranscriptionConfig {
            api_key: "super-secret-key-12345".to_string(),
            ..Default::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
