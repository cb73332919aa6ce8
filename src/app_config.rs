use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Chunking settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Fallback duration estimator settings
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Speech synthesis collaborator settings
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Script loading settings
    #[serde(default)]
    pub script: ScriptConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech synthesis provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    // @provider: VOICEVOX engine over HTTP
    #[default]
    Voicevox,
    // @provider: No synthesis, every chunk is estimated
    DryRun,
}

impl SynthesisProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Voicevox => "VOICEVOX",
            Self::DryRun => "Dry run",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Voicevox => "voicevox".to_string(),
            Self::DryRun => "dryrun".to_string(),
        }
    }
}

impl std::fmt::Display for SynthesisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for SynthesisProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "voicevox" => Ok(Self::Voicevox),
            "dryrun" | "dry-run" => Ok(Self::DryRun),
            _ => Err(anyhow!("Invalid synthesis provider: {}", s)),
        }
    }
}

/// How narration text is cut into chunks
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk (one subtitle window, one synthesis call)
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Sentences shorter than this are merged with the next one when they fit
    #[serde(default = "default_min_merge_chars")]
    pub min_merge_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            min_merge_chars: default_min_merge_chars(),
        }
    }
}

/// Speaking-rate constants for the fallback estimator
///
/// The defaults are tuned for Japanese narration, where one kana is one mora.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Phonetic units spoken per second
    #[serde(default = "default_units_per_second")]
    pub units_per_second: f64,

    /// Units counted for one kanji
    #[serde(default = "default_kanji_units")]
    pub kanji_units: f64,

    /// Units counted for one latin letter or digit
    #[serde(default = "default_latin_units")]
    pub latin_units: f64,

    /// Pause added per sentence terminator
    #[serde(default = "default_sentence_pause_secs")]
    pub sentence_pause_secs: f64,

    /// Pause added per clause mark
    #[serde(default = "default_clause_pause_secs")]
    pub clause_pause_secs: f64,

    /// Lower bound of any estimate
    #[serde(default = "default_min_seconds")]
    pub min_seconds: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            units_per_second: default_units_per_second(),
            kanji_units: default_kanji_units(),
            latin_units: default_latin_units(),
            sentence_pause_secs: default_sentence_pause_secs(),
            clause_pause_secs: default_clause_pause_secs(),
            min_seconds: default_min_seconds(),
        }
    }
}

/// Speech synthesis collaborator configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SynthesisConfig {
    /// Synthesizer to call
    #[serde(default)]
    pub provider: SynthesisProvider,

    /// Service endpoint URL
    #[serde(default = "default_voicevox_endpoint")]
    pub endpoint: String,

    /// Speaker used when a part does not name one
    #[serde(default = "default_speaker")]
    pub default_speaker: u32,

    /// Maximum number of synthesis calls in flight
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Per-chunk timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::default(),
            endpoint: default_voicevox_endpoint(),
            default_speaker: default_speaker(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Script document loading options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScriptConfig {
    /// Narrate the script title as the first part
    #[serde(default = "default_true")]
    pub narrate_title: bool,

    /// Drop blank parts instead of failing on them
    #[serde(default = "default_true")]
    pub skip_empty_parts: bool,

    /// Only keep the first N parts (useful while iterating on a script)
    #[serde(default)]
    pub max_parts: Option<usize>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            narrate_title: true,
            skip_empty_parts: true,
            max_parts: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_max_chars() -> usize {
    45
}

fn default_min_merge_chars() -> usize {
    15
}

fn default_units_per_second() -> f64 {
    7.5
}

fn default_kanji_units() -> f64 {
    2.0
}

fn default_latin_units() -> f64 {
    0.4
}

fn default_sentence_pause_secs() -> f64 {
    0.35
}

fn default_clause_pause_secs() -> f64 {
    0.15
}

fn default_min_seconds() -> f64 {
    0.3
}

fn default_voicevox_endpoint() -> String {
    "http://localhost:50021".to_string()
}

fn default_speaker() -> u32 {
    3 // Zundamon
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file, creating it with defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chars == 0 {
            return Err(anyhow!("chunking.max_chars must be greater than zero"));
        }

        let estimator = &self.estimator;
        if !(estimator.units_per_second.is_finite() && estimator.units_per_second > 0.0) {
            return Err(anyhow!("estimator.units_per_second must be a positive number"));
        }
        if !(estimator.min_seconds.is_finite() && estimator.min_seconds > 0.0) {
            return Err(anyhow!("estimator.min_seconds must be a positive number"));
        }
        for (name, value) in [
            ("kanji_units", estimator.kanji_units),
            ("latin_units", estimator.latin_units),
            ("sentence_pause_secs", estimator.sentence_pause_secs),
            ("clause_pause_secs", estimator.clause_pause_secs),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(anyhow!("estimator.{} must not be negative", name));
            }
        }

        if self.synthesis.concurrent_requests == 0 {
            return Err(anyhow!("synthesis.concurrent_requests must be at least 1"));
        }
        if self.synthesis.timeout_secs == 0 {
            return Err(anyhow!("synthesis.timeout_secs must be at least 1"));
        }
        if self.synthesis.provider == SynthesisProvider::Voicevox {
            url::Url::parse(&self.synthesis.endpoint)
                .with_context(|| format!("Invalid synthesis endpoint: {}", self.synthesis.endpoint))?;
        }

        if self.script.max_parts == Some(0) {
            return Err(anyhow!("script.max_parts must be at least 1 when set"));
        }

        Ok(())
    }
}
