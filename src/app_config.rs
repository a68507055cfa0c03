use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

use crate::synthesis::timeline::TICKS_PER_SECOND;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Speech engine connection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Voice used for every segment
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Segmentation, retry, timing and caption settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Output artifact settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech engine type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineProvider {
    // @provider: Streaming HTTP bridge to the TTS engine
    #[default]
    Http,
    // @provider: Offline engine producing synthetic audio
    Mock,
}

impl EngineProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Http => "HTTP",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Http => "http".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for EngineProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for EngineProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid engine provider: {}", s)),
        }
    }
}

/// Engine connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    // @field: Engine type
    #[serde(default)]
    pub provider: EngineProvider,

    // @field: Engine base URL
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds for one synthesis call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: EngineProvider::default(),
            endpoint: default_engine_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Voice settings passed to the engine
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VoiceConfig {
    /// Engine voice identifier (e.g. "pt-BR-FranciscaNeural")
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Speaking rate adjustment (e.g. "+10%")
    #[serde(default = "default_rate")]
    pub rate: String,

    /// Pitch adjustment (e.g. "-5Hz")
    #[serde(default = "default_pitch")]
    pub pitch: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            rate: default_rate(),
            pitch: default_pitch(),
        }
    }
}

/// Tunables of the caption-synthesis pipeline
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Character budget per engine call
    #[serde(default = "default_max_segment_chars")]
    pub max_segment_chars: usize,

    /// Additional attempts per segment after the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between attempts, doubled on each retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Estimated speaking time per character when the engine returns no timing.
    /// Calibration value; observed values range from 500_000 to 800_000 ticks.
    #[serde(default = "default_fallback_ticks_per_char")]
    pub fallback_ticks_per_char: u64,

    /// Silence inserted between consecutive segments on the timeline
    #[serde(default = "default_inter_segment_gap_ticks")]
    pub inter_segment_gap_ticks: u64,

    /// Hard upper bound of words per caption
    #[serde(default = "default_max_words_per_caption")]
    pub max_words_per_caption: usize,

    /// Words a caption needs before sentence punctuation may close it
    #[serde(default = "default_min_words_before_sentence_break")]
    pub min_words_before_sentence_break: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_segment_chars: default_max_segment_chars(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            fallback_ticks_per_char: default_fallback_ticks_per_char(),
            inter_segment_gap_ticks: default_inter_segment_gap_ticks(),
            max_words_per_caption: default_max_words_per_caption(),
            min_words_before_sentence_break: default_min_words_before_sentence_break(),
        }
    }
}

/// Output artifact settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Length of the placeholder caption used when no caption was produced
    #[serde(default = "default_placeholder_duration_ticks")]
    pub placeholder_duration_ticks: u64,

    /// Also write the JSON response envelope next to the audio
    #[serde(default)]
    pub write_json_envelope: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            placeholder_duration_ticks: default_placeholder_duration_ticks(),
            write_json_envelope: false,
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
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_engine_endpoint() -> String {
    "http://localhost:5050".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_voice() -> String {
    "pt-BR-FranciscaNeural".to_string()
}

fn default_rate() -> String {
    "+0%".to_string()
}

fn default_pitch() -> String {
    "+0Hz".to_string()
}

fn default_max_segment_chars() -> usize {
    250
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_fallback_ticks_per_char() -> u64 {
    800_000 // 80 ms per character
}

fn default_inter_segment_gap_ticks() -> u64 {
    1_000_000 // 100 ms
}

fn default_max_words_per_caption() -> usize {
    6
}

fn default_min_words_before_sentence_break() -> usize {
    3
}

fn default_placeholder_duration_ticks() -> u64 {
    TICKS_PER_SECOND
}

/// Map an engine adjustment to `None` when it is empty or neutral.
///
/// Neutral values such as `+0%` or `+0Hz` are never forwarded to the engine.
pub fn normalize_adjustment(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let magnitude = trimmed
        .trim_start_matches(['+', '-'])
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');

    match magnitude.parse::<f64>() {
        Ok(number) if number == 0.0 => None,
        _ => Some(trimmed.to_string()),
    }
}

impl Config {
    /// Load a configuration file, or write and return the default one when
    /// the path does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            log::warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.voice.voice.trim().is_empty() {
            return Err(anyhow!("A voice identifier is required"));
        }

        let pipeline = &self.pipeline;
        if pipeline.max_segment_chars == 0 {
            return Err(anyhow!("max_segment_chars must be greater than zero"));
        }
        if pipeline.max_words_per_caption == 0 {
            return Err(anyhow!("max_words_per_caption must be greater than zero"));
        }
        if pipeline.min_words_before_sentence_break >= pipeline.max_words_per_caption {
            return Err(anyhow!(
                "min_words_before_sentence_break ({}) must be smaller than max_words_per_caption ({})",
                pipeline.min_words_before_sentence_break,
                pipeline.max_words_per_caption
            ));
        }

        if self.engine.provider == EngineProvider::Http {
            Url::parse(&self.engine.endpoint)
                .with_context(|| format!("Invalid engine endpoint: {}", self.engine.endpoint))?;
        }

        Ok(())
    }
}
