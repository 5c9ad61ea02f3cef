use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub transcription: TranscriptionConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Remote speech-to-text service settings
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_smart_format")]
    pub smart_format: bool,
}

/// Remote structured-extraction service settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

fn default_smart_format() -> bool {
    true
}

impl Config {
    /// Load configuration from a file, with `CHARTNOTE__`-prefixed
    /// environment variables overriding file values (API keys in
    /// particular are expected to come from the environment).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CHARTNOTE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
