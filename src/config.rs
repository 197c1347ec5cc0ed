use crate::error::AppError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE: &str = "authenticity";
const CONFIG_PATH_VAR: &str = "AUTHENTICITY_CONFIG";
const ENV_PREFIX: &str = "AUTHENTICITY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub log_level: String,
    pub model: ModelConfig,
    pub inference: InferenceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// ONNX classifier used as the learned signal. None leaves the GAN sector neutral.
    pub path: Option<PathBuf>,
    pub input_size: u32,
    pub intra_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub timeout_ms: u64,
    /// 0 means one slot per available core.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub ela_dir: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            model: ModelConfig::default(),
            inference: InferenceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            input_size: 224,
            intra_threads: 2,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            concurrency: 0,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency > 0 {
            return self.concurrency;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl Configuration {
    /// Layers the optional config file under `AUTHENTICITY__*` environment overrides.
    pub fn load() -> Result<Self, AppError> {
        let file = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| CONFIG_FILE.to_string());
        let configuration: Configuration = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.model.input_size == 0 {
            return Err(AppError::InvalidConfig(
                "Model input size must be greater than 0".to_string(),
            ));
        }

        if self.inference.timeout_ms == 0 {
            return Err(AppError::InvalidConfig(
                "Inference timeout must be greater than 0".to_string(),
            ));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(AppError::InvalidConfig(format!(
                "Unknown log level: {}",
                self.log_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.model.input_size, 224);
        assert_eq!(configuration.inference.timeout(), Duration::from_secs(30));
        assert!(configuration.model.path.is_none());
    }

    #[test]
    fn zero_concurrency_uses_available_cores() {
        let inference = InferenceConfig::default();
        assert!(inference.effective_concurrency() >= 1);

        let pinned = InferenceConfig {
            concurrency: 3,
            ..InferenceConfig::default()
        };
        assert_eq!(pinned.effective_concurrency(), 3);
    }

    #[test]
    fn rejects_zero_timeout_and_bad_level() {
        let mut configuration = Configuration::default();
        configuration.inference.timeout_ms = 0;
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.log_level = "chatty".to_string();
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn partial_sources_fill_in_defaults() {
        let configuration: Configuration = config::Config::builder()
            .set_override("model.input_size", 299)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(configuration.model.input_size, 299);
        assert_eq!(configuration.model.intra_threads, 2);
        assert_eq!(configuration.log_level, "info");
    }
}
