use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for FieldShield
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldShieldConfig {
    /// Local store settings
    pub store: StoreConfig,
    /// Capture workflow settings
    pub capture: CaptureSettings,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Technician identity settings
    #[serde(default)]
    pub technician: TechnicianConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Directory holding compliance records and the offline queue
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureSettings {
    /// Simulated scan/lookup delay in milliseconds
    pub scan_delay_ms: u64,
    /// Bound on the single geolocation attempt
    pub location_timeout_secs: u64,
}

impl CaptureSettings {
    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_secs)
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable structured log output
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TechnicianConfig {
    /// Technician identifier (can be set via env var)
    pub id: Option<String>,
}

impl Default for FieldShieldConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                data_dir: ".fieldshield".to_string(),
            },
            capture: CaptureSettings {
                scan_delay_ms: 1500,
                location_timeout_secs: 5,
            },
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
            },
            technician: TechnicianConfig {
                id: None, // Will be read from env var or fieldshield.toml
            },
        }
    }
}

impl FieldShieldConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (fieldshield.toml)
    /// 3. Environment variables (prefixed with FIELDSHIELD_)
    pub fn load() -> Result<Self> {
        let defaults = FieldShieldConfig::default();

        let mut builder = Config::builder()
            .set_default("store.data_dir", defaults.store.data_dir.clone())?
            .set_default("capture.scan_delay_ms", defaults.capture.scan_delay_ms)?
            .set_default(
                "capture.location_timeout_secs",
                defaults.capture.location_timeout_secs,
            )?
            .set_default(
                "observability.tracing_enabled",
                defaults.observability.tracing_enabled,
            )?
            .set_default("observability.log_level", defaults.observability.log_level.clone())?;

        if Path::new("fieldshield.toml").exists() {
            builder = builder.add_source(File::with_name("fieldshield"));
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("FIELDSHIELD")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;

        let mut fieldshield_config: FieldShieldConfig = config.try_deserialize()?;

        // Special handling for the technician id - check multiple sources
        if fieldshield_config.technician.id.is_none() {
            if let Ok(id) = std::env::var("FIELD_TECH_ID") {
                fieldshield_config.technician.id = Some(id);
            } else if let Ok(id) = std::env::var("FIELDSHIELD_TECH_ID") {
                fieldshield_config.technician.id = Some(id);
            }
        }

        Ok(fieldshield_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<FieldShieldConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = FieldShieldConfig::load_env_file();
        FieldShieldConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static FieldShieldConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
