use crate::session::GateConfig;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Load gate configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Arc<GateConfig>, String> {
    let path = path.as_ref();
    info!("Loading gate configuration from: {}", path.display());

    // Read the file
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    // Parse YAML
    let config: GateConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse YAML config: {}", e))?;

    // Validate the configuration
    config.validate()?;

    if config.auto_lock_enabled() {
        info!(
            "Gate configured with {}ms inactivity timeout (key '{}')",
            config.timeout_ms, config.storage_key
        );
    } else {
        info!(
            "Gate configured without auto-lock (key '{}')",
            config.storage_key
        );
    }

    Ok(Arc::new(config))
}

/// Load gate configuration with fallback options
pub fn load_config_with_fallback() -> Result<Arc<GateConfig>, String> {
    // Try loading from environment variable first
    if let Ok(config_path) = std::env::var("GATE_CONFIG_PATH") {
        match load_config(&config_path) {
            Ok(config) => return Ok(config),
            Err(e) => warn!(
                "Failed to load config from GATE_CONFIG_PATH ({}): {}",
                config_path, e
            ),
        }
    }

    // Try common config file locations
    let paths = vec!["gate.yaml", "gate.yml", "./gate.yaml", "./gate.yml"];

    for path in paths {
        if Path::new(path).exists() {
            match load_config(path) {
                Ok(config) => return Ok(config),
                Err(e) => warn!("Failed to load config from '{}': {}", path, e),
            }
        }
    }

    // If no config file found, return error with helpful message
    Err(
        "No gate configuration file found. Please create a gate.yaml file or set GATE_CONFIG_PATH \
        environment variable."
            .to_string(),
    )
}
