use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub debug: bool,
    pub debug_mode: String,
    pub supports_color: bool,
    pub use_traceback: bool,
    pub warnings: bool,
    pub source_extension: String,
    pub output_extension: String,
    pub output_empty: bool,
    pub debounce_ms: u64,
    pub version: String,
    pub color_scheme: ColorScheme,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ColorScheme {
    pub exception: String,
    pub warning: String,
    pub help: String,
    pub debug: String,
    pub note: String,
    pub info: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            debug_mode: "normal".to_string(),
            supports_color: true,
            use_traceback: true,
            warnings: true,
            source_extension: "blcs".to_string(),
            output_extension: "cs".to_string(),
            output_empty: false,
            debounce_ms: 100,
            version: env!("CARGO_PKG_VERSION").to_string(),
            color_scheme: ColorScheme::default(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            exception: "#F44350".to_string(),
            warning: "#FFC107".to_string(),
            help: "#21B8DB".to_string(),
            debug: "#434343".to_string(),
            note: "#1CC58B".to_string(),
            info: "#D1D1D1".to_string(),
        }
    }
}

pub fn get_config_path() -> String {
    let config_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.json");

    if config_path.exists() {
        config_path.to_string_lossy().into_owned()
    } else {
        "config.json".to_string()
    }
}

pub fn get_config() -> Result<Config, String> {
    let path = get_config_path();
    if !Path::new(&path).exists() {
        return Err("Config file not found".to_string());
    }
    let mut file = File::open(path).map_err(|_| "Config file not found".to_string())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|_| "Failed to read config file".to_string())?;

    serde_json::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to deserialize JSON: {}", e))
}
