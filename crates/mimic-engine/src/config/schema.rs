use mimic_common::{Display, Environment};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MimicConfig {
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub variation: VariationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_process_probe_interval_ms")]
    pub process_probe_interval_ms: u64,
    #[serde(default = "default_service_probe_interval_ms")]
    pub service_probe_interval_ms: u64,
    #[serde(default = "default_gui_probe_interval_ms")]
    pub gui_probe_interval_ms: u64,
    #[serde(default)]
    pub capture_mouse_moves: bool,
    #[serde(default = "default_capture_gui")]
    pub capture_gui: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            process_probe_interval_ms: default_process_probe_interval_ms(),
            service_probe_interval_ms: default_service_probe_interval_ms(),
            gui_probe_interval_ms: default_gui_probe_interval_ms(),
            capture_mouse_moves: false,
            capture_gui: default_capture_gui(),
        }
    }
}

fn default_process_probe_interval_ms() -> u64 {
    2000
}

fn default_service_probe_interval_ms() -> u64 {
    5000
}

fn default_gui_probe_interval_ms() -> u64 {
    1000
}

fn default_capture_gui() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_per_action_cost_ms")]
    pub per_action_cost_ms: u64,
    #[serde(default = "default_min_efficiency")]
    pub min_efficiency: f64,
    #[serde(default = "default_min_cleanliness")]
    pub min_cleanliness: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            per_action_cost_ms: default_per_action_cost_ms(),
            min_efficiency: default_min_efficiency(),
            min_cleanliness: default_min_cleanliness(),
        }
    }
}

fn default_per_action_cost_ms() -> u64 {
    500
}

fn default_min_efficiency() -> f64 {
    0.7
}

fn default_min_cleanliness() -> f64 {
    0.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_action_spacing_ms")]
    pub action_spacing_ms: u64,
    #[serde(default = "default_platform")]
    pub default_platform: String,
    #[serde(default)]
    pub default_display: Display,
    #[serde(default = "default_locale")]
    pub default_locale: String,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            action_spacing_ms: default_action_spacing_ms(),
            default_platform: default_platform(),
            default_display: Display::default(),
            default_locale: default_locale(),
            default_timezone: default_timezone(),
        }
    }
}

impl SynthesisConfig {
    pub fn default_environment(&self) -> Environment {
        Environment {
            platform: self.default_platform.clone(),
            locale: self.default_locale.clone(),
            timezone: self.default_timezone.clone(),
            displays: vec![self.default_display.clone()],
            ..Default::default()
        }
    }
}

fn default_action_spacing_ms() -> u64 {
    100
}

fn default_platform() -> String {
    "linux".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationConfig {
    #[serde(default = "default_coordinate_jitter")]
    pub coordinate_jitter: f64,
    #[serde(default = "default_timestamp_jitter_ms")]
    pub timestamp_jitter_ms: u64,
    /// Relative noise applied to resource metrics (0.05 = up to 5%).
    #[serde(default = "default_resource_jitter")]
    pub resource_jitter: f64,
    #[serde(default = "default_scale_jitter")]
    pub scale_jitter: f64,
    #[serde(default = "default_merge_spacing_ms")]
    pub merge_spacing_ms: u64,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            coordinate_jitter: default_coordinate_jitter(),
            timestamp_jitter_ms: default_timestamp_jitter_ms(),
            resource_jitter: default_resource_jitter(),
            scale_jitter: default_scale_jitter(),
            merge_spacing_ms: default_merge_spacing_ms(),
        }
    }
}

fn default_coordinate_jitter() -> f64 {
    5.0
}

fn default_timestamp_jitter_ms() -> u64 {
    20
}

fn default_resource_jitter() -> f64 {
    0.05
}

fn default_scale_jitter() -> f64 {
    0.1
}

fn default_merge_spacing_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".mimic").join("recordings"),
        None => PathBuf::from("./recordings"),
    }
}
