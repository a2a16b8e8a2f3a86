use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
}

fn default_scale_factor() -> f64 {
    1.0
}

impl Default for Display {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            scale_factor: default_scale_factor(),
        }
    }
}

/// Machine/session descriptor attached to recordings and action contexts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Environment {
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub locale: String,
    pub timezone: String,
    pub displays: Vec<Display>,
    pub extra: BTreeMap<String, String>,
}

impl Environment {
    /// Flat `key:value` tags describing this environment; empty fields are skipped.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if !self.platform.is_empty() {
            tags.push(format!("platform:{}", self.platform));
        }
        if let Some(os) = &self.os_version {
            tags.push(format!("os:{}", os));
        }
        if !self.locale.is_empty() {
            tags.push(format!("locale:{}", self.locale));
        }
        if !self.timezone.is_empty() {
            tags.push(format!("timezone:{}", self.timezone));
        }
        for display in &self.displays {
            tags.push(format!("display:{}x{}", display.width, display.height));
        }
        for (key, value) in &self.extra {
            tags.push(format!("{}:{}", key, value));
        }
        tags
    }

    pub fn primary_display(&self) -> Option<&Display> {
        self.displays.first()
    }
}
