pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use schema::{
    ExtractionConfig, MimicConfig, RecorderConfig, StorageConfig, SynthesisConfig,
    VariationConfig,
};
