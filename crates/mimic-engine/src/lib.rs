pub mod capture;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod learner;
pub mod recorder;
pub mod replay;
pub mod store;
pub mod translator;

pub use context::MimicContext;
pub use mimic_common as model;
