mod dirs;
mod settings;
mod validation;

pub use dirs::Directories;
pub use settings::{AppearanceConfig, BehaviorConfig, Config, WindowGeometry};
pub use validation::warn_unknown_fields;
