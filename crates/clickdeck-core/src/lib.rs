pub mod autostart;
pub mod config;
pub mod editor;
pub mod icons;
pub mod input;
pub mod launch;
pub mod popup;
pub mod session;
pub mod store;

mod error;
mod utils;

#[cfg(test)]
mod tests;

pub use error::{Error, Result, ValidationError};
pub use utils::now_millis;

pub use clickdeck_types::*;
