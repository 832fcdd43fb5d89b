//! Engine settings: plain-data types, validation, and file loading.

mod loader;
mod types;

pub use loader::load_from_dir;
pub use types::{
    ConfigError,
    I18nSettings,
    ValidationError,
};
