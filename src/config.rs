//! Build settings: defaults, `.diplomat.json` loading, validation and file matching.

/// Settings file loader
mod loader;
/// Settings manager
mod manager;
/// Source file pattern matcher
mod matcher;
/// Settings types
mod types;

pub use loader::SETTINGS_FILE_NAME;
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
    SourceKind,
};
pub use types::{
    BuildSettings,
    ConcurrencyConfig,
    ConfigError,
    ValidationError,
};
