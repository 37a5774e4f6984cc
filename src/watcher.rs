//! Filesystem watching and per-path debouncing for watch mode.

pub mod debounce;
pub mod fs;

pub use debounce::Debouncer;
pub use fs::{
    ChangeReceiver,
    SourceChange,
    watch_directory,
};
