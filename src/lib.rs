//! diplomat
//!
//! Builds locale-specific output modules from a translation outline and
//! fragment files, once or continuously while sources change.

pub mod cli;
pub mod config;
pub mod emit;
pub mod input;
pub mod ir;
pub mod pipeline;
pub mod preprocess;
pub mod reader;
pub mod watcher;

#[cfg(test)]
mod test_utils;

pub use pipeline::{
    Pipeline,
    Session,
};
pub use reader::{
    Reader,
    ReaderStreams,
};
