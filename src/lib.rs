//! srcdeps - build source dependencies from version control
//!
//! A dependency version such as `1.0-SRC-revision-66ea95d` tells the build
//! to check out and build the sources instead of downloading a binary.
//! This crate fingerprints such build requests, remembers which commit each
//! fingerprint was built from and runs the build tool when a rebuild is
//! needed.

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod gav;
pub mod metadata;
pub mod request;
pub mod scm;
pub mod service;
pub mod shell;
pub mod store;
pub mod version;

pub use error::{SrcdepsError, SrcdepsResult};
