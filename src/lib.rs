//! # nestarc Core Library
//!
//! This crate provides the core functionality for the `nestarc` command-line
//! tool, which applies uniform command semantics across nested containers:
//! zip archives, gzip wrappers, and host directories, chained arbitrarily
//! deep in a single extended archive path.
//!
//! ## Key Modules
//!
//! - [`resolve`]: Opens the chain of containers named by an extended archive path.
//! - [`container`]: The polymorphic leaf model and container protocols.
//! - [`depth`]: The scan-depth policy bounding descent into nested containers.
//! - [`matcher`]: Glob-pattern compilation and ordered entry matching.
//! - [`delete`] / [`print`]: The mutation and read command handlers.
//! - [`decode`]: Line-oriented text decoding for legacy encodings.

pub mod cli;
pub mod common;
pub mod container;
pub mod decode;
pub mod delete;
pub mod depth;
pub mod detect;
pub mod dirfs;
pub mod error;
pub mod flat;
pub mod info;
pub mod matcher;
pub mod print;
pub mod progress;
pub mod resolve;
pub mod wtree;

pub use error::NestArcError;
