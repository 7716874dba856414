//! # hookwrap-core
//!
//! Foundation types, errors, and logging for hookwrap.
//!
//! This crate provides the shared vocabulary the other hookwrap crates depend on:
//!
//! - **Values**: [`Value`] dynamic argument/result model and the identity-bearing [`Object`] handle
//! - **Calls**: [`CallArgs`] positional + named arguments for one call
//! - **Cache keys**: [`CacheKey`] computed from call arguments under a [`KeyPolicy`]
//! - **Errors**: [`Error`] hierarchy via `thiserror`, with target errors passed through intact
//! - **Logging**: `tracing` subscriber bootstrap and in-memory capture for tests

#![deny(unsafe_code)]

pub mod errors;
pub mod key;
pub mod logging;
pub mod value;

pub use errors::{Error, Result};
pub use key::{CacheKey, KeyPart, KeyPolicy};
pub use value::{CallArgs, Object, Value};
