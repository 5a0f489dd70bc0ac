//! imgrelay is a same-origin image proxy.
//!
//! It serves `GET /image-proxy?url=...`, fetching the image from an
//! allow-listed storage domain and re-serving the bytes from the
//! caller's own origin so browsers do not apply cross-origin
//! restrictions to them. Hosts outside the configured suffix are
//! refused, which keeps the service from acting as an open proxy.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Config model, file loading, and validation.
//! - [`error`] -- Process-level error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- The image proxy handler: parameter extraction, allow-list
//!   check, upstream fetch, and response shaping.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;
