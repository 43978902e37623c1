//! tikbot: the Telegram shell around `tikcore`.
//!
//! - [`telegram`] - commands, menus, dispatcher schema, and the download flow
//! - [`health`] - liveness / readiness / metrics HTTP server
//! - [`cli`] - command-line interface

pub mod cli;
pub mod health;
pub mod telegram;
