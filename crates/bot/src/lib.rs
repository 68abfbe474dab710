//! Nonogram Relay bot library.
//!
//! This crate provides the bot as a library, allowing it to be tested and
//! reused:
//! - Discord gateway worker that marks submissions and applies admin reviews
//! - Relay HTTP server that forwards messages into the review channel
//!
//! # Security
//!
//! The process holds the bot token and the database credentials. The relay
//! endpoint is unauthenticated and protected only by CORS, so bind it to a
//! private interface unless public relaying is intended.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod discord;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
