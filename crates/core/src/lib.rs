//! eShop Core - Shared types library.
//!
//! This crate provides the domain types used across all eShop components:
//! - `storefront` - REST client, session handling and view models
//! - `cli` - Command-line front end driving the storefront workflows
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere, including in the mock API used by the integration tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, money, validated contact fields, roles and the
//!   product / address / order records exchanged with the REST API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
