//! Clover Core - Shared types library.
//!
//! This crate provides common types used across all Clover components:
//! - `client` - Headless storefront client library
//! - `cli` - Command-line tool for exercising the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
