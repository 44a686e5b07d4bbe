//! linman core
//!
//! Domain types, traits, and error handling for the Linode provisioning
//! manager. This crate has minimal dependencies and defines the shared
//! vocabulary used across all other crates.

pub mod api;
pub mod catalog;
pub mod dns;
pub mod error;
pub mod instance;
pub mod network;
pub mod nodebalancer;
pub mod objectstorage;

pub use api::{LinodeApi, Reconciler};
pub use error::{ClientError, Result};
