#![doc = "vault-mirror-core: core logic library for vault-mirror."]

//! This crate contains all synchronisation, reconciliation and caching logic for
//! vault-mirror. Transport concerns (the GitHub client, the HTTP read API, the CLI)
//! live in the `vault-mirror` binary crate.
//!
//! # Usage
//! Add this as a dependency for the reconciler, pipeline, publisher, store and
//! contract traits.

pub mod config;
pub mod contract;
pub mod manifest;
pub mod pipeline;
pub mod publish;
pub mod reconcile;
pub mod slug;
pub mod store;
pub mod synchronise;
