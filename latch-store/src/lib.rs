//! # latch-store
//!
//! Storage contracts for latch plus an in-memory reference implementation.
//!
//! This crate provides:
//! - The [`RecordStore`] trait the engine reads and writes through
//! - The [`RuleCatalog`] trait for validation rule lookup
//! - [`MemoryStore`], an in-memory implementation of both

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{EdgeEndpoint, RecordStore, RuleCatalog};
