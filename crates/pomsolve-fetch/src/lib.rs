//! Repository access for the resolver: the `Downloader` capability trait,
//! an HTTP implementation over the Maven repository layout, an in-memory
//! fixture implementation, and the two-tier workspace cache.

pub mod cache;
pub mod checksum;
pub mod downloader;
pub mod http;
pub mod memory;
pub mod metadata;
pub mod metrics;
pub mod repository;
