//! Leadgate Platform
//!
//! Core platform providing:
//! - Qualification evaluation for screening-form submissions
//! - Application intake orchestration
//! - Signed webhook delivery with bounded retries and an auditable log
//! - Buffered analytics ingestion with batch persistence
//! - Admin and public REST APIs

pub mod domain;
pub mod repository;
pub mod service;
pub mod api;
pub mod error;

pub use domain::*;
pub use error::PlatformError;
