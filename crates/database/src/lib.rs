//! # Campaign Database Crate
//!
//! This crate acts as the application-specific interface to the PostgreSQL
//! database that stores campaigns, channels and their lookup tables.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** All SQL lives here. The rest of the application sees
//!   entities from `core-types` and a typed `RepositoryError`, never rows.
//! - **Fixed Catalog:** Every statement is a parameterized constant in
//!   [`queries`]; user input is only ever bound, never spliced.
//! - **Declarative Mapping:** Each entity declares a column-name-to-field table
//!   in [`mapping`], checked against the result columns of every query.
//! - **Asynchronous & Pooled:** Operations check a connection out of a
//!   bounded `PgPool` for their duration and return it on every exit path.
//!
//! ## Public API
//!
//! - `connect`: builds the connection pool from `DatabaseConfig`.
//! - `DbRepository`: holds the pool and provides the data access methods.
//! - `RepositoryError`: the failure taxonomy returned by every method.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod mapping;
pub mod queries;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_url};
pub use error::RepositoryError;
pub use repository::{DbRepository, OperationPolicy};
