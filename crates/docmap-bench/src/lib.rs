//! docmap Benchmark Suite
//!
//! Criterion benchmarks for the docmap core.
//!
//! # Benchmark Categories
//!
//! - **Transform**: reading, writing and comparing documents
//! - **Observer**: watching graphs and detecting the first mutation

pub mod fixtures;

pub use fixtures::{generate_users, user_to_document, Scale, Schema};
