//! Credit Pro Report API Library
//!
//! This library provides the core functionality for the Credit Pro report
//! service: bulk credit-score acquisition against the Credit Pro provider
//! (single authentication, grouped concurrent fetches with bounded retries)
//! and HTML report generation.
//!
//! # Modules
//!
//! - `batch`: Batch orchestration (grouping, retries, backoff, cooldown).
//! - `config`: Configuration management.
//! - `credit_client`: Credit Pro API client and response mapping.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `report`: HTML report rendering and persistence.

pub mod batch;
pub mod config;
pub mod credit_client;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod report;
