//! gdreviews - employer review scraping.
//!
//! Fetches review listing pages, pulls the embedded Apollo state out of each
//! one, normalizes it into overview and review records, and stores them.

pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod services;
