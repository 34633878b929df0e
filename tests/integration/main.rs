//! Integration tests for Rival-Harvest
//!
//! These tests use wiremock to stand up mock competitor sites and exercise
//! the fetch layer, sitemap reader, scheduler and extractor end-to-end.

mod common;
mod extract_tests;
mod fetch_tests;
mod scheduler_tests;
mod sitemap_tests;
