//! Integration test suite for Pagesift

mod common;
mod crawl_tests;
mod fetch_tests;
