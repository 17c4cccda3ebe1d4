//! Site-specific harvesting code.
//!
//! Each submodule owns the selectors and traversal rules for one outlet and
//! follows the same two-phase pattern:
//!
//! 1. **Listing**: walk the paginated topic listing and collect article links
//! 2. **Articles**: fetch each linked page and extract its fields
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Channel NewsAsia | [`cna`] | HTML scraping | Paginated topic listings |
//!
//! Scrapers use:
//! - Strictly sequential fetching with a fixed pause between requests
//! - Graceful error handling (failed article fetches are logged and skipped)
//! - Per-field fallback chains over meta tags and visible markup

pub mod cna;
