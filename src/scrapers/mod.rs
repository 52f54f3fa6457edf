//! Upstream scrapers.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Wikipedia current events portal | [`wikipedia`] | MediaWiki parse API + HTML walk | One page per UTC day |
//!
//! A scraper fetches once per call, with no retries and no caching; upstream
//! failures are returned to the caller.

pub mod wikipedia;
