//! Buildkite account reporting.
//!
//! Fetches organization members through the Buildkite GraphQL API,
//! normalizes them into flat cross-org records, detects duplicate
//! accounts by email or display name, and renders the result as JSON,
//! CSV, or a count.

pub mod member;
pub mod output;
pub mod report;
pub mod source;
