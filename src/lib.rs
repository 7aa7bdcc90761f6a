//! Thank-you site - a small personal web site.
//!
//! Static pages, an honour wall and goodbyes read from JSON files, diary
//! entries rendered from Markdown, and a view counter persisted as a single
//! JSON document. Every request is written to a rotating activity log with a
//! best-effort real client IP.

pub mod bootstrap;
pub mod config;
pub mod diary;
pub mod logging;
pub mod render;
pub mod server;
pub mod store;
