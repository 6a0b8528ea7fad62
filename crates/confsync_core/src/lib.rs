//! Core library for confsync: reconciles a spreadsheet inventory of files
//! with a single Confluence page, rewriting the page's table from the
//! current folder grouping once per run.

pub mod config;
pub mod confluence;
pub mod credentials;
pub mod diff;
pub mod error;
pub mod inventory;
pub mod pipeline;
pub mod prompt;
pub mod refresh;
pub mod render;
