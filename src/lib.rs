//! sitemap-validator: XML sitemap validation and scoring
//!
//! Fetches a sitemap, checks it against the sitemap protocol, looks it up in
//! robots.txt, probes a sample of its URLs and turns the findings into a
//! 0-100 score, categorized issues and recommendations.

pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod probe;
pub mod progress;
pub mod report;
pub mod robots;
pub mod score;
pub mod sitemap;
pub mod validator;

pub use config::Config;
pub use error::{Error, Result};
pub use models::ValidationResult;
pub use validator::SitemapValidator;
