#[macro_use]
extern crate rust_i18n;

pub mod config;
pub mod directory;
pub mod duty;
pub mod error;
pub mod models;
pub mod seed;
pub mod shutdown;
pub mod startup;
pub mod store;
pub mod utils;
pub mod web;

// Initialize i18n
i18n!("locales", fallback = "en");
