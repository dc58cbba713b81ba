//! Order-aggregate persistence: orders with their line items kept consistent
//! across transactions, plus the JSON API that exposes them.

pub mod config;
pub mod db;
pub mod domain;
pub mod http;
pub mod metrics;
pub mod service;
pub mod utils;
