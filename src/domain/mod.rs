//! Core domain types and logic.

pub mod config_validation;
pub mod error;
pub mod fundamentals;
pub mod indicator;
pub mod indicator_engine;
pub mod ohlcv;
pub mod screener;
pub mod series;
pub mod signals;
pub mod store;
pub mod strategy;
pub mod universe;
pub mod verdict;
