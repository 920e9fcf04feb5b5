pub mod analyzer;
pub mod config;
pub mod enricher;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod scraper;
pub mod storage;
pub mod utils;
