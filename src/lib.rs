pub mod config;
pub mod crawler;
pub mod extractor;
pub mod logger;
pub mod pdf;
pub mod utils;

pub use crawler::MangaCrawler;
