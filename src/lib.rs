pub mod app;
pub mod config;
pub mod logging;
pub mod parser;
pub mod report;
pub mod scan;
pub mod version;
