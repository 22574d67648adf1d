pub mod config;
pub mod logging;

// Core modules
pub mod download;
pub mod http;
pub mod lockfile;
pub mod registry;
pub mod resolve;
pub mod version;
pub mod workspace;
