//! API module for the video guide generator
//!
//! Provides the REST endpoints the browser UI drives: video upload,
//! vision-service orchestration, artifact synthesis and guide persistence.

pub mod handlers;
pub mod models;
pub mod server;
