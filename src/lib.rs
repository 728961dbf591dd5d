pub mod analysis;
pub mod app;
pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod scoring;
pub mod state;
pub mod storage;
pub mod uploads;
