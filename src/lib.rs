//! Horror movie quote shorts generator: quotes from a chat-completions
//! API, gradient frames rendered locally, video assembly via ffmpeg,
//! optional YouTube upload.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod quote;
pub mod render;
pub mod upload;
pub mod video;
