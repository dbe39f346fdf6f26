// Cinder: activity intelligence for public Telegram channels
//
// This is the library root. Each module corresponds to one stage of the
// analysis pipeline, from target normalization through result assembly.

pub mod classify;
pub mod config;
pub mod error;
pub mod graph;
pub mod message;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod source;
pub mod target;
pub mod timeline;
