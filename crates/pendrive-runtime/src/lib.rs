//! pendrive-runtime: the three client contexts and their wiring.
//!
//! Each context (background, popup, content) runs as its own tokio task and
//! owns its `SessionState`; the only links between them are the
//! availability bus and per-tab command channels.

pub mod background;
pub mod bus;
pub mod config;
pub mod content;
pub mod fill;
pub mod monitor;
pub mod popup;
pub mod sink;
pub mod tabs;
