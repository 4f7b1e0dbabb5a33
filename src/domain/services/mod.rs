pub mod actions;
mod conversation;
pub mod ingest;
mod monitor;
pub mod speech;

pub use conversation::*;
pub use monitor::*;
