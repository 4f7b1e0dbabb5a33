mod action;
mod attachment;
mod author;
mod backend;
mod event;
mod history;
mod message;
mod notification;
mod snapshot;
mod voice;

pub use action::*;
pub use attachment::*;
pub use author::*;
pub use backend::*;
pub use event::*;
pub use history::*;
pub use message::*;
pub use notification::*;
pub use snapshot::*;
pub use voice::*;
