pub mod backends;
pub mod notify;
pub mod voice;
