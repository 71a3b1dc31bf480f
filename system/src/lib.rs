mod message;
mod timer;
mod types;

pub use message::*;
pub use timer::*;
pub use types::*;

pub extern crate chrono;
pub extern crate serde;
pub extern crate serde_json;
pub extern crate uuid;
