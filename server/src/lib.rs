pub extern crate actix_web;

pub mod config;
pub mod connection;
pub mod error;
mod extractor;
pub mod handlers;
pub mod notifier;
mod password;
pub mod registry;
pub mod server;
pub mod session;
pub mod state;
pub mod store;
