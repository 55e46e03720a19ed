//! Superlists Web Application
//!
//! A minimal to-do list application: one server-rendered page that echoes a
//! posted item back into the list table.

pub mod server;
pub mod templates;

pub use server::WebServer;
pub use templates::Templates;
