// src/devserver/mod.rs

//! Development HTTP server: serves the build directory and pushes reload
//! notifications to browsers over server-sent events.

pub mod reload;
pub mod server;

pub use reload::ReloadHub;
pub use server::{DevServer, DevServerHandle, RELOAD_PATH};
