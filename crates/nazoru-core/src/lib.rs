pub mod client;
pub mod config;
pub mod keymap;
pub mod protocol;
pub mod recorder;
