pub mod args;
pub mod commands;
pub mod config;
pub mod loader;

pub use args::{Args, Command};
pub use commands::execute;
pub use config::ConfigFile;
pub use loader::{Settings, SettingsLoader};
