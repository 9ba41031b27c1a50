pub mod config_loader;
pub mod constants;
pub mod duration;
pub mod logging;
pub mod path;
