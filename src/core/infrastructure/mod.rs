pub mod api_client;
pub mod config_loader;
pub mod logging;
