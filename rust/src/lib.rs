pub mod board_store;
pub mod config_store;
pub mod main_ui_html;
pub mod path_utils;
pub mod server;
pub mod snippet;

pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/80?text=Error";
