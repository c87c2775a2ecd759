//! Request handlers.

mod http;
mod websocket;

pub use http::{check_class, get_class_summary, get_roster, health_check};
pub use websocket::websocket_handler;
