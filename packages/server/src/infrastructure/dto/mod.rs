//! Data Transfer Objects (DTOs)
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (inbound events and outbound events)
//! - `http`: HTTP reporting API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
