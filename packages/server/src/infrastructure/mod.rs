//! Infrastructure 層
//!
//! ドメイン層の trait の具体的な実装と、通信用の DTO を提供します。

pub mod classifier;
pub mod dto;
pub mod emotion_log;
pub mod message_pusher;
pub mod repository;
