//! 通知发送 - 消息封装、协议客户端、分发状态机
//!
//! # 使用示例
//! ```ignore
//! use matrixchat_notify::notification::{DeliveryTarget, MatrixClient, Message, NotificationDispatcher};
//!
//! let target = DeliveryTarget::from_settings(&settings)?;
//! let client = MatrixClient::new(&target.homeserver)?;
//! let mut dispatcher = NotificationDispatcher::new(client);
//! dispatcher.dispatch(&target, &Message::from("Build: passed")).await?;
//! ```

pub mod client;
pub mod dispatcher;
pub mod matrix;
pub mod message;

pub use client::{ChatClient, Credentials, Delivery, DeliveryTarget, Session};
pub use dispatcher::{DispatchState, NotificationDispatcher};
pub use matrix::MatrixClient;
pub use message::{Message, DEFAULT_MSGTYPE, HTML_FORMAT};
