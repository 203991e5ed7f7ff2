//! 聊天协议客户端抽象与凭据

use crate::config::Settings;
use crate::error::NotifyError;
use async_trait::async_trait;
use serde_json::Value;

/// 登录凭据；access token + device id 优先于密码
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token {
        access_token: String,
        device_id: String,
    },
    Password {
        password: String,
        device_name: Option<String>,
    },
}

// 不打印密钥
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token { device_id, .. } => f
                .debug_struct("Token")
                .field("access_token", &"<redacted>")
                .field("device_id", device_id)
                .finish(),
            Self::Password { device_name, .. } => f
                .debug_struct("Password")
                .field("password", &"<redacted>")
                .field("device_name", device_name)
                .finish(),
        }
    }
}

impl Credentials {
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let token = settings.get_non_empty("accesstoken");
        let device_id = settings.get_non_empty("deviceid");

        if let (Some(access_token), Some(device_id)) = (token, device_id) {
            return Some(Self::Token {
                access_token,
                device_id,
            });
        }

        settings
            .get_non_empty("password")
            .map(|password| Self::Password {
                password,
                device_name: settings.get_non_empty("devicename"),
            })
    }
}

/// 已认证会话
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub device_id: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// 发送成功的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP 状态码
    pub status: u16,
    /// 服务器分配的事件 ID
    pub event_id: Option<String>,
}

/// 一次通知的投递目标，构造时完成前置检查
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub homeserver: String,
    pub user_id: String,
    pub room_id: String,
    pub credentials: Credentials,
}

impl DeliveryTarget {
    /// 缺少 userid / roomid / 凭据时返回 `NotifyError::Precondition`
    pub fn from_settings(settings: &Settings) -> Result<Self, NotifyError> {
        let user_id = settings
            .get_non_empty("userid")
            .ok_or_else(|| NotifyError::Precondition("userid not found in configuration.".into()))?;
        let room_id = settings
            .get_non_empty("roomid")
            .ok_or_else(|| NotifyError::Precondition("roomid not found in configuration.".into()))?;
        let credentials = Credentials::from_settings(settings).ok_or_else(|| {
            NotifyError::Precondition(
                "No password or accesstoken/deviceid found in configuration.".into(),
            )
        })?;
        let homeserver = settings
            .get_non_empty("homeserver")
            .unwrap_or_else(|| crate::config::settings::DEFAULT_HOMESERVER.to_string());

        Ok(Self {
            homeserver,
            user_id,
            room_id,
            credentials,
        })
    }
}

/// 聊天协议客户端
///
/// 调用顺序：`login` 或 `restore_session` → `send` → `close`。
#[async_trait]
pub trait ChatClient: Send {
    /// 密码登录，返回新的 token / device id
    async fn login(
        &mut self,
        user_id: &str,
        password: &str,
        device_name: Option<&str>,
    ) -> Result<Session, NotifyError>;

    /// 直接安装已有会话（不发起网络请求）
    fn restore_session(&mut self, session: Session);

    /// 向房间发送一条事件
    async fn send(
        &mut self,
        room_id: &str,
        event_type: &str,
        content: &Value,
    ) -> Result<Delivery, NotifyError>;

    /// 释放会话资源
    async fn close(&mut self);
}
