//! Matrix Client-Server API 客户端
//!
//! 只实现通知需要的两个端点：密码登录和房间消息发送。

use super::client::{ChatClient, Delivery, Session};
use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 登录请求体
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "type")]
    login_type: &'static str,
    identifier: UserIdentifier<'a>,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_device_display_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UserIdentifier<'a> {
    #[serde(rename = "type")]
    id_type: &'static str,
    user: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    device_id: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    event_id: Option<String>,
}

/// 错误响应 `{"errcode": ..., "error": ...}`
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errcode: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorResponse {
    fn describe(status: StatusCode, body: &str) -> String {
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
        match (parsed.errcode, parsed.error) {
            (Some(code), Some(msg)) => format!("{code}: {msg} (HTTP {})", status.as_u16()),
            (Some(code), None) => format!("{code} (HTTP {})", status.as_u16()),
            (None, Some(msg)) => format!("{msg} (HTTP {})", status.as_u16()),
            (None, None) => format!("HTTP {}: {}", status.as_u16(), body.trim()),
        }
    }
}

/// Matrix 客户端
#[derive(Debug)]
pub struct MatrixClient {
    client: Client,
    homeserver: Url,
    session: Option<Session>,
    txn_counter: u64,
}

impl MatrixClient {
    /// 创建新客户端
    pub fn new(homeserver: &str) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Self::with_http_client(homeserver, client)
    }

    /// 使用自定义的 HTTP 客户端（代理、超时等）
    pub fn with_http_client(homeserver: &str, client: Client) -> Result<Self, NotifyError> {
        let homeserver = Url::parse(homeserver).map_err(|e| {
            NotifyError::Precondition(format!("invalid homeserver URL '{homeserver}': {e}"))
        })?;
        if homeserver.cannot_be_a_base() {
            return Err(NotifyError::Precondition(format!(
                "invalid homeserver URL '{homeserver}'"
            )));
        }

        debug!(homeserver = %homeserver, "Created Matrix client");
        Ok(Self {
            client,
            homeserver,
            session: None,
            txn_counter: 0,
        })
    }

    pub fn homeserver(&self) -> &Url {
        &self.homeserver
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// 拼接 API 路径；每段单独做百分号编码
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.homeserver.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn next_txn_id(&mut self) -> String {
        self.txn_counter += 1;
        format!(
            "mcn{}.{}",
            chrono::Utc::now().timestamp_millis(),
            self.txn_counter
        )
    }
}

#[async_trait]
impl ChatClient for MatrixClient {
    async fn login(
        &mut self,
        user_id: &str,
        password: &str,
        device_name: Option<&str>,
    ) -> Result<Session, NotifyError> {
        let url = self.endpoint(&["_matrix", "client", "v3", "login"]);
        let request = LoginRequest {
            login_type: "m.login.password",
            identifier: UserIdentifier {
                id_type: "m.id.user",
                user: user_id,
            },
            password,
            initial_device_display_name: device_name,
        };

        debug!(url = %url, user_id = %user_id, "Logging in with password");
        let response = self.client.post(url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NotifyError::Authentication(ErrorResponse::describe(
                status, &body,
            )));
        }

        let login: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| NotifyError::Authentication(format!("malformed login response: {e}")))?;
        let session = Session {
            access_token: login.access_token,
            device_id: login.device_id,
        };
        self.session = Some(session.clone());
        Ok(session)
    }

    fn restore_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    async fn send(
        &mut self,
        room_id: &str,
        event_type: &str,
        content: &Value,
    ) -> Result<Delivery, NotifyError> {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or_else(|| NotifyError::Precondition("not logged in".into()))?;
        let txn_id = self.next_txn_id();
        let url = self.endpoint(&[
            "_matrix", "client", "v3", "rooms", room_id, "send", event_type, txn_id.as_str(),
        ]);

        debug!(url = %url, "Sending room event");
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(content)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NotifyError::Delivery(ErrorResponse::describe(status, &body)));
        }

        let parsed: SendResponse = serde_json::from_str(&body).unwrap_or(SendResponse { event_id: None });
        Ok(Delivery {
            status: status.as_u16(),
            event_id: parsed.event_id,
        })
    }

    async fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("Closed Matrix client session");
        }
    }
}
