//! 通知分发器 - 认证并把消息发送到固定房间
//!
//! 状态机：`Idle → Authenticating → Authenticated → Sending → Delivered`，
//! 任一阶段出错进入 `Failed`。token 路径直接从 `Idle` 进入 `Authenticated`。
//! 无论结果如何，返回前都会关闭客户端会话。

use super::client::{ChatClient, Credentials, Delivery, DeliveryTarget, Session};
use super::message::{Message, ROOM_MESSAGE_EVENT};
use crate::error::NotifyError;
use std::future::Future;
use tracing::{debug, error, info};

/// 分发状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Authenticating,
    Authenticated,
    Sending,
    Delivered,
    Failed,
}

/// 通知分发器
pub struct NotificationDispatcher<C: ChatClient> {
    client: C,
    history: Vec<DispatchState>,
}

impl<C: ChatClient> NotificationDispatcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            history: vec![DispatchState::Idle],
        }
    }

    /// 当前状态
    pub fn state(&self) -> DispatchState {
        self.history
            .last()
            .copied()
            .unwrap_or(DispatchState::Idle)
    }

    /// 经历过的所有状态（含初始 `Idle`）
    pub fn history(&self) -> &[DispatchState] {
        &self.history
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    fn transition(&mut self, next: DispatchState) {
        debug!(from = ?self.state(), to = ?next, "Dispatch state transition");
        self.history.push(next);
    }

    /// 发送通知（不可取消）
    pub async fn dispatch(
        &mut self,
        target: &DeliveryTarget,
        message: &Message,
    ) -> Result<Delivery, NotifyError> {
        self.dispatch_until(target, message, std::future::pending::<()>())
            .await
    }

    /// 发送通知，`cancel` 先完成时中止并返回 `NotifyError::Cancelled`
    #[tracing::instrument(skip_all, fields(room = %target.room_id, user = %target.user_id))]
    pub async fn dispatch_until<F>(
        &mut self,
        target: &DeliveryTarget,
        message: &Message,
        cancel: F,
    ) -> Result<Delivery, NotifyError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let result = tokio::select! {
            biased;
            _ = &mut cancel => Err(NotifyError::Cancelled),
            result = self.authenticate_and_send(target, message) => result,
        };

        self.client.close().await;

        match &result {
            Ok(delivery) => {
                self.transition(DispatchState::Delivered);
                info!(
                    homeserver = %target.homeserver,
                    status = delivery.status,
                    event_id = ?delivery.event_id,
                    "Sent notification message"
                );
            }
            Err(NotifyError::Cancelled) => {
                self.transition(DispatchState::Failed);
                info!("Interrupted.");
            }
            Err(e) => {
                self.transition(DispatchState::Failed);
                error!(error = %e, "Notification failed");
            }
        }

        result
    }

    async fn authenticate_and_send(
        &mut self,
        target: &DeliveryTarget,
        message: &Message,
    ) -> Result<Delivery, NotifyError> {
        match &target.credentials {
            Credentials::Token {
                access_token,
                device_id,
            } => {
                debug!("Using access token for authentication.");
                self.client.restore_session(Session {
                    access_token: access_token.clone(),
                    device_id: device_id.clone(),
                });
            }
            Credentials::Password {
                password,
                device_name,
            } => {
                self.transition(DispatchState::Authenticating);
                debug!("Trying to log in with password...");
                let session = self
                    .client
                    .login(&target.user_id, password, device_name.as_deref())
                    .await?;
                debug!("Matrix login successful.");
                debug!("Access token: {}", session.access_token);
                debug!("Device ID: {}", session.device_id);
            }
        }
        self.transition(DispatchState::Authenticated);

        self.transition(DispatchState::Sending);
        let content = message.to_content();
        self.client
            .send(&target.room_id, ROOM_MESSAGE_EVENT, &content)
            .await
    }
}
