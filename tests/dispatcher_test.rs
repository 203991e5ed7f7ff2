//! 分发器状态机测试（内存 ChatClient 替身，不访问网络）

use async_trait::async_trait;
use matrixchat_notify::notification::{
    ChatClient, Credentials, Delivery, DeliveryTarget, DispatchState, Message,
    NotificationDispatcher, Session, HTML_FORMAT,
};
use matrixchat_notify::NotifyError;
use serde_json::Value;

/// 记录调用次数的客户端替身
#[derive(Default)]
struct RecordingClient {
    login_error: Option<String>,
    send_error: Option<String>,
    logins: Vec<(String, Option<String>)>,
    restored: Vec<Session>,
    sent: Vec<Value>,
    closes: usize,
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn login(
        &mut self,
        user_id: &str,
        _password: &str,
        device_name: Option<&str>,
    ) -> Result<Session, NotifyError> {
        self.logins
            .push((user_id.to_string(), device_name.map(str::to_string)));
        match &self.login_error {
            Some(e) => Err(NotifyError::Authentication(e.clone())),
            None => Ok(Session {
                access_token: "syt_fresh".to_string(),
                device_id: "FRESHDEV".to_string(),
            }),
        }
    }

    fn restore_session(&mut self, session: Session) {
        self.restored.push(session);
    }

    async fn send(
        &mut self,
        _room_id: &str,
        _event_type: &str,
        content: &Value,
    ) -> Result<Delivery, NotifyError> {
        if let Some(e) = &self.send_error {
            return Err(NotifyError::Delivery(e.clone()));
        }
        self.sent.push(content.clone());
        Ok(Delivery {
            status: 200,
            event_id: Some("$event".to_string()),
        })
    }

    async fn close(&mut self) {
        self.closes += 1;
    }
}

fn target(credentials: Credentials) -> DeliveryTarget {
    DeliveryTarget {
        homeserver: "https://matrix.example.org".to_string(),
        user_id: "@ci:example.org".to_string(),
        room_id: "!builds:example.org".to_string(),
        credentials,
    }
}

#[tokio::test]
async fn test_token_credentials_are_installed_without_login() {
    let mut dispatcher = NotificationDispatcher::new(RecordingClient::default());
    let creds = Credentials::Token {
        access_token: "syt_token".to_string(),
        device_id: "DEVICE".to_string(),
    };

    dispatcher
        .dispatch(&target(creds), &Message::from("done"))
        .await
        .unwrap();

    let client = dispatcher.into_client();
    assert!(client.logins.is_empty());
    assert_eq!(client.restored.len(), 1);
    assert_eq!(client.restored[0].device_id, "DEVICE");
    assert_eq!(client.closes, 1);
}

#[tokio::test]
async fn test_password_login_passes_device_name() {
    let mut dispatcher = NotificationDispatcher::new(RecordingClient::default());
    let creds = Credentials::Password {
        password: "secret".to_string(),
        device_name: Some("drone".to_string()),
    };

    let delivery = dispatcher
        .dispatch(&target(creds), &Message::from("done"))
        .await
        .unwrap();

    assert_eq!(delivery.event_id.as_deref(), Some("$event"));
    assert_eq!(
        dispatcher.history(),
        &[
            DispatchState::Idle,
            DispatchState::Authenticating,
            DispatchState::Authenticated,
            DispatchState::Sending,
            DispatchState::Delivered,
        ]
    );
    let client = dispatcher.into_client();
    assert_eq!(
        client.logins,
        vec![("@ci:example.org".to_string(), Some("drone".to_string()))]
    );
}

#[tokio::test]
async fn test_rejected_login_closes_once_and_never_sends() {
    let client = RecordingClient {
        login_error: Some("M_FORBIDDEN: Invalid password".to_string()),
        ..Default::default()
    };
    let mut dispatcher = NotificationDispatcher::new(client);
    let creds = Credentials::Password {
        password: "wrong".to_string(),
        device_name: None,
    };

    let err = dispatcher
        .dispatch(&target(creds), &Message::from("done"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Invalid password"));
    assert_eq!(dispatcher.state(), DispatchState::Failed);
    assert!(!dispatcher.history().contains(&DispatchState::Sending));
    let client = dispatcher.into_client();
    assert!(client.sent.is_empty());
    assert_eq!(client.closes, 1);
}

#[tokio::test]
async fn test_rejected_send_is_delivery_error() {
    let client = RecordingClient {
        send_error: Some("M_FORBIDDEN: not in room (HTTP 403)".to_string()),
        ..Default::default()
    };
    let mut dispatcher = NotificationDispatcher::new(client);
    let creds = Credentials::Token {
        access_token: "t".to_string(),
        device_id: "d".to_string(),
    };

    let err = dispatcher
        .dispatch(&target(creds), &Message::from("done"))
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::Delivery(_)));
    assert_eq!(dispatcher.state(), DispatchState::Failed);
    assert_eq!(dispatcher.client().closes, 1);
}

#[tokio::test]
async fn test_rich_message_envelope() {
    let mut dispatcher = NotificationDispatcher::new(RecordingClient::default());
    let creds = Credentials::Token {
        access_token: "t".to_string(),
        device_id: "d".to_string(),
    };
    let message = Message::Rich {
        body: "*done*".to_string(),
        formatted_body: "<p><em>done</em></p>".to_string(),
        format: HTML_FORMAT.to_string(),
    };

    dispatcher.dispatch(&target(creds), &message).await.unwrap();

    let content = &dispatcher.client().sent[0];
    assert_eq!(content["msgtype"], "m.notice");
    assert_eq!(content["body"], "*done*");
    assert_eq!(content["formatted_body"], "<p><em>done</em></p>");
    assert_eq!(content["format"], "org.matrix.custom.html");
}

#[tokio::test]
async fn test_cancellation_is_clean_abort() {
    let mut dispatcher = NotificationDispatcher::new(RecordingClient::default());
    let creds = Credentials::Password {
        password: "secret".to_string(),
        device_name: None,
    };

    let err = dispatcher
        .dispatch_until(&target(creds), &Message::from("done"), async {})
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::Cancelled));
    let client = dispatcher.into_client();
    assert!(client.sent.is_empty());
    assert_eq!(client.closes, 1);
}
