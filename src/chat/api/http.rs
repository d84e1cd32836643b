//! `reqwest` implementation of the backend contract.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::chat::api::{ApiFuture, MessagingApi};
use crate::chat::core::config::ChatConfig;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::{ConversationId, NotificationId};
use crate::chat::core::types::{
    Conversation, Message, SendMessageRequest, StartConversationRequest, StartedConversation,
};
use crate::notifications::api::NotificationsApi;
use crate::notifications::types::{Notification, UnreadCount};

/// Error payload returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    id: Option<ConversationId>,
}

/// HTTP client for the marketplace chat and notification endpoints.
///
/// Credentials travel as cookies in the client's own jar, the same way a
/// browser session would send them.
#[derive(Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    cookies: Arc<Jar>,
    base: Url,
}

impl HttpChatClient {
    /// Create a client for the configured API base.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ChatConfig) -> ChatResult<Self> {
        config.validate()?;
        let base = config.api_base_url()?;
        let cookies = Arc::new(Jar::default());
        let client = Self::build_client(config, Arc::clone(&cookies))?;
        Ok(Self {
            client,
            cookies,
            base,
        })
    }

    /// Build an HTTP client with JSON defaults and a shared cookie jar.
    fn build_client(config: &ChatConfig, cookies: Arc<Jar>) -> ChatResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(agent) = HeaderValue::from_str(&format!(
            "hive-chat/{}",
            env!("CARGO_PKG_VERSION")
        )) {
            headers.insert(USER_AGENT, agent);
        }

        Ok(reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_provider(cookies)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?)
    }

    /// Add a session cookie (e.g. `JSESSIONID=...`) obtained by the login flow.
    pub fn add_session_cookie(&self, cookie: &str) {
        self.cookies.add_cookie_str(cookie, &self.base);
    }

    /// API base every path is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ChatResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChatResult<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = ensure_success(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn send_no_content(&self, request: RequestBuilder) -> ChatResult<()> {
        ensure_success(request).await?;
        Ok(())
    }
}

/// Send the request and turn any non-2xx status into [`ChatError::Status`].
async fn ensure_success(request: RequestBuilder) -> ChatResult<Response> {
    let response = request.send().await?;
    if response.status().is_success() {
        return Ok(response);
    }
    Err(status_error(response).await)
}

async fn status_error(response: Response) -> ChatError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorBody>(&body).unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "Request rejected");
    ChatError::Status {
        status: status.as_u16(),
        message: parsed.error.or(parsed.message),
        existing: parsed.id,
    }
}

impl MessagingApi for HttpChatClient {
    fn list_conversations(&self) -> ApiFuture<'_, ChatResult<Vec<Conversation>>> {
        Box::pin(async move { self.get_json("chat/conversations").await })
    }

    fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> ApiFuture<'_, ChatResult<Vec<Message>>> {
        Box::pin(async move {
            self.get_json(&format!("chat/conversations/{conversation}/messages"))
                .await
        })
    }

    fn send_message(&self, request: SendMessageRequest) -> ApiFuture<'_, ChatResult<Message>> {
        Box::pin(async move {
            let url = self.endpoint("chat/messages")?;
            debug!(%url, conversation = %request.conversation_id, "POST message");
            let response = ensure_success(self.client.post(url).json(&request)).await?;
            Ok(response.json().await?)
        })
    }

    fn mark_read(&self, conversation: ConversationId) -> ApiFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("chat/conversations/{conversation}/read"))?;
            self.send_no_content(self.client.put(url)).await
        })
    }

    fn start_conversation(
        &self,
        request: StartConversationRequest,
    ) -> ApiFuture<'_, ChatResult<StartedConversation>> {
        Box::pin(async move {
            let url = self.endpoint("chat/conversations")?;
            let response = self.client.post(url).json(&request).send().await?;
            if response.status().is_success() {
                let conversation: Conversation = response.json().await?;
                return Ok(StartedConversation::Created(conversation));
            }

            let status = response.status();
            let err = status_error(response).await;
            match err.existing_conversation() {
                Some(existing) if status == StatusCode::BAD_REQUEST => {
                    debug!(%existing, "Conversation already exists");
                    Ok(StartedConversation::Existing(existing))
                }
                _ => Err(err),
            }
        })
    }
}

impl NotificationsApi for HttpChatClient {
    fn list_notifications(&self) -> ApiFuture<'_, ChatResult<Vec<Notification>>> {
        Box::pin(async move { self.get_json("notifications").await })
    }

    fn unread_notification_count(&self) -> ApiFuture<'_, ChatResult<u32>> {
        Box::pin(async move {
            let body: UnreadCount = self.get_json("notifications/unread/count").await?;
            Ok(body.count)
        })
    }

    fn mark_notification_read(&self, id: NotificationId) -> ApiFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("notifications/{id}/read"))?;
            self.send_no_content(self.client.put(url)).await
        })
    }

    fn mark_all_notifications_read(&self) -> ApiFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let url = self.endpoint("notifications/read-all")?;
            self.send_no_content(self.client.put(url)).await
        })
    }

    fn delete_notification(&self, id: NotificationId) -> ApiFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("notifications/{id}"))?;
            self.send_no_content(self.client.delete(url)).await
        })
    }
}
