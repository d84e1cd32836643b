//! In-memory doubles shared by the chat tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use crate::chat::api::{ApiFuture, MessagingApi};
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::{ConversationId, MessageId, UserId};
use crate::chat::core::types::{
    Conversation, Message, SendMessageRequest, StartConversationRequest, StartedConversation,
};
use crate::chat::view::{ConversationListView, DayGroup, MessageView, ToastLevel};

/// A call observed by [`MockApi`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    ListConversations,
    ListMessages(ConversationId),
    Send(ConversationId, String),
    MarkRead(ConversationId),
    Start(UserId),
}

pub fn message(id: i64, conversation: i64, content: &str, is_mine: bool) -> Message {
    Message {
        id: MessageId(id),
        conversation_id: Some(ConversationId(conversation)),
        content: content.to_string(),
        sent_at: Utc::now(),
        is_mine,
        is_read: false,
    }
}

pub fn conversation(id: i64, firstname: &str, unread_count: u32) -> Conversation {
    Conversation {
        id: ConversationId(id),
        other_user_firstname: firstname.to_string(),
        other_user_lastname: "Kowalski".to_string(),
        last_message_content: Some(format!("hello from {firstname}")),
        last_message_at: Some(Utc::now()),
        unread_count,
    }
}

fn rejected(status: u16, message: &str) -> ChatError {
    ChatError::Status {
        status,
        message: Some(message.to_string()),
        existing: None,
    }
}

/// Scriptable in-memory backend.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<(Instant, ApiCall)>>,
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<HashMap<ConversationId, Vec<Message>>>,
    list_delays: Mutex<HashMap<ConversationId, Duration>>,
    existing: Mutex<HashMap<UserId, ConversationId>>,
    send_error: Mutex<Option<String>>,
    send_delay: Mutex<Option<Duration>>,
    fail_messages: AtomicBool,
    fail_conversations: AtomicBool,
    fail_mark_read: AtomicBool,
    next_id: AtomicI64,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            ..Self::default()
        }
    }

    pub fn set_messages(&self, conversation: i64, messages: Vec<Message>) {
        self.messages
            .lock()
            .unwrap()
            .insert(ConversationId(conversation), messages);
    }

    pub fn push_message(&self, conversation: i64, message: Message) {
        self.messages
            .lock()
            .unwrap()
            .entry(ConversationId(conversation))
            .or_default()
            .push(message);
    }

    pub fn set_conversations(&self, conversations: Vec<Conversation>) {
        *self.conversations.lock().unwrap() = conversations;
    }

    pub fn set_list_delay(&self, conversation: i64, delay: Duration) {
        self.list_delays
            .lock()
            .unwrap()
            .insert(ConversationId(conversation), delay);
    }

    pub fn set_existing(&self, user: i64, conversation: i64) {
        self.existing
            .lock()
            .unwrap()
            .insert(UserId(user), ConversationId(conversation));
    }

    pub fn fail_sends_with(&self, error: &str) {
        *self.send_error.lock().unwrap() = Some(error.to_string());
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_messages(&self, fail: bool) {
        self.fail_messages.store(fail, Ordering::SeqCst);
    }

    pub fn fail_conversations(&self, fail: bool) {
        self.fail_conversations.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mark_read(&self, fail: bool) {
        self.fail_mark_read.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, ApiCall)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &ApiCall) -> usize {
        self.calls().iter().filter(|seen| *seen == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

impl MessagingApi for MockApi {
    fn list_conversations(&self) -> ApiFuture<'_, ChatResult<Vec<Conversation>>> {
        Box::pin(async move {
            self.record(ApiCall::ListConversations);
            if self.fail_conversations.load(Ordering::SeqCst) {
                return Err(rejected(500, "conversations unavailable"));
            }
            Ok(self.conversations.lock().unwrap().clone())
        })
    }

    fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> ApiFuture<'_, ChatResult<Vec<Message>>> {
        Box::pin(async move {
            self.record(ApiCall::ListMessages(conversation));
            let delay = self.list_delays.lock().unwrap().get(&conversation).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_messages.load(Ordering::SeqCst) {
                return Err(rejected(500, "messages unavailable"));
            }
            Ok(self
                .messages
                .lock()
                .unwrap()
                .get(&conversation)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn send_message(&self, request: SendMessageRequest) -> ApiFuture<'_, ChatResult<Message>> {
        Box::pin(async move {
            self.record(ApiCall::Send(request.conversation_id, request.content.clone()));
            let delay = *self.send_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let error = self.send_error.lock().unwrap().clone();
            if let Some(error) = error {
                return Err(rejected(400, &error));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let sent = message(id, request.conversation_id.get(), &request.content, true);
            self.push_message(request.conversation_id.get(), sent.clone());
            Ok(sent)
        })
    }

    fn mark_read(&self, conversation: ConversationId) -> ApiFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            self.record(ApiCall::MarkRead(conversation));
            if self.fail_mark_read.load(Ordering::SeqCst) {
                return Err(rejected(500, "read marker unavailable"));
            }
            Ok(())
        })
    }

    fn start_conversation(
        &self,
        request: StartConversationRequest,
    ) -> ApiFuture<'_, ChatResult<StartedConversation>> {
        Box::pin(async move {
            self.record(ApiCall::Start(request.other_user_id));
            let existing = self
                .existing
                .lock()
                .unwrap()
                .get(&request.other_user_id)
                .copied();
            if let Some(id) = existing {
                return Ok(StartedConversation::Existing(id));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let mut created = conversation(id, "New", 0);
            created.last_message_content = Some(request.initial_message);
            self.conversations.lock().unwrap().insert(0, created.clone());
            Ok(StartedConversation::Created(created))
        })
    }
}

/// A render call observed by [`RecordingView`].
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    Loading,
    Error(String),
    Render(Vec<i64>),
    Append(i64),
    ScrollToBottom,
    InputEnabled(bool),
    ClearInput,
    Toast(String, ToastLevel),
    ConversationsLoading,
    ConversationsError(String),
    Conversations(Vec<i64>, Option<i64>),
}

/// View double that records every call.
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
    distance: AtomicU64,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            distance: AtomicU64::new(0f64.to_bits()),
        }
    }
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_distance(&self, px: f64) {
        self.distance.store(px.to_bits(), Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn renders(&self) -> Vec<Vec<i64>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Render(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn scrolls(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == ViewEvent::ScrollToBottom)
            .count()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl MessageView for RecordingView {
    fn show_loading(&self) {
        self.push(ViewEvent::Loading);
    }

    fn show_error(&self, message: &str) {
        self.push(ViewEvent::Error(message.to_string()));
    }

    fn render_messages(&self, days: &[DayGroup<'_>]) {
        let ids = days
            .iter()
            .flat_map(|day| day.messages.iter().map(|message| message.id.get()))
            .collect();
        self.push(ViewEvent::Render(ids));
    }

    fn append_message(&self, message: &Message) {
        self.push(ViewEvent::Append(message.id.get()));
    }

    fn distance_from_bottom(&self) -> f64 {
        f64::from_bits(self.distance.load(Ordering::SeqCst))
    }

    fn scroll_to_bottom(&self) {
        self.push(ViewEvent::ScrollToBottom);
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.push(ViewEvent::InputEnabled(enabled));
    }

    fn clear_input(&self) {
        self.push(ViewEvent::ClearInput);
    }

    fn show_toast(&self, message: &str, level: ToastLevel) {
        self.push(ViewEvent::Toast(message.to_string(), level));
    }
}

impl ConversationListView for RecordingView {
    fn show_conversations_loading(&self) {
        self.push(ViewEvent::ConversationsLoading);
    }

    fn show_conversations_error(&self, message: &str) {
        self.push(ViewEvent::ConversationsError(message.to_string()));
    }

    fn render_conversations(&self, conversations: &[Conversation], active: Option<ConversationId>) {
        self.push(ViewEvent::Conversations(
            conversations.iter().map(|c| c.id.get()).collect(),
            active.map(ConversationId::get),
        ));
    }
}

/// Let spawned tasks run without advancing the paused clock.
pub async fn drain() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
