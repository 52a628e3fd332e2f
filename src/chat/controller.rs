//! Send-and-stream controller
//!
//! Drives one request/response cycle:
//!
//! ```text
//! Idle -> Sending (user message appended) -> Streaming (placeholder appended,
//!         store busy) -> Idle (busy cleared, input cleared)
//! Sending --error--> Idle (user message removed, toast shown)
//! ```
//!
//! The user message is appended before the request goes out and removed
//! again if the request fails. The reply is streamed into an empty
//! assistant placeholder, one decoded chunk at a time, through a single
//! [`TextStreamDecoder`] that lives for the whole response.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;

use super::commands::Command;
use super::decoder::TextStreamDecoder;
use super::input::{InputOutcome, SharedInput};
use super::message::{Message, MessageRequest};
use super::store::{MessageStore, StoreError};
use super::toast::Toaster;
use super::transport::{ByteStream, MessageTransport, TransportError};

/// Toast shown for every failed send
pub const SEND_FAILED_TOAST: &str = "Something went wrong. Please try again.";

/// Delay before focus returns to the input after a reply, so a pending
/// redraw lands first
pub const DEFAULT_FOCUS_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A message is already being sent")]
    Busy,

    #[error("No stream found")]
    NoStream,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    Sending,
    Streaming,
}

/// Ids of the two messages a successful cycle produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub user_message_id: String,
    pub reply_id: String,
}

#[derive(Clone)]
pub struct ChatController {
    store: MessageStore,
    input: SharedInput,
    toaster: Toaster,
    transport: Arc<dyn MessageTransport>,
    phase: Arc<RwLock<SendPhase>>,
    focus_delay: Duration,
}

impl ChatController {
    pub fn new(
        store: MessageStore,
        input: SharedInput,
        toaster: Toaster,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self {
            store,
            input,
            toaster,
            transport,
            phase: Arc::new(RwLock::new(SendPhase::Idle)),
            focus_delay: DEFAULT_FOCUS_DELAY,
        }
    }

    pub fn with_focus_delay(mut self, delay: Duration) -> Self {
        self.focus_delay = delay;
        self
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn input(&self) -> &SharedInput {
        &self.input
    }

    pub fn toaster(&self) -> &Toaster {
        &self.toaster
    }

    pub fn phase(&self) -> SendPhase {
        *self.phase.read().unwrap_or_else(|p| p.into_inner())
    }

    /// True from submission until the reply has finished (or failed)
    pub fn is_loading(&self) -> bool {
        self.phase() != SendPhase::Idle
    }

    fn set_phase(&self, phase: SendPhase) {
        *self.phase.write().unwrap_or_else(|p| p.into_inner()) = phase;
    }

    /// Route a keyboard command to the input.
    ///
    /// When the command submits, the user message is appended right away and
    /// the rest of the cycle runs on a spawned task whose handle is returned.
    pub fn handle_command(
        &self,
        command: &Command,
    ) -> Option<JoinHandle<Result<SendOutcome, SendError>>> {
        let InputOutcome::Submit(text) = self.input.apply(command) else {
            return None;
        };

        match self.begin(text) {
            Ok(message) => {
                let this = self.clone();
                Some(tokio::spawn(async move { this.run(message).await }))
            }
            Err(e) => {
                tracing::debug!("Submission ignored: {}", e);
                None
            }
        }
    }

    /// Run one full send-and-stream cycle for `text`
    pub async fn submit(&self, text: impl Into<String>) -> Result<SendOutcome, SendError> {
        let message = self.begin(text.into())?;
        self.run(message).await
    }

    /// Enter `Sending`: disable the input and optimistically append the user
    /// message
    fn begin(&self, text: String) -> Result<Message, SendError> {
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }

        {
            let mut phase = self.phase.write().unwrap_or_else(|p| p.into_inner());
            if *phase != SendPhase::Idle {
                return Err(SendError::Busy);
            }
            *phase = SendPhase::Sending;
        }

        let message = Message::user(text);
        if let Err(e) = self.store.add_message(message.clone()) {
            self.set_phase(SendPhase::Idle);
            return Err(e.into());
        }
        self.input.set_disabled(true);

        tracing::debug!(id = %message.id, "Sending message");
        Ok(message)
    }

    async fn run(&self, message: Message) -> Result<SendOutcome, SendError> {
        let user_message_id = message.id.clone();

        let result = match self.transport.send(&MessageRequest::single(message)).await {
            Ok(Some(stream)) => self.consume(stream).await,
            Ok(None) => Err(SendError::NoStream),
            Err(e) => Err(e.into()),
        };

        if let Err(ref e) = result {
            self.roll_back(&user_message_id, e);
        }

        self.set_phase(SendPhase::Idle);
        self.input.set_disabled(false);

        match result {
            Ok(reply_id) => {
                self.input.clear();
                self.schedule_focus();
                Ok(SendOutcome {
                    user_message_id,
                    reply_id,
                })
            }
            Err(e) => {
                self.input.focus();
                Err(e)
            }
        }
    }

    /// Drain the response into a fresh assistant placeholder
    ///
    /// Ends only when the stream does. The store's busy flag is set for the
    /// whole drain and cleared on the way out, error or not.
    async fn consume(&self, mut stream: ByteStream) -> Result<String, SendError> {
        let placeholder = Message::placeholder();
        let id = placeholder.id.clone();
        self.store.add_message(placeholder)?;
        self.store.set_is_message_updating(true);
        self.set_phase(SendPhase::Streaming);

        let mut decoder = TextStreamDecoder::new();
        let result = loop {
            match stream.next().await {
                Some(Ok(chunk)) => {
                    let text = decoder.decode(&chunk);
                    if let Err(e) = self.append(&id, &text) {
                        break Err(e.into());
                    }
                }
                Some(Err(e)) => break Err(SendError::Transport(e)),
                None => break Ok(()),
            }
        };

        let tail = decoder.finish();
        let flushed = self.append(&id, &tail);

        self.store.set_is_message_updating(false);
        tracing::debug!(id = %id, ok = result.is_ok(), "Reply stream finished");

        result?;
        flushed?;
        Ok(id)
    }

    fn append(&self, id: &str, text: &str) -> Result<(), StoreError> {
        if text.is_empty() {
            return Ok(());
        }
        self.store.update_message(id, |prev| {
            let mut next = String::with_capacity(prev.len() + text.len());
            next.push_str(prev);
            next.push_str(text);
            next
        })
    }

    fn roll_back(&self, user_message_id: &str, error: &SendError) {
        tracing::warn!("Message send failed, rolling back: {}", error);
        self.toaster.error(SEND_FAILED_TOAST);
        self.store.remove_message(user_message_id);
    }

    fn schedule_focus(&self) {
        let input = self.input.clone();
        let delay = self.focus_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            input.focus();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport that replays a fixed script of chunks
    struct ScriptedTransport {
        chunks: Vec<Result<Vec<u8>, &'static str>>,
        reply: Reply,
        requests: Mutex<Vec<MessageRequest>>,
        store_len_at_send: Mutex<Vec<usize>>,
        store: Option<MessageStore>,
    }

    #[derive(Clone, Copy)]
    enum Reply {
        Stream,
        NoBody,
        Fail,
    }

    impl ScriptedTransport {
        fn new(reply: Reply, chunks: Vec<Result<Vec<u8>, &'static str>>) -> Self {
            Self {
                chunks,
                reply,
                requests: Mutex::new(Vec::new()),
                store_len_at_send: Mutex::new(Vec::new()),
                store: None,
            }
        }

        fn watching(mut self, store: &MessageStore) -> Self {
            self.store = Some(store.clone());
            self
        }
    }

    #[async_trait]
    impl MessageTransport for ScriptedTransport {
        async fn send(
            &self,
            request: &MessageRequest,
        ) -> Result<Option<ByteStream>, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(store) = &self.store {
                self.store_len_at_send.lock().unwrap().push(store.len());
            }
            match self.reply {
                Reply::Fail => Err(TransportError::Network("connection refused".to_string())),
                Reply::NoBody => Ok(None),
                Reply::Stream => {
                    let items: Vec<Result<Bytes, TransportError>> = self
                        .chunks
                        .iter()
                        .map(|c| match c {
                            Ok(bytes) => Ok(Bytes::from(bytes.clone())),
                            Err(msg) => Err(TransportError::Stream(msg.to_string())),
                        })
                        .collect();
                    Ok(Some(Box::pin(futures::stream::iter(items))))
                }
            }
        }
    }

    fn ok(bytes: &[u8]) -> Result<Vec<u8>, &'static str> {
        Ok(bytes.to_vec())
    }

    fn controller(transport: ScriptedTransport, store: MessageStore) -> ChatController {
        ChatController::new(
            store,
            SharedInput::default(),
            Toaster::new(),
            Arc::new(transport),
        )
        .with_focus_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_user_message_appended_before_request() {
        let store = MessageStore::new();
        let transport = ScriptedTransport::new(Reply::Stream, vec![ok(b"ok")]).watching(&store);
        let transport = Arc::new(transport);
        let ctrl = ChatController::new(
            store.clone(),
            SharedInput::default(),
            Toaster::new(),
            transport.clone(),
        );

        ctrl.submit("hello").await.unwrap();

        assert_eq!(*transport.store_len_at_send.lock().unwrap(), vec![1]);
        let sent = transport.requests.lock().unwrap();
        assert_eq!(sent[0].messages.len(), 1);
        assert!(sent[0].messages[0].is_user_message);
        assert_eq!(sent[0].messages[0].text, "hello");
    }

    #[tokio::test]
    async fn test_chunks_concatenate_into_reply() {
        let store = MessageStore::new();
        let ctrl = controller(
            ScriptedTransport::new(Reply::Stream, vec![ok(b"Hel"), ok(b"lo, "), ok(b"world")]),
            store.clone(),
        );

        let outcome = ctrl.submit("hi").await.unwrap();

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, outcome.user_message_id);
        assert_eq!(messages[1].id, outcome.reply_id);
        assert!(!messages[1].is_user_message);
        assert_eq!(messages[1].text, "Hello, world");
        assert!(!store.is_message_updating());
        assert_eq!(ctrl.phase(), SendPhase::Idle);
    }

    #[tokio::test]
    async fn test_split_multibyte_char_decodes() {
        let store = MessageStore::new();
        // "ü" = C3 BC, split across chunks
        let ctrl = controller(
            ScriptedTransport::new(Reply::Stream, vec![ok(b"gr\xC3"), ok(b"\xBCn")]),
            store.clone(),
        );

        ctrl.submit("colour?").await.unwrap();
        assert_eq!(store.messages()[1].text, "grün");
    }

    #[tokio::test]
    async fn test_network_failure_rolls_back() {
        let store = MessageStore::with_messages(vec![Message::assistant("welcome")]).unwrap();
        let ctrl = controller(ScriptedTransport::new(Reply::Fail, vec![]), store.clone());
        ctrl.input().set_content("try this");

        let err = ctrl.submit("try this").await.unwrap_err();

        assert!(matches!(err, SendError::Transport(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].text, "welcome");
        let toasts = ctrl.toaster().all();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, SEND_FAILED_TOAST);
        // Text is kept so the user can resend; focus comes straight back
        assert_eq!(ctrl.input().content(), "try this");
        assert!(ctrl.input().is_focused());
        assert!(!ctrl.input().is_disabled());
    }

    #[tokio::test]
    async fn test_missing_stream_is_a_failure() {
        let store = MessageStore::new();
        let ctrl = controller(ScriptedTransport::new(Reply::NoBody, vec![]), store.clone());

        let err = ctrl.submit("anyone?").await.unwrap_err();

        assert!(matches!(err, SendError::NoStream));
        assert_eq!(err.to_string(), "No stream found");
        assert!(store.is_empty());
        assert_eq!(ctrl.toaster().all()[0].message, SEND_FAILED_TOAST);
    }

    #[tokio::test]
    async fn test_stream_error_clears_busy_flag() {
        let store = MessageStore::new();
        let ctrl = controller(
            ScriptedTransport::new(Reply::Stream, vec![ok(b"partial"), Err("reset by peer")]),
            store.clone(),
        );

        let err = ctrl.submit("go").await.unwrap_err();

        assert!(matches!(err, SendError::Transport(TransportError::Stream(_))));
        assert!(!store.is_message_updating());
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].is_user_message);
        assert_eq!(messages[0].text, "partial");
        assert!(!ctrl.is_loading());
    }

    #[tokio::test]
    async fn test_empty_text_is_ignored() {
        let store = MessageStore::new();
        let ctrl = controller(ScriptedTransport::new(Reply::Stream, vec![]), store.clone());

        assert!(matches!(
            ctrl.submit("   ").await,
            Err(SendError::EmptyMessage)
        ));
        assert!(store.is_empty());
        assert!(ctrl.toaster().all().is_empty());
    }

    #[tokio::test]
    async fn test_input_cleared_and_refocused_after_reply() {
        let store = MessageStore::new();
        let ctrl = controller(
            ScriptedTransport::new(Reply::Stream, vec![ok(b"done")]),
            store.clone(),
        );
        ctrl.input().set_content("question");

        let handle = ctrl.handle_command(&Command::Submit).unwrap();
        assert!(ctrl.is_loading());
        assert!(ctrl.input().is_disabled());
        assert_eq!(store.len(), 1);

        handle.await.unwrap().unwrap();
        assert_eq!(ctrl.input().content(), "");
        assert!(!ctrl.input().is_disabled());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(ctrl.input().is_focused());
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline_without_sending() {
        let store = MessageStore::new();
        let transport = ScriptedTransport::new(Reply::Stream, vec![ok(b"x")]);
        let ctrl = controller(transport, store.clone());
        ctrl.input().set_content("line one");

        let key = crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Enter,
            crossterm::event::KeyModifiers::SHIFT,
        );
        let command = crate::chat::key_to_command(key).unwrap();
        assert_eq!(command, Command::InsertNewline);

        assert!(ctrl.handle_command(&command).is_none());
        assert!(store.is_empty());
        assert!(!ctrl.is_loading());
        assert_eq!(ctrl.input().content(), "line one\n");
        assert!(!ctrl.input().is_disabled());
    }

    #[tokio::test]
    async fn test_second_submit_while_loading_is_rejected() {
        let store = MessageStore::new();
        let ctrl = controller(
            ScriptedTransport::new(Reply::Stream, vec![ok(b"x")]),
            store.clone(),
        );
        ctrl.input().set_content("first");

        let handle = ctrl.handle_command(&Command::Submit).unwrap();
        assert!(matches!(ctrl.submit("second").await, Err(SendError::Busy)));
        handle.await.unwrap().unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_busy_flag_spans_the_drain() {
        let store = MessageStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let polls = Arc::new(AtomicUsize::new(0));

        struct Observed {
            store: MessageStore,
            seen: Arc<Mutex<Vec<(bool, String)>>>,
            polls: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl MessageTransport for Observed {
            async fn send(
                &self,
                _request: &MessageRequest,
            ) -> Result<Option<ByteStream>, TransportError> {
                let store = self.store.clone();
                let seen = self.seen.clone();
                let polls = self.polls.clone();
                let chunks = vec!["Hel", "lo, ", "world"];
                let stream = futures::stream::iter(chunks).map(move |c| {
                    polls.fetch_add(1, Ordering::SeqCst);
                    let reply = store
                        .messages()
                        .last()
                        .map(|m| m.text.clone())
                        .unwrap_or_default();
                    seen.lock()
                        .unwrap()
                        .push((store.is_message_updating(), reply));
                    Ok::<_, TransportError>(Bytes::from(c))
                });
                Ok(Some(Box::pin(stream)))
            }
        }

        let ctrl = ChatController::new(
            store.clone(),
            SharedInput::default(),
            Toaster::new(),
            Arc::new(Observed {
                store: store.clone(),
                seen: seen.clone(),
                polls: polls.clone(),
            }),
        );

        ctrl.submit("hi").await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert!(seen.iter().all(|(busy, _)| *busy));
        let prefixes: Vec<_> = seen.into_iter().map(|(_, text)| text).collect();
        assert_eq!(prefixes, vec!["", "Hel", "Hello, "]);
        assert_eq!(store.messages()[1].text, "Hello, world");
        assert!(!store.is_message_updating());
    }
}
