//! Typed handling of inbound push notifications.
//!
//! Push data arrives as untyped bytes and client pages talk to the
//! notification handler through loosely shaped JSON messages. This module
//! parses both at the boundary into explicit types, and keeps the most recent
//! notification in a [`NotificationInbox`] owned by the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_TITLE: &str = "New Notification";
pub const DEFAULT_BODY: &str = "You have a new update";
pub const STATUS_ACTIVE: &str = "Service worker is active";

const FALLBACK_TEXT: &str = "Notification";
const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Payload delivered by the push service.
///
/// The push service sends `body`; older senders use `message`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
}

impl PushPayload {
    fn fallback(body: impl Into<String>) -> Self {
        Self {
            title: Some(DEFAULT_TITLE.to_string()),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Interprets raw push data.
    ///
    /// A JSON object is taken as is. Any other text becomes the body of a
    /// generic notification, and missing data yields a generic update.
    pub fn from_push_data(data: Option<&[u8]>) -> Self {
        let Some(bytes) = data.filter(|bytes| !bytes.is_empty()) else {
            debug!("push without data");
            return Self::fallback(DEFAULT_BODY);
        };

        match serde_json::from_slice::<PushPayload>(bytes) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, "push data is not a JSON payload, using it as text");
                Self::fallback(String::from_utf8_lossy(bytes))
            }
        }
    }

    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.body.as_deref())
            .unwrap_or(FALLBACK_TEXT)
    }
}

/// What to show to the user for one push.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayNotification {
    pub title: String,
    pub body: String,
    /// Page to open when the notification is clicked.
    pub url: String,
    pub tag: String,
    pub timestamp: i64,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    pub renotify: bool,
    pub actions: Vec<NotificationAction>,
    pub payload: PushPayload,
}

impl DisplayNotification {
    pub fn for_payload(payload: &PushPayload, now_millis: i64) -> Self {
        Self {
            title: payload.title.clone().unwrap_or_else(|| FALLBACK_TEXT.to_string()),
            body: payload.text().to_string(),
            url: payload.url.clone().unwrap_or_else(|| "/".to_string()),
            tag: payload
                .tag
                .clone()
                .unwrap_or_else(|| format!("notification-{}", now_millis)),
            timestamp: now_millis,
            vibrate: VIBRATE_PATTERN.to_vec(),
            require_interaction: true,
            renotify: true,
            actions: payload.actions.clone(),
            payload: payload.clone(),
        }
    }
}

/// Messages sent from the notification handler to open pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerMessage {
    Notification { payload: PushPayload },
    NotificationClicked { payload: Option<PushPayload> },
    /// Reply to a ping. Carries `"type": "status"` like every other
    /// message; pages that only read `status` are unaffected.
    Status { status: String },
}

/// Messages sent from pages to the notification handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// The bare string `"ping"`.
    Ping,
    /// `{"type": "checkNotifications"}`.
    CheckNotifications,
}

#[derive(Debug)]
pub enum MessageError {
    Json(serde_json::Error),
    Unknown(String),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::Json(err) => write!(f, "client message is not JSON: {}", err),
            MessageError::Unknown(message) => write!(f, "unknown client message: {}", message),
        }
    }
}

impl std::error::Error for MessageError {}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        MessageError::Json(err)
    }
}

impl ClientMessage {
    pub fn from_value(value: &Value) -> Result<Self, MessageError> {
        match value {
            Value::String(text) if text == "ping" => Ok(ClientMessage::Ping),
            Value::Object(fields) if fields.get("type").and_then(Value::as_str) == Some("checkNotifications") => {
                Ok(ClientMessage::CheckNotifications)
            }
            other => Err(MessageError::Unknown(other.to_string())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MessageError> {
        Self::from_value(&serde_json::from_str(json)?)
    }
}

/// Result of handling one push.
#[derive(Debug, Clone, PartialEq)]
pub struct PushDelivery {
    pub display: DisplayNotification,
    /// Forwarded to every open page.
    pub broadcast: WorkerMessage,
}

/// What to do after the user clicks a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// A page already shows `url`: focus it and tell it about the click.
    Focus { url: String, message: WorkerMessage },
    /// No page shows `url`: open a new one.
    Open { url: String },
}

/// Per-session notification state.
#[derive(Debug, Clone, Default)]
pub struct NotificationInbox {
    last: Option<PushPayload>,
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent push payload, if any.
    pub fn last(&self) -> Option<&PushPayload> {
        self.last.as_ref()
    }

    pub fn on_push(&mut self, data: Option<&[u8]>, now_millis: i64) -> PushDelivery {
        let payload = PushPayload::from_push_data(data);
        let notification = DisplayNotification::for_payload(&payload, now_millis);
        debug!(title = %notification.title, "push received");

        self.last = Some(payload.clone());
        PushDelivery {
            display: notification,
            broadcast: WorkerMessage::Notification { payload },
        }
    }

    /// `open_pages` are the URLs of the pages currently open.
    pub fn on_click<S: AsRef<str>>(&self, notification: &DisplayNotification, open_pages: &[S]) -> ClickAction {
        let url = notification.url.clone();
        if open_pages.iter().any(|page| page.as_ref() == url) {
            ClickAction::Focus {
                url,
                message: WorkerMessage::NotificationClicked {
                    payload: Some(notification.payload.clone()),
                },
            }
        } else {
            ClickAction::Open { url }
        }
    }

    /// Reply to send back to the page, if any.
    pub fn on_client_message(&self, message: ClientMessage) -> Option<WorkerMessage> {
        match message {
            ClientMessage::Ping => Some(WorkerMessage::Status {
                status: STATUS_ACTIVE.to_string(),
            }),
            ClientMessage::CheckNotifications => self
                .last
                .clone()
                .map(|payload| WorkerMessage::Notification { payload }),
        }
    }

    /// Parses and answers a raw page message; unknown messages are logged
    /// and get no reply.
    pub fn on_raw_message(&self, json: &str) -> Option<WorkerMessage> {
        match ClientMessage::from_json(json) {
            Ok(message) => self.on_client_message(message),
            Err(err) => {
                warn!(error = %err, "ignoring client message");
                None
            }
        }
    }
}
