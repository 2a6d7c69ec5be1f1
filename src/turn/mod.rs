//! Turn capability and the activities it carries
//!
//! The engine treats a `TurnContext` as opaque: it hands the same reference to
//! every dialog invoked during the turn and never looks inside.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::DialogResult;

/// Kind of activity exchanged with the channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActivityType {
    /// User or bot message
    Message,
    /// Programmatic event carrying a value
    Event,
    /// The conversation is over
    EndOfConversation,
}

/// Content carried by an activity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// Structured data (JSON)
    Structured(serde_json::Value),
}

/// An inbound or outbound activity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    /// Unique identifier
    pub id: Uuid,
    /// Kind of activity
    pub activity_type: ActivityType,
    /// Payload
    pub content: MessageContent,
    /// When the activity was created
    pub timestamp: DateTime<Utc>,
    /// Channel specific properties
    pub properties: HashMap<String, serde_json::Value>,
}

impl Activity {
    /// Create a text message
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(ActivityType::Message, MessageContent::Text(content.into()))
    }

    /// Create an event carrying a structured value
    pub fn event(value: serde_json::Value) -> Self {
        Self::new(ActivityType::Event, MessageContent::Structured(value))
    }

    fn new(activity_type: ActivityType, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_type,
            content,
            timestamp: Utc::now(),
            properties: HashMap::new(),
        }
    }

    /// Attach a channel property
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Text payload, if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Structured(_) => None,
        }
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }
}

/// Capability for the turn being processed
#[async_trait]
pub trait TurnContext: Send + Sync {
    /// The inbound activity that started this turn
    fn activity(&self) -> &Activity;

    /// Send an activity back to the user
    async fn send_activity(&self, activity: Activity) -> DialogResult<()>;

    /// Whether anything has been sent during this turn
    fn responded(&self) -> bool;
}

/// Turn context that buffers outbound activities in memory
///
/// Useful for hosts that batch replies and for tests.
#[derive(Debug)]
pub struct InMemoryTurnContext {
    activity: Activity,
    sent: Mutex<Vec<Activity>>,
    responded: AtomicBool,
}

impl InMemoryTurnContext {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            sent: Mutex::new(Vec::new()),
            responded: AtomicBool::new(false),
        }
    }

    /// Shortcut for a turn carrying a text message
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Activity::text(text))
    }

    /// Activities sent so far
    pub async fn sent_activities(&self) -> Vec<Activity> {
        self.sent.lock().await.clone()
    }

    /// Text of the activities sent so far
    pub async fn sent_text(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|a| a.as_text().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl TurnContext for InMemoryTurnContext {
    fn activity(&self) -> &Activity {
        &self.activity
    }

    async fn send_activity(&self, activity: Activity) -> DialogResult<()> {
        self.sent.lock().await.push(activity);
        self.responded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }
}
