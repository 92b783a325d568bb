//! Inline success/error message shown under the new-target form.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const BASE_CLASS: &str = "message-wrapper";

/// Text and CSS class of the message area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageState {
    pub text: String,
    pub class: String,
}

impl Default for MessageState {
    fn default() -> Self {
        Self {
            text: String::new(),
            class: BASE_CLASS.to_string(),
        }
    }
}

/// Shared handle on the message area.
///
/// Every shown message schedules its own clear; an older clear still fires
/// after a newer message replaced the text.
#[derive(Debug, Clone)]
pub struct MessageArea {
    state: Arc<RwLock<MessageState>>,
    clear_delay: Duration,
}

impl MessageArea {
    pub const ELEMENT_ID: &'static str = "form-message-wrapper";

    pub fn new(clear_delay: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(MessageState::default())),
            clear_delay,
        }
    }

    /// Display `text` with the `message-<status>` class and schedule the clear.
    pub async fn show(&self, status: &str, text: &str) {
        {
            let mut state = self.state.write().await;
            state.text = text.to_string();
            state.class = format!("{} message-{}", BASE_CLASS, status);
        }

        let area = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(area.clear_delay).await;
            area.clear().await;
        });
    }

    pub async fn clear(&self) {
        *self.state.write().await = MessageState::default();
    }

    pub async fn snapshot(&self) -> MessageState {
        self.state.read().await.clone()
    }
}
