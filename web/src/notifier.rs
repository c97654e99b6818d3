//! User-facing notices.
//!
//! Every action outcome ends up here. Notices queue until the next page
//! render drains them; the queue is bounded so an unattended page cannot
//! grow it without limit. Each notice is also logged.

use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::{error, info};

pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub struct Notifier {
    queue: Mutex<VecDeque<Notice>>,
    capacity: usize,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Success, message.into()).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Error, message.into()).await;
    }

    async fn publish(&self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Success => info!(notice = %message, "action succeeded"),
            NoticeLevel::Error => error!(notice = %message, "action failed"),
        }
        let mut queue = self.queue.lock().await;
        // oldest notices go first
        while queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(Notice { level, message });
    }

    /// Take every queued notice, oldest first.
    pub async fn drain(&self) -> Vec<Notice> {
        self.queue.lock().await.drain(..).collect()
    }

    /// Queued notices, without consuming them.
    pub async fn pending(&self) -> Vec<Notice> {
        self.queue.lock().await.iter().cloned().collect()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
