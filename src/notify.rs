// src/notify.rs

//! Outbound notifications.
//!
//! Producers (the orchestrator, dialog timers, the permission gate) push
//! [`Notification`]s into an mpsc channel; the front-end owns the receiver
//! and decides how to deliver them. Producers never see delivery failures.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::OperatorId;

/// Who a notification is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// The configured owner.
    Owner,
    /// One specific operator.
    Operator(OperatorId),
    /// Every known operator.
    Operators,
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Owner => f.write_str("owner"),
            Recipient::Operator(id) => write!(f, "{id}"),
            Recipient::Operators => f.write_str("operators"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: Recipient,
    pub text: String,
}

/// Cloneable, best-effort sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with the receiver the front-end drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Queue a notification. A closed channel is logged and otherwise ignored.
    pub async fn send(&self, recipient: Recipient, text: impl Into<String>) {
        let text = text.into();
        debug!(%recipient, %text, "queueing notification");
        if let Err(err) = self.tx.send(Notification { recipient, text }).await {
            warn!(%recipient, error = %err, "notification dropped: receiver closed");
        }
    }

    pub async fn notify_owner(&self, text: impl Into<String>) {
        self.send(Recipient::Owner, text).await;
    }

    pub async fn notify_operator(&self, id: OperatorId, text: impl Into<String>) {
        self.send(Recipient::Operator(id), text).await;
    }

    pub async fn notify_operators(&self, text: impl Into<String>) {
        self.send(Recipient::Operators, text).await;
    }
}
