use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};

use crate::home::HomeEvent;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

#[derive(Default)]
struct ToastSlot {
    current: Option<Notification>,
    generation: u64,
    expiry: Option<JoinHandle<()>>,
}

/// Single transient notification slot. A new message replaces the visible
/// one and restarts the visibility window.
#[derive(Clone)]
pub struct Notifier {
    slot: Arc<Mutex<ToastSlot>>,
    visible_for: Duration,
    events: broadcast::Sender<HomeEvent>,
}

impl Notifier {
    pub fn new(visible_for: Duration, events: broadcast::Sender<HomeEvent>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(ToastSlot::default())),
            visible_for,
            events,
        }
    }

    pub async fn current(&self) -> Option<Notification> {
        self.slot.lock().await.current.clone()
    }

    pub async fn show(&self, message: impl Into<String>) -> Notification {
        let notification = Notification {
            message: message.into(),
            shown_at: Utc::now(),
        };

        let mut guard = self.slot.lock().await;
        guard.generation = guard.generation.wrapping_add(1);
        guard.current = Some(notification.clone());
        if let Some(handle) = guard.expiry.take() {
            handle.abort();
        }

        let generation = guard.generation;
        let slot = self.slot.clone();
        let events = self.events.clone();
        let visible_for = self.visible_for;
        guard.expiry = Some(tokio::spawn(async move {
            time::sleep(visible_for).await;
            let mut guard = slot.lock().await;
            if guard.generation == generation {
                guard.current = None;
                guard.expiry = None;
                let _ = events.send(HomeEvent::NotificationCleared);
            }
        }));
        drop(guard);

        let _ = self.events.send(HomeEvent::NotificationShown {
            notification: notification.clone(),
        });
        notification
    }
}
