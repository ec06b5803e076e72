//! Push notifications.
//!
//! A push message carries a JSON `{title, body}` payload and is shown with
//! a fixed icon, badge, vibration pattern and two actions. Clicking closes
//! the notification; the `explore` action also brings up the app root.

use std::sync::Mutex;
use std::sync::PoisonError;

use serde::{Deserialize, Serialize};

use swcache_core::Error;

pub const NOTIFICATION_ICON: &str = "/icon-192x192.png";
pub const NOTIFICATION_BADGE: &str = "/badge-72x72.png";
pub const VIBRATION_PATTERN: [u32; 3] = [100, 50, 100];
pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

/// Payload of a push message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PushPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationData {
    /// Arrival time in milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationOptions {
    pub body: Option<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl NotificationOptions {
    /// Display options for a push payload.
    pub fn for_push(payload: &PushPayload, arrived_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            body: payload.body.clone(),
            icon: NOTIFICATION_ICON.into(),
            badge: NOTIFICATION_BADGE.into(),
            vibrate: VIBRATION_PATTERN.to_vec(),
            data: NotificationData { date_of_arrival: arrived_at.timestamp_millis(), primary_key: 1 },
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.into(),
                    title: "View Results".into(),
                    icon: NOTIFICATION_ICON.into(),
                },
                NotificationAction { action: ACTION_CLOSE.into(), title: "Close".into(), icon: NOTIFICATION_ICON.into() },
            ],
        }
    }
}

/// A displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub options: NotificationOptions,
}

/// Action carried by a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    Explore,
    Close,
    /// Click on the notification body rather than a button.
    Default,
    Other(String),
}

impl From<Option<&str>> for ClickAction {
    fn from(action: Option<&str>) -> Self {
        match action {
            None | Some("") => ClickAction::Default,
            Some(ACTION_EXPLORE) => ClickAction::Explore,
            Some(ACTION_CLOSE) => ClickAction::Close,
            Some(other) => ClickAction::Other(other.to_string()),
        }
    }
}

/// Parse a push message body.
///
/// `None` (a push without data) means nothing is shown.
pub fn parse_push(data: Option<&str>) -> Result<Option<PushPayload>, Error> {
    data.map(|raw| serde_json::from_str(raw).map_err(|e| Error::InvalidInput(format!("push payload is not JSON: {e}"))))
        .transpose()
}

#[derive(Debug, Default)]
struct Tray {
    shown: Vec<Notification>,
    next_id: u64,
}

/// Notifications currently on screen.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    tray: Mutex<Tray>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, title: impl Into<String>, options: NotificationOptions) -> Notification {
        let mut tray = self.tray.lock().unwrap_or_else(PoisonError::into_inner);
        tray.next_id += 1;
        let notification = Notification { id: tray.next_id, title: title.into(), options };
        tray.shown.push(notification.clone());
        notification
    }

    pub fn close(&self, id: u64) -> Option<Notification> {
        let mut tray = self.tray.lock().unwrap_or_else(PoisonError::into_inner);
        let index = tray.shown.iter().position(|n| n.id == id)?;
        Some(tray.shown.remove(index))
    }

    pub fn list(&self) -> Vec<Notification> {
        self.tray.lock().unwrap_or_else(PoisonError::into_inner).shown.clone()
    }
}
