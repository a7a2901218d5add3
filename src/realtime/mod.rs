pub mod listener;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use listener::{CHANNEL, spawn_listener};

/// Open WebSocket senders per logged-in user.
pub type ConnectionMap = Arc<RwLock<HashMap<i64, Vec<mpsc::UnboundedSender<String>>>>>;

pub fn new_connection_map() -> ConnectionMap {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Payload published by the database triggers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeNotice {
    pub table: String,
    pub op: String,
    #[serde(default)]
    pub id: Option<i64>,
}

/// The work one burst of notices calls for.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Burst {
    /// At least one notice touched `pericias`.
    pub refresh_appointments: bool,
    /// Distinct (table, op) pairs in arrival order, one `data_changed` event each.
    pub changes: Vec<(String, String)>,
    /// New broadcast messages, each pushed on its own.
    pub messages: Vec<i64>,
}

/// Fold a burst of notices into a single refresh and deduplicated events.
pub fn coalesce(notices: impl IntoIterator<Item = ChangeNotice>) -> Burst {
    let mut burst = Burst::default();
    for notice in notices {
        if notice.table == "pericias" {
            burst.refresh_appointments = true;
        }
        match (notice.table.as_str(), notice.op.as_str(), notice.id) {
            ("global_messages", "INSERT", Some(id)) => {
                if !burst.messages.contains(&id) {
                    burst.messages.push(id);
                }
            }
            _ => {
                let key = (notice.table, notice.op);
                if !burst.changes.contains(&key) {
                    burst.changes.push(key);
                }
            }
        }
    }
    burst
}

/// What connected clients receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    DataChanged {
        table: String,
        op: String,
    },
    GlobalMessage {
        id: i64,
        message: String,
        created_by: String,
        created_at: DateTime<Utc>,
    },
}

/// Send `event` to every open connection. Returns how many sockets it was queued on.
pub fn broadcast(conn_map: &ConnectionMap, event: &ChangeEvent) -> usize {
    let msg = match serde_json::to_string(event) {
        Ok(m) => m,
        Err(e) => {
            log::error!("Failed to encode change event: {e}");
            return 0;
        }
    };
    let map = match conn_map.read() {
        Ok(m) => m,
        Err(_) => return 0,
    };
    let mut sent = 0;
    for senders in map.values() {
        for sender in senders {
            if sender.send(msg.clone()).is_ok() {
                sent += 1;
            }
        }
    }
    sent
}

pub fn register(conn_map: &ConnectionMap, user_id: i64, sender: mpsc::UnboundedSender<String>) {
    let mut map = conn_map.write().unwrap_or_else(|e| e.into_inner());
    map.entry(user_id).or_default().push(sender);
}

/// Drop closed senders for `user_id`, and the user entry once none remain.
pub fn prune(conn_map: &ConnectionMap, user_id: i64) {
    if let Ok(mut map) = conn_map.write() {
        if let Some(senders) = map.get_mut(&user_id) {
            senders.retain(|s| !s.is_closed());
            if senders.is_empty() {
                map.remove(&user_id);
            }
        }
    }
}
