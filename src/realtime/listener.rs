use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgListener, PgNotification};

use super::{Burst, ChangeEvent, ChangeNotice, ConnectionMap, broadcast, coalesce};
use crate::models::message;
use crate::snapshot::AppointmentSnapshot;

/// Notification channel the table triggers publish on.
pub const CHANNEL: &str = "sigpef_changes";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Notices arriving this soon after the first one are handled together.
const COALESCE_WINDOW: Duration = Duration::from_millis(250);
const MAX_BURST: usize = 1000;

/// Follow the change feed for the life of the process, reconnecting on failure.
pub fn spawn_listener(pool: PgPool, snapshot: AppointmentSnapshot, conn_map: ConnectionMap) {
    actix_web::rt::spawn(async move {
        loop {
            if let Err(e) = listen(&pool, &snapshot, &conn_map).await {
                log::error!("Change listener failed: {e}; reconnecting in {}s", RECONNECT_DELAY.as_secs());
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    });
}

async fn listen(
    pool: &PgPool,
    snapshot: &AppointmentSnapshot,
    conn_map: &ConnectionMap,
) -> Result<(), sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHANNEL).await?;
    log::info!("Listening for changes on '{CHANNEL}'");

    // The feed may have missed changes while disconnected.
    snapshot.spawn_refresh(pool.clone());

    loop {
        let first = listener.recv().await?;
        let mut notices: Vec<ChangeNotice> = decode(&first).into_iter().collect();

        let deadline = tokio::time::Instant::now() + COALESCE_WINDOW;
        while notices.len() < MAX_BURST {
            match tokio::time::timeout_at(deadline, listener.recv()).await {
                Ok(next) => notices.extend(decode(&next?)),
                Err(_) => break,
            }
        }

        handle(pool, snapshot, conn_map, coalesce(notices)).await;
    }
}

fn decode(notification: &PgNotification) -> Option<ChangeNotice> {
    match serde_json::from_str(notification.payload()) {
        Ok(n) => Some(n),
        Err(e) => {
            log::warn!("Ignoring malformed change notice '{}': {e}", notification.payload());
            None
        }
    }
}

async fn handle(pool: &PgPool, snapshot: &AppointmentSnapshot, conn_map: &ConnectionMap, burst: Burst) {
    if burst.refresh_appointments {
        if let Err(e) = snapshot.refresh(pool).await {
            log::error!("Appointment refresh after change failed: {e}");
        }
    }

    for (table, op) in burst.changes {
        broadcast(conn_map, &ChangeEvent::DataChanged { table, op });
    }

    for id in burst.messages {
        match message::find_by_id(pool, id).await {
            Ok(Some(m)) => {
                broadcast(
                    conn_map,
                    &ChangeEvent::GlobalMessage {
                        id: m.id,
                        message: m.message,
                        created_by: m.created_by,
                        created_at: m.created_at,
                    },
                );
            }
            Ok(None) => {}
            Err(e) => log::error!("Failed to load global message {id}: {e}"),
        }
    }
}
