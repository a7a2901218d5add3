use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use tokio::sync::mpsc;

use crate::auth::session::get_user_id;
use crate::realtime::{self, ConnectionMap};

/// GET /ws - upgrade to a WebSocket that receives change events.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    conn_map: web::Data<ConnectionMap>,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = match get_user_id(&session) {
        Some(id) => id,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    realtime::register(&conn_map, user_id, tx);

    let conn_map = conn_map.get_ref().clone();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if ws_session.text(msg).await.is_err() {
                        break;
                    }
                }
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        // Clients only listen; edits go through the HTTP API.
                        _ => {}
                    }
                }
                else => break,
            }
        }

        drop(rx);
        realtime::prune(&conn_map, user_id);
    });

    Ok(response)
}
