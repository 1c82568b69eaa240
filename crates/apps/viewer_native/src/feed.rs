use futures_util::StreamExt;
use streaming::{TileChanged, TileKey};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Tile key named by one feed message, if it is a well-formed `TileChanged`.
pub fn parse_message(text: &str) -> Option<TileKey> {
    let msg: TileChanged = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(err) => {
            debug!(error = %err, "ignoring feed message");
            return None;
        }
    };
    match msg.key() {
        Ok(key) => Some(key),
        Err(err) => {
            warn!(error = %err, "feed named an invalid tile");
            None
        }
    }
}

/// Forward tile invalidations from a websocket feed until it closes or the
/// receiver goes away.
pub async fn run(url: String, tx: mpsc::Sender<TileKey>) {
    let mut ws = match connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(err) => {
            warn!(%url, error = %err, "invalidation feed unavailable");
            return;
        }
    };
    info!(%url, "invalidation feed connected");

    while let Some(msg) = ws.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let Some(key) = parse_message(&text) else {
                    continue;
                };
                if tx.send(key).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "invalidation feed failed");
                break;
            }
        }
    }
    info!(%url, "invalidation feed closed");
}
