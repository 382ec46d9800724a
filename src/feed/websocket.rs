// WebSocket plumbing shared by the feed clients: connect, send the
// subscription request, wait for its acknowledgement, then turn the socket
// into a stream of normalized transactions.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::feed::client::{FeedError, TransactionStream};
use crate::models::FeedTransaction;

pub type FeedSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Pulls the transaction out of one decoded notification. `Ok(None)` means
/// the message is not a notification and should be skipped.
pub type Extractor = fn(&Value) -> Result<Option<FeedTransaction>, FeedError>;

pub async fn connect(url: &str, authorization: Option<&str>) -> Result<FeedSocket, FeedError> {
    let mut request = url.into_client_request()?;

    if let Some(key) = authorization {
        let value = HeaderValue::from_str(key)
            .map_err(|_| FeedError::Config("API key is not a valid header value".to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (socket, response) = connect_async(request).await?;
    debug!("WebSocket handshake completed with status {}", response.status());

    Ok(socket)
}

/// Sends `request` and consumes frames until the response carrying
/// `request_id` arrives. Returns the response's `result` (usually the
/// subscription id).
pub async fn subscribe(
    socket: &mut FeedSocket,
    request: &Value,
    request_id: u64,
) -> Result<Value, FeedError> {
    socket.send(Message::text(request.to_string())).await?;

    while let Some(frame) = socket.next().await {
        let Some(message) = decode_frame(frame?)? else {
            continue;
        };

        if message.get("id").and_then(Value::as_u64) != Some(request_id) {
            debug!("Skipping message received before subscription ack: {}", message);
            continue;
        }

        if let Some(error) = message.get("error") {
            return Err(FeedError::Rejected(error.to_string()));
        }

        let result = message.get("result").cloned().unwrap_or(Value::Null);
        info!("Subscription acknowledged: {}", result);
        return Ok(result);
    }

    Err(FeedError::Closed)
}

/// Wraps an acknowledged socket into a [`TransactionStream`].
pub fn into_transaction_stream(socket: FeedSocket, extract: Extractor) -> TransactionStream {
    socket
        .filter_map(move |frame| async move {
            let message = match frame.map_err(FeedError::from).and_then(decode_frame) {
                Ok(Some(message)) => message,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };

            extract(&message).transpose()
        })
        .boxed()
}

/// JSON payload of a data frame; control frames yield `None`.
fn decode_frame(frame: Message) -> Result<Option<Value>, FeedError> {
    match frame {
        Message::Text(text) => Ok(Some(serde_json::from_str(&text)?)),
        Message::Binary(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Message::Close(reason) => {
            info!("Feed closed the connection: {:?}", reason);
            Ok(None)
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}

/// `params.result` of a subscription notification, if this is one.
pub fn notification_result(message: &Value) -> Option<&Value> {
    message
        .pointer("/params/result")
        .filter(|result| !result.is_null())
}
