//! WebSocket exec channel.
//!
//! The control plane exposes remote execution as a WebSocket upgrade.
//! Output frames are multiplexed with a one-byte channel prefix
//! (1 = stdout, 2 = stderr, 3 = final status JSON); this module reads
//! the stream until it closes and forwards each frame to the caller's
//! callback.

use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message;

use crate::api::PodApiError;

/// Stdout channel byte in multiplexed exec frames.
const CHANNEL_STDOUT: u8 = 1;
/// Stderr channel byte.
const CHANNEL_STDERR: u8 = 2;
/// Final status channel byte.
const CHANNEL_STATUS: u8 = 3;

/// One event observed on the exec channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Stdout(String),
    Stderr(String),
    /// Final command status reported by the control plane.
    Status {
        success: bool,
        message: Option<String>,
    },
}

/// Execute `command` inside the named pod, streaming events to
/// `on_event` until the channel closes.
pub async fn exec_in_pod(
    api_url: &str,
    token: &str,
    namespace: &str,
    pod_name: &str,
    command: &[String],
    on_event: &(dyn Fn(ExecEvent) + Send + Sync),
) -> Result<(), PodApiError> {
    let url = exec_url(api_url, namespace, pod_name, command);

    let mut request = url
        .clone()
        .into_client_request()
        .map_err(|e| PodApiError::Exec(format!("Invalid exec URL {url}: {e}")))?;
    request.headers_mut().insert(
        AUTHORIZATION,
        format!("Bearer {token}")
            .parse()
            .map_err(|_| PodApiError::Exec("Invalid authorization header".to_string()))?,
    );

    let (ws_stream, _response) = connect_async(request)
        .await
        .map_err(|e| PodApiError::Exec(format!("Failed to open exec channel to {pod_name}: {e}")))?;

    tracing::info!(pod = pod_name, "Exec channel opened");

    let (_write, mut read) = ws_stream.split();
    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(Message::Binary(frame)) => handle_frame(&frame, on_event),
            Ok(Message::Text(text)) => {
                // Some gateways send plain text output frames.
                on_event(ExecEvent::Stdout(text.to_string()));
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Handled automatically by tungstenite.
            }
            Ok(Message::Close(frame)) => {
                tracing::debug!(pod = pod_name, ?frame, "Exec channel closed");
                break;
            }
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                return Err(PodApiError::Exec(format!(
                    "Exec channel receive error: {e}"
                )));
            }
        }
    }

    Ok(())
}

/// Decode one multiplexed frame and forward it to the callback.
fn handle_frame(frame: &[u8], on_event: &(dyn Fn(ExecEvent) + Send + Sync)) {
    let Some((&channel, payload)) = frame.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(payload).to_string();
    match channel {
        CHANNEL_STDOUT => on_event(ExecEvent::Stdout(text)),
        CHANNEL_STDERR => on_event(ExecEvent::Stderr(text)),
        CHANNEL_STATUS => on_event(parse_status(&text)),
        other => {
            tracing::trace!(channel = other, "Ignoring frame on unknown exec channel");
        }
    }
}

/// Parse the final status JSON (`{"status": "Success" | "Failure",
/// "message": ...}`); malformed payloads count as failure.
fn parse_status(text: &str) -> ExecEvent {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => ExecEvent::Status {
            success: value["status"].as_str() == Some("Success"),
            message: value["message"].as_str().map(|s| s.to_string()),
        },
        Err(_) => ExecEvent::Status {
            success: false,
            message: Some(text.to_string()),
        },
    }
}

/// Build the exec WebSocket URL, switching the REST scheme to its
/// WebSocket counterpart and query-encoding each command token.
fn exec_url(api_url: &str, namespace: &str, pod_name: &str, command: &[String]) -> String {
    let ws_base = if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_string()
    };

    let mut url = format!(
        "{ws_base}/namespaces/{namespace}/pods/{pod_name}/exec?tty=true&stdout=true&stderr=true"
    );
    for token in command {
        url.push_str("&command=");
        url.push_str(&encode_component(token));
    }
    url
}

/// Percent-encode a query component, leaving `/` intact for script
/// paths.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' | b',' => {
                out.push(byte as char)
            }
            other => {
                out.push('%');
                out.push_str(&format!("{other:02X}"));
            }
        }
    }
    out
}
