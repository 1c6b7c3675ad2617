//! Push transport.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Url;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::debug;

use quartermaster_core::{AppError, AppResult, ErrorKind};

/// One inbound item from the push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload.
    Text(String),
    /// The server closed the connection.
    Close {
        /// Close code, if one was sent.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },
}

/// Stream of frames from an open connection. Ends when the socket closes.
pub type FrameStream = BoxStream<'static, AppResult<Frame>>;

/// Opens push connections.
///
/// A refused session must be reported as `AuthRequired` so the channel
/// stops instead of retrying; every other failure is retried.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`.
    async fn connect(&self, url: &Url) -> AppResult<FrameStream>;
}

/// [`Connector`] over a plain WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> AppResult<FrameStream> {
        let (socket, response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(handshake_error)?;
        debug!(status = response.status().as_u16(), "WebSocket handshake complete");

        let frames = socket.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Close(frame)) => Some(Ok(match frame {
                    Some(frame) => Frame::Close {
                        code: Some(u16::from(frame.code)),
                        reason: frame.reason.as_str().to_owned(),
                    },
                    None => Frame::Close {
                        code: None,
                        reason: String::new(),
                    },
                })),
                Ok(Message::Binary(bytes)) => {
                    debug!(len = bytes.len(), "Ignoring binary frame");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(AppError::with_source(
                    ErrorKind::Network,
                    "WebSocket read failed",
                    e,
                ))),
            }
        });
        Ok(frames.boxed())
    }
}

fn handshake_error(e: tungstenite::Error) -> AppError {
    if let tungstenite::Error::Http(response) = &e {
        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return AppError::auth_required(format!(
                "Push endpoint refused the session (HTTP {status})"
            ));
        }
    }
    AppError::with_source(ErrorKind::Network, "WebSocket handshake failed", e)
}
