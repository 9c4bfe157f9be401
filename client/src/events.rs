use crate::{Error, Result};
use commonware_codec::ReadExt;
use futures_util::{Stream as FutStream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use tracing::{debug, warn};

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Session feed decoded from binary WebSocket frames.
///
/// A background task reads the socket and queues each frame as a `T` (an
/// [casino_types::api::Update] for the simulator feed). Dropping the
/// stream stops the task.
pub struct Stream<T: ReadExt + Send + Sync + 'static> {
    frames: mpsc::Receiver<Result<T>>,
    reader: tokio::task::JoinHandle<()>,
}

impl<T: ReadExt + Send + Sync + 'static> Drop for Stream<T> {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl<T: ReadExt + Send + Sync + 'static> Stream<T> {
    /// Start reading `ws`, buffering up to `capacity` frames (`0` uses the
    /// default).
    pub(crate) fn new_with_capacity<S>(mut ws: WebSocketStream<S>, capacity: usize) -> Self
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let capacity = match capacity {
            0 => DEFAULT_CHANNEL_CAPACITY,
            capacity => capacity,
        };
        let (tx, frames) = mpsc::channel(capacity);

        let reader = tokio::spawn(async move {
            while let Some(message) = ws.next().await {
                let frame = match message {
                    Ok(Message::Binary(data)) => {
                        T::read(&mut data.as_slice()).map_err(|err| {
                            warn!(len = data.len(), ?err, "undecodable session update");
                            Error::InvalidData(err)
                        })
                    }
                    Ok(Message::Close(_)) => {
                        debug!("session feed closed by server");
                        let _ = tx.send(Err(Error::ConnectionClosed)).await;
                        break;
                    }
                    // Ping/pong and text frames carry no updates
                    Ok(_) => continue,
                    Err(err) => {
                        warn!(?err, "session feed failed");
                        let _ = tx.send(Err(err.into())).await;
                        break;
                    }
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        Self { frames, reader }
    }

    /// Next update, or `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Result<T>> {
        self.frames.recv().await
    }
}

impl<T: ReadExt + Send + Sync + 'static> FutStream for Stream<T> {
    type Item = Result<T>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.frames.poll_recv(cx)
    }
}
