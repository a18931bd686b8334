use std::sync::{mpsc, Mutex, PoisonError};
use crate::types::ThumbnailReady;

/// 読み込み完了通知の受け口
///
/// 集約スレッドから呼ばれる。UI スレッドへの転送などはホスト側で行う。
pub trait ReadySink: Send + Sync + 'static {
    fn deliver(&self, event: ThumbnailReady);
}

impl<F> ReadySink for F
where
    F: Fn(ThumbnailReady) + Send + Sync + 'static,
{
    fn deliver(&self, event: ThumbnailReady) {
        self(event)
    }
}

/// std の mpsc チャネルに流すシンク
pub struct ChannelSink {
    tx: Mutex<mpsc::Sender<ThumbnailReady>>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::Receiver<ThumbnailReady>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl ReadySink for ChannelSink {
    fn deliver(&self, event: ThumbnailReady) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        if tx.send(event).is_err() {
            // 受信側が既に破棄されている
            tracing::debug!("通知の受信側が閉じています");
        }
    }
}

/// tokio の非同期チャネルに流すシンク（async なホスト向け）
pub struct TokioSink {
    tx: tokio::sync::mpsc::UnboundedSender<ThumbnailReady>,
}

impl TokioSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ThumbnailReady>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReadySink for TokioSink {
    fn deliver(&self, event: ThumbnailReady) {
        if self.tx.send(event).is_err() {
            tracing::debug!("通知の受信側が閉じています");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bitmap, CacheKey, PixelFormat};
    use std::sync::Arc;

    fn event(name: &str) -> ThumbnailReady {
        ThumbnailReady {
            key: CacheKey::new(name, 1, 1),
            bitmap: Bitmap::from_raw(1, 1, PixelFormat::Rgb8, vec![0; 3]).unwrap(),
        }
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (sink, rx) = ChannelSink::new();
        sink.deliver(event("a"));
        assert_eq!(rx.recv().unwrap().path(), std::path::Path::new("a"));
    }

    #[test]
    fn closed_receiver_is_tolerated() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.deliver(event("a"));
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&seen);
        let sink = move |e: ThumbnailReady| store.lock().unwrap().push(e.key);
        sink.deliver(event("b"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tokio_sink_forwards_events() {
        let (sink, mut rx) = TokioSink::new();
        sink.deliver(event("c"));
        assert_eq!(rx.recv().await.unwrap().key, CacheKey::new("c", 1, 1));
    }
}
