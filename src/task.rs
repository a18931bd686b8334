use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use crate::config::ResizeLimits;
use crate::error::ThumbnailError;
use crate::thumbnail::Decoder;
use crate::types::{Bitmap, CacheKey};

/// ワーカーから集約スレッドへ送る完了メッセージ
pub(crate) struct Completion {
    pub key: CacheKey,
    pub outcome: Result<Bitmap, ThumbnailError>,
}

/// 1キー分のデコード処理（ワーカープール上で実行）
pub(crate) struct TaskUnit {
    pub key: CacheKey,
    pub decoder: Arc<dyn Decoder>,
    pub limits: ResizeLimits,
    pub completions: Sender<Completion>,
}

impl TaskUnit {
    pub fn run(self) {
        let Self { key, decoder, limits, completions } = self;

        // デコーダーが panic しても必ず完了を報告する（キーがデコード中のまま残らないように）
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| decoder.decode(&key, &limits)))
            .unwrap_or_else(|payload| {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "不明なエラー".to_string());
                Err(ThumbnailError::decode(key.path(), format!("デコード中に panic: {}", reason)))
            });

        if completions.send(Completion { key, outcome }).is_err() {
            // 集約スレッドが既に終了している（シャットダウン中）
            tracing::debug!("完了通知の送信先がありません");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelFormat;
    use std::sync::mpsc::channel;

    fn run_with<D: Decoder>(decoder: D) -> Completion {
        let (tx, rx) = channel();
        TaskUnit {
            key: CacheKey::new("a.png", 4, 4),
            decoder: Arc::new(decoder),
            limits: ResizeLimits::default(),
            completions: tx,
        }
        .run();
        rx.recv().unwrap()
    }

    #[test]
    fn reports_success() {
        let done = run_with(|key: &CacheKey, _: &ResizeLimits| -> Result<Bitmap, ThumbnailError> {
            Ok(Bitmap::from_raw(key.width(), key.height(), PixelFormat::Rgb8, vec![0; 48]).unwrap())
        });
        assert_eq!(done.key, CacheKey::new("a.png", 4, 4));
        assert!(done.outcome.is_ok());
    }

    #[test]
    fn reports_failure() {
        let done = run_with(|key: &CacheKey, _: &ResizeLimits| -> Result<Bitmap, ThumbnailError> {
            Err(ThumbnailError::decode(key.path(), "壊れています"))
        });
        assert_eq!(done.outcome.unwrap_err().reason(), "壊れています");
    }

    #[test]
    fn panic_becomes_failure() {
        let done = run_with(|_: &CacheKey, _: &ResizeLimits| -> Result<Bitmap, ThumbnailError> {
            panic!("boom")
        });
        assert!(done.outcome.unwrap_err().reason().contains("boom"));
    }
}
