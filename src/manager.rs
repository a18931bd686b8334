use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use crate::cache::{CacheState, CacheStats};
use crate::config::{CacheConfig, ResizeLimits};
use crate::error::BuildError;
use crate::placeholder::{minimal_placeholder, placeholder_for};
use crate::sink::{ChannelSink, ReadySink};
use crate::task::{Completion, TaskUnit};
use crate::thumbnail::{Decoder, FileDecoder};
use crate::types::{CacheKey, Lookup, ThumbnailReady};

/// サムネイルキャッシュの窓口
///
/// ヒットは同期的に返し、ミスはワーカープールでデコードして通知で届ける。
/// 同じキーのデコードは同時に1つだけ。clone は同じキャッシュを指すハンドルの複製。
#[derive(Clone)]
pub struct ThumbnailManager {
    shared: Arc<Shared>,
    pool: Arc<rayon::ThreadPool>,
    decoder: Arc<dyn Decoder>,
    limits: ResizeLimits,
    completions: Sender<Completion>,
}

/// 集約スレッドと共有する状態
struct Shared {
    state: Mutex<CacheState>,
    sink: Box<dyn ReadySink>,
    cache_failures: bool,
}

impl ThumbnailManager {
    pub fn new(config: CacheConfig, sink: impl ReadySink) -> Result<Self, BuildError> {
        Self::with_decoder(config, sink, FileDecoder)
    }

    /// 通知を std の mpsc チャネルで受け取る構成
    pub fn with_channel(config: CacheConfig) -> Result<(Self, Receiver<ThumbnailReady>), BuildError> {
        let (sink, rx) = ChannelSink::new();
        Ok((Self::new(config, sink)?, rx))
    }

    pub fn with_decoder(
        config: CacheConfig,
        sink: impl ReadySink,
        decoder: impl Decoder,
    ) -> Result<Self, BuildError> {
        config.validate()?;

        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("thumbnail-worker-{}", index));
        if let Some(threads) = config.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(CacheState::new(config.max_entries)),
            sink: Box::new(sink),
            cache_failures: config.cache_failures,
        });

        // 完了メッセージを1本のスレッドで集約（ストア更新 → 通知）
        let (completions, rx) = mpsc::channel();
        let consolidator = Arc::clone(&shared);
        thread::Builder::new()
            .name("thumbnail-consolidator".to_string())
            .spawn(move || consolidator.run(rx))
            .map_err(BuildError::Consolidator)?;

        tracing::debug!(
            max_entries = config.max_entries,
            workers = pool.current_num_threads(),
            cache_failures = config.cache_failures,
            "サムネイルキャッシュを初期化"
        );

        Ok(Self {
            shared,
            pool: Arc::new(pool),
            decoder: Arc::new(decoder),
            limits: config.resize_limits(),
            completions,
        })
    }

    /// サムネイルを要求する（I/O で待たない）
    ///
    /// キャッシュ済みなら `Lookup::Ready`、それ以外は `Lookup::Pending` を返し、
    /// 結果は通知で1回だけ届く。
    pub fn request(&self, path: impl Into<PathBuf>, width: u32, height: u32) -> Lookup {
        self.request_key(CacheKey::new(path, width, height))
    }

    pub fn request_key(&self, key: CacheKey) -> Lookup {
        {
            let mut guard = self.shared.lock();
            let state = &mut *guard;

            if let Some(bitmap) = state.store.get(&key).cloned() {
                state.counters.hits += 1;
                tracing::trace!(%key, "キャッシュヒット");
                return Lookup::Ready(bitmap);
            }
            if state.in_flight.contains(&key) {
                state.counters.coalesced += 1;
                tracing::trace!(%key, "読み込み中のため待機");
                return Lookup::Pending;
            }
            state.in_flight.begin(key.clone());
            state.counters.misses += 1;
        }

        tracing::debug!(%key, id = %key.fingerprint(), "デコードを開始");
        let task = TaskUnit {
            key,
            decoder: Arc::clone(&self.decoder),
            limits: self.limits,
            completions: self.completions.clone(),
        };
        self.pool.spawn(move || task.run());
        Lookup::Pending
    }

    /// キャッシュを空にする（デコード中のタスクはそのまま完了する）
    pub fn clear(&self) {
        let mut state = self.shared.lock();
        let dropped = state.store.len();
        state.store.clear();
        tracing::debug!(dropped, in_flight = state.in_flight.len(), "キャッシュをクリア");
    }

    /// 1件だけ破棄（次回の要求で再デコード）
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.shared.lock().store.remove(key).is_some()
    }

    /// LRU 位置を変えずにキャッシュ済みか確認
    pub fn is_resident(&self, key: &CacheKey) -> bool {
        self.shared.lock().store.contains(key)
    }

    pub fn is_loading(&self, key: &CacheKey) -> bool {
        self.shared.lock().in_flight.contains(key)
    }

    pub fn len(&self) -> usize {
        self.shared.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.lock().store.capacity()
    }

    pub fn stats(&self) -> CacheStats {
        self.shared.lock().stats()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // 全ての送信側（マネージャーと実行中タスク）が破棄されると終了
    fn run(&self, completions: Receiver<Completion>) {
        for completion in completions {
            self.complete(completion);
        }
        tracing::debug!("集約スレッドを終了");
    }

    fn complete(&self, completion: Completion) {
        let Completion { key, outcome } = completion;
        let (bitmap, failed) = match outcome {
            Ok(bitmap) => (bitmap, false),
            Err(err) => {
                tracing::warn!(%key, error = %err, "デコード失敗、プレースホルダーで代替");
                // 集約スレッドが止まると以降の通知がすべて届かなくなる
                let placeholder = panic::catch_unwind(AssertUnwindSafe(|| placeholder_for(&key)))
                    .unwrap_or_else(|_| {
                        tracing::error!(%key, "プレースホルダーの生成で panic が発生");
                        minimal_placeholder()
                    });
                (placeholder, true)
            }
        };

        {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.in_flight.finish(&key);

            if failed {
                state.counters.failed += 1;
            } else {
                state.counters.decoded += 1;
            }

            if !failed || self.cache_failures {
                let evicted = state.store.insert(key.clone(), bitmap.clone());
                state.counters.evicted += evicted.len() as u64;
                for (old, _) in &evicted {
                    tracing::debug!(key = %old, "LRU で追い出し");
                }
                if let Err(err) = state.store.check_capacity() {
                    tracing::error!(error = %err, "キャッシュの不変条件違反");
                }
            }
        }

        // ロックを外してから通知（シンクから request を呼んでもデッドロックしない）
        let event = ThumbnailReady { key, bitmap };
        if panic::catch_unwind(AssertUnwindSafe(|| self.sink.deliver(event))).is_err() {
            tracing::error!("通知シンクで panic が発生");
        }
    }
}
