mod inflight;
mod memory;

pub use inflight::InFlightRegistry;
pub use memory::ThumbnailMemoryCache;

use serde::Serialize;
use crate::types::{Bitmap, CacheKey};

/// ロックで保護される共有状態（ストア + デコード中キー + 統計）
pub(crate) struct CacheState {
    pub store: ThumbnailMemoryCache<CacheKey, Bitmap>,
    pub in_flight: InFlightRegistry,
    pub counters: Counters,
}

impl CacheState {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: ThumbnailMemoryCache::new(max_entries),
            in_flight: InFlightRegistry::new(),
            counters: Counters::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits,
            misses: self.counters.misses,
            coalesced: self.counters.coalesced,
            decoded: self.counters.decoded,
            failed: self.counters.failed,
            evicted: self.counters.evicted,
            resident: self.store.len(),
            in_flight: self.in_flight.len(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub decoded: u64,
    pub failed: u64,
    pub evicted: u64,
}

/// キャッシュ統計のスナップショット
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// キャッシュヒット数
    pub hits: u64,
    /// デコードを開始したミス数
    pub misses: u64,
    /// 読み込み中のキーへの重複リクエスト数
    pub coalesced: u64,
    /// デコード成功数
    pub decoded: u64,
    /// デコード失敗数（プレースホルダーで代替）
    pub failed: u64,
    /// LRU で追い出した件数
    pub evicted: u64,
    /// 現在のキャッシュ件数
    pub resident: usize,
    /// 現在デコード中の件数
    pub in_flight: usize,
}
