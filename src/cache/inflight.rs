use std::collections::HashSet;
use crate::types::CacheKey;

/// デコード中のキー一覧（同一キーの重複デコード防止）
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    keys: HashSet<CacheKey>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 読み込み開始を登録（既に登録済みなら false）
    pub fn begin(&mut self, key: CacheKey) -> bool {
        self.keys.insert(key)
    }

    /// 読み込み完了（登録されていなければ false）
    pub fn finish(&mut self, key: &CacheKey) -> bool {
        self.keys.remove(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
