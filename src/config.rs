use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, MAX_PIXEL_COUNT, MEMORY_CACHE_MAX_SIZE,
    SAFETY_CLAMP_MULTIPLIER, SAFETY_MAX_SIDE,
};
use crate::error::ConfigError;

/// キャッシュマネージャーの構築時設定
///
/// JSON の各フィールドは省略可能（省略時は既定値）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// メモリに保持する最大件数
    pub max_entries: usize,
    /// 安全クランプの絶対上限（辺の長さ）
    pub max_side: u32,
    /// 安全クランプの倍率（目標サイズの長辺 × 倍率）
    pub clamp_multiplier: u32,
    /// デコードを許可する元画像の最大ピクセル数
    pub max_source_pixels: u64,
    /// ワーカースレッド数（None の場合は rayon の既定値）
    pub worker_threads: Option<usize>,
    /// デコード失敗時のプレースホルダーをキャッシュに残すか
    pub cache_failures: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: MEMORY_CACHE_MAX_SIZE,
            max_side: SAFETY_MAX_SIDE,
            clamp_multiplier: SAFETY_CLAMP_MULTIPLIER,
            max_source_pixels: MAX_PIXEL_COUNT,
            worker_threads: None,
            cache_failures: true,
        }
    }
}

impl CacheConfig {
    /// JSON 設定ファイルを読み込む
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 既定の設定ファイル（存在すれば）を読み込み、無ければ既定値を返す
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/thumbnail-cache/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid("max_entries は1以上が必要".to_string()));
        }
        if self.max_side == 0 {
            return Err(ConfigError::Invalid("max_side は1以上が必要".to_string()));
        }
        if self.clamp_multiplier == 0 {
            return Err(ConfigError::Invalid("clamp_multiplier は1以上が必要".to_string()));
        }
        if self.max_source_pixels == 0 {
            return Err(ConfigError::Invalid("max_source_pixels は1以上が必要".to_string()));
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid("worker_threads は1以上が必要".to_string()));
        }
        Ok(())
    }

    pub(crate) fn resize_limits(&self) -> ResizeLimits {
        ResizeLimits {
            max_side: self.max_side,
            clamp_multiplier: self.clamp_multiplier,
            max_source_pixels: self.max_source_pixels,
        }
    }
}

/// デコーダーに渡すサイズ制限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeLimits {
    pub max_side: u32,
    pub clamp_multiplier: u32,
    pub max_source_pixels: u64,
}

impl Default for ResizeLimits {
    fn default() -> Self {
        CacheConfig::default().resize_limits()
    }
}

impl ResizeLimits {
    /// 最終リサイズ前に許容する辺の長さ
    pub fn safety_bound(&self, target_width: u32, target_height: u32) -> u32 {
        let relative = target_width
            .max(target_height)
            .saturating_mul(self.clamp_multiplier);
        relative.min(self.max_side).max(1)
    }
}
