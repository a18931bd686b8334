use std::path::{Path, PathBuf};
use thiserror::Error;

/// デコード・リサイズの失敗（呼び出し側にはプレースホルダーとして届く）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ThumbnailError {
    #[error("画像デコードエラー: {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
}

impl ThumbnailError {
    pub fn decode(path: &Path, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Decode { reason, .. } => reason,
        }
    }
}

/// キャッシュ内部の不変条件違反（発生したらプログラムの不具合）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("キャッシュ容量超過: {len} 件 (最大: {max})")]
    CapacityExceeded { len: usize, max: usize },
}

/// 設定ファイルの読み込み・検証エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("設定ファイルの読み込みに失敗: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("設定ファイルのパースに失敗: {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("無効な設定値: {0}")]
    Invalid(String),
}

/// キャッシュマネージャー構築時のエラー
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("ワーカープールの作成に失敗: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("集約スレッドの起動に失敗: {0}")]
    Consolidator(#[source] std::io::Error),
}
