use std::path::Path;
use serde::Serialize;
use super::{Bitmap, CacheKey};

/// `request` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// キャッシュヒット（即時に返す）
    Ready(Bitmap),
    /// 読み込み中（結果は通知で届く）
    Pending,
}

impl Lookup {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        match self {
            Self::Ready(bitmap) => Some(bitmap),
            Self::Pending => None,
        }
    }

    pub fn into_bitmap(self) -> Option<Bitmap> {
        match self {
            Self::Ready(bitmap) => Some(bitmap),
            Self::Pending => None,
        }
    }
}

/// 読み込み完了通知（キー1件につき1回）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailReady {
    pub key: CacheKey,
    pub bitmap: Bitmap,
}

impl ThumbnailReady {
    pub fn path(&self) -> &Path {
        self.key.path()
    }

    pub fn width(&self) -> u32 {
        self.key.width()
    }

    pub fn height(&self) -> u32 {
        self.key.height()
    }

    /// フロントエンドに渡す JSON 用のデータ
    pub fn to_payload(&self) -> Result<ThumbnailPayload, String> {
        Ok(ThumbnailPayload {
            cache_key: self.key.fingerprint(),
            path: self.key.path().to_string_lossy().to_string(),
            width: self.bitmap.width(),
            height: self.bitmap.height(),
            placeholder: self.bitmap.is_placeholder(),
            data_url: self.bitmap.to_data_url()?,
        })
    }
}

/// サムネイル通知のシリアライズ形式
#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailPayload {
    /// キャッシュキー（MD5ハッシュ）
    pub cache_key: String,
    /// 元ファイルのパス
    pub path: String,
    /// 実際のビットマップ幅
    pub width: u32,
    /// 実際のビットマップ高さ
    pub height: u32,
    /// デコード失敗時のプレースホルダーか
    pub placeholder: bool,
    /// base64 PNG
    pub data_url: String,
}
