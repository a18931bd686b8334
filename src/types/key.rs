use std::fmt;
use std::path::{Path, PathBuf};
use crate::constants::MAX_TARGET_DIMENSION;

/// キャッシュキー（元ファイル + 目標サイズ）
///
/// 同じファイルでもサイズが違えば別エントリとして扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl CacheKey {
    /// 幅・高さは 1..=MAX_TARGET_DIMENSION に丸める
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width: width.clamp(1, MAX_TARGET_DIMENSION),
            height: height.clamp(1, MAX_TARGET_DIMENSION),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// ホスト側で使う不透明なID（MD5ハッシュ）
    pub fn fingerprint(&self) -> String {
        let input = format!("{}:{}:{}", self.path.display(), self.width, self.height);
        format!("{:x}", md5::compute(input))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}x{}", self.path.display(), self.width, self.height)
    }
}
