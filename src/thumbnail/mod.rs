mod image;
mod psd;

pub use self::image::load_image;
pub use self::psd::load_psd;

use std::path::Path;
use crate::config::ResizeLimits;
use crate::error::ThumbnailError;
use crate::image_utils::{create_thumbnail, get_file_type};
use crate::types::{Bitmap, CacheKey};

/// デコード・リサイズ処理（ワーカースレッドから呼ばれる）
pub trait Decoder: Send + Sync + 'static {
    fn decode(&self, key: &CacheKey, limits: &ResizeLimits) -> Result<Bitmap, ThumbnailError>;
}

/// ファイルから読み込む標準のデコーダー
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl Decoder for FileDecoder {
    fn decode(&self, key: &CacheKey, limits: &ResizeLimits) -> Result<Bitmap, ThumbnailError> {
        decode_and_resize(key.path(), key.width(), key.height(), limits)
    }
}

impl<F> Decoder for F
where
    F: Fn(&CacheKey, &ResizeLimits) -> Result<Bitmap, ThumbnailError> + Send + Sync + 'static,
{
    fn decode(&self, key: &CacheKey, limits: &ResizeLimits) -> Result<Bitmap, ThumbnailError> {
        self(key, limits)
    }
}

/// 画像ファイルを読み込み、目標サイズに収まるビットマップを生成
pub fn decode_and_resize(
    path: &Path,
    target_width: u32,
    target_height: u32,
    limits: &ResizeLimits,
) -> Result<Bitmap, ThumbnailError> {
    if !path.is_file() {
        return Err(ThumbnailError::decode(path, "ファイルが存在しません"));
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    // PSD は拡張子で判定、それ以外は中身から形式を判定
    let source = match get_file_type(ext) {
        Some("psd") => load_psd(path, target_width.max(target_height), limits),
        _ => load_image(path, limits),
    }
    .map_err(|reason| ThumbnailError::decode(path, reason))?;

    create_thumbnail(source, target_width, target_height, limits)
        .map_err(|reason| ThumbnailError::decode(path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage, Rgba, RgbaImage};
    use crate::types::PixelFormat;

    #[test]
    fn missing_file_is_decode_error() {
        let err = decode_and_resize(Path::new("/no/such/file.png"), 64, 64, &ResizeLimits::default())
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::Decode { .. }));
        assert!(err.reason().contains("存在しません"));
    }

    #[test]
    fn png_is_resized_to_fit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(400, 200, Rgb([0, 128, 255])).save(&path).unwrap();

        let bitmap = decode_and_resize(&path, 100, 100, &ResizeLimits::default()).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (100, 50));
        assert_eq!(bitmap.format(), PixelFormat::Rgb8);
        assert!(!bitmap.is_placeholder());
    }

    #[test]
    fn transparent_png_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(50, 80, Rgba([255, 0, 0, 0])).save(&path).unwrap();

        let bitmap = decode_and_resize(&path, 25, 25, &ResizeLimits::default()).unwrap();
        assert_eq!(bitmap.format(), PixelFormat::Rgba8);
        assert!(bitmap.width() <= 25 && bitmap.height() <= 25);
    }

    #[test]
    fn truncated_jpeg_is_salvaged() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.jpg");
        RgbImage::from_fn(256, 256, |x, y| Rgb([x as u8, y as u8, 128]))
            .save(&full)
            .unwrap();
        let data = std::fs::read(&full).unwrap();

        for percent in [50, 70, 90] {
            let path = dir.path().join(format!("cut_{}.jpg", percent));
            std::fs::write(&path, &data[..data.len() * percent / 100]).unwrap();

            let bitmap = decode_and_resize(&path, 64, 64, &ResizeLimits::default())
                .unwrap_or_else(|e| panic!("{}%: {}", percent, e));
            assert_eq!((bitmap.width(), bitmap.height()), (64, 64));
            assert!(!bitmap.is_placeholder());
        }
    }

    #[test]
    fn file_decoder_uses_key_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tall.png");
        RgbImage::new(30, 90).save(&path).unwrap();

        let key = CacheKey::new(&path, 60, 60);
        let bitmap = FileDecoder.decode(&key, &ResizeLimits::default()).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (20, 60));
    }
}
