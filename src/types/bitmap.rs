use std::sync::Arc;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// ピクセル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }

    fn color_type(self) -> ExtendedColorType {
        match self {
            Self::Rgb8 => ExtendedColorType::Rgb8,
            Self::Rgba8 => ExtendedColorType::Rgba8,
        }
    }
}

/// ビットマップの出自（実画像 or プレースホルダー）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapOrigin {
    Decoded,
    Placeholder,
}

/// 表示用ビットマップ
///
/// ピクセルは `Arc` で共有されるため、clone はハンドルの複製のみ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    pixels: Arc<[u8]>,
    origin: BitmapOrigin,
}

impl Bitmap {
    /// 生ピクセル列からビットマップを作成（長さが合わなければ None）
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let stride = (width as usize).checked_mul(format.channels())?;
        if pixels.len() != stride.checked_mul(height as usize)? {
            return None;
        }
        Some(Self {
            width,
            height,
            stride,
            format,
            pixels: pixels.into(),
            origin: BitmapOrigin::Decoded,
        })
    }

    /// プレースホルダー用（サイズは呼び出し側で保証済みの RGBA バッファ）
    pub(crate) fn placeholder(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            stride: width as usize * PixelFormat::Rgba8.channels(),
            format: PixelFormat::Rgba8,
            pixels: pixels.into(),
            origin: BitmapOrigin::Placeholder,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 1行あたりのバイト数
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn origin(&self) -> BitmapOrigin {
        self.origin
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == BitmapOrigin::Placeholder
    }

    /// 同じピクセルバッファを共有しているか
    pub fn shares_pixels(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// (x, y) のピクセル（範囲外なら None）
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.format.channels();
        let start = y as usize * self.stride + x as usize * channels;
        self.pixels.get(start..start + channels)
    }

    /// PNG形式で出力（可逆圧縮で画質劣化なし）
    pub fn encode_png(&self) -> Result<Vec<u8>, String> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(&self.pixels, self.width, self.height, self.format.color_type())
            .map_err(|e| format!("サムネイル書き出しエラー: {}", e))?;
        Ok(buffer)
    }

    /// WebView 向けの data URL（base64 PNG）
    pub fn to_data_url(&self) -> Result<String, String> {
        let png = self.encode_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_checks_buffer_length() {
        assert!(Bitmap::from_raw(2, 2, PixelFormat::Rgb8, vec![0; 12]).is_some());
        assert!(Bitmap::from_raw(2, 2, PixelFormat::Rgb8, vec![0; 11]).is_none());
        assert!(Bitmap::from_raw(2, 2, PixelFormat::Rgba8, vec![0; 12]).is_none());
        assert!(Bitmap::from_raw(0, 2, PixelFormat::Rgb8, vec![]).is_none());
    }

    #[test]
    fn stride_follows_format() {
        let rgb = Bitmap::from_raw(5, 1, PixelFormat::Rgb8, vec![0; 15]).unwrap();
        let rgba = Bitmap::from_raw(5, 1, PixelFormat::Rgba8, vec![0; 20]).unwrap();
        assert_eq!(rgb.stride(), 15);
        assert_eq!(rgba.stride(), 20);
    }

    #[test]
    fn pixel_lookup() {
        let pixels = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let bitmap = Bitmap::from_raw(2, 2, PixelFormat::Rgb8, pixels).unwrap();
        assert_eq!(bitmap.pixel(1, 1), Some(&[10, 11, 12][..]));
        assert_eq!(bitmap.pixel(2, 0), None);
    }

    #[test]
    fn clone_shares_pixels() {
        let bitmap = Bitmap::from_raw(1, 1, PixelFormat::Rgba8, vec![0; 4]).unwrap();
        let copy = bitmap.clone();
        assert!(bitmap.shares_pixels(&copy));
        assert!(!copy.is_placeholder());
    }

    #[test]
    fn data_url_is_png() {
        let bitmap = Bitmap::from_raw(3, 2, PixelFormat::Rgb8, vec![200; 18]).unwrap();
        let png = bitmap.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert!(bitmap.to_data_url().unwrap().starts_with("data:image/png;base64,"));
    }
}
