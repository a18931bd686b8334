use image::imageops::{self, FilterType};
use image::DynamicImage;
use crate::config::ResizeLimits;
use crate::constants::MAX_IMAGE_DIMENSION;
use crate::types::{Bitmap, PixelFormat};

// 画像サイズ検証（DoS防止）
pub fn validate_dimensions(width: u32, height: u32, max_pixels: u64) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err("無効な画像サイズ: 幅または高さが0".to_string());
    }
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(format!(
            "画像サイズが大きすぎます: {}x{} (最大: {})",
            width, height, MAX_IMAGE_DIMENSION
        ));
    }
    let pixel_count = (width as u64) * (height as u64);
    if pixel_count > max_pixels {
        return Err(format!(
            "ピクセル数が多すぎます: {} (最大: {})",
            pixel_count, max_pixels
        ));
    }
    Ok(())
}

// ファイルタイプを取得
pub fn get_file_type(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "psd" => Some("psd"),
        "tif" | "tiff" => Some("tif"),
        _ => None,
    }
}

/// 枠 (box_width x box_height) に収まるサイズ。拡大はしない。
pub fn fitted_size(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    if width <= box_width && height <= box_height {
        return (width, height);
    }
    let scale = f64::min(
        box_width as f64 / width as f64,
        box_height as f64 / height as f64,
    );
    let fit = |side: u32, bound: u32| ((side as f64 * scale).round() as u32).clamp(1, bound.max(1));
    (fit(width, box_width), fit(height, box_height))
}

/// 安全クランプ: 上限を超える画像を最終リサイズ前に縮小
pub fn clamp_for_safety(img: DynamicImage, bound: u32) -> DynamicImage {
    if img.width() <= bound && img.height() <= bound {
        return img;
    }
    let (width, height) = fitted_size(img.width(), img.height(), bound, bound);
    tracing::debug!(
        from_width = img.width(),
        from_height = img.height(),
        width,
        height,
        "安全クランプで縮小"
    );
    // Lanczos3: 高品質な縮小（後段のリサイズの元になるため）
    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// 画像をサムネイル用ビットマップに変換
///
/// 安全クランプ → 色形式の正規化（アルファ有りは RGBA、無しは RGB）→ 枠に収まるよう縮小。
pub fn create_thumbnail(
    img: DynamicImage,
    target_width: u32,
    target_height: u32,
    limits: &ResizeLimits,
) -> Result<Bitmap, String> {
    validate_dimensions(img.width(), img.height(), u64::MAX)?;

    let bound = limits.safety_bound(target_width, target_height);
    let img = clamp_for_safety(img, bound);
    let (width, height) = fitted_size(img.width(), img.height(), target_width, target_height);

    // Triangle: 高速なリサンプリングフィルタ（サムネイル用途では十分な品質）
    let (format, pixels) = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let resized = if rgba.dimensions() == (width, height) {
            rgba
        } else {
            imageops::resize(&rgba, width, height, FilterType::Triangle)
        };
        (PixelFormat::Rgba8, resized.into_raw())
    } else {
        let rgb = img.to_rgb8();
        let resized = if rgb.dimensions() == (width, height) {
            rgb
        } else {
            imageops::resize(&rgb, width, height, FilterType::Triangle)
        };
        (PixelFormat::Rgb8, resized.into_raw())
    };

    Bitmap::from_raw(width, height, format, pixels).ok_or_else(|| "画像データの変換に失敗".to_string())
}
