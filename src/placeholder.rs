use crate::constants::{PLACEHOLDER_BACKGROUND, PLACEHOLDER_GLYPH};
use crate::types::{Bitmap, CacheKey, PixelFormat};

/// デコード失敗時の代替ビットマップ（要求サイズちょうど、単色背景 + ×印）
pub fn placeholder_for(key: &CacheKey) -> Bitmap {
    let (width, height) = (key.width(), key.height());
    let channels = PixelFormat::Rgba8.channels();
    let mut pixels = PLACEHOLDER_BACKGROUND.repeat(width as usize * height as usize);

    // 中央に×印（短辺の半分、線幅は短辺の1/16）
    let side = width.min(height) as i64;
    let half = side / 4;
    let thickness = (side / 16).max(1);
    let (cx, cy) = (width as i64 / 2, height as i64 / 2);
    if half > 0 {
        for y in (cy - half)..=(cy + half) {
            for x in (cx - half)..=(cx + half) {
                let (dx, dy) = (x - cx, y - cy);
                let on_glyph = (dx - dy).abs() < thickness || (dx + dy).abs() < thickness;
                if !on_glyph || x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    continue;
                }
                let start = (y as usize * width as usize + x as usize) * channels;
                pixels[start..start + channels].copy_from_slice(&PLACEHOLDER_GLYPH);
            }
        }
    }

    Bitmap::placeholder(width, height, pixels)
}

/// 1x1 の背景色のみ（プレースホルダー生成自体に失敗したときの代替）
pub(crate) fn minimal_placeholder() -> Bitmap {
    Bitmap::placeholder(1, 1, PLACEHOLDER_BACKGROUND.to_vec())
}
