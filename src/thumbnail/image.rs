use std::fs;
use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use crate::config::ResizeLimits;
use crate::image_utils::validate_dimensions;

// 一般画像ファイル（JPEG/PNG/TIFF）を読み込む
pub fn load_image(path: &Path, limits: &ResizeLimits) -> Result<DynamicImage, String> {
    let data = fs::read(path).map_err(|e| format!("ファイル読み込みエラー: {}", e))?;

    match decode_bytes(&data, limits) {
        Ok(img) => Ok(img),
        Err(err) => {
            // 途中で切れたJPEGはEOIを補って再試行（読めた範囲だけでも表示する）
            let Some(repaired) = repair_truncated_jpeg(&data) else {
                return Err(err);
            };
            tracing::debug!(path = %path.display(), "JPEG終端を補って再デコード");
            decode_bytes(&repaired, limits).map_err(|_| err)
        }
    }
}

fn decode_bytes(data: &[u8], limits: &ResizeLimits) -> Result<DynamicImage, String> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("画像形式の判定に失敗: {}", e))?;
    if reader.format().is_none() {
        return Err("サポートされていない画像形式".to_string());
    }

    let decoder = reader
        .into_decoder()
        .map_err(|e| format!("画像読み込みエラー: {}", e))?;

    // ピクセルを展開する前にヘッダーのサイズで検証（DoS防止）
    let (width, height) = decoder.dimensions();
    validate_dimensions(width, height, limits.max_source_pixels)?;

    DynamicImage::from_decoder(decoder).map_err(|e| format!("画像読み込みエラー: {}", e))
}

fn repair_truncated_jpeg(data: &[u8]) -> Option<Vec<u8>> {
    const EOI: [u8; 2] = [0xFF, 0xD9];
    if image::guess_format(data).ok()? != ImageFormat::Jpeg || data.ends_with(&EOI) {
        return None;
    }
    let mut repaired = Vec::with_capacity(data.len() + EOI.len());
    repaired.extend_from_slice(data);
    repaired.extend_from_slice(&EOI);
    Some(repaired)
}
