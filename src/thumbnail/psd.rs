use std::fs;
use std::path::Path;
use image::{DynamicImage, ImageFormat, RgbaImage};
use crate::config::ResizeLimits;
use crate::image_utils::validate_dimensions;

// サムネイルリソースID (1036 = Photoshop 5.0+, 1033 = 旧バージョン)
const THUMBNAIL_RESOURCE_IDS: [u16; 2] = [1036, 1033];
// format(4) + width(4) + height(4) + widthbytes(4) + totalsize(4) + compressedsize(4) + bpp(2) + planes(2)
const THUMBNAIL_HEADER_LEN: usize = 28;
const THUMBNAIL_FORMAT_JPEG: u32 = 1;

/// ビッグエンディアンのバイト列リーダー（範囲外は None）
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn skip(&mut self, len: usize) -> Option<()> {
        self.take(len).map(|_| ())
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

// ヘッダーの幅・高さ（レイヤーを展開せずに読む）
fn header_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut header = ByteReader::new(data);
    if header.take(4)? != b"8BPS" {
        return None;
    }
    // バージョン(2) + 予約(6) + チャンネル数(2)
    header.skip(10)?;
    let height = header.u32()?;
    let width = header.u32()?;
    Some((width, height))
}

// PSDファイルのイメージリソースから埋め込みJPEGサムネイルを探す
fn embedded_thumbnail(data: &[u8]) -> Option<&[u8]> {
    let mut header = ByteReader::new(data);
    if header.take(4)? != b"8BPS" {
        return None;
    }
    // バージョン(2) + 予約(6) + チャンネル数(2) + 高さ(4) + 幅(4) + 深度(2) + カラーモード(2)
    header.skip(22)?;

    let color_mode_len = header.u32()? as usize;
    header.skip(color_mode_len)?;

    let resources_len = header.u32()? as usize;
    let mut resources = ByteReader::new(header.take(resources_len)?);

    while !resources.is_empty() {
        if resources.take(4)? != b"8BIM" {
            return None;
        }
        let resource_id = resources.u16()?;

        // パスカル文字列（長さバイト込みで偶数長）
        let name_len = resources.take(1)?[0] as usize;
        resources.skip(name_len + usize::from(name_len % 2 == 0))?;

        let size = resources.u32()? as usize;
        let body = resources.take(size)?;
        // 偶数バウンダリにアライン（末尾はパディングが無い場合もある）
        let _ = resources.skip(size % 2);

        if THUMBNAIL_RESOURCE_IDS.contains(&resource_id) && body.len() > THUMBNAIL_HEADER_LEN {
            let format = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
            if format == THUMBNAIL_FORMAT_JPEG {
                return Some(&body[THUMBNAIL_HEADER_LEN..]);
            }
        }
    }

    None
}

// PSDファイルを読み込む
// 埋め込みサムネイルが目標サイズ以上の場合のみ使用、それ以外はフルコンポジット
pub fn load_psd(path: &Path, target_side: u32, limits: &ResizeLimits) -> Result<DynamicImage, String> {
    let data = fs::read(path).map_err(|e| format!("ファイル読み込みエラー: {}", e))?;

    // 1. 埋め込みサムネイル（JPEG）を試行
    if let Some(jpeg_data) = embedded_thumbnail(&data) {
        if let Ok(img) = image::load_from_memory_with_format(jpeg_data, ImageFormat::Jpeg) {
            // 低解像度だと画質が劣化するため、目標サイズに届かなければフルコンポジット
            if img.width() >= target_side || img.height() >= target_side {
                return Ok(img);
            }
        }
    }

    // 2. フルコンポジット（全レイヤーを展開する前にヘッダーのサイズで検証）
    let (width, height) = header_dimensions(&data).ok_or_else(|| "PSDヘッダーが不正".to_string())?;
    validate_dimensions(width, height, limits.max_source_pixels)?;

    let psd_file = psd::Psd::from_bytes(&data).map_err(|e| format!("PSD読み込みエラー: {:?}", e))?;
    let (width, height) = (psd_file.width(), psd_file.height());

    RgbaImage::from_raw(width, height, psd_file.rgba())
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| "画像データの変換に失敗".to_string())
}
