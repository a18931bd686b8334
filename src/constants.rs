// サムネイル既定サイズ（CLI の --size 省略時）
pub const THUMBNAIL_SIZE: u32 = 480;

// 画像サイズ制限（DoS防止）
pub const MAX_IMAGE_DIMENSION: u32 = 65535;      // 最大辺長
pub const MAX_PIXEL_COUNT: u64 = 100_000_000;    // 最大ピクセル数（100メガピクセル）

// 目標サイズの上限（プレースホルダーの確保量を抑える）
pub const MAX_TARGET_DIMENSION: u32 = 4096;

// 安全クランプ（最終リサイズ前の縮小上限）
pub const SAFETY_MAX_SIDE: u32 = 4096;           // 絶対上限
pub const SAFETY_CLAMP_MULTIPLIER: u32 = 4;      // 目標サイズの何倍まで許容するか

// サポートする拡張子
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "psd", "tif", "tiff"];

// メモリキャッシュサイズ
pub const MEMORY_CACHE_MAX_SIZE: usize = 20;  // 最大20件をメモリに保持（メモリ節約）

// プレースホルダーの配色 (RGBA)
pub const PLACEHOLDER_BACKGROUND: [u8; 4] = [0xE0, 0xE0, 0xE0, 0xFF];
pub const PLACEHOLDER_GLYPH: [u8; 4] = [0xC0, 0x39, 0x2B, 0xFF];

// 設定ファイル
pub const CONFIG_DIR_NAME: &str = "thumbnail-cache";
pub const CONFIG_FILE_NAME: &str = "config.json";
