use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::{bail, Context, Result};
use clap::Parser;
use crate::commands::folder::get_folder_contents;
use crate::config::CacheConfig;
use crate::constants::THUMBNAIL_SIZE;
use crate::manager::ThumbnailManager;
use crate::types::{CacheKey, Lookup, ThumbnailReady};

/// 画像のサムネイルをメモリキャッシュ経由で生成する
#[derive(Debug, Parser)]
#[command(name = "thumbcache", version, about)]
pub struct Cli {
    /// 画像ファイルまたはフォルダ
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// 目標サイズ（幅x高さ）
    #[arg(long, default_value_t = Size::square(THUMBNAIL_SIZE))]
    pub size: Size,

    /// PNG の出力先フォルダ
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// 設定ファイル（JSON）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 結果を JSON Lines で出力
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn square(side: u32) -> Self {
        Self { width: side, height: side }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("サイズは 幅x高さ の形式で指定: {}", s))?;
        let parse = |v: &str| -> Result<u32, String> {
            match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(format!("無効なサイズ: {}", s)),
            }
        };
        Ok(Self { width: parse(w)?, height: parse(h)? })
    }
}

pub fn generate(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CacheConfig::load(path)?,
        None => CacheConfig::load_or_default()?,
    };

    let files = collect_inputs(&cli.inputs)?;
    if files.is_empty() {
        bail!("対象の画像がありません");
    }
    if let Some(out) = &cli.out {
        fs::create_dir_all(out)
            .with_context(|| format!("出力ディレクトリの作成に失敗: {}", out.display()))?;
    }

    let (manager, events) = ThumbnailManager::with_channel(config)?;
    let Size { width, height } = cli.size;

    let mut pending = 0usize;
    for file in &files {
        match manager.request(file, width, height) {
            Lookup::Ready(bitmap) => {
                let key = CacheKey::new(file, width, height);
                report(&cli, &ThumbnailReady { key, bitmap })?
            }
            Lookup::Pending => pending += 1,
        }
    }

    for _ in 0..pending {
        let event = events.recv().context("通知チャネルが閉じました")?;
        report(&cli, &event)?;
    }

    let stats = manager.stats();
    tracing::info!(
        decoded = stats.decoded,
        failed = stats.failed,
        evicted = stats.evicted,
        "サムネイル生成完了"
    );
    Ok(())
}

// ファイル・フォルダ指定を展開して重複を除く
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(get_folder_contents(input).map_err(anyhow::Error::msg)?);
        } else {
            files.push(input.clone());
        }
    }
    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
    Ok(files)
}

fn report(cli: &Cli, event: &ThumbnailReady) -> Result<()> {
    let (path, bitmap) = (event.path(), &event.bitmap);
    if let Some(out) = &cli.out {
        // 拡張子まで含めて名前にする（a.png と a.jpg を別ファイルに）
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        let target = out.join(format!("{}_{}.png", name, cli.size));
        let png = bitmap.encode_png().map_err(anyhow::Error::msg)?;
        fs::write(&target, png).with_context(|| format!("書き出しに失敗: {}", target.display()))?;
    }
    if cli.json {
        let payload = event.to_payload().map_err(anyhow::Error::msg)?;
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        let status = if bitmap.is_placeholder() { "placeholder" } else { "ok" };
        println!("{}\t{}x{}\t{}", path.display(), bitmap.width(), bitmap.height(), status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::ffi::OsString;

    #[test]
    fn size_parsing() {
        assert_eq!("120x80".parse::<Size>(), Ok(Size { width: 120, height: 80 }));
        assert_eq!("64X64".parse::<Size>(), Ok(Size::square(64)));
        assert!("0x10".parse::<Size>().is_err());
        assert!("64".parse::<Size>().is_err());
        assert_eq!(Size::square(THUMBNAIL_SIZE).to_string(), "480x480");
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["thumbcache", "a.png"]).unwrap();
        assert_eq!(cli.size, Size::square(THUMBNAIL_SIZE));
        assert!(!cli.json);
    }

    #[test]
    fn generate_writes_pngs_for_images_and_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        RgbImage::from_pixel(80, 40, Rgb([1, 2, 3])).save(src.join("a.png")).unwrap();
        fs::write(src.join("b.jpg"), b"broken").unwrap();
        fs::write(src.join("a.jpg"), b"broken").unwrap();
        let out = dir.path().join("out");
        let config = dir.path().join("config.json");
        fs::write(&config, r#"{"worker_threads": 2}"#).unwrap();

        let args: Vec<OsString> = vec![
            "thumbcache".into(),
            src.clone().into(),
            "--size".into(),
            "40x40".into(),
            "--out".into(),
            out.clone().into(),
            "--config".into(),
            config.clone().into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        generate(cli).unwrap();

        let a = image::open(out.join("a.png_40x40.png")).unwrap();
        assert_eq!((a.width(), a.height()), (40, 20));
        let b = image::open(out.join("b.jpg_40x40.png")).unwrap();
        assert_eq!((b.width(), b.height()), (40, 40));
        // 同名で拡張子違いのファイルは上書きし合わない
        let a_jpg = image::open(out.join("a.jpg_40x40.png")).unwrap();
        assert_eq!((a_jpg.width(), a_jpg.height()), (40, 40));
        assert_eq!(fs::read_dir(&out).unwrap().count(), 3);
    }
}
