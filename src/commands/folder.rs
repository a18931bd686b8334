use std::fs;
use std::path::{Path, PathBuf};
use crate::constants::SUPPORTED_EXTENSIONS;

/// フォルダ内のサポート対象画像をファイル名の自然順で返す
pub fn get_folder_contents(folder: &Path) -> Result<Vec<PathBuf>, String> {
    if !folder.is_dir() {
        return Err(format!("無効なフォルダパス: {}", folder.display()));
    }

    let entries = fs::read_dir(folder).map_err(|e| e.to_string())?;
    let mut files: Vec<PathBuf> = Vec::new();

    for entry_result in entries {
        // ディレクトリエントリ読み込みエラーはログに残してスキップ
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "ディレクトリエントリ読み込みエラー");
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }

    // ファイル名で自然順ソート
    files.sort_by(|a, b| natord::compare(&file_name(a), &file_name(b)));
    Ok(files)
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap_or_default().to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_supported_files_in_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page10.png", "page2.jpg", "notes.txt", "page1.PSD"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let names: Vec<String> = get_folder_contents(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["page1.PSD", "page2.jpg", "page10.png"]);
    }

    #[test]
    fn missing_folder_is_error() {
        assert!(get_folder_contents(Path::new("/no/such/folder")).is_err());
    }
}
