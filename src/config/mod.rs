pub mod job;
pub mod layout;
pub mod merged;
pub mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use layout::{LayoutTable, builtin_layout};
use settings::Settings;

/// ジョブファイルのパスからsettings.yamlを自動検出して読み込む。
///
/// ジョブファイルと同じディレクトリに `settings.yaml` が存在すれば読み込み、
/// 存在しなければデフォルト設定を返す。
pub fn load_settings_for_job(job_file_path: &Path) -> crate::error::Result<Settings> {
    let dir = job_file_path
        .parent()
        .ok_or_else(|| crate::error::GaitError::config("Cannot determine job file directory"))?;

    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}

/// 設定に従ってレイアウト表を読み込む。未指定なら組み込みレイアウトを共有する。
pub fn load_layout(layout_path: Option<&Path>) -> crate::error::Result<Arc<LayoutTable>> {
    match layout_path {
        Some(path) => Ok(Arc::new(LayoutTable::from_file(path)?)),
        None => Ok(builtin_layout()),
    }
}

/// 相対パスを基準ディレクトリで解決する。絶対パスはそのまま返す。
pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
