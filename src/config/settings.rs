use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::GaitError;

/// 描画解像度は固定（`render::pdfium::RENDER_DPI`）なので設定項目にしない。
/// 未知のキー（旧 `dpi` を含む）は読み込み時にエラーにする。
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// 0 のときは rayon の既定値（論理CPU数）を使う。
    pub parallel_workers: usize,
    /// 抽出結果キャッシュの置き場所。未指定ならキャッシュしない。
    pub cache_dir: Option<PathBuf>,
    pub database: PathBuf,
    /// レイアウト表YAML。未指定なら組み込みレイアウトを使う。
    pub layout: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            parallel_workers: 0,
            cache_dir: None,
            database: PathBuf::from("gait.db"),
            layout: None,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml)
            .map_err(|e| GaitError::config(format!("Failed to parse settings YAML: {e}")))
    }

    /// 設定ファイルを読み込み、相対パスをそのファイルのディレクトリ基準で解決する。
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(settings.resolve_relative(base))
    }

    fn resolve_relative(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        self.cache_dir = self.cache_dir.map(resolve);
        self.database = resolve(self.database);
        self.layout = self.layout.map(resolve);
        self
    }
}
