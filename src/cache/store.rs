// Phase 8: ファイルシステムキャッシュ: hash → 抽出結果
//
// Stores and retrieves Extraction on disk, keyed by SHA-256 hash.
// Entries: metadata.json, extraction.json

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GaitError;
use crate::record::Extraction;

/// キャッシュエントリの必須ファイル。
const CACHE_FILES: &[&str] = &["metadata.json", "extraction.json"];

/// ファイルシステムベースのキャッシュストア。
///
/// `<cache_dir>/<hex_hash>/` 以下に抽出結果を格納する。
pub struct CacheStore {
    cache_dir: PathBuf,
}

/// metadata.json に保存するエントリ情報。
#[derive(serde::Serialize, serde::Deserialize)]
struct CacheMetadata {
    cache_key: String,
    created_at: String,
    #[serde(default)]
    source: Option<String>,
}

/// キャッシュキーが有効な SHA-256 hex 文字列であることを検証する。
///
/// 有効なキーは正確に64文字の小文字16進数([0-9a-f])である必要がある。
/// パストラバーサルや不正なディレクトリアクセスを防止する。
fn validate_cache_key(key: &str) -> crate::error::Result<()> {
    if key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(())
    } else {
        Err(GaitError::cache(format!(
            "invalid cache key: expected 64-character lowercase hex string, got '{key}'"
        )))
    }
}

impl CacheStore {
    /// 指定されたディレクトリをキャッシュルートとして新しい CacheStore を作成する。
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    /// キャッシュキーからディレクトリパスを計算する。
    fn key_dir(&self, key: &str) -> crate::error::Result<PathBuf> {
        validate_cache_key(key)?;
        Ok(self.cache_dir.join(key))
    }

    /// 抽出結果をキャッシュに保存する。
    ///
    /// キャッシュディレクトリが存在しない場合は自動的に作成する。
    /// 書き込みはアトミック: 一時ディレクトリにファイルを書き込み、
    /// 最後にrenameで最終パスに移動する。
    pub fn store(
        &self,
        key: &str,
        extraction: &Extraction,
        source: Option<&Path>,
    ) -> crate::error::Result<()> {
        let dir = self.key_dir(key)?;
        let tmp_dir = dir.with_extension("tmp");

        if tmp_dir.exists() {
            let _ = fs::remove_dir_all(&tmp_dir);
        }
        fs::create_dir_all(&tmp_dir).map_err(|e| GaitError::cache(e.to_string()))?;

        let extraction_json = serde_json::to_string_pretty(extraction)?;
        fs::write(tmp_dir.join("extraction.json"), extraction_json.as_bytes())
            .map_err(|e| GaitError::cache(e.to_string()))?;

        let metadata = CacheMetadata {
            cache_key: key.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            source: source.map(|p| p.display().to_string()),
        };
        let metadata_json = serde_json::to_string(&metadata)?;
        fs::write(tmp_dir.join("metadata.json"), metadata_json.as_bytes())
            .map_err(|e| GaitError::cache(e.to_string()))?;

        if dir.exists() {
            let _ = fs::remove_dir_all(&dir);
        }

        fs::rename(&tmp_dir, &dir).map_err(|e| GaitError::cache(e.to_string()))?;

        Ok(())
    }

    /// キャッシュから抽出結果を取得する。キャッシュミスの場合は None を返す。
    pub fn retrieve(&self, key: &str) -> crate::error::Result<Option<Extraction>> {
        let dir = self.key_dir(key)?;
        if !dir.exists() {
            return Ok(None);
        }

        let metadata_str = fs::read_to_string(dir.join("metadata.json"))
            .map_err(|e| GaitError::cache(e.to_string()))?;
        let metadata: CacheMetadata = serde_json::from_str(&metadata_str)?;

        if metadata.cache_key != key {
            return Err(GaitError::cache(format!(
                "cache key mismatch: expected '{key}', found '{}'",
                metadata.cache_key
            )));
        }

        let extraction_str = fs::read_to_string(dir.join("extraction.json"))
            .map_err(|e| GaitError::cache(e.to_string()))?;
        Ok(Some(serde_json::from_str(&extraction_str)?))
    }

    /// キャッシュキーが存在するか確認する。
    pub fn contains(&self, key: &str) -> bool {
        match self.key_dir(key) {
            Ok(dir) => CACHE_FILES.iter().all(|f| dir.join(f).exists()),
            Err(_) => false,
        }
    }
}
