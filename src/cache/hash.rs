// Phase 8: SHA-256（PDFバイト列 + 抽出設定）
//
// Computes a cache key from the document bytes and the settings that affect
// extraction. The key is a SHA-256 hash encoded as a lowercase hexadecimal string.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::config::layout::LayoutTable;

/// 抽出結果に影響する設定パラメータ。
///
/// キャッシュキー計算時にハッシュに含める設定値のみを保持する。
/// 被験者IDや保存先は抽出結果に影響しないので含めない。描画解像度は
/// 固定値なのでバージョンに含まれる。
pub struct CacheSettings<'a> {
    pub layout: &'a LayoutTable,
}

/// 設定を正規化JSON形式に変換する（キーはアルファベット順で固定）。
fn settings_to_canonical_json(settings: &CacheSettings<'_>) -> crate::error::Result<String> {
    let mut map = BTreeMap::new();
    map.insert("layout", serde_json::to_value(settings.layout)?);
    map.insert("version", serde_json::json!(env!("CARGO_PKG_VERSION")));
    Ok(serde_json::to_string(&map)?)
}

/// PDFバイト列と設定からキャッシュキー（SHA-256ハッシュ）を計算する。
///
/// ハッシュ入力: `pdf_bytes || settings_canonical_json`
/// 内容でキーを決めるので、同じPDFを別のパスから読んでも同じキーになる。
pub fn compute_cache_key(
    pdf_bytes: &[u8],
    settings: &CacheSettings<'_>,
) -> crate::error::Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(pdf_bytes);

    let settings_json = settings_to_canonical_json(settings)?;
    hasher.update(settings_json.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}
