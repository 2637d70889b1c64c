// Phase 2: PDF読込とテキスト層の抽出

use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::GaitError;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// 先頭4バイトが `%PDF` であることを確認する。
pub fn ensure_pdf_magic(path: &Path, bytes: &[u8]) -> crate::error::Result<()> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(GaitError::NotAPdf {
            path: path.to_path_buf(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

/// PDFを一度だけ読み込み、バイト列とlopdf Documentの両方を保持する。
///
/// バイト列はキャッシュキーの計算とpdfiumでの描画に再利用する。
pub struct PdfReader {
    path: PathBuf,
    bytes: Vec<u8>,
    doc: Document,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path, bytes)
    }

    /// 読み込み済みのバイト列からPdfReaderを作成する。`path` はエラー表示用。
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> crate::error::Result<Self> {
        let path = path.into();
        ensure_pdf_magic(&path, &bytes)?;
        let doc = Document::load_mem(&bytes)
            .map_err(|e| GaitError::pdf_read(format!("{}: {e}", path.display())))?;
        Ok(Self { path, bytes, doc })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// ページ数を返す。
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// 指定ページ(0-indexed)のテキストを返す。
    pub fn page_text(&self, page_index: u32) -> crate::error::Result<String> {
        let total = self.page_count();
        if page_index >= total {
            return Err(GaitError::PageOutOfRange {
                page: page_index,
                total,
            });
        }
        Ok(self.doc.extract_text(&[page_index + 1])?)
    }

    /// 指定ページ群(0-indexed)のテキストを改行で連結したコーパスを返す。
    ///
    /// 文書に存在しないページは読み飛ばす。テキストを取り出せないページは
    /// 警告を出して読み飛ばす（該当フィールドは後段で `None` になる）。
    pub fn text_corpus(&self, page_indices: &[u32]) -> String {
        let total = self.page_count();
        let mut parts = Vec::new();

        for &idx in page_indices.iter().filter(|&&idx| idx < total) {
            match self.page_text(idx) {
                Ok(text) => {
                    debug!(page = idx, chars = text.len(), "extracted page text");
                    parts.push(text);
                }
                Err(e) => {
                    warn!(page = idx, path = %self.path.display(), "skipping unreadable text page: {e}");
                }
            }
        }

        parts.join("\n")
    }
}
