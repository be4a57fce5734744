//! # Disklink 共有型定義
//!
//! 署名付きトークンに載せるペイロードと、ディスクGatewayが受け付けるリクエストを
//! Rust構造体として提供する。
//!
//! ## エンコーディング規則
//! - Base64 (URL-safe, パディングなし): 署名付きトークン（URLパスにそのまま載せる）
//! - Base64 (Standard): チェックサム（MD5ダイジェスト）

use std::fmt;

use serde::{Deserialize, Serialize};

/// Content-Typeが指定されなかった場合に返すMIMEタイプ。
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// トークン用途
// ---------------------------------------------------------------------------

/// 署名付きトークンの用途（purpose）。
///
/// トークンは発行時の用途でのみ検証に成功する。
/// ダウンロード用トークンをアップロードに流用する、といった用途間の再利用は拒否される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    /// ダウンロード用。ペイロードはストレージキー文字列。
    #[serde(rename = "blob-key")]
    BlobKey,
    /// アップロード用。ペイロードは [`BlobMetadata`]。
    #[serde(rename = "blob-metadata")]
    BlobMetadata,
}

impl Purpose {
    /// トークンのエンベロープに書き込まれる識別子。
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::BlobKey => "blob-key",
            Purpose::BlobMetadata => "blob-metadata",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// アップロード用ペイロード
// ---------------------------------------------------------------------------

/// アップロード用トークン（`blob-metadata`）のペイロード。
///
/// 発行時点でアップロード元が計算したチェックサムを埋め込み、
/// 受信したボディの完全性検証に使用する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// 書き込み先のストレージキー
    pub key: String,
    /// Base64エンコードされたMD5ダイジェスト
    pub checksum: String,
}

// ---------------------------------------------------------------------------
// ダウンロードリクエスト
// ---------------------------------------------------------------------------

/// Content-Dispositionの種別。
///
/// `inline` と `attachment` 以外（空文字・未指定を含む）は `inline` にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// ブラウザ内で表示
    #[default]
    Inline,
    /// ファイルとして保存
    Attachment,
}

impl Disposition {
    /// クエリパラメータの値を解釈する。未知の値は黙って `inline` になる。
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("attachment") => Disposition::Attachment,
            _ => Disposition::Inline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `GET /disk/{encoded_key}` のクエリパラメータ（未検証）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadQuery {
    /// Content-Dispositionに載せるファイル名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// レスポンスのContent-Type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// `inline` または `attachment`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
}

/// 境界でデフォルト値を適用済みのダウンロードリクエスト。
///
/// ファイル名とContent-Typeは保存済みBlobと照合せず、そのままレスポンスヘッダに反映する。
/// これらの値の信頼性はURLの発行元に委ねられる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// 署名付きトークン（`blob-key`）
    pub encoded_key: String,
    /// ファイル名（空文字は未指定扱い）
    pub filename: Option<String>,
    /// Content-Type（未指定時は [`DEFAULT_CONTENT_TYPE`]）
    pub content_type: String,
    /// Content-Dispositionの種別
    pub disposition: Disposition,
}

impl DownloadRequest {
    /// パスのトークンとクエリパラメータからリクエストを組み立てる。
    pub fn new(encoded_key: String, query: DownloadQuery) -> Self {
        let disposition = Disposition::from_param(query.disposition.as_deref());
        let content_type = query
            .content_type
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let filename = query.filename.filter(|v| !v.is_empty());

        Self {
            encoded_key,
            filename,
            content_type,
            disposition,
        }
    }

    /// Content-Dispositionヘッダ値を構築する。
    ///
    /// 例: `inline; filename="report.pdf"`
    pub fn content_disposition(&self) -> String {
        match &self.filename {
            Some(filename) => format!("{}; filename=\"{}\"", self.disposition, filename),
            None => self.disposition.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
