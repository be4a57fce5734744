//! # Gatewayエンドポイント
//!
//! - `GET /disk/{encoded_key}` — 署名付きダウンロード（`show`）
//! - `PUT /disk/{encoded_metadata}` — 署名付きアップロード + 完全性検証（`update`）
//!
//! どちらもトークン検証に失敗した場合は404を返し、失敗理由を区別しない。

pub mod show;
pub mod update;

#[cfg(test)]
pub(crate) mod test_helpers;


pub use show::handle_show;
pub use update::{commit_upload, handle_update, UploadOutcome};

use disklink_crypto::{MessageVerifier, TokenError};
use disklink_types::{BlobMetadata, Purpose};
use serde::de::DeserializeOwned;

use crate::error::GatewayError;

/// トークンを指定用途で検証する。失敗理由はログにのみ残し、404として扱う。
fn decode_verified<T: DeserializeOwned>(
    verifier: &MessageVerifier,
    token: &str,
    purpose: Purpose,
) -> Result<T, GatewayError> {
    verifier.verify(token, purpose).map_err(|e: TokenError| {
        tracing::debug!(%purpose, error = %e, "トークン検証に失敗");
        GatewayError::NotFound
    })
}

/// ダウンロード用トークン（`blob-key`）からストレージキーを取り出す。
pub(crate) fn decode_verified_key(
    verifier: &MessageVerifier,
    encoded_key: &str,
) -> Result<String, GatewayError> {
    decode_verified(verifier, encoded_key, Purpose::BlobKey)
}

/// アップロード用トークン（`blob-metadata`）からキーとチェックサムを取り出す。
pub(crate) fn decode_verified_metadata(
    verifier: &MessageVerifier,
    encoded_metadata: &str,
) -> Result<BlobMetadata, GatewayError> {
    decode_verified(verifier, encoded_metadata, Purpose::BlobMetadata)
}
