//! # PUT /disk/{encoded_metadata}
//!
//! 署名付きアップロード + 完全性検証。
//!
//! ## 処理フロー
//! 1. `blob-metadata` トークンを検証（失敗 → 404）。ボディはまだ読まない
//! 2. ボディを受信しながらチェックサムを計算し、一時領域に書き込む
//! 3. 上限超過 → 破棄（413）
//! 4. トークン埋め込みの値と一致 → Blobとして確定（204）
//! 5. 不一致 → 破棄（422）
//!
//! 確定前のバイト列が読み出されることはなく、破棄時に既存のBlobは変わらない。

use std::fmt::Display;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bytes::Bytes;
use disklink_crypto::ChecksumHasher;
use disklink_types::BlobMetadata;
use futures::{Stream, StreamExt};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::storage::{BlobStore, StagedBlob};

use super::decode_verified_metadata;

/// 検証済みトークンに対するアップロードの結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// チェックサム一致、書き込み完了
    Committed,
    /// チェックサム不一致、書き込みなし
    ChecksumMismatch,
    /// ボディが上限を超えた、書き込みなし
    TooLarge,
}

/// ボディを最後まで受信した結果
enum Received {
    Complete(ChecksumHasher),
    TooLarge,
}

async fn receive<S, E>(
    staged: &mut dyn StagedBlob,
    body: S,
    max_size: usize,
) -> Result<Received, GatewayError>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut hasher = ChecksumHasher::new();

    while let Some(chunk) = body.next().await {
        let chunk =
            chunk.map_err(|e| GatewayError::BadRequest(format!("ボディの受信に失敗: {e}")))?;
        if hasher.len() + chunk.len() as u64 > max_size as u64 {
            return Ok(Received::TooLarge);
        }
        hasher.update(&chunk);
        staged.append(&chunk).await?;
    }

    Ok(Received::Complete(hasher))
}

/// ボディを受信しながらチェックサムを検証し、一致した場合のみBlobとして確定する。
pub async fn commit_upload<S, E>(
    storage: &dyn BlobStore,
    metadata: &BlobMetadata,
    body: S,
    max_size: usize,
) -> Result<UploadOutcome, GatewayError>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Display,
{
    let mut staged = storage.stage(&metadata.key).await?;

    let received = receive(staged.as_mut(), body, max_size).await;
    let outcome = match received {
        Ok(Received::Complete(hasher)) => {
            let size = hasher.len();
            if hasher.finalize() == metadata.checksum {
                staged.commit().await?;
                tracing::info!(key = %metadata.key, bytes = size, "アップロードを保存しました");
                return Ok(UploadOutcome::Committed);
            }
            tracing::warn!(
                key = %metadata.key,
                bytes = size,
                "チェックサム不一致のためアップロードを拒否"
            );
            Ok(UploadOutcome::ChecksumMismatch)
        }
        Ok(Received::TooLarge) => {
            tracing::warn!(key = %metadata.key, max_size, "アップロード上限を超過");
            Ok(UploadOutcome::TooLarge)
        }
        Err(e) => Err(e),
    };

    staged.abort().await;
    outcome
}

/// PUT /disk/{encoded_metadata} — 署名付きアップロード。
///
/// リトライは行わない。失敗したアップロードはクライアントが再送する。
pub async fn handle_update(
    State(state): State<Arc<GatewayState>>,
    Path(encoded_metadata): Path<String>,
    body: Body,
) -> Result<StatusCode, GatewayError> {
    let metadata = decode_verified_metadata(&state.verifier, &encoded_metadata)?;

    match commit_upload(
        state.storage.as_ref(),
        &metadata,
        body.into_data_stream(),
        state.max_upload_size,
    )
    .await?
    {
        UploadOutcome::Committed => Ok(StatusCode::NO_CONTENT),
        UploadOutcome::ChecksumMismatch => Err(GatewayError::IntegrityFailure),
        UploadOutcome::TooLarge => Err(GatewayError::PayloadTooLarge),
    }
}
