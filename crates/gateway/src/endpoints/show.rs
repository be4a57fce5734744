//! # GET /disk/{encoded_key}
//!
//! 署名付きダウンロード。

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use disklink_types::{DownloadQuery, DownloadRequest};

use crate::config::GatewayState;
use crate::error::GatewayError;

use super::decode_verified_key;

/// ヘッダ値として使える文字列か検証する。
/// 非ASCII（UTF-8のファイル名等）はそのまま通し、制御文字のみ拒否する。
fn header_value(name: &str, value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_bytes(value.as_bytes()).map_err(|_| {
        GatewayError::BadRequest(format!("{name}にヘッダ値として使用できない文字が含まれています"))
    })
}

/// GET /disk/{encoded_key} — 署名付きダウンロード。
///
/// `blob-key` 用途のトークンを検証し、対応するBlobのバイト列を返す。
/// ファイル名・Content-Type・Dispositionはクエリの値をそのままヘッダに反映する。
///
/// 有効なトークンに対応するBlobが存在しない場合は404ではなく500とする
/// （発行済みトークンとストレージの不整合であり、隠蔽しない）。
pub async fn handle_show(
    State(state): State<Arc<GatewayState>>,
    Path(encoded_key): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, GatewayError> {
    let request = DownloadRequest::new(encoded_key, query);

    let key = decode_verified_key(&state.verifier, &request.encoded_key)?;

    let content_type = header_value("content_type", &request.content_type)?;
    let content_disposition = header_value("filename", &request.content_disposition())?;

    let data = state.storage.read(&key).await.map_err(|e| {
        tracing::error!(key = %key, error = %e, "有効なトークンに対応するBlobを読み出せません");
        GatewayError::from(e)
    })?;

    tracing::debug!(
        key = %key,
        bytes = data.len(),
        disposition = %request.disposition,
        "Blobを送信"
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        data,
    )
        .into_response())
}
