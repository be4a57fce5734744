//! # Gateway エラー型
//!
//! ハンドラ共通のエラー型とHTTPステータスへの対応付け。

use axum::http::StatusCode;

use crate::storage::StorageError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// トークン検証の失敗（署名不正・用途不一致・期限切れ）。
    /// どの検証で失敗したかはクライアントに返さない。
    #[error("Not Found")]
    NotFound,
    /// アップロードされたボディのチェックサムが不一致
    #[error("チェックサムが一致しません")]
    IntegrityFailure,
    /// アップロードのボディが上限を超過
    #[error("アップロードサイズが上限を超えています")]
    PayloadTooLarge,
    /// ストレージ操作に失敗
    #[error("ストレージ操作に失敗: {0}")]
    Storage(String),
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<StorageError> for GatewayError {
    fn from(e: StorageError) -> Self {
        GatewayError::Storage(e.to_string())
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::IntegrityFailure => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Storage(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // 5xxの詳細（ディスク上のパス等）はログにのみ残す
        if status.is_server_error() {
            tracing::error!(error = %self, "リクエスト処理に失敗");
            return (status, "内部エラー").into_response();
        }

        (status, self.to_string()).into_response()
    }
}
