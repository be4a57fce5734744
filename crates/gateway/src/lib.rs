//! # Disklink Gateway
//!
//! ローカルディスク上のBlobに、有効期限付きの署名付きURLでアクセスさせるGateway。
//! リモートのオブジェクトストレージと同じ「署名付きURL」の契約を、ローカルディスクでも提供する。
//!
//! ## 役割
//! - 署名付きURLによるダウンロード（トークン検証 → 読み出し）
//! - 署名付きURLによるアップロード（トークン検証 → チェックサム検証 → 書き込み）
//! - 署名付きURLの発行（[`urls`]、Gateway外の呼び出し元が使用）
//!
//! ## API エンドポイント
//! - `GET /disk/{encoded_key}?filename=&content_type=&disposition=`
//! - `PUT /disk/{encoded_metadata}`

pub mod config;
pub mod endpoints;
pub mod error;
pub mod storage;
pub mod urls;

use std::sync::Arc;

use axum::routing::get;

use crate::config::GatewayState;

/// Gatewayのルーターを構築する。
///
/// アップロードのボディはトークン検証後にハンドラ内で受信し、
/// `max_upload_size` を超えた時点で413とする。
pub fn router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route(
            "/disk/{encoded_token}",
            get(endpoints::handle_show).put(endpoints::handle_update),
        )
        .with_state(state)
}
