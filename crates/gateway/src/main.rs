//! # Disklink Gateway エントリポイント
//!
//! 環境変数から設定を読み込み、`/disk` ルートを公開する。
//! 設定項目は [`disklink_gateway::config`] を参照。

use std::sync::Arc;

use disklink_gateway::config::{GatewayConfig, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    let state = Arc::new(GatewayState::from_config(&config)?);

    let app = disklink_gateway::router(state);

    tracing::info!("Gatewayを {} で起動します", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
