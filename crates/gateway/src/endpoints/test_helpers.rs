//! # エンドポイントテスト用共通ヘルパー
//!
//! 固定の秘密鍵を使った共有状態と、テスト用Gatewayサーバーの起動。

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use disklink_crypto::MessageVerifier;

use crate::config::GatewayState;
use crate::storage::{BlobStore, DiskStore, StagedBlob, StorageError};

/// テスト用の固定秘密鍵
pub const TEST_SECRET: &[u8] = b"disklink-test-secret";

/// テスト用トークンの有効期限
pub const FIVE_MINUTES: Duration = Duration::from_secs(300);

/// テスト用アップロード上限（バイト）
pub const TEST_MAX_UPLOAD_SIZE: usize = 1024;

pub fn test_verifier() -> MessageVerifier {
    MessageVerifier::new(TEST_SECRET.to_vec()).unwrap()
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// 任意のBlob Storeで共有状態を構築する。
pub fn test_state(storage: Box<dyn BlobStore>) -> Arc<GatewayState> {
    Arc::new(GatewayState {
        verifier: test_verifier(),
        storage,
        max_upload_size: TEST_MAX_UPLOAD_SIZE,
    })
}

/// 指定ディレクトリをルートとするDiskStoreで共有状態を構築する。
pub fn disk_state(root: &Path) -> Arc<GatewayState> {
    test_state(Box::new(DiskStore::new(root)))
}

/// すべての操作がI/Oエラーになるモックストア。
/// 呼ばれたこと自体をエラーで観測できる。
pub struct FailingStore;

fn io_failure() -> StorageError {
    StorageError::Io(std::io::Error::other("mock storage failure"))
}

#[async_trait::async_trait]
impl BlobStore for FailingStore {
    async fn read(&self, _key: &str) -> Result<Bytes, StorageError> {
        Err(io_failure())
    }

    async fn stage(&self, _key: &str) -> Result<Box<dyn StagedBlob>, StorageError> {
        Err(io_failure())
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Err(io_failure())
    }
}

/// テスト用Gatewayサーバーを起動し、待受ポートを返す。
pub async fn start_gateway(state: Arc<GatewayState>) -> u16 {
    let app = crate::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    port
}
