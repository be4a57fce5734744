//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//!
//! | 環境変数 | 既定値 | 内容 |
//! |---------|-------|------|
//! | `DISKLINK_SECRET_KEY` | （ランダム生成） | トークン署名用秘密鍵（16進数） |
//! | `DISKLINK_ROOT` | `./storage` | Blobの保存先ディレクトリ |
//! | `DISKLINK_BIND_ADDR` | `0.0.0.0:3000` | 待受アドレス |
//! | `DISKLINK_MAX_UPLOAD_SIZE` | 2GB | アップロード最大サイズ（バイト） |

use std::path::PathBuf;

use anyhow::Context;
use disklink_crypto::MessageVerifier;
use rand::RngCore;

use crate::storage::{BlobStore, DiskStore};

/// アップロード最大サイズの既定値（2GB）
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 2 * 1024 * 1024 * 1024;

/// 開発環境用に生成する秘密鍵の長さ（バイト）
const GENERATED_SECRET_LEN: usize = 64;

/// 環境変数から読み込んだGateway設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// トークン署名用秘密鍵。Noneの場合は起動時にランダム生成する（開発環境用）
    pub secret_key: Option<Vec<u8>>,
    /// Blobの保存先ディレクトリ
    pub storage_root: PathBuf,
    /// 待受アドレス
    pub bind_addr: String,
    /// アップロード最大サイズ（バイト）
    pub max_upload_size: usize,
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = std::env::var("DISKLINK_SECRET_KEY")
            .ok()
            .map(|key_hex| {
                hex::decode(key_hex.trim())
                    .context("DISKLINK_SECRET_KEYは16進数である必要があります")
            })
            .transpose()?;

        let storage_root = std::env::var("DISKLINK_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./storage"));

        let bind_addr =
            std::env::var("DISKLINK_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let max_upload_size = match std::env::var("DISKLINK_MAX_UPLOAD_SIZE") {
            Ok(v) => v
                .parse::<usize>()
                .context("DISKLINK_MAX_UPLOAD_SIZEはバイト数である必要があります")?,
            Err(_) => DEFAULT_MAX_UPLOAD_SIZE,
        };

        Ok(Self {
            secret_key,
            storage_root,
            bind_addr,
            max_upload_size,
        })
    }
}

/// Gatewayの共有状態。
///
/// 起動時に一度だけ構築し、以後は不変。リクエスト間で可変状態を共有しない。
pub struct GatewayState {
    /// 署名付きトークンの検証器
    pub verifier: MessageVerifier,
    /// Blob Store（トレイトで抽象化）
    pub storage: Box<dyn BlobStore>,
    /// アップロード最大サイズ（バイト）
    pub max_upload_size: usize,
}

impl GatewayState {
    /// 設定からディスクストアを使う共有状態を構築する。
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let secret = match &config.secret_key {
            Some(key) => key.clone(),
            None => {
                // 開発環境用: 再起動すると発行済みURLはすべて無効になる
                tracing::warn!(
                    "DISKLINK_SECRET_KEYが未設定です。ランダムキーを生成します（開発環境用）"
                );
                let mut key = vec![0u8; GENERATED_SECRET_LEN];
                rand::rngs::OsRng.fill_bytes(&mut key);
                key
            }
        };
        let verifier = MessageVerifier::new(secret)?;

        tracing::info!(
            storage_root = %config.storage_root.display(),
            max_upload_size = config.max_upload_size,
            "ディスクストアを設定"
        );

        Ok(Self {
            verifier,
            storage: Box::new(DiskStore::new(config.storage_root.clone())),
            max_upload_size: config.max_upload_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disklink_types::Purpose;

    #[test]
    fn test_from_config_with_secret() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            secret_key: Some(b"fixed-secret".to_vec()),
            storage_root: dir.path().to_path_buf(),
            bind_addr: "127.0.0.1:0".to_string(),
            max_upload_size: 1024,
        };
        let state = GatewayState::from_config(&config).unwrap();

        // 同じ鍵で発行したトークンが検証できる
        let issuer = MessageVerifier::new(b"fixed-secret".to_vec()).unwrap();
        let token = issuer
            .generate(&"abc123", Purpose::BlobKey, None)
            .unwrap();
        let key: String = state.verifier.verify(&token, Purpose::BlobKey).unwrap();
        assert_eq!(key, "abc123");
        assert_eq!(state.max_upload_size, 1024);
    }

    #[test]
    fn test_from_config_generates_secret() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            secret_key: None,
            storage_root: dir.path().to_path_buf(),
            bind_addr: "127.0.0.1:0".to_string(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        };
        assert!(GatewayState::from_config(&config).is_ok());
    }

    #[test]
    fn test_from_config_rejects_empty_secret() {
        let config = GatewayConfig {
            secret_key: Some(Vec::new()),
            storage_root: PathBuf::from("./storage"),
            bind_addr: "127.0.0.1:0".to_string(),
            max_upload_size: 1024,
        };
        assert!(GatewayState::from_config(&config).is_err());
    }
}
