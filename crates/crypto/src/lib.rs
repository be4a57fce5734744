//! # Disklink 暗号処理
//!
//! 署名付きURLを支えるトークンコーデックと、アップロード完全性検証用のチェックサムを提供する。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | トークン署名 | HMAC-SHA256 |
//! | トークンエンコード | Base64 (URL-safe, パディングなし) |
//! | チェックサム | MD5 (Base64 Standard) |
//!
//! トークンの構造は [`token`] を参照。

pub mod checksum;
pub mod token;

pub use checksum::{compute_checksum, verify_checksum, ChecksumHasher};
pub use token::{MessageVerifier, TokenError};
