//! # 署名付きトークン
//!
//! 用途（purpose）と有効期限を持つ、改ざん検知可能なトークンの生成と検証。
//! 検証は外部状態を参照せず、トークン文字列と秘密鍵のみで完結する。
//!
//! ## トークン形式
//! ```text
//! base64url(envelope) "." base64url(HMAC-SHA256(secret, base64url(envelope)))
//! envelope = {"msg": <payload>, "pur": "<purpose>", "exp": <UNIX秒 | null>}
//! ```
//!
//! `.` はBase64 URL-safeのアルファベットに含まれないため、区切り文字として曖昧さがない。

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use disklink_types::Purpose;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// データ部と署名部の区切り文字
const SEPARATOR: char = '.';

/// Base64エンジン（URL-safe, パディングなし）
fn b64url() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
}

/// トークン処理のエラー型。
///
/// 呼び出し側（Gateway）はどの検証で失敗したかをクライアントに返してはならない。
/// 区別はサーバー側のログ用途に限る。
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// 秘密鍵が空
    #[error("署名鍵が空です")]
    EmptySecret,
    /// 区切り文字・Base64・JSONのいずれかが不正
    #[error("トークンの形式が不正です")]
    Malformed,
    /// HMAC署名が一致しない（改ざん、または別の鍵で発行）
    #[error("トークンの署名が一致しません")]
    InvalidSignature,
    /// 発行時と異なる用途で検証された
    #[error("トークンの用途が一致しません: 期待値 {expected}, 実際 {actual}")]
    PurposeMismatch {
        /// 検証時に指定した用途
        expected: Purpose,
        /// トークンに記録された用途
        actual: String,
    },
    /// 有効期限切れ
    #[error("トークンの有効期限が切れています")]
    Expired,
    /// ペイロードのシリアライズに失敗
    #[error("ペイロードのシリアライズに失敗: {0}")]
    Serialize(String),
    /// システム時刻の取得に失敗
    #[error("時刻取得失敗: {0}")]
    Clock(String),
}

/// 生成時のエンベロープ（ペイロードを借用する）。
#[derive(Serialize)]
struct EnvelopeRef<'a, T: Serialize> {
    msg: &'a T,
    pur: &'a str,
    exp: Option<u64>,
}

/// 検証時のエンベロープ。
#[derive(Deserialize)]
struct Envelope {
    msg: serde_json::Value,
    pur: String,
    exp: Option<u64>,
}

/// 現在時刻のUNIXタイムスタンプ（秒）
fn unix_now() -> Result<u64, TokenError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| TokenError::Clock(e.to_string()))?
        .as_secs())
}

/// HMAC-SHA256による署名付きトークンの生成・検証器。
///
/// プロセス起動時に秘密鍵を与えて一度だけ構築し、以後は不変。
/// Gatewayの共有状態に注入して使う（グローバル状態は持たない）。
#[derive(Clone)]
pub struct MessageVerifier {
    secret: Vec<u8>,
}

impl fmt::Debug for MessageVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl MessageVerifier {
    /// 秘密鍵から検証器を構築する。空の鍵は拒否する。
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self { secret })
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::EmptySecret)
    }

    /// 現在時刻を基準にトークンを生成する。
    ///
    /// `expires_in` が `None` の場合、有効期限なしのトークンになる。
    pub fn generate<T: Serialize>(
        &self,
        payload: &T,
        purpose: Purpose,
        expires_in: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.generate_at(payload, purpose, expires_in, unix_now()?)
    }

    /// 指定時刻（UNIX秒）を基準にトークンを生成する。
    pub fn generate_at<T: Serialize>(
        &self,
        payload: &T,
        purpose: Purpose,
        expires_in: Option<Duration>,
        now: u64,
    ) -> Result<String, TokenError> {
        let envelope = EnvelopeRef {
            msg: payload,
            pur: purpose.as_str(),
            exp: expires_in.map(|d| now.saturating_add(d.as_secs())),
        };
        let json =
            serde_json::to_vec(&envelope).map_err(|e| TokenError::Serialize(e.to_string()))?;
        let data = b64url().encode(json);

        let mut mac = self.mac()?;
        mac.update(data.as_bytes());
        let signature = b64url().encode(mac.finalize().into_bytes());

        Ok(format!("{data}{SEPARATOR}{signature}"))
    }

    /// 現在時刻を基準にトークンを検証し、ペイロードを返す。
    pub fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        purpose: Purpose,
    ) -> Result<T, TokenError> {
        self.verify_at(token, purpose, unix_now()?)
    }

    /// 指定時刻（UNIX秒）を基準にトークンを検証し、ペイロードを返す。
    ///
    /// 検証順: 形式 → 署名 → 用途 → 有効期限 → ペイロード型。
    /// いずれかで失敗した場合は部分的なペイロードを返さずにエラーとする。
    pub fn verify_at<T: DeserializeOwned>(
        &self,
        token: &str,
        purpose: Purpose,
        now: u64,
    ) -> Result<T, TokenError> {
        let (data, signature) = token
            .rsplit_once(SEPARATOR)
            .ok_or(TokenError::Malformed)?;
        let signature = b64url()
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        // 定数時間比較
        let mut mac = self.mac()?;
        mac.update(data.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let json = b64url().decode(data).map_err(|_| TokenError::Malformed)?;
        let envelope: Envelope =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if envelope.pur != purpose.as_str() {
            return Err(TokenError::PurposeMismatch {
                expected: purpose,
                actual: envelope.pur,
            });
        }

        if let Some(exp) = envelope.exp {
            if now >= exp {
                return Err(TokenError::Expired);
            }
        }

        serde_json::from_value(envelope.msg).map_err(|_| TokenError::Malformed)
    }
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
