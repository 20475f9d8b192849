//! JWT 토큰 처리.
//!
//! Access Token 및 Refresh Token 발급/검증 로직.
//! 두 토큰은 같은 클레임 구조를 쓰지만 서명 시크릿과 수명이 다릅니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use asset_core::{AuthConfig, Principal, Role};

use super::clock::Clock;
use crate::metrics::record_token_rejected;

/// 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: Uuid,
    /// 사용자 이름
    pub username: String,
    /// 사용자 역할
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 같은 초에 발급된 토큰도 서로 다르게 만든다
    pub jti: Uuid,
    /// 토큰 종류
    #[serde(rename = "typ")]
    pub kind: TokenKind,
}

impl Claims {
    fn new(
        principal: &Principal,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;

        Ok(Self {
            sub: principal.user_id,
            username: principal.username.clone(),
            role: principal.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            kind,
        })
    }

    /// 요청 컨텍스트에 붙일 식별 정보.
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// 주어진 시각에 만료되었는지 확인 (`exp` 시각 자체도 만료로 본다).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// 발급된 토큰과 그 클레임.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

impl TokenPair {
    /// Access Token 남은 수명 (초).
    pub fn expires_in(&self) -> i64 {
        self.access.claims.exp - self.access.claims.iat
    }
}

/// JWT 처리 에러.
///
/// 검증 실패는 원인과 관계없이 `Invalid` 하나로 보고됩니다.
/// 원인(서명 불일치, 만료 등)은 내부 로그와 메트릭에만 남습니다.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰 만료 시각이 표현 범위를 벗어남")]
    ExpiryOutOfRange,
    #[error("유효하지 않은 토큰")]
    Invalid,
}

/// 검증 실패의 내부 분류 (감사 로그용).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectReason {
    Malformed,
    BadSignature,
    Expired,
    WrongKind,
}

impl RejectReason {
    fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed",
            RejectReason::BadSignature => "bad_signature",
            RejectReason::Expired => "expired",
            RejectReason::WrongKind => "wrong_kind",
        }
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// 토큰 발급기 겸 검증기.
///
/// 시작 시 한 번 생성되어 `Arc`로 공유됩니다. 키와 수명은 생성 후 바뀌지 않습니다.
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// 설정과 시계로 서비스를 생성합니다.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 주입된 시계로 직접 판단한다
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            access: SigningKeys::new(config.access_secret.expose_secret(), config.access_ttl()),
            refresh: SigningKeys::new(config.refresh_secret.expose_secret(), config.refresh_ttl()),
            validation,
            clock,
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// 토큰 종류별 수명.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys(kind).ttl
    }

    /// 현재 시각 (서비스 시계 기준).
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn issue(&self, principal: &Principal, kind: TokenKind) -> Result<IssuedToken, TokenError> {
        let keys = self.keys(kind);
        let claims = Claims::new(principal, kind, self.clock.now(), keys.ttl)?;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;
        Ok(IssuedToken { token, claims })
    }

    /// Access Token 발급.
    pub fn issue_access_token(&self, principal: &Principal) -> Result<IssuedToken, TokenError> {
        self.issue(principal, TokenKind::Access)
    }

    /// Refresh Token 발급.
    pub fn issue_refresh_token(&self, principal: &Principal) -> Result<IssuedToken, TokenError> {
        self.issue(principal, TokenKind::Refresh)
    }

    /// Access Token + Refresh Token 쌍 발급.
    pub fn issue_pair(&self, principal: &Principal) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue_access_token(principal)?,
            refresh: self.issue_refresh_token(principal)?,
        })
    }

    /// 토큰 서명과 만료를 검증합니다.
    ///
    /// 변조, 형식 오류, 종류 불일치, 만료 모두 `TokenError::Invalid`로 반환됩니다.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        self.check(token, kind).map_err(|reason| {
            debug!(kind = kind.as_str(), reason = reason.as_str(), "Token rejected");
            record_token_rejected(kind.as_str(), reason.as_str());
            TokenError::Invalid
        })
    }

    fn check(&self, token: &str, kind: TokenKind) -> Result<Claims, RejectReason> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => RejectReason::BadSignature,
                _ => RejectReason::Malformed,
            },
        )?;

        let claims = data.claims;
        if claims.kind != kind {
            return Err(RejectReason::WrongKind);
        }
        if claims.is_expired_at(self.clock.now()) {
            return Err(RejectReason::Expired);
        }

        Ok(claims)
    }
}
