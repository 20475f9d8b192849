//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 솔트 해싱 및 검증. 사용자 비밀번호와 refresh 토큰 ledger가
//! 같은 방식을 사용합니다.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use asset_core::PasswordConfig;

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("비밀번호 검증 실패")]
    VerificationFailed,
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
    #[error("잘못된 Argon2 파라미터: {0}")]
    InvalidParams(String),
    #[error("해싱 작업 스레드 실패")]
    TaskFailed,
}

/// Argon2id 해셔.
///
/// 해싱 비용은 설정에서 오며, 검증은 해시 문자열에 기록된 파라미터를 따릅니다.
/// 평문은 어떤 경우에도 로그에 남기지 않습니다.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// 설정된 비용으로 해셔를 생성합니다.
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// 평문을 해싱합니다.
    ///
    /// 솔트는 매번 새로 생성되므로 같은 입력도 다른 해시가 됩니다.
    ///
    /// # Returns
    ///
    /// PHC 형식의 해시 문자열 (`$argon2id$v=19$m=...`)
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;

        Ok(hash.to_string())
    }

    /// 평문이 저장된 해시와 일치하는지 확인합니다.
    ///
    /// 비교는 argon2 내부에서 상수 시간으로 수행됩니다.
    /// 불일치는 `Ok(false)`, 해시 자체가 손상된 경우는 에러입니다.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(PasswordError::VerificationFailed),
        }
    }

    /// 블로킹 스레드에서 해싱합니다.
    ///
    /// Argon2는 의도적으로 CPU를 많이 쓰므로 요청 처리 스레드에서 직접 호출하지 않습니다.
    pub async fn hash_async(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|_| PasswordError::TaskFailed)?
    }

    /// 블로킹 스레드에서 검증합니다.
    pub async fn verify_async(&self, plaintext: String, hash: String) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|_| PasswordError::TaskFailed)?
    }
}

/// 비밀번호 강도 검증.
///
/// # 요구사항
///
/// - 최소 8자 이상
/// - 최소 1개의 숫자 포함
/// - 최소 1개의 영문자 포함
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters long");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password must contain at least one digit");
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("password must contain at least one letter");
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    // 테스트 속도를 위한 최소 비용
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
