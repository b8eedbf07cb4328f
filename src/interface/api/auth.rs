use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use derive_more::Display;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::interface::api::error::ApiError;

/// 認証済みのリクエスト主体
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "{}", subject)]
pub struct Principal {
    pub subject: String,

    /// 無効化された主体は認証はされるが操作は許可されない
    pub enabled: bool,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            enabled: true,
        }
    }

    pub fn disabled(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            enabled: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.enabled
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingCredential,

    #[error("malformed authorization header")]
    MalformedCredential,

    #[error("unknown bearer token")]
    InvalidCredential,

    #[error("token specification '{0}' must look like token=subject")]
    InvalidTokenSpec(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// 認証コラボレーター
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// 設定で与えられたトークン表による認証
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    /// `token=subject`形式の指定から作成する。`!subject`は無効化された主体
    pub fn from_specs<I, S>(specs: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut authenticator = Self::new();
        for spec in specs {
            let spec = spec.as_ref().trim();
            let (token, subject) = spec
                .split_once('=')
                .filter(|(t, s)| !t.is_empty() && !s.is_empty() && *s != "!")
                .ok_or_else(|| AuthError::InvalidTokenSpec(spec.to_string()))?;
            let principal = match subject.strip_prefix('!') {
                Some(subject) => Principal::disabled(subject),
                None => Principal::new(subject),
            };
            authenticator = authenticator.with_token(token, principal);
        }
        Ok(authenticator)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredential)
    }
}

fn bearer_token<B>(request: &Request<B>) -> Result<&str, AuthError> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::MalformedCredential),
    }
}

/// 認証済み主体をリクエストに要求するミドルウェア
///
/// 資格情報がなければ401、主体が許可されていなければ403でハンドラーに到達しない。
pub async fn require_authenticated<B>(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Response {
    let token = bearer_token(&request).map(str::to_owned);
    let principal = match token {
        Ok(token) => authenticator.authenticate(&token).await,
        Err(e) => Err(e),
    };

    let principal = match principal {
        Ok(principal) => principal,
        Err(e) => return ApiError::from(e).into_response(),
    };

    if !principal.is_authenticated() {
        return ApiError::Forbidden(
            "You do not have permissions to perform this operation.".to_string(),
        )
        .into_response();
    }

    debug!(principal = %principal, "request authenticated");
    request.extensions_mut().insert(principal);
    next.run(request).await
}
