use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::{ApiError, AuthError},
    models::User,
    repository::RepositoryState,
};

/// Audience stamped into every session token; tokens minted for anything else are refused.
pub const SESSION_AUDIENCE: &str = "item-vault:auth";

/// Audience of password-reset tokens. A reset token never resolves as a session.
pub const RESET_AUDIENCE: &str = "item-vault:reset";

pub const RESET_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Claims
///
/// Payload of the session token carried in the auth cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID, looked up on every request.
    pub sub: Uuid,
    pub aud: String,
    /// Issued At (iat), unix seconds.
    pub iat: i64,
    /// Expiration Time (exp), unix seconds. `iat + session lifetime`.
    pub exp: i64,
}

/// ResetClaims
///
/// Payload of a password-reset token. `fgpt` is the salt of the password hash current at
/// issuance; any password change replaces the salt and so voids outstanding tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub fgpt: String,
}

/// AuthUser
///
/// The flat identity record resolved from a session. Handlers and guards only ever see
/// this, never the stored [`User`] row.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub active: bool,
    pub verified: bool,
    pub superuser: bool,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            active: user.is_active,
            verified: user.is_verified,
            superuser: user.is_superuser,
        }
    }
}

/// Requirement
///
/// Authorization predicates evaluated against a resolved identity. Every variant demands
/// `active`, so a deactivated account never passes any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Active,
    ActiveVerified,
    Superuser,
}

impl Requirement {
    pub fn permits(self, identity: &AuthUser) -> bool {
        match self {
            Requirement::Active => identity.active,
            Requirement::ActiveVerified => identity.active && identity.verified,
            Requirement::Superuser => identity.active && identity.superuser,
        }
    }
}

// --- Password Hashing ---

/// Hashes a password with Argon2id on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// Checks a password against a stored PHC string. A corrupt hash counts as a mismatch.
pub async fn verify_password(password: String, hashed: String) -> Result<bool, AuthError> {
    task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&hashed) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Salt of a stored PHC string, or empty for a hash that does not parse.
fn password_fingerprint(hashed: &str) -> String {
    PasswordHash::new(hashed)
        .ok()
        .and_then(|parsed| parsed.salt)
        .map(|salt| salt.as_str().to_string())
        .unwrap_or_default()
}

// --- Identity Provider ---

/// IdentityProvider
///
/// Issues session tokens and resolves them back into identities. Also owns the
/// credential checks, since those are the only way a session comes into existence.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Mints a session token for the given user.
    fn issue(&self, user_id: Uuid) -> Result<String, AuthError>;

    /// Validates a token and loads the current state of its user.
    async fn resolve(&self, token: &str) -> Result<AuthUser, AuthError>;

    /// Returns the user if the email/password pair matches, `None` otherwise.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AuthError>;

    /// Creates an account with the given flags. Duplicate emails surface as
    /// `AuthError::Repository(RepoError::Conflict)`.
    async fn register(
        &self,
        email: &str,
        password: &str,
        verified: bool,
        superuser: bool,
    ) -> Result<User, AuthError>;

    /// Mints a single-purpose token that lets `user` set a new password.
    fn issue_reset_token(&self, user: &User) -> Result<String, AuthError>;

    /// Redeems a reset token and stores the new password. Expired, forged or stale
    /// tokens and inactive accounts are refused with `InvalidToken`/`ExpiredToken`.
    async fn reset_password(&self, token: &str, password: &str) -> Result<User, AuthError>;
}

/// IdentityState
///
/// Shared handle to the identity provider, stored in `AppState`.
pub type IdentityState = Arc<dyn IdentityProvider>;

/// JwtCookieProvider
///
/// Stateless sessions: an HS256 token signed with the configured secret. Flags are read
/// from the repository on every resolve, so deactivating a user takes effect immediately.
pub struct JwtCookieProvider {
    repo: RepositoryState,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl JwtCookieProvider {
    pub fn new(repo: RepositoryState, secret: &str, lifetime_secs: u64) -> Self {
        Self {
            repo,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs: i64::try_from(lifetime_secs).unwrap_or(i64::MAX),
        }
    }

    fn validation(audience: &str) -> Validation {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_audience(&[audience]);
        validation
    }
}

#[async_trait]
impl IdentityProvider for JwtCookieProvider {
    fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            aud: SESSION_AUDIENCE.to_string(),
            iat: now,
            exp: now.saturating_add(self.lifetime_secs),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    async fn resolve(&self, token: &str) -> Result<AuthUser, AuthError> {
        let validation = Self::validation(SESSION_AUDIENCE);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?;

        // The token may outlive the account it was issued for.
        let user = self
            .repo
            .get_user(token_data.claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        Ok(AuthUser::from(user))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let Some(user) = self.repo.get_user_by_email(email).await? else {
            // Spend the same hashing time on a miss so response timing does not reveal
            // which emails are registered.
            hash_password(password.to_string()).await?;
            return Ok(None);
        };

        if verify_password(password.to_string(), user.hashed_password.clone()).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        verified: bool,
        superuser: bool,
    ) -> Result<User, AuthError> {
        let hashed_password = hash_password(password.to_string()).await?;
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            hashed_password,
            is_active: true,
            is_verified: verified,
            is_superuser: superuser,
        };
        Ok(self.repo.create_user(user).await?)
    }

    fn issue_reset_token(&self, user: &User) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = ResetClaims {
            sub: user.id,
            aud: RESET_AUDIENCE.to_string(),
            iat: now,
            exp: now.saturating_add(RESET_TOKEN_LIFETIME_SECS),
            fgpt: password_fingerprint(&user.hashed_password),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    async fn reset_password(&self, token: &str, password: &str) -> Result<User, AuthError> {
        let validation = Self::validation(RESET_AUDIENCE);
        let claims = decode::<ResetClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?
            .claims;

        let user = self
            .repo
            .get_user(claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        if !user.is_active || password_fingerprint(&user.hashed_password) != claims.fgpt {
            return Err(AuthError::InvalidToken);
        }

        let hashed_password = hash_password(password.to_string()).await?;
        self.repo
            .update_user_credentials(user.id, None, Some(hashed_password))
            .await?
            .ok_or(AuthError::UnknownUser)
    }
}

// --- Session Cookie ---

/// Finds a named cookie across every `Cookie` header on the request.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(config: &AppConfig, token: &str) -> Result<HeaderValue, ApiError> {
    let secure = if config.env == Env::Production { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax{}",
        config.cookie_name, token, config.session_lifetime_secs, secure
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_session_cookie(config: &AppConfig) -> Result<HeaderValue, ApiError> {
    let secure = if config.env == Env::Production { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax{}",
        config.cookie_name, secure
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))
}

// --- Extractors ---

/// AuthUser Extractor Implementation
///
/// Resolves the session cookie into an identity without checking any predicate.
///
/// 1. Read the cookie named by `AppConfig::cookie_name`; absent → 401.
/// 2. `IdentityProvider::resolve`; bad signature, expiry or unknown user → 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = IdentityState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token =
            parse_cookie(&parts.headers, &config.cookie_name).ok_or(AuthError::MissingToken)?;

        let user = identity.resolve(&token).await.map_err(|e| {
            tracing::debug!("session rejected: {}", e);
            e
        })?;

        Ok(user)
    }
}

/// Resolves the caller and applies `requirement`: 401 before resolution succeeds,
/// 403 when the predicate fails.
async fn authorize<S>(
    parts: &mut Parts,
    state: &S,
    requirement: Requirement,
) -> Result<AuthUser, ApiError>
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !requirement.permits(&user) {
        tracing::info!(user_id = %user.id, ?requirement, "authorization denied");
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

/// Guard: any active account.
#[derive(Debug, Clone)]
pub struct ActiveUser(pub AuthUser);

/// Guard: an active account whose email has been verified.
#[derive(Debug, Clone)]
pub struct ActiveVerifiedUser(pub AuthUser);

/// Guard: an active superuser.
#[derive(Debug, Clone)]
pub struct Superuser(pub AuthUser);

impl<S> FromRequestParts<S> for ActiveUser
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Requirement::Active).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for ActiveVerifiedUser
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Requirement::ActiveVerified)
            .await
            .map(Self)
    }
}

impl<S> FromRequestParts<S> for Superuser
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Requirement::Superuser).await.map(Self)
    }
}
