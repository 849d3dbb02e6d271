use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    chain::{Handler, Outcome, RequestContext},
    config::AppConfig,
    error::{DispatchError, ForbiddenReason},
};

/// Role
///
/// The forum's role ladder. Only `Admin`, `SuperAdmin` and `Crawler` pass the
/// admin gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Normal,
    Editor,
    Admin,
    SuperAdmin,
    Crawler,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin | Self::Crawler)
    }
}

/// AccountStatus
///
/// Lifecycle of an account. Accounts start `Inactive` until the activation
/// link is followed, and moderators may freeze them later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Inactive,
    Active,
    Frozen,
}

/// Claims
///
/// Payload of the bearer JWT issued at signin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    pub role: Role,
    pub status: AccountStatus,
    /// Expiration time, seconds since the epoch. Always validated.
    pub exp: u64,
    /// Issued at.
    pub iat: u64,
}

/// IdentityClaim
///
/// Proof of who is calling, valid for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub id: Uuid,
    pub role: Role,
    pub status: AccountStatus,
}

impl From<Claims> for IdentityClaim {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            status: claims.status,
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential expired")]
    Expired,
    #[error("credential rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
    #[error("failed to issue credential: {0}")]
    Issue(#[source] jsonwebtoken::errors::Error),
}

/// CredentialVerifier
///
/// Turns a raw bearer credential into an identity. Implementations may
/// consult a session store or just check a signature; the predicates only
/// see the result.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<IdentityClaim, CredentialError>;
}

pub type VerifierState = Arc<dyn CredentialVerifier>;

/// JwtVerifier
///
/// HMAC-signed JWT credentials, as issued by the signin controller.
#[derive(Clone)]
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age_secs: u64,
}

impl JwtVerifier {
    pub fn new(secret: &str, max_age_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            max_age_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_max_age_secs)
    }

    /// issue
    ///
    /// Mints a token for `identity` that expires after the configured max age.
    /// An oversized max age clamps the expiry to the end of time rather than
    /// wrapping into the past.
    pub fn issue(&self, identity: &IdentityClaim) -> Result<String, CredentialError> {
        let now = get_current_timestamp();
        let claims = Claims {
            sub: identity.id,
            role: identity.role,
            status: identity.status,
            iat: now,
            exp: now.saturating_add(self.max_age_secs),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(CredentialError::Issue)
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, credential: &str) -> Result<IdentityClaim, CredentialError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match decode::<Claims>(credential, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.into()),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(CredentialError::Expired),
                _ => Err(CredentialError::Rejected(e)),
            },
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// SignedInRequired
///
/// Halts with 401 unless the request carries a valid bearer credential.
/// On success the verified identity is stored in the context. A valid
/// credential for an inactive or frozen account halts with 403 instead,
/// and no identity is stored.
#[derive(Clone)]
pub struct SignedInRequired {
    verifier: VerifierState,
}

impl SignedInRequired {
    pub fn new(verifier: VerifierState) -> Self {
        Self { verifier }
    }

    pub async fn authenticate(&self, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        let token = bearer_token(ctx.headers())
            .map(str::to_owned)
            .ok_or_else(|| DispatchError::Unauthorized("missing bearer credential".into()))?;

        let identity = self.verifier.verify(&token).await.map_err(|e| {
            tracing::warn!(uri = %ctx.uri(), error = %e, "credential rejected");
            DispatchError::Unauthorized(e.to_string())
        })?;

        match identity.status {
            AccountStatus::Active => {}
            AccountStatus::Inactive => {
                return Err(DispatchError::Forbidden(ForbiddenReason::AccountInactive));
            }
            AccountStatus::Frozen => {
                return Err(DispatchError::Forbidden(ForbiddenReason::AccountFrozen));
            }
        }

        ctx.set_identity(identity);
        Ok(())
    }
}

#[async_trait]
impl Handler for SignedInRequired {
    async fn call(&self, ctx: &mut RequestContext) -> Outcome {
        match self.authenticate(ctx).await {
            Ok(()) => Outcome::Continue,
            Err(error) => {
                tracing::debug!(uri = %ctx.uri(), %error, "sign-in required");
                Outcome::reject(error)
            }
        }
    }

    fn name(&self) -> &'static str {
        "signed_in_required"
    }
}

/// AdminRequired
///
/// Authenticates first when no identity is present yet (so an anonymous
/// caller gets 401, never 403), then requires an admin role.
#[derive(Clone)]
pub struct AdminRequired {
    signed_in: SignedInRequired,
}

impl AdminRequired {
    pub fn new(verifier: VerifierState) -> Self {
        Self {
            signed_in: SignedInRequired::new(verifier),
        }
    }
}

#[async_trait]
impl Handler for AdminRequired {
    async fn call(&self, ctx: &mut RequestContext) -> Outcome {
        if ctx.identity().is_none() {
            if let Err(error) = self.signed_in.authenticate(ctx).await {
                tracing::debug!(uri = %ctx.uri(), %error, "admin route without identity");
                return Outcome::reject(error);
            }
        }

        match ctx.identity() {
            Some(identity) if identity.role.is_admin() => Outcome::Continue,
            Some(identity) => {
                tracing::warn!(
                    user_id = %identity.id,
                    role = ?identity.role,
                    uri = %ctx.uri(),
                    "admin route refused"
                );
                Outcome::reject(DispatchError::Forbidden(ForbiddenReason::NotAdmin))
            }
            None => Outcome::reject(DispatchError::Unauthorized("missing identity".into())),
        }
    }

    fn name(&self) -> &'static str {
        "admin_required"
    }
}
