//! Bearer token verification.
//!
//! # Pre-conditions
//! - The token is a compact JWT signed with the configured algorithm.
//!
//! # Post-conditions
//! - On success, returns the [`Principal`] described by the claims, with
//!   sharing labels normalised.
//!
//! # Invariants
//! - Verification is stateless; the same inputs always produce the same outputs.
//! - Expired tokens are always rejected.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use super::JwtConfig;
use super::context::{AgeRestriction, ContentRestrictions, Principal};
use crate::types::{LibraryId, UserId};

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// Libraries the user may see. Absent means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libraries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_restriction: Option<AgeRestriction>,
    #[serde(default)]
    pub labels_allow: Vec<String>,
    #[serde(default)]
    pub labels_exclude: Vec<String>,
}

impl Claims {
    fn into_principal(self) -> Result<Principal, JwtError> {
        if self.sub.trim().is_empty() {
            return Err(JwtError::MissingSubClaim);
        }
        Ok(Principal {
            user_id: UserId::new(self.sub),
            libraries: self
                .libraries
                .map(|ids| ids.into_iter().map(LibraryId::new).collect()),
            restrictions: ContentRestrictions::new(
                self.age_restriction,
                self.labels_allow,
                self.labels_exclude,
            ),
        })
    }
}

/// Error returned when JWT verification fails.
#[derive(Debug)]
pub enum JwtError {
    /// The JWT signature is invalid.
    InvalidSignature,
    /// The JWT has expired.
    TokenExpired,
    /// The JWT is malformed or cannot be parsed.
    MalformedToken,
    /// The 'sub' claim is missing or blank.
    MissingSubClaim,
    /// The decoding key could not be created from the provided configuration.
    InvalidKey(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid JWT signature"),
            Self::TokenExpired => write!(f, "JWT has expired"),
            Self::MalformedToken => write!(f, "malformed JWT"),
            Self::MissingSubClaim => write!(f, "missing 'sub' claim in JWT"),
            Self::InvalidKey(reason) => write!(f, "invalid key: {reason}"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Verify a token and extract the principal it describes.
///
/// # Errors
/// Returns `JwtError` if verification fails for any reason.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Principal, JwtError> {
    let key = match config {
        JwtConfig::Hs256 { secret } => {
            if secret.is_empty() {
                return Err(JwtError::InvalidKey("secret must be non-empty".to_owned()));
            }
            DecodingKey::from_secret(secret)
        }
        JwtConfig::Rs256 { public_key } => DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| JwtError::InvalidKey(e.to_string()))?,
    };
    let validation = Validation::new(config.algorithm());

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| map_jwt_error(&e))?;
    token_data.claims.into_principal()
}

/// Maps jsonwebtoken errors to our `JwtError` type.
fn map_jwt_error(error: &jsonwebtoken::errors::Error) -> JwtError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => JwtError::MissingSubClaim,
        _ => JwtError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::auth::AgeRestrictionMode;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough";
    /// 2100-01-01T00:00:00Z.
    const FAR_FUTURE: u64 = 4_102_444_800;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_owned(),
            exp: FAR_FUTURE,
            ..Claims::default()
        }
    }

    fn sign(claims: &Claims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("failed to create test token")
    }

    fn config() -> JwtConfig {
        JwtConfig::Hs256 {
            secret: SECRET.to_vec(),
        }
    }

    #[test]
    fn test_verify_minimal_token() {
        let token = sign(&claims("user-123"), SECRET);
        let principal = verify_token(&token, &config()).expect("verified token");
        assert_eq!(principal.user_id, UserId::new("user-123"));
        assert!(principal.libraries.is_none());
        assert!(!principal.restrictions.is_restricted());
    }

    #[test]
    fn test_verify_token_with_scope_and_restrictions() {
        let token = sign(
            &Claims {
                libraries: Some(vec!["lib-1".to_owned(), "lib-2".to_owned()]),
                age_restriction: Some(AgeRestriction::allow_only(12)),
                labels_allow: vec![" Kids ".to_owned()],
                labels_exclude: vec!["Mature".to_owned(), String::new()],
                ..claims("alice")
            },
            SECRET,
        );
        let principal = verify_token(&token, &config()).expect("verified token");
        let libraries = BTreeSet::from([LibraryId::new("lib-1"), LibraryId::new("lib-2")]);
        assert_eq!(principal.libraries, Some(libraries));
        let restrictions = principal.restrictions;
        assert_eq!(
            restrictions.age_restriction.map(|age| age.mode),
            Some(AgeRestrictionMode::AllowOnly)
        );
        assert_eq!(
            restrictions.labels_allow,
            BTreeSet::from(["kids".to_owned()])
        );
        assert_eq!(
            restrictions.labels_exclude,
            BTreeSet::from(["mature".to_owned()])
        );
    }

    #[test]
    fn test_verify_invalid_signature() {
        let token = sign(&claims("user-123"), b"wrong-secret-key-that-is-different");
        let result = verify_token(&token, &config());
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_verify_expired_token() {
        let token = sign(
            &Claims {
                exp: 1_000,
                ..claims("user-123")
            },
            SECRET,
        );
        let result = verify_token(&token, &config());
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_verify_malformed_token() {
        for token in ["", "not-a-valid-jwt"] {
            let result = verify_token(token, &config());
            assert!(matches!(result, Err(JwtError::MalformedToken)));
        }
    }

    #[test]
    fn test_verify_empty_sub_claim() {
        let token = sign(&claims(""), SECRET);
        let result = verify_token(&token, &config());
        assert!(matches!(result, Err(JwtError::MissingSubClaim)));
    }

    #[test]
    fn test_verify_empty_secret() {
        let config = JwtConfig::Hs256 { secret: vec![] };
        match verify_token("some.jwt.token", &config) {
            Err(JwtError::InvalidKey(message)) => assert_eq!(message, "secret must be non-empty"),
            other => panic!("expected InvalidKey error, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_rs256_invalid_key() {
        let config = JwtConfig::Rs256 {
            public_key: "not-a-valid-pem-key".to_owned(),
        };
        let result = verify_token("some.jwt.token", &config);
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }

    #[test]
    fn test_jwt_error_display() {
        assert_eq!(
            JwtError::InvalidSignature.to_string(),
            "invalid JWT signature"
        );
        assert_eq!(JwtError::TokenExpired.to_string(), "JWT has expired");
        assert_eq!(JwtError::MalformedToken.to_string(), "malformed JWT");
        assert_eq!(
            JwtError::MissingSubClaim.to_string(),
            "missing 'sub' claim in JWT"
        );
    }
}
