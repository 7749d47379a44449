//! ID token claim checks.
//!
//! The ID token is received directly from the token endpoint over TLS, so
//! only its claims are checked here (OpenID Connect Core 3.1.3.7); the
//! signature is not verified.

use crate::error::{OidcError, OidcResult};
use crate::types::IdTokenClaims;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Allowed clock skew when checking `exp`
const CLOCK_SKEW_SECONDS: i64 = 60;

/// Decode the claims section of an ID token without verifying its signature.
pub fn decode_claims(id_token: &str) -> OidcResult<IdTokenClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<IdTokenClaims>(id_token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Check issuer, audience, expiry and nonce.
pub fn verify_claims(
    claims: &IdTokenClaims,
    issuer: &str,
    client_id: &str,
    expected_nonce: Option<&str>,
) -> OidcResult<()> {
    if claims.iss.trim_end_matches('/') != issuer.trim_end_matches('/') {
        return Err(OidcError::InvalidIdToken(format!(
            "issuer mismatch: expected {}, got {}",
            issuer, claims.iss
        )));
    }

    if !claims.aud.contains(client_id) {
        return Err(OidcError::InvalidIdToken(format!(
            "audience does not contain {}",
            client_id
        )));
    }

    if claims.exp.saturating_add(CLOCK_SKEW_SECONDS) < Utc::now().timestamp() {
        return Err(OidcError::InvalidIdToken("token expired".to_string()));
    }

    if let Some(expected) = expected_nonce {
        match claims.nonce.as_deref() {
            Some(nonce) if nonce == expected => {}
            Some(_) => return Err(OidcError::InvalidIdToken("nonce mismatch".to_string())),
            None => return Err(OidcError::InvalidIdToken("missing nonce".to_string())),
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    /// Build an unsigned-looking JWT carrying `claims`.
    pub fn fake_id_token(claims: serde_json::Value) -> String {
        let header = serde_json::json!({ "alg": "RS256", "typ": "JWT", "kid": "test" });
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap()),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap()),
            URL_SAFE_NO_PAD.encode(b"signature")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::fake_id_token;
    use super::*;

    fn claims(aud: serde_json::Value, exp_offset: i64, nonce: Option<&str>) -> IdTokenClaims {
        let token = fake_id_token(serde_json::json!({
            "iss": "https://idp.example.com/",
            "sub": "user-1",
            "aud": aud,
            "exp": Utc::now().timestamp() + exp_offset,
            "iat": Utc::now().timestamp(),
            "nonce": nonce,
            "email": "user@example.com",
            "groups": ["admins"]
        }));
        decode_claims(&token).unwrap()
    }

    #[test]
    fn test_decode_keeps_extra_claims() {
        let claims = claims(serde_json::json!("client"), 300, Some("n"));
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
        assert_eq!(claims.additional_claims["groups"][0], "admins");
    }

    #[test]
    fn test_valid_claims() {
        let claims = claims(serde_json::json!(["other", "client"]), 300, Some("n"));
        verify_claims(&claims, "https://idp.example.com", "client", Some("n")).unwrap();
    }

    #[test]
    fn test_rejects_wrong_audience() {
        let claims = claims(serde_json::json!("someone-else"), 300, Some("n"));
        let result = verify_claims(&claims, "https://idp.example.com/", "client", Some("n"));
        assert!(matches!(result, Err(OidcError::InvalidIdToken(_))));
    }

    #[test]
    fn test_rejects_wrong_issuer() {
        let claims = claims(serde_json::json!("client"), 300, None);
        let result = verify_claims(&claims, "https://evil.example.com", "client", None);
        assert!(matches!(result, Err(OidcError::InvalidIdToken(_))));
    }

    #[test]
    fn test_far_future_expiry_is_not_wrapped() {
        let mut claims = claims(serde_json::json!("client"), 300, Some("n"));
        claims.exp = i64::MAX;
        verify_claims(&claims, "https://idp.example.com", "client", Some("n")).unwrap();
    }

    #[test]
    fn test_rejects_expired_token() {
        let claims = claims(serde_json::json!("client"), -3600, Some("n"));
        let result = verify_claims(&claims, "https://idp.example.com/", "client", Some("n"));
        assert!(matches!(result, Err(OidcError::InvalidIdToken(_))));
    }

    #[test]
    fn test_rejects_nonce_mismatch() {
        let claims = claims(serde_json::json!("client"), 300, Some("replayed"));
        let result = verify_claims(&claims, "https://idp.example.com/", "client", Some("n"));
        assert!(matches!(result, Err(OidcError::InvalidIdToken(_))));
    }

    #[test]
    fn test_garbage_token() {
        assert!(decode_claims("not-a-jwt").is_err());
    }
}
