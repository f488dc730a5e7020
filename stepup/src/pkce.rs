//! PKCE primitives for the authorization-code flow (RFC 7636, S256 only).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use concierge_a2a_types::AuthChallenge;
use rand::RngCore as _;
use sha2::{Digest as _, Sha256};

use crate::error::{StepUpError, StepUpResult};

// 64 random bytes encode to 86 characters, inside the RFC's 43..=128 window.
const VERIFIER_BYTES: usize = 64;
const STATE_BYTES: usize = 32;

pub const CODE_CHALLENGE_METHOD: &str = "S256";

fn random_urlsafe(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// A fresh high-entropy code verifier. Never reused across attempts.
pub fn generate_verifier() -> String {
    random_urlsafe(VERIFIER_BYTES)
}

/// The S256 code challenge for a verifier:
/// `base64url(sha256(verifier))` without padding.
pub fn generate_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// An anti-forgery state token, independent of the verifier.
pub fn generate_state() -> String {
    random_urlsafe(STATE_BYTES)
}

/// Assemble the authorization URL the user's browser is sent to.
///
/// Every parameter value is percent-encoded. Scopes are space-joined before
/// encoding, per OAuth2 convention.
pub fn build_authorization_url(
    challenge: &AuthChallenge,
    client_id: &str,
    redirect_uri: &str,
    code_challenge: &str,
    state: &str,
) -> StepUpResult<String> {
    if client_id.trim().is_empty() {
        return Err(StepUpError::MissingConfiguration {
            field: "client_id".to_string(),
        });
    }

    let scope = challenge.scopes.join(" ");
    Ok(format!(
        "{}?response_type={}&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method={}",
        challenge.authorization_endpoint,
        urlencoding::encode(&challenge.response_type),
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope),
        urlencoding::encode(state),
        urlencoding::encode(code_challenge),
        CODE_CHALLENGE_METHOD,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_length_and_charset_are_rfc_compliant() {
        let verifier = generate_verifier();
        assert!((43..=128).contains(&verifier.len()));
        assert!(verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn verifiers_and_states_are_distinct_per_call() {
        assert_ne!(generate_verifier(), generate_verifier());
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn challenge_is_deterministic_for_a_verifier() {
        let verifier = generate_verifier();
        assert_eq!(generate_challenge(&verifier), generate_challenge(&verifier));
        assert_ne!(generate_challenge(&verifier), verifier);
    }

    #[test]
    fn challenge_matches_rfc_7636_appendix_b_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            generate_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn authorization_url_carries_all_pkce_parameters() {
        let challenge = AuthChallenge {
            authorization_endpoint: "https://auth.example.com/authorize".to_string(),
            token_endpoint: "https://auth.example.com/token".to_string(),
            scopes: vec!["booking:write".to_string(), "profile".to_string()],
            redirect_uri: None,
            response_type: "code".to_string(),
        };

        let url = build_authorization_url(
            &challenge,
            "client-1",
            "https://app.example.com/auth/callback",
            "challenge-abc",
            "state-xyz",
        )
        .unwrap();

        assert!(url.starts_with("https://auth.example.com/authorize?response_type=code"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fauth%2Fcallback"));
        assert!(url.contains("scope=booking%3Awrite%20profile"));
        assert!(url.contains("state=state-xyz"));
        assert!(url.contains("code_challenge=challenge-abc"));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn empty_client_id_fails_fast() {
        let challenge = AuthChallenge {
            authorization_endpoint: "https://auth.example.com/authorize".to_string(),
            token_endpoint: "https://auth.example.com/token".to_string(),
            scopes: vec![],
            redirect_uri: None,
            response_type: "code".to_string(),
        };

        let error = build_authorization_url(&challenge, "", "https://cb", "c", "s").unwrap_err();
        assert!(matches!(error, StepUpError::MissingConfiguration { .. }));
    }
}
