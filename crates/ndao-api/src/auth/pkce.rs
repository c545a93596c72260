use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use oauth2::PkceCodeChallenge;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Random bytes behind a login `state` value (hex-encoded, so twice as many chars).
pub const STATE_BYTES: usize = 16;

/// One pending login, created by `/init-login` and consumed by the callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAttempt {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

impl LoginAttempt {
    /// Generate a fresh verifier (32 random bytes, base64url), its S256 challenge
    /// and a random hex state.
    pub fn generate() -> Self {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        Self {
            code_verifier: verifier.secret().clone(),
            code_challenge: challenge.as_str().to_string(),
            state: generate_state(),
        }
    }

    /// Whether this record was stored under `key` and its challenge still
    /// derives from its verifier.
    pub fn is_consistent(&self, key: &str) -> bool {
        self.state == key && code_challenge_for(&self.code_verifier) == self.code_challenge
    }
}

/// `BASE64URL(SHA256(verifier))` without padding.
pub fn code_challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Whether `state` has the exact shape [`generate_state`] produces.
pub fn is_well_formed_state(state: &str) -> bool {
    state.len() == STATE_BYTES * 2 && state.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(value: &str) -> bool {
        value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn test_challenge_derives_from_verifier() {
        for _ in 0..32 {
            let attempt = LoginAttempt::generate();
            let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(attempt.code_verifier.as_bytes()));

            assert_eq!(attempt.code_challenge, expected);
            assert!(is_url_safe(&attempt.code_challenge));
            assert!(!attempt.code_challenge.contains(['+', '/', '=']));
        }
    }

    #[test]
    fn test_verifier_encodes_32_bytes() {
        let attempt = LoginAttempt::generate();

        assert_eq!(attempt.code_verifier.len(), 43);
        assert!(is_url_safe(&attempt.code_verifier));
        assert_eq!(
            URL_SAFE_NO_PAD.decode(&attempt.code_verifier).unwrap().len(),
            32
        );
    }

    #[test]
    fn test_known_challenge_vector() {
        // RFC 7636, appendix B
        assert_eq!(
            code_challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_state_shape_and_uniqueness() {
        let first = LoginAttempt::generate();
        let second = LoginAttempt::generate();

        assert!(is_well_formed_state(&first.state));
        assert!(is_well_formed_state(&second.state));
        assert_ne!(first.state, second.state);
        assert_ne!(first.code_verifier, second.code_verifier);
    }

    #[test]
    fn test_well_formed_state_rejects_paths_and_case() {
        assert!(!is_well_formed_state(""));
        assert!(!is_well_formed_state("../../etc/passwd"));
        assert!(!is_well_formed_state(&"A".repeat(32)));
        assert!(!is_well_formed_state(&"a".repeat(31)));
        assert!(is_well_formed_state(&"a".repeat(32)));
    }

    #[test]
    fn test_consistency_check() {
        let attempt = LoginAttempt::generate();
        assert!(attempt.is_consistent(&attempt.state));
        assert!(!attempt.is_consistent(&generate_state()));

        let tampered = LoginAttempt {
            code_verifier: "something-else".to_string(),
            ..attempt.clone()
        };
        assert!(!tampered.is_consistent(&attempt.state));
    }

    #[test]
    fn test_serialized_field_names() {
        let attempt = LoginAttempt::generate();
        let json = serde_json::to_value(&attempt).unwrap();

        assert_eq!(json["codeVerifier"], attempt.code_verifier);
        assert_eq!(json["codeChallenge"], attempt.code_challenge);
        assert_eq!(json["state"], attempt.state);
    }
}
