//! PKCE Generator
//!
//! RFC 7636 Proof Key for Code Exchange, used when building authorization
//! URLs for the authorization-code grant.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Mutex;

use crate::error::{ConfigurationError, HttpClientResult};
use crate::types::{PkceMethod, PkceParams};

const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// PKCE generator interface (for dependency injection).
pub trait PkceGenerator: Send + Sync {
    /// Generate a verifier and its challenge.
    fn generate(&self, method: PkceMethod) -> PkceParams;
}

/// Derive the challenge sent to the authorization endpoint.
pub fn compute_challenge(verifier: &str, method: PkceMethod) -> String {
    match method {
        PkceMethod::Plain => verifier.to_string(),
        PkceMethod::S256 => URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())),
    }
}

/// Random verifier generator.
pub struct DefaultPkceGenerator {
    verifier_length: usize,
}

impl DefaultPkceGenerator {
    /// 64-character verifiers.
    pub fn new() -> Self {
        Self { verifier_length: 64 }
    }

    /// Custom verifier length, 43 to 128 characters.
    pub fn with_length(length: usize) -> HttpClientResult<Self> {
        if !(43..=128).contains(&length) {
            return Err(ConfigurationError::InvalidValue {
                field: "verifier_length".to_string(),
                message: format!("{} is outside 43..=128", length),
            }
            .into());
        }

        Ok(Self {
            verifier_length: length,
        })
    }
}

impl Default for DefaultPkceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PkceGenerator for DefaultPkceGenerator {
    fn generate(&self, method: PkceMethod) -> PkceParams {
        let mut rng = rand::thread_rng();
        let code_verifier: String = (0..self.verifier_length)
            .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
            .collect();

        PkceParams {
            code_challenge: compute_challenge(&code_verifier, method),
            code_verifier,
            code_challenge_method: method,
        }
    }
}

/// PKCE generator returning scripted verifiers.
#[derive(Default)]
pub struct MockPkceGenerator {
    next_verifier: Mutex<Option<String>>,
    generate_history: Mutex<Vec<PkceParams>>,
}

impl MockPkceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the verifier returned by the next `generate` call.
    pub fn set_next_verifier(&self, verifier: impl Into<String>) -> &Self {
        *self.next_verifier.lock().unwrap() = Some(verifier.into());
        self
    }

    pub fn get_generate_history(&self) -> Vec<PkceParams> {
        self.generate_history.lock().unwrap().clone()
    }
}

impl PkceGenerator for MockPkceGenerator {
    fn generate(&self, method: PkceMethod) -> PkceParams {
        let code_verifier = self
            .next_verifier
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| "mock-verifier-0000000000000000000000000000000".to_string());

        let params = PkceParams {
            code_challenge: compute_challenge(&code_verifier, method),
            code_verifier,
            code_challenge_method: method,
        };

        self.generate_history.lock().unwrap().push(params.clone());
        params
    }
}

/// Check verifier length and alphabet.
pub fn is_valid_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len()) && verifier.bytes().all(|b| VERIFIER_CHARSET.contains(&b))
}

/// Create production PKCE generator.
pub fn create_pkce_generator() -> DefaultPkceGenerator {
    DefaultPkceGenerator::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_verifier_is_valid() {
        let params = DefaultPkceGenerator::new().generate(PkceMethod::S256);

        assert_eq!(params.code_verifier.len(), 64);
        assert!(is_valid_verifier(&params.code_verifier));
        assert_eq!(
            params.code_challenge,
            compute_challenge(&params.code_verifier, PkceMethod::S256)
        );
    }

    #[test]
    fn test_s256_rfc_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            compute_challenge(verifier, PkceMethod::S256),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
        assert_eq!(compute_challenge(verifier, PkceMethod::Plain), verifier);
    }

    #[test]
    fn test_verifier_validation() {
        assert!(is_valid_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"));
        assert!(!is_valid_verifier("short"));
        assert!(!is_valid_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOE!@#"));
    }

    #[test]
    fn test_invalid_length_rejected() {
        assert!(DefaultPkceGenerator::with_length(42).is_err());
        assert!(DefaultPkceGenerator::with_length(128).is_ok());
    }

    #[test]
    fn test_mock_generator_history() {
        let generator = MockPkceGenerator::new();
        generator.set_next_verifier("fixed-verifier");

        assert_eq!(generator.generate(PkceMethod::Plain).code_challenge, "fixed-verifier");
        assert_eq!(generator.get_generate_history().len(), 1);
    }
}
