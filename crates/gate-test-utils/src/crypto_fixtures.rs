//! RSA signing fixtures for RS256 test tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

/// A freshly generated RSA keypair with a key ID.
///
/// Signs RS256 test tokens and exports the public half as a JWK for mock
/// JWKS endpoints.
pub struct TestKeypair {
    kid: String,
    private_pem: Vec<u8>,
    n_b64: String,
    e_b64: String,
}

impl TestKeypair {
    /// Generate a 2048-bit RSA keypair.
    pub fn generate(kid: &str) -> Self {
        let mut rng = rand::thread_rng();
        let private_key =
            RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA keypair");
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("Failed to encode private key")
            .as_bytes()
            .to_vec();

        Self {
            kid: kid.to_string(),
            private_pem,
            n_b64: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e_b64: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    }

    /// The key ID this keypair signs under.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Sign claims into an RS256 token with this keypair's `kid` header.
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        let encoding_key =
            EncodingKey::from_rsa_pem(&self.private_pem).expect("Invalid RSA private key");

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());

        encode(&header, claims, &encoding_key).expect("Failed to sign test token")
    }

    /// The public half as a JWK object.
    pub fn jwk_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "RSA",
            "kid": self.kid,
            "n": self.n_b64,
            "e": self.e_b64,
            "alg": "RS256",
            "use": "sig"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_exports_rsa_jwk() {
        let keypair = TestKeypair::generate("fixture-key");
        let jwk = keypair.jwk_json();

        assert_eq!(jwk["kty"], "RSA");
        assert_eq!(jwk["kid"], "fixture-key");
        assert_eq!(jwk["alg"], "RS256");
        assert!(jwk["n"].as_str().is_some_and(|n| !n.is_empty()));
        assert_eq!(jwk["e"], "AQAB");
    }

    #[test]
    fn test_signed_token_carries_kid_header() {
        let keypair = TestKeypair::generate("fixture-key");
        let token = keypair.sign(&serde_json::json!({"sub": "alice", "exp": 9_999_999_999_i64}));

        let header = jsonwebtoken::decode_header(&token).expect("header should parse");
        assert_eq!(header.kid.as_deref(), Some("fixture-key"));
        assert_eq!(header.alg, Algorithm::RS256);
    }
}
