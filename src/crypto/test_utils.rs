//! Shared RSA fixtures for unit tests.

use crate::crypto::certificate::PublicKeyMaterial;
use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha1::Sha1;
use sha2::Sha256;

// Test keypair (DO NOT USE IN PRODUCTION). 1024 bits keeps debug builds fast.
static TEST_KEY: Lazy<RsaPrivateKey> = Lazy::new(|| {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, 1024).expect("RSA key generation")
});

/// The test key's public half.
pub fn public_key() -> PublicKeyMaterial {
    let der = TEST_KEY
        .to_public_key()
        .to_public_key_der()
        .expect("SPKI encoding");
    PublicKeyMaterial::from_spki_der(der.as_bytes().to_vec())
}

/// RSA-SHA1 signature over `message`.
pub fn sign(message: &[u8]) -> Vec<u8> {
    let key = SigningKey::<Sha1>::new(TEST_KEY.clone());
    key.sign(message).to_bytes().into_vec()
}

/// RSA-SHA256 signature over `message`.
pub fn sign_sha256(message: &[u8]) -> Vec<u8> {
    let key = SigningKey::<Sha256>::new(TEST_KEY.clone());
    key.sign(message).to_bytes().into_vec()
}

/// Base64 RSA-SHA1 signature over `message`.
pub fn sign_b64(message: &[u8]) -> String {
    STANDARD.encode(sign(message))
}
