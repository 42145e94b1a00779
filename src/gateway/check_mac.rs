//! `CheckMacValue` computation for the payment gateway.
//!
//! The value is an upper-case hex SHA-256 over a canonical string:
//! parameters sorted by key, joined as `key=value` with `&`, wrapped in
//! `HashKey=…&` / `&HashIV=…`, URL-encoded, lower-cased, and finally with a
//! fixed set of escapes turned back into literal characters.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use url::form_urlencoded;

pub const CHECK_MAC_FIELD: &str = "CheckMacValue";

/// Parameters exchanged with the gateway. `BTreeMap` keeps keys in byte order.
pub type GatewayParams = BTreeMap<String, String>;

/// Escapes the gateway expects to see as literal characters after lower-casing.
const LITERAL_ESCAPES: [(&str, &str); 9] = [
    ("%20", "+"),
    ("%2d", "-"),
    ("%5f", "_"),
    ("%2e", "."),
    ("%21", "!"),
    ("%2a", "*"),
    ("%28", "("),
    ("%29", ")"),
    ("%7e", "~"),
];

#[derive(Clone)]
pub struct CheckMacCodec {
    hash_key: String,
    hash_iv: String,
}

impl std::fmt::Debug for CheckMacCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckMacCodec").finish_non_exhaustive()
    }
}

impl CheckMacCodec {
    pub fn new(hash_key: impl Into<String>, hash_iv: impl Into<String>) -> Self {
        Self {
            hash_key: hash_key.into(),
            hash_iv: hash_iv.into(),
        }
    }

    pub fn sign(&self, params: &GatewayParams) -> String {
        let digest = Sha256::digest(self.canonicalize(params).as_bytes());
        hex::encode_upper(digest)
    }

    pub fn verify(&self, params: &GatewayParams, signature: &str) -> bool {
        let expected = self.sign(params);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }

    /// Verifies the `CheckMacValue` carried inside `params`. A missing field
    /// is a failed verification.
    pub fn verify_params(&self, params: &GatewayParams) -> bool {
        match params.get(CHECK_MAC_FIELD) {
            Some(signature) if !signature.is_empty() => self.verify(params, signature),
            _ => false,
        }
    }

    fn canonicalize(&self, params: &GatewayParams) -> String {
        let joined = params
            .iter()
            .filter(|(key, _)| key.as_str() != CHECK_MAC_FIELD)
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let raw = format!("HashKey={}&{}&HashIV={}", self.hash_key, joined, self.hash_iv);

        let mut encoded = form_urlencoded::byte_serialize(raw.as_bytes())
            .collect::<String>()
            .to_lowercase();
        for (escape, literal) in LITERAL_ESCAPES {
            encoded = encoded.replace(escape, literal);
        }
        encoded
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
