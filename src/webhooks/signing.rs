use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use tracing::trace;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Digest used to key the HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

/// Computes the hex-encoded HMAC of `data` under `key`.
pub fn sign(data: &[u8], key: &[u8], algorithm: Algorithm) -> String {
    let digest = match algorithm {
        Algorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
    };
    hex::encode(digest)
}

/// Checks a hex-encoded HMAC against the exact bytes received.
///
/// Anything that isn't a matching signature (bad hex, wrong length, wrong key) is simply `false`.
/// The comparison itself is constant-time.
pub fn verify(data: &[u8], key: &[u8], signature: &str, algorithm: Algorithm) -> bool {
    let signature = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", signature);
            return false;
        }
    };

    match algorithm {
        Algorithm::Sha1 => match HmacSha1::new_from_slice(key) {
            Ok(mut mac) => {
                mac.update(data);
                mac.verify_slice(&signature).is_ok()
            }
            Err(_) => false,
        },
        Algorithm::Sha256 => match HmacSha256::new_from_slice(key) {
            Ok(mut mac) => {
                mac.update(data);
                mac.verify_slice(&signature).is_ok()
            }
            Err(_) => false,
        },
    }
}

/// Constant-time equality for plaintext secrets. Only the length leaks.
pub fn token_matches(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// How the value of a signature header is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Hex HMAC of the body, optionally behind a prefix such as `sha256=`.
    Hmac {
        algorithm: Algorithm,
        prefix: Option<&'static str>,
    },
    /// The header carries the shared secret itself.
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader {
    pub name: &'static str,
    pub scheme: Scheme,
}

impl SignatureHeader {
    pub fn verify(&self, data: &[u8], key: &str, value: &str) -> bool {
        match self.scheme {
            Scheme::Token => token_matches(value, key),
            Scheme::Hmac { algorithm, prefix } => {
                let signature = match prefix {
                    Some(prefix) => match value.strip_prefix(prefix) {
                        Some(s) => s,
                        None => {
                            trace!("couldn't strip prefix from signature `{}`", value);
                            return false;
                        }
                    },
                    None => value,
                };
                verify(data, key.as_bytes(), signature, algorithm)
            }
        }
    }
}
