use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes HMAC-SHA256 of `payload` under `secret_key`, hex-encodes it, and
/// compares it against `received_hex` in constant time. The body bytes must be
/// exactly what the client sent — never a re-serialization of parsed JSON.
///
/// Malformed secrets or a `received_hex` of the wrong length simply yield
/// `false`; nothing here panics or leaks a distinguishable error to the caller.
pub fn verify(payload: &[u8], secret_key: &[u8], received_hex: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret_key) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    let expected = mac.finalize().into_bytes();
    let expected_hex = hex::encode(expected);

    // Compare the hex strings themselves in constant time rather than decoding
    // `received_hex` first — decoding would short-circuit on the first invalid
    // nibble and leak length/validity information through timing.
    constant_time_str_eq(expected_hex.as_bytes(), received_hex.as_bytes())
}

fn constant_time_str_eq(expected: &[u8], received: &[u8]) -> bool {
    if expected.len() != received.len() {
        return false;
    }
    expected.ct_eq(received).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let body = br#"{"event":"x"}"#;
        let sig = sign("whsec_test", body);
        assert!(verify(body, b"whsec_test", &sig));
    }

    #[test]
    fn rejects_a_mismatched_signature() {
        let body = br#"{"event":"x"}"#;
        assert!(!verify(body, b"whsec_test", "deadbeef"));
    }

    #[test]
    fn rejects_when_signed_under_a_different_secret() {
        let body = br#"{"event":"x"}"#;
        let sig = sign("other_secret", body);
        assert!(!verify(body, b"whsec_test", &sig));
    }

    #[test]
    fn rejects_when_body_bytes_differ_even_with_equivalent_json() {
        let signed_body = br#"{"event":"x"}"#;
        let reserialized_body = br#"{"event": "x"}"#;
        let sig = sign("whsec_test", signed_body);
        assert!(!verify(reserialized_body, b"whsec_test", &sig));
    }

    #[test]
    fn rejects_empty_signature_without_panicking() {
        assert!(!verify(b"{}", b"whsec_test", ""));
    }
}
