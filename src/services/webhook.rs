use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Authenticates inbound gateway callbacks against the shared secret.
///
/// The signature header carries a hex-encoded HMAC-SHA-512 over the exact
/// raw request bytes. Anything short of a full constant-time match is
/// forged: missing secret, missing header, wrong length, wrong digest.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>) -> bool {
        let (Some(secret), Some(signature)) = (self.secret.as_deref(), signature) else {
            return false;
        };

        let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(raw_body);
        let expected = hex::encode(mac.finalize().into_bytes());

        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let verifier = WebhookVerifier::new(Some("whsec_test".into()));
        let body = br#"{"event":"charge.success"}"#;
        let sig = sign("whsec_test", body);
        assert!(verifier.verify(body, Some(&sig)));
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = WebhookVerifier::new(Some("whsec_test".into()));
        let body = br#"{"event":"charge.success"}"#;
        let sig = sign("whsec_other", body);
        assert!(!verifier.verify(body, Some(&sig)));
    }

    #[test]
    fn rejects_tampered_body() {
        let verifier = WebhookVerifier::new(Some("whsec_test".into()));
        let sig = sign("whsec_test", br#"{"event":"charge.success"}"#);
        assert!(!verifier.verify(br#"{"event":"charge.failed"}"#, Some(&sig)));
    }

    #[test]
    fn rejects_missing_header() {
        let verifier = WebhookVerifier::new(Some("whsec_test".into()));
        assert!(!verifier.verify(b"{}", None));
    }

    #[test]
    fn rejects_when_secret_not_configured() {
        let verifier = WebhookVerifier::new(None);
        let sig = sign("anything", b"{}");
        assert!(!verifier.verify(b"{}", Some(&sig)));
    }

    #[test]
    fn rejects_truncated_signature() {
        let verifier = WebhookVerifier::new(Some("whsec_test".into()));
        let body = b"{}";
        let sig = sign("whsec_test", body);
        assert!(!verifier.verify(body, Some(&sig[..sig.len() - 2])));
    }
}
