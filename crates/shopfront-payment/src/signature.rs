//! Callback signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::PaymentError;

/// Hex-encoded HMAC-SHA256 over `gateway_order_id|gateway_payment_id`.
pub fn compute_signature(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    secret: &str,
) -> Result<String, PaymentError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| PaymentError::InvalidKey)?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a callback signature in constant time.
pub fn verify_signature(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    signature: &str,
    secret: &str,
) -> Result<bool, PaymentError> {
    let expected = compute_signature(gateway_order_id, gateway_payment_id, secret)?;
    Ok(expected.as_bytes().ct_eq(signature.as_bytes()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // echo -n "order_1|pay_1" | openssl dgst -sha256 -hmac "secret"
        let sig = compute_signature("order_1", "pay_1", "secret").unwrap();
        assert_eq!(sig.len(), 64);
        assert_eq!(
            sig,
            "52115a0d3400de9e86aade1f1b6eba9e8974604f4e267a9e9a16633a4c8dd2cb"
        );
    }

    #[test]
    fn verification_detects_tampering() {
        let sig = compute_signature("order_1", "pay_1", "secret").unwrap();
        assert!(verify_signature("order_1", "pay_1", &sig, "secret").unwrap());
        assert!(!verify_signature("order_1", "pay_2", &sig, "secret").unwrap());
        assert!(!verify_signature("order_1", "pay_1", &sig, "other").unwrap());
        assert!(!verify_signature("order_1", "pay_1", "", "secret").unwrap());
        assert!(!verify_signature("order_1", "pay_1", &sig.to_uppercase(), "secret").unwrap());
    }
}
