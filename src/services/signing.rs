use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of the query string, hex encoded, as the futures API expects
/// in the `signature` parameter.
pub fn sign_query(query: &str, secret: &str) -> Result<String, ApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Signing(e.to_string()))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
