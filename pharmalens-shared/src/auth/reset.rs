/// Password-reset token generation
///
/// Reset tokens are opaque 64-character hex strings backed by 32 bytes
/// from the OS RNG. They are stored server-side with a 1-hour expiry and
/// a single-use flag; see `models::password_reset_token`.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};

/// Reset tokens expire one hour after issuance
const RESET_TOKEN_LIFETIME_MINUTES: i64 = 60;

/// Generates a cryptographically random reset token
///
/// # Example
///
/// ```
/// use pharmalens_shared::auth::reset::generate_reset_token;
///
/// let token = generate_reset_token();
/// assert_eq!(token.len(), 64);
/// ```
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Computes the expiry timestamp for a token issued now
pub fn reset_token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(RESET_TOKEN_LIFETIME_MINUTES)
}
