// libs/consultation-cell/src/services/token.rs
use base64::{Engine as _, engine::general_purpose};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

pub const MEETING_ID_PREFIX: &str = "cons_";
pub const ACCESS_TOKEN_BYTES: usize = 32;

/// Generates consultation identifiers and join secrets.
///
/// Ids and tokens come from separate random draws, so knowing one never
/// narrows down the other. Both sources read the operating system RNG; if it
/// is unavailable generation panics, which is fatal for the service.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    pub fn new() -> Self {
        Self
    }

    /// `cons_` followed by 32 lowercase hex characters.
    pub fn new_meeting_id(&self) -> String {
        format!("{}{}", MEETING_ID_PREFIX, Uuid::new_v4().simple())
    }

    /// 256 random bits, URL-safe base64 without padding (43 characters).
    pub fn new_access_token(&self) -> String {
        let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }
}
