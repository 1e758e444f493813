//! Protocol numbers and error strings used by the STUN decoder.

pub const MAGIC_COOKIE: u32 = 0x2112A442;
pub const STUN_HEADER_SIZE: usize = 20;
pub const TRANSACTION_ID_SIZE: usize = 12;

pub const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;
pub const ATTR_ERROR_CODE: u16 = 0x0009;
pub const ATTR_LIFETIME: u16 = 0x000D;
pub const ATTR_REALM: u16 = 0x0014;
pub const ATTR_NONCE: u16 = 0x0015;

/// 401, long-term credentials missing or wrong.
pub const UNAUTHORISED_ERROR_CODE: u32 = 401;
/// 438, the server rotated its nonce.
pub const STALE_NONCE_ERROR_CODE: u32 = 438;

pub const STUN_ERROR: &str = "StunError";
pub const TOO_SHORT_ERROR: &str = "MessageTooShort";
pub const MAGIC_COOKIE_ERROR: &str = "InvalidMagicCookie";
pub const TRUNCATED_ATTRIBUTE_ERROR: &str = "TruncatedAttribute";
pub const ERROR_CODE_ERROR: &str = "InvalidErrorCode";
