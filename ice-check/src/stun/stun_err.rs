use crate::stun::stun_const::{
    ERROR_CODE_ERROR, MAGIC_COOKIE_ERROR, STUN_ERROR, TOO_SHORT_ERROR, TRUNCATED_ATTRIBUTE_ERROR,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StunError {
    #[error("{}: \"{}\" {} bytes", STUN_ERROR, TOO_SHORT_ERROR, .0)]
    TooShort(usize),
    #[error("{}: \"{}\" {:#010x}", STUN_ERROR, MAGIC_COOKIE_ERROR, .0)]
    InvalidMagicCookie(u32),
    #[error("{}: \"{}\" type {:#06x}", STUN_ERROR, TRUNCATED_ATTRIBUTE_ERROR, .0)]
    TruncatedAttribute(u16),
    #[error("{}: \"{}\" class {} number {}", STUN_ERROR, ERROR_CODE_ERROR, .class, .number)]
    InvalidErrorCode { class: u8, number: u8 },
}
