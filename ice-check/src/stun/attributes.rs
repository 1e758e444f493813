//! STUN/TURN attributes the connectivity checks care about.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::Buf;

use super::stun_const::{
    ATTR_ERROR_CODE, ATTR_LIFETIME, ATTR_NONCE, ATTR_REALM, ATTR_XOR_MAPPED_ADDRESS, MAGIC_COOKIE,
};
use super::stun_err::StunError;
use super::transaction::TransactionId;

/// Decoded attribute of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StunAttribute {
    ErrorCode { code: u32, reason: String },
    /// TURN allocation lifetime, kept in wire order.
    Lifetime { seconds_be: [u8; 4] },
    Realm(String),
    Nonce(String),
    XorMappedAddress(SocketAddr),
    Unknown { attribute_type: u16, value: Vec<u8> },
}

impl StunAttribute {
    /// Builds a LIFETIME attribute from a number of seconds.
    pub fn lifetime(seconds: u32) -> Self {
        StunAttribute::Lifetime {
            seconds_be: seconds.to_be_bytes(),
        }
    }

    /// Numeric attribute type as carried in the TLV header.
    pub fn attribute_type(&self) -> u16 {
        match self {
            StunAttribute::ErrorCode { .. } => ATTR_ERROR_CODE,
            StunAttribute::Lifetime { .. } => ATTR_LIFETIME,
            StunAttribute::Realm(_) => ATTR_REALM,
            StunAttribute::Nonce(_) => ATTR_NONCE,
            StunAttribute::XorMappedAddress(_) => ATTR_XOR_MAPPED_ADDRESS,
            StunAttribute::Unknown { attribute_type, .. } => *attribute_type,
        }
    }

    /// Lifetime as a duration, for LIFETIME attributes only.
    pub fn lifetime_duration(&self) -> Option<Duration> {
        match self {
            StunAttribute::Lifetime { seconds_be } => {
                Some(Duration::from_secs(u64::from(u32::from_be_bytes(*seconds_be))))
            }
            _ => None,
        }
    }

    /// Decodes every attribute following the header.
    ///
    /// Values are padded to 4 bytes on the wire; the padding of the last
    /// attribute may be missing in sloppy implementations and is tolerated.
    pub fn parse_all(
        mut data: &[u8],
        transaction_id: &TransactionId,
    ) -> Result<Vec<StunAttribute>, StunError> {
        let mut attributes = Vec::new();

        while data.remaining() >= 4 {
            let attr_type = data.get_u16();
            let attr_length = data.get_u16() as usize;
            if data.remaining() < attr_length {
                return Err(StunError::TruncatedAttribute(attr_type));
            }

            let value = &data[..attr_length];
            attributes.push(Self::parse_value(attr_type, value, transaction_id)?);

            let padded = (attr_length + 3) & !3;
            data.advance(padded.min(data.remaining()));
        }

        Ok(attributes)
    }

    fn parse_value(
        attr_type: u16,
        value: &[u8],
        transaction_id: &TransactionId,
    ) -> Result<StunAttribute, StunError> {
        match attr_type {
            ATTR_ERROR_CODE => Self::parse_error_code(value),
            ATTR_LIFETIME => {
                let seconds_be: [u8; 4] = value
                    .get(..4)
                    .and_then(|bytes| bytes.try_into().ok())
                    .ok_or(StunError::TruncatedAttribute(attr_type))?;
                Ok(StunAttribute::Lifetime { seconds_be })
            }
            ATTR_REALM => Ok(StunAttribute::Realm(
                String::from_utf8_lossy(value).into_owned(),
            )),
            ATTR_NONCE => Ok(StunAttribute::Nonce(
                String::from_utf8_lossy(value).into_owned(),
            )),
            ATTR_XOR_MAPPED_ADDRESS => match parse_xor_address(value, transaction_id) {
                Some(addr) => Ok(StunAttribute::XorMappedAddress(addr)),
                None => Err(StunError::TruncatedAttribute(attr_type)),
            },
            other => Ok(StunAttribute::Unknown {
                attribute_type: other,
                value: value.to_vec(),
            }),
        }
    }

    /// ERROR-CODE: 21 reserved bits, 3-bit class, 8-bit number, reason phrase.
    fn parse_error_code(value: &[u8]) -> Result<StunAttribute, StunError> {
        if value.len() < 4 {
            return Err(StunError::TruncatedAttribute(ATTR_ERROR_CODE));
        }
        let class = value[2] & 0x07;
        let number = value[3];
        if !(3..=6).contains(&class) || number > 99 {
            return Err(StunError::InvalidErrorCode { class, number });
        }

        Ok(StunAttribute::ErrorCode {
            code: u32::from(class) * 100 + u32::from(number),
            reason: String::from_utf8_lossy(&value[4..]).into_owned(),
        })
    }
}

/// Decodes an XOR-MAPPED-ADDRESS value, IPv4 or IPv6.
fn parse_xor_address(mut value: &[u8], transaction_id: &TransactionId) -> Option<SocketAddr> {
    if value.remaining() < 4 {
        return None;
    }
    value.advance(1);
    let family = value.get_u8();

    // XOR port with the firsts 16 bits of the magic cookie
    let port = value.get_u16() ^ (MAGIC_COOKIE >> 16) as u16;

    match family {
        0x01 if value.remaining() >= 4 => {
            let ip = value.get_u32() ^ MAGIC_COOKIE;
            Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::from(ip)), port))
        }
        0x02 if value.remaining() >= 16 => {
            let mut key = [0u8; 16];
            key[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
            key[4..].copy_from_slice(transaction_id.as_bytes());

            let mut octets = [0u8; 16];
            value.copy_to_slice(&mut octets);
            for (octet, k) in octets.iter_mut().zip(key.iter()) {
                *octet ^= k;
            }
            Some(SocketAddr::new(IpAddr::V6(Ipv6Addr::from(octets)), port))
        }
        _ => None,
    }
}
