//! Inbound STUN/TURN message model and header decoding.

use std::time::Duration;

use bytes::Buf;

use super::attributes::StunAttribute;
use super::stun_const::{MAGIC_COOKIE, STUN_HEADER_SIZE, TRANSACTION_ID_SIZE};
use super::stun_err::StunError;
use super::transaction::TransactionId;

/// The two class bits of a STUN message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    Request,
    Indication,
    SuccessResponse,
    ErrorResponse,
}

impl MessageClass {
    /// Extracts the class bits (C1 at bit 8, C0 at bit 4) of a message type.
    pub fn from_u16(value: u16) -> Self {
        match ((value >> 7) & 0x2) | ((value >> 4) & 0x1) {
            0 => MessageClass::Request,
            1 => MessageClass::Indication,
            2 => MessageClass::SuccessResponse,
            _ => MessageClass::ErrorResponse,
        }
    }
}

/// Message types supported by the connectivity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    BindingRequest,
    BindingSuccessResponse,
    BindingErrorResponse,
    AllocateRequest,
    AllocateSuccessResponse,
    AllocateErrorResponse,
    RefreshRequest,
    RefreshSuccessResponse,
    RefreshErrorResponse,
    CreatePermissionRequest,
    CreatePermissionSuccessResponse,
    CreatePermissionErrorResponse,
    Unknown(u16),
}

impl MessageType {
    /// Creates a message type based on the numeric value of the header.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0001 => MessageType::BindingRequest,
            0x0101 => MessageType::BindingSuccessResponse,
            0x0111 => MessageType::BindingErrorResponse,
            0x0003 => MessageType::AllocateRequest,
            0x0103 => MessageType::AllocateSuccessResponse,
            0x0113 => MessageType::AllocateErrorResponse,
            0x0004 => MessageType::RefreshRequest,
            0x0104 => MessageType::RefreshSuccessResponse,
            0x0114 => MessageType::RefreshErrorResponse,
            0x0008 => MessageType::CreatePermissionRequest,
            0x0108 => MessageType::CreatePermissionSuccessResponse,
            0x0118 => MessageType::CreatePermissionErrorResponse,
            other => MessageType::Unknown(other),
        }
    }

    /// Converts a message type to the value used in the STUN header.
    pub fn to_u16(&self) -> u16 {
        match self {
            MessageType::BindingRequest => 0x0001,
            MessageType::BindingSuccessResponse => 0x0101,
            MessageType::BindingErrorResponse => 0x0111,
            MessageType::AllocateRequest => 0x0003,
            MessageType::AllocateSuccessResponse => 0x0103,
            MessageType::AllocateErrorResponse => 0x0113,
            MessageType::RefreshRequest => 0x0004,
            MessageType::RefreshSuccessResponse => 0x0104,
            MessageType::RefreshErrorResponse => 0x0114,
            MessageType::CreatePermissionRequest => 0x0008,
            MessageType::CreatePermissionSuccessResponse => 0x0108,
            MessageType::CreatePermissionErrorResponse => 0x0118,
            MessageType::Unknown(val) => *val,
        }
    }

    pub fn class(&self) -> MessageClass {
        MessageClass::from_u16(self.to_u16())
    }
}

/// A decoded STUN/TURN message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunMessage {
    pub class: MessageClass,
    pub message_type: MessageType,
    pub transaction_id: TransactionId,
    pub attributes: Vec<StunAttribute>,
}

impl StunMessage {
    pub fn new(message_type: MessageType, transaction_id: TransactionId) -> Self {
        Self {
            class: message_type.class(),
            message_type,
            transaction_id,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: StunAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Analyzes a STUN message and returns the structured representation.
    pub fn parse(data: &[u8]) -> Result<Self, StunError> {
        if data.len() < STUN_HEADER_SIZE {
            return Err(StunError::TooShort(data.len()));
        }

        let mut header = &data[..STUN_HEADER_SIZE];
        let raw_type = header.get_u16() & 0x3FFF;
        let length = header.get_u16() as usize;

        let magic = header.get_u32();
        if magic != MAGIC_COOKIE {
            return Err(StunError::InvalidMagicCookie(magic));
        }

        let mut id = [0u8; TRANSACTION_ID_SIZE];
        header.copy_to_slice(&mut id);
        let transaction_id = TransactionId::from_bytes(id);

        let body = &data[STUN_HEADER_SIZE..];
        if body.len() < length {
            return Err(StunError::TooShort(data.len()));
        }
        let attributes = StunAttribute::parse_all(&body[..length], &transaction_id)?;

        Ok(StunMessage {
            class: MessageClass::from_u16(raw_type),
            message_type: MessageType::from_u16(raw_type),
            transaction_id,
            attributes,
        })
    }

    /// First ERROR-CODE value carried by the message.
    pub fn error_code(&self) -> Option<u32> {
        self.attributes.iter().find_map(|attr| match attr {
            StunAttribute::ErrorCode { code, .. } => Some(*code),
            _ => None,
        })
    }

    pub fn lifetime(&self) -> Option<Duration> {
        self.attributes
            .iter()
            .find_map(StunAttribute::lifetime_duration)
    }

    pub fn realm(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            StunAttribute::Realm(realm) => Some(realm.as_str()),
            _ => None,
        })
    }

    pub fn nonce(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            StunAttribute::Nonce(nonce) => Some(nonce.as_str()),
            _ => None,
        })
    }
}
