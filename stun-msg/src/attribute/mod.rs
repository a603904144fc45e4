// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! STUN Attributes
//!
//! Attribute types, the type-length-value layout of an attribute within a message and helpers
//! for walking the attributes of an existing message.
//!
//! Every attribute consists of a 4 byte header (type and unpadded length, both big endian)
//! followed by the value which is padded with zero bytes to a multiple of 4 bytes.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Type                  |            Length             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Value (variable)                ....
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

mod error;
pub use error::ErrorCode;
mod integrity;
pub use integrity::{Fingerprint, MessageIntegrity};

use byteorder::{BigEndian, ByteOrder};

use crate::message::{MessageHeader, StunParseError};

/// The type of an attribute in a STUN message
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeType(u16);

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#x}: {})", self.0, self.0, self.name())
    }
}

/// MAPPED-ADDRESS
pub const MAPPED_ADDRESS: AttributeType = AttributeType::new(0x0001);
/// USERNAME
pub const USERNAME: AttributeType = AttributeType::new(0x0006);
/// MESSAGE-INTEGRITY
pub const MESSAGE_INTEGRITY: AttributeType = AttributeType::new(0x0008);
/// ERROR-CODE
pub const ERROR_CODE: AttributeType = AttributeType::new(0x0009);
/// UNKNOWN-ATTRIBUTES
pub const UNKNOWN_ATTRIBUTES: AttributeType = AttributeType::new(0x000A);
/// REALM
pub const REALM: AttributeType = AttributeType::new(0x0014);
/// NONCE
pub const NONCE: AttributeType = AttributeType::new(0x0015);
/// XOR-MAPPED-ADDRESS
pub const XOR_MAPPED_ADDRESS: AttributeType = AttributeType::new(0x0020);
/// PRIORITY
pub const PRIORITY: AttributeType = AttributeType::new(0x0024);
/// USE-CANDIDATE
pub const USE_CANDIDATE: AttributeType = AttributeType::new(0x0025);
/// SOFTWARE
pub const SOFTWARE: AttributeType = AttributeType::new(0x8022);
/// ALTERNATE-SERVER
pub const ALTERNATE_SERVER: AttributeType = AttributeType::new(0x8023);
/// FINGERPRINT
pub const FINGERPRINT: AttributeType = AttributeType::new(0x8028);
/// ICE-CONTROLLED
pub const ICE_CONTROLLED: AttributeType = AttributeType::new(0x8029);
/// ICE-CONTROLLING
pub const ICE_CONTROLLING: AttributeType = AttributeType::new(0x802A);

impl AttributeType {
    /// Create a new AttributeType from an existing value
    ///
    /// Note: the value passed in is not encoded as in a stun message
    ///
    /// # Examples
    /// ```
    /// # use stun_msg::attribute::AttributeType;
    /// assert_eq!(AttributeType::new(0x123).value(), 0x123);
    /// ```
    pub const fn new(val: u16) -> Self {
        Self(val)
    }

    /// Return the integer value of this AttributeType
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Returns a human readable name of this `AttributeType` or "unknown"
    ///
    /// # Examples
    /// ```
    /// # use stun_msg::attribute::*;
    /// assert_eq!(XOR_MAPPED_ADDRESS.name(), "XOR-MAPPED-ADDRESS");
    /// ```
    pub fn name(self) -> &'static str {
        match self {
            MAPPED_ADDRESS => "MAPPED-ADDRESS",
            USERNAME => "USERNAME",
            MESSAGE_INTEGRITY => "MESSAGE-INTEGRITY",
            ERROR_CODE => "ERROR-CODE",
            UNKNOWN_ATTRIBUTES => "UNKNOWN-ATTRIBUTES",
            REALM => "REALM",
            NONCE => "NONCE",
            XOR_MAPPED_ADDRESS => "XOR-MAPPED-ADDRESS",
            PRIORITY => "PRIORITY",
            USE_CANDIDATE => "USE-CANDIDATE",
            SOFTWARE => "SOFTWARE",
            ALTERNATE_SERVER => "ALTERNATE-SERVER",
            FINGERPRINT => "FINGERPRINT",
            ICE_CONTROLLED => "ICE-CONTROLLED",
            ICE_CONTROLLING => "ICE-CONTROLLING",
            _ => "unknown",
        }
    }

    /// Check if comprehension is required for an `AttributeType`.  All integer attribute
    /// values < 0x8000 require comprehension.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::AttributeType;
    /// assert_eq!(AttributeType::new(0x0).comprehension_required(), true);
    /// assert_eq!(AttributeType::new(0x8000).comprehension_required(), false);
    /// ```
    pub fn comprehension_required(self) -> bool {
        self.0 < 0x8000
    }
}
impl From<u16> for AttributeType {
    fn from(f: u16) -> Self {
        Self::new(f)
    }
}
impl From<AttributeType> for u16 {
    fn from(f: AttributeType) -> Self {
        f.0
    }
}

/// The number of zero bytes following an attribute value of `len` bytes.
///
/// # Examples
///
/// ```
/// # use stun_msg::attribute::padding;
/// assert_eq!(padding(0), 0);
/// assert_eq!(padding(1), 3);
/// assert_eq!(padding(4), 0);
/// assert_eq!(padding(7), 1);
/// ```
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// The length of an attribute value of `len` bytes including padding.
pub fn padded_attr_len(len: usize) -> usize {
    len + padding(len)
}

/// Structure for holding the header of a STUN attribute.  Contains the type and the length
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeHeader {
    atype: AttributeType,
    length: u16,
}

impl AttributeHeader {
    /// The length of an attribute header
    pub const LENGTH: usize = 4;

    pub(crate) fn new(atype: AttributeType, length: u16) -> Self {
        Self { atype, length }
    }

    fn parse(data: &[u8]) -> Result<Self, StunParseError> {
        if data.len() < Self::LENGTH {
            return Err(StunParseError::Truncated {
                expected: Self::LENGTH,
                actual: data.len(),
            });
        }
        Ok(Self {
            atype: BigEndian::read_u16(&data[0..2]).into(),
            length: BigEndian::read_u16(&data[2..4]),
        })
    }

    pub(crate) fn write_into(&self, dest: &mut [u8]) {
        BigEndian::write_u16(&mut dest[0..2], self.atype.into());
        BigEndian::write_u16(&mut dest[2..4], self.length);
    }

    /// The [`AttributeType`]
    pub fn get_type(&self) -> AttributeType {
        self.atype
    }

    /// The unpadded length of the attribute value
    pub fn length(&self) -> u16 {
        self.length
    }
}

impl TryFrom<&[u8]> for AttributeHeader {
    type Error = StunParseError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        AttributeHeader::parse(value)
    }
}

/// The header and a view of the value of an attribute within a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute<'a> {
    /// The [`AttributeHeader`] of this [`RawAttribute`]
    pub header: AttributeHeader,
    /// The unpadded value of this [`RawAttribute`]
    pub value: &'a [u8],
}

impl<'a> RawAttribute<'a> {
    /// Read a [`RawAttribute`] from the start of `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::{RawAttribute, AttributeType};
    /// let data = &[0, 1, 0, 2, 5, 6, 0, 0];
    /// let attr = RawAttribute::from_bytes(data).unwrap();
    /// assert_eq!(attr.get_type(), AttributeType::new(1));
    /// assert_eq!(attr.value, &[5, 6]);
    /// assert_eq!(attr.padded_len(), 8);
    /// ```
    pub fn from_bytes(data: &'a [u8]) -> Result<Self, StunParseError> {
        let header = AttributeHeader::parse(data)?;
        let available = data.len() - AttributeHeader::LENGTH;
        // the advertised length is larger than actual data -> error
        if header.length() as usize > available {
            return Err(StunParseError::Truncated {
                expected: header.length() as usize,
                actual: available,
            });
        }
        Ok(Self {
            header,
            value: &data[AttributeHeader::LENGTH..AttributeHeader::LENGTH + header.length() as usize],
        })
    }

    /// Returns the [`AttributeType`] of this [`RawAttribute`]
    pub fn get_type(&self) -> AttributeType {
        self.header.get_type()
    }

    /// The number of bytes this attribute occupies in a message including the header and
    /// padding.
    pub fn padded_len(&self) -> usize {
        AttributeHeader::LENGTH + padded_attr_len(self.value.len())
    }
}

impl std::fmt::Display for RawAttribute<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RawAttribute (type: {}, len: {}, data: {:?})",
            self.get_type(),
            self.header.length(),
            self.value
        )
    }
}

/// Iterator over the attributes of a STUN message.
///
/// Only the attribute area declared by the header length is walked.  Iteration ends at the
/// first attribute that does not fit in the message.
#[derive(Debug, Clone)]
pub struct MessageAttributesIter<'a> {
    data: &'a [u8],
    data_i: usize,
}

impl<'a> MessageAttributesIter<'a> {
    /// Construct an Iterator over the attributes of a message stored in `data`.
    pub fn new(data: &'a [u8]) -> Result<Self, StunParseError> {
        let header = MessageHeader::from_bytes(data)?;
        let end = MessageHeader::LENGTH + header.data_length() as usize;
        if end > data.len() {
            return Err(StunParseError::Truncated {
                expected: end,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: &data[..end],
            data_i: MessageHeader::LENGTH,
        })
    }
}

impl<'a> Iterator for MessageAttributesIter<'a> {
    type Item = (usize, RawAttribute<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data_i >= self.data.len() {
            return None;
        }

        let Ok(attr) = RawAttribute::from_bytes(&self.data[self.data_i..]) else {
            self.data_i = self.data.len();
            return None;
        };
        let offset = self.data_i;
        self.data_i += attr.padded_len();
        Some((offset, attr))
    }
}

/// Find the comprehension-required attributes of `msg` that are not listed in `known`.
///
/// Each unknown attribute type is returned once, in the order it first appears in the
/// message.
///
/// # Examples
///
/// ```
/// # use stun_msg::attribute::*;
/// # use stun_msg::message::*;
/// # use stun_msg::builder::MessageBuilder;
/// let mut buf = [0; 64];
/// let mut builder = MessageBuilder::request(&mut buf, BINDING, TransactionIdGenerator::global())
///     .unwrap();
/// builder.append_u32(PRIORITY, 10).unwrap();
/// builder.append_flag(AttributeType::new(0x0123)).unwrap();
/// builder.append_flag(AttributeType::new(0x8123)).unwrap();
/// let len = builder.finish().unwrap();
/// let unknown = find_unknown(&buf[..len], &[PRIORITY]).unwrap();
/// assert_eq!(unknown, vec![AttributeType::new(0x0123)]);
/// ```
pub fn find_unknown(
    msg: &[u8],
    known: &[AttributeType],
) -> Result<Vec<AttributeType>, StunParseError> {
    let mut ret = Vec::new();
    for (_offset, attr) in MessageAttributesIter::new(msg)? {
        let atype = attr.get_type();
        if atype.comprehension_required() && !known.contains(&atype) && !ret.contains(&atype) {
            tracing::debug!("unknown comprehension required attribute {atype}");
            ret.push(atype);
        }
    }
    Ok(ret)
}
