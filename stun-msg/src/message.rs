// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! STUN Message headers
//!
//! Provides the fixed 20 byte header of a STUN message as specified in [RFC5389]: the packed
//! [`MessageType`], the attribute area length, the magic cookie and the [`TransactionId`].
//!
//! Writing a complete message is done with a
//! [`MessageBuilder`](crate::builder::MessageBuilder).
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389
//!
//! ## Examples
//!
//! ### Read a STUN [`MessageHeader`]
//!
//! ```
//! use stun_msg::message::{MessageHeader, MessageType, MessageClass, BINDING};
//!
//! let msg_data = [
//!     0x00, 0x01, 0x00, 0x08, // method, class and length
//!     0x21, 0x12, 0xA4, 0x42, // Fixed STUN magic bytes
//!     0x00, 0x00, 0x00, 0x00, // \
//!     0x00, 0x00, 0x00, 0x00, // } transaction ID
//!     0x00, 0x00, 0x73, 0x92, // /
//! ];
//! let header = MessageHeader::from_bytes(&msg_data).unwrap();
//!
//! assert_eq!(header.get_type(), MessageType::from_class_method(MessageClass::Request, BINDING));
//! assert_eq!(header.transaction_id(), 0x7392.into());
//! assert_eq!(header.data_length(), 8);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use byteorder::{BigEndian, ByteOrder};

use crate::address::AddressFamily;
use crate::attribute::AttributeType;

use tracing::{trace, warn};

/// The value of the magic cookie (in network byte order) as specified in RFC5389.
pub const MAGIC_COOKIE: u32 = 0x2112A442;

/// The largest STUN message that will be written.  Larger buffers are only used up to this
/// size.
pub const STUN_MAXMSG: usize = 65552;

/// The method in a STUN message
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Method(u16);

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#x}: {})", self.0, self.0, self.name())
    }
}

impl Method {
    /// Create a new [`Method`] from an existing value
    ///
    /// Note: the value passed in is not encoded as in a stun message
    ///
    /// Panics if the value is out of range (>= 0x1000)
    ///
    /// # Examples
    /// ```
    /// # use stun_msg::message::Method;
    /// assert_eq!(Method::new(0x123).value(), 0x123);
    /// ```
    pub const fn new(val: u16) -> Self {
        if val >= 0x1000 {
            panic!("Method value is out of range!");
        }
        Self(val)
    }

    /// Return the integer value of this [`Method`]
    ///
    /// Note: the value returned is not encoded as in a stun message
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Returns a human readable name of this `Method` or "unknown"
    ///
    /// # Examples
    /// ```
    /// # use stun_msg::message::*;
    /// assert_eq!(BINDING.name(), "BINDING");
    /// ```
    pub fn name(self) -> &'static str {
        match self {
            BINDING => "BINDING",
            _ => "unknown",
        }
    }
}

/// The value of the binding message type.  Can be used in either a request or an indication
/// message.
pub const BINDING: Method = Method::new(0x0001);

/// Possible errors when reading a STUN message header.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StunParseError {
    /// Not a STUN message.
    #[error("The provided data is not a STUN message")]
    NotStun,
    /// The message has been truncated
    #[error("Not enough data available to parse the packet, expected {}, actual {}", .expected, .actual)]
    Truncated {
        /// The expeced number of bytes
        expected: usize,
        /// The encountered number of bytes
        actual: usize,
    },
    /// The attribute cannot be read as the requested attribute type
    #[error("Attribute of type {} cannot be read as {}", .actual, .expected)]
    WrongAttributeType {
        /// The attribute type that was requested
        expected: AttributeType,
        /// The attribute type that was found
        actual: AttributeType,
    },
}

/// Errors produced when writing a STUN message
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StunWriteError {
    /// The destination buffer cannot hold the data
    #[error("Not enough space available to write the data, expected {}, actual {}", .expected, .actual)]
    BufferTooSmall {
        /// The number of bytes required
        expected: usize,
        /// The number of bytes available
        actual: usize,
    },
    /// The address family cannot be stored in a STUN address attribute
    #[error("Unsupported address family {}", .0)]
    InvalidAddressFamily(AddressFamily),
    /// The address data is too short for the declared address family
    #[error("Address data is too short, expected {}, actual {}", .expected, .actual)]
    InvalidAddressLength {
        /// The number of address bytes the family requires
        expected: usize,
        /// The number of address bytes provided
        actual: usize,
    },
    /// A message integrity attribute already exists. Cannot write any further attributes
    #[error("The message already contains a message intregrity attribute")]
    MessageIntegrityExists,
    /// The fingerprint attribute already exists. Cannot write any further attributes
    #[error("The message already contains a fingerprint attribute")]
    FingerprintExists,
    /// Failed to compute integrity
    #[error("Failed to compute integrity")]
    IntegrityFailed,
}

/// Structure for holding the required credentials for handling long-term STUN credentials
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct LongTermCredentials {
    username: String,
    password: String,
    realm: String,
}

impl LongTermCredentials {
    /// Create a new set of [`LongTermCredentials`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::LongTermCredentials;
    /// let credentials = LongTermCredentials::new(
    ///     "user".to_string(),
    ///     "pass".to_string(),
    ///     "realm".to_string(),
    /// );
    /// assert_eq!(credentials.username(), "user");
    /// assert_eq!(credentials.password(), "pass");
    /// assert_eq!(credentials.realm(), "realm");
    /// ```
    pub fn new(username: String, password: String, realm: String) -> Self {
        Self {
            username,
            password,
            realm,
        }
    }

    /// The configured username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The configured password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The configured realm
    pub fn realm(&self) -> &str {
        &self.realm
    }
}

/// Structure for holding the required credentials for handling short-term STUN credentials
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ShortTermCredentials {
    username: Option<String>,
    password: String,
}

impl ShortTermCredentials {
    /// Create a new set of [`ShortTermCredentials`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::ShortTermCredentials;
    /// let credentials = ShortTermCredentials::new("password".to_string());
    /// assert_eq!(credentials.password(), "password");
    /// assert_eq!(credentials.username(), None);
    /// ```
    pub fn new(password: String) -> Self {
        Self {
            username: None,
            password,
        }
    }

    /// Set the USERNAME that is written alongside the integrity
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::ShortTermCredentials;
    /// let credentials = ShortTermCredentials::new("password".to_string())
    ///     .with_username("user".to_string());
    /// assert_eq!(credentials.username(), Some("user"));
    /// ```
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// The configured username
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The configured password
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Enum for holding the credentials used to sign a message
///
/// This can either be a set of [`ShortTermCredentials`] or [`LongTermCredentials`]`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum MessageIntegrityCredentials {
    /// Short term integrity credentials.
    ShortTerm(ShortTermCredentials),
    /// Long term integrity credentials.
    LongTerm(LongTermCredentials),
}

impl From<LongTermCredentials> for MessageIntegrityCredentials {
    fn from(value: LongTermCredentials) -> Self {
        MessageIntegrityCredentials::LongTerm(value)
    }
}

impl From<ShortTermCredentials> for MessageIntegrityCredentials {
    fn from(value: ShortTermCredentials) -> Self {
        MessageIntegrityCredentials::ShortTerm(value)
    }
}

impl MessageIntegrityCredentials {
    pub(crate) fn make_hmac_key(&self) -> Vec<u8> {
        match self {
            MessageIntegrityCredentials::ShortTerm(short) => short.password.clone().into(),
            MessageIntegrityCredentials::LongTerm(long) => long.make_hmac_key(),
        }
    }
}

impl LongTermCredentials {
    /// MD5(username ":" realm ":" password)
    pub(crate) fn make_hmac_key(&self) -> Vec<u8> {
        use md5::{Digest, Md5};
        let mut digest = Md5::new();
        digest.update(self.username.as_bytes());
        digest.update(b":");
        digest.update(self.realm.as_bytes());
        digest.update(b":");
        digest.update(self.password.as_bytes());
        digest.finalize().to_vec()
    }
}

/// The class of a STUN message.
///
/// There are four classes of messages within the STUN protocol:
///
///  - [Request][`MessageClass::Request`] indicates that a request is being made and a
///    response is expected.
///  - An [Indication][`MessageClass::Indication`] is a fire and forget message where
///    no response is required or expected.
///  - [Success][`MessageClass::Success`] indicates that a [Request][`MessageClass::Request`]
///    was successfully handled.
///  - [Error][`MessageClass::Error`] class indicates that an error was produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageClass {
    /// A request that is expecting a response of either Success, or Error.
    Request,
    /// A request that does not expect a response.
    Indication,
    /// A success response to a previous Request.
    Success,
    /// An error response to a previous Request.
    Error,
}

impl MessageClass {
    /// Returns whether this [`MessageClass`] is of a response type.  i.e. is either
    /// [`MessageClass::Success`] or [`MessageClass::Error`].
    pub fn is_response(self) -> bool {
        matches!(self, MessageClass::Success | MessageClass::Error)
    }

    fn to_bits(self) -> u8 {
        match self {
            MessageClass::Request => 0x0,
            MessageClass::Indication => 0x1,
            MessageClass::Success => 0x2,
            MessageClass::Error => 0x3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0x0 => MessageClass::Request,
            0x1 => MessageClass::Indication,
            0x2 => MessageClass::Success,
            _ => MessageClass::Error,
        }
    }
}

/// The type of a STUN message.  A combination of a [`MessageClass`] and a STUN [`Method`].
///
/// The two class bits are interleaved with the twelve method bits so that the two most
/// significant bits of the 16-bit field are always zero:
///
/// ```text
///  0                 1
///  2  3  4 5 6 7 8 9 0 1 2 3 4 5
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// |M |M |M|M|M|C|M|M|M|C|M|M|M|M|
/// |11|10|9|8|7|1|6|5|4|0|3|2|1|0|
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MessageType([u8; 2]);

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MessageType(class: {:?}, method: {})",
            self.class(),
            self.method(),
        )
    }
}

impl MessageType {
    /// Create a new [`MessageType`] from the provided [`MessageClass`] and method
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::{MessageType, MessageClass, BINDING};
    /// let mtype = MessageType::from_class_method(MessageClass::Indication, BINDING);
    /// assert_eq!(mtype.has_class(MessageClass::Indication), true);
    /// assert_eq!(mtype.has_method(BINDING), true);
    /// assert_eq!(mtype.to_bytes(), [0x00, 0x11]);
    /// ```
    pub fn from_class_method(class: MessageClass, method: Method) -> Self {
        let c = class.to_bits() as u16;
        let m = method.value();
        let b0 = (c >> 1) | ((m >> 6) & 0x3e);
        let b1 = ((c << 4) & 0x10) | ((m << 1) & 0xe0) | (m & 0x0f);
        let ret = Self([b0 as u8, b1 as u8]);
        debug_assert_eq!(ret.class(), class);
        debug_assert_eq!(ret.method(), method);
        ret
    }

    /// Retrieves the class of a [`MessageType`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::{MessageType, MessageClass, BINDING};
    /// let mtype = MessageType::from_class_method(MessageClass::Error, BINDING);
    /// assert_eq!(mtype.class(), MessageClass::Error);
    /// ```
    pub fn class(self) -> MessageClass {
        let [b0, b1] = self.0;
        MessageClass::from_bits(((b0 & 0x01) << 1) | ((b1 & 0x10) >> 4))
    }

    /// Returns whether class of a [`MessageType`] is equal to the provided [`MessageClass`]
    pub fn has_class(self, cls: MessageClass) -> bool {
        self.class() == cls
    }

    /// Returns whether the class of a [`MessageType`] indicates a response message
    pub fn is_response(self) -> bool {
        self.class().is_response()
    }

    /// Returns the method of a [`MessageType`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::{MessageType, MessageClass, BINDING};
    /// let mtype = MessageType::from_class_method(MessageClass::Indication, BINDING);
    /// assert_eq!(mtype.method(), BINDING);
    /// ```
    pub fn method(self) -> Method {
        let [b0, b1] = self.0;
        let (b0, b1) = (b0 as u16, b1 as u16);
        Method::new(((b0 & 0x3e) << 6) | ((b1 & 0xe0) >> 1) | (b1 & 0x0f))
    }

    /// Returns whether the method of a [`MessageType`] is equal to the provided value
    pub fn has_method(self, method: Method) -> bool {
        self.method() == method
    }

    /// Convert a [`MessageType`] to network bytes
    pub fn write_into(&self, dest: &mut [u8]) {
        dest[..2].copy_from_slice(&self.0);
    }

    pub(crate) fn from_raw(bytes: [u8; 2]) -> Self {
        debug_assert_eq!(bytes[0] & 0xc0, 0);
        Self(bytes)
    }

    /// Convert a [`MessageType`] to network bytes
    pub fn to_bytes(self) -> [u8; 2] {
        self.0
    }

    /// Convert a set of network bytes into a [`MessageType`] or return an error
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::{MessageType, StunParseError};
    /// assert!(matches!(MessageType::from_bytes(&[0xc0, 0x01]), Err(StunParseError::NotStun)));
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self, StunParseError> {
        if data.len() < 2 {
            return Err(StunParseError::Truncated {
                expected: 2,
                actual: data.len(),
            });
        }
        if data[0] & 0xc0 != 0x0 {
            /* not a stun packet */
            return Err(StunParseError::NotStun);
        }
        Ok(Self([data[0], data[1]]))
    }
}

impl TryFrom<&[u8]> for MessageType {
    type Error = StunParseError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        MessageType::from_bytes(value)
    }
}

/// A unique transaction identifier for each message and it's (possible) response.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct TransactionId {
    id: u128,
}

impl TransactionId {
    /// The number of bytes a [`TransactionId`] occupies in a message header.
    pub const LENGTH: usize = 12;

    /// Generate a new STUN transaction identifier from the process wide
    /// [`TransactionIdGenerator`].
    pub fn generate() -> TransactionId {
        TransactionIdGenerator::global().generate()
    }

    /// The network bytes of this [`TransactionId`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::TransactionId;
    /// let id = TransactionId::from(0x0102);
    /// assert_eq!(id.to_bytes(), [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2]);
    /// ```
    pub fn to_bytes(self) -> [u8; 12] {
        let mut ret = [0; 12];
        let bytes = self.id.to_be_bytes();
        ret.copy_from_slice(&bytes[4..]);
        ret
    }

    /// Read a [`TransactionId`] from the first 12 bytes of `data`
    pub fn from_bytes(data: &[u8]) -> Result<Self, StunParseError> {
        if data.len() < Self::LENGTH {
            return Err(StunParseError::Truncated {
                expected: Self::LENGTH,
                actual: data.len(),
            });
        }
        let mut bytes = [0; 16];
        bytes[4..].copy_from_slice(&data[..Self::LENGTH]);
        Ok(u128::from_be_bytes(bytes).into())
    }
}

impl From<u128> for TransactionId {
    fn from(id: u128) -> Self {
        Self {
            id: id & 0xffff_ffff_ffff_ffff_ffff_ffff,
        }
    }
}
impl From<TransactionId> for u128 {
    fn from(id: TransactionId) -> Self {
        id.id
    }
}
impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.id)
    }
}

/// Produces unique [`TransactionId`]s.
///
/// The first 4 bytes of each identifier are a fixed prefix and the remaining 8 bytes are taken
/// from a strictly increasing counter shared by every generator in the process.  Identifiers
/// are unique for the lifetime of the process, across generators and threads.
///
/// # Examples
///
/// ```
/// # use stun_msg::message::TransactionIdGenerator;
/// let generator = TransactionIdGenerator::new();
/// let first = generator.generate();
/// let second = generator.generate();
/// assert_ne!(first, second);
/// assert_eq!(first.to_bytes()[..4], [0; 4]);
/// assert_ne!(TransactionIdGenerator::new().generate(), first);
/// ```
#[derive(Debug, Default)]
pub struct TransactionIdGenerator {
    prefix: u32,
}

static GLOBAL_GENERATOR: TransactionIdGenerator = TransactionIdGenerator::new();
static COUNTER: AtomicU64 = AtomicU64::new(0);

impl TransactionIdGenerator {
    /// Construct a new [`TransactionIdGenerator`] with an all zero prefix.
    pub const fn new() -> Self {
        Self { prefix: 0 }
    }

    /// Construct a new [`TransactionIdGenerator`] with a randomly chosen prefix.
    ///
    /// Identifiers from different generators are then unlikely to collide.
    pub fn with_random_prefix() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        Self {
            prefix: rng.random::<u32>(),
        }
    }

    /// The process wide [`TransactionIdGenerator`].
    pub fn global() -> &'static TransactionIdGenerator {
        &GLOBAL_GENERATOR
    }

    /// The prefix used for the first 4 bytes of every generated [`TransactionId`].
    pub fn prefix(&self) -> u32 {
        self.prefix
    }

    /// Generate the next [`TransactionId`].
    pub fn generate(&self) -> TransactionId {
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        let id = TransactionId::from(((self.prefix as u128) << 64) | counter as u128);
        trace!("generated transaction id {id}");
        id
    }
}

/// The fixed length header of a STUN message.  Allows reading the message header for a quick
/// check if this message is a valid STUN message.  Can also be used to expose the length of the
/// complete message without needing to receive the entire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    mtype: MessageType,
    transaction_id: TransactionId,
    length: u16,
}

impl MessageHeader {
    /// The length of the STUN message header.
    pub const LENGTH: usize = 20;

    /// Deserialize a `MessageHeader`
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::message::{MessageHeader, MessageType, MessageClass, BINDING};
    /// let msg_data = [0, 1, 0, 8, 33, 18, 164, 66, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 232];
    /// let message = MessageHeader::from_bytes(&msg_data).unwrap();
    /// assert_eq!(message.get_type(), MessageType::from_class_method(MessageClass::Request, BINDING));
    /// assert_eq!(message.transaction_id(), 1000.into());
    /// assert_eq!(message.data_length(), 8);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self, StunParseError> {
        if data.len() < Self::LENGTH {
            return Err(StunParseError::Truncated {
                expected: Self::LENGTH,
                actual: data.len(),
            });
        }
        let mtype = MessageType::from_bytes(data)?;
        let mlength = BigEndian::read_u16(&data[2..]);
        let cookie = BigEndian::read_u32(&data[4..]);
        if cookie != MAGIC_COOKIE {
            warn!(
                "malformed cookie constant {:?} != stored data {:?}",
                MAGIC_COOKIE, cookie
            );
            return Err(StunParseError::NotStun);
        }
        let transaction_id = TransactionId::from_bytes(&data[8..])?;

        Ok(Self {
            mtype,
            transaction_id,
            length: mlength,
        })
    }

    /// The number of bytes of content in this [`MessageHeader`]. Adding both `data_length()`
    /// and [`MessageHeader::LENGTH`] will result in the size of the complete STUN message.
    pub fn data_length(&self) -> u16 {
        self.length
    }

    /// The [`TransactionId`] of this [`MessageHeader`]
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// The [`MessageType`] of this [`MessageHeader`]
    pub fn get_type(&self) -> MessageType {
        self.mtype
    }

    pub(crate) fn new(mtype: MessageType, transaction_id: TransactionId, length: u16) -> Self {
        Self {
            mtype,
            transaction_id,
            length,
        }
    }

    pub(crate) fn write_into(&self, dest: &mut [u8]) {
        self.mtype.write_into(&mut dest[..2]);
        BigEndian::write_u16(&mut dest[2..4], self.length);
        BigEndian::write_u32(&mut dest[4..8], MAGIC_COOKIE);
        dest[8..20].copy_from_slice(&self.transaction_id.to_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn msg_type_roundtrip() {
        let _log = crate::tests::test_init_log();
        /* validate that all methods/classes survive a roundtrip */
        for m in 0..0x1000 {
            let m = Method::new(m);
            let classes = [
                MessageClass::Request,
                MessageClass::Indication,
                MessageClass::Success,
                MessageClass::Error,
            ];
            for c in classes {
                let mtype = MessageType::from_class_method(c, m);
                assert_eq!(mtype.class(), c);
                assert_eq!(mtype.method(), m);
                let bytes = mtype.to_bytes();
                // the two most significant bits are always clear
                assert_eq!(bytes[0] & 0xc0, 0);
                let ptype = MessageType::from_bytes(&bytes).unwrap();
                assert_eq!(mtype, ptype);
            }
        }
    }

    #[test]
    fn msg_type_known_values() {
        let _log = crate::tests::test_init_log();
        let binding = |c| MessageType::from_class_method(c, BINDING).to_bytes();
        assert_eq!(binding(MessageClass::Request), [0x00, 0x01]);
        assert_eq!(binding(MessageClass::Indication), [0x00, 0x11]);
        assert_eq!(binding(MessageClass::Success), [0x01, 0x01]);
        assert_eq!(binding(MessageClass::Error), [0x01, 0x11]);
        let all = MessageType::from_class_method(MessageClass::Error, Method::new(0xfff));
        assert_eq!(all.to_bytes(), [0x3f, 0xff]);
    }

    #[test]
    fn msg_type_not_stun() {
        let _log = crate::tests::test_init_log();
        assert!(matches!(
            MessageType::from_bytes(&[0xc0, 0x00]),
            Err(StunParseError::NotStun)
        ));
        assert!(matches!(
            MessageType::from_bytes(&[0x00]),
            Err(StunParseError::Truncated {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn method_out_of_range() {
        let _log = crate::tests::test_init_log();
        let _ = Method::new(0x1000);
    }

    #[test]
    fn header_roundtrip() {
        let _log = crate::tests::test_init_log();
        let mtype = MessageType::from_class_method(MessageClass::Success, BINDING);
        let tid = TransactionId::from(0x0102_0304_0506_0708_090a_0b0c);
        let mut data = [0; 20];
        MessageHeader::new(mtype, tid, 44).write_into(&mut data);
        assert_eq!(&data[4..8], &[0x21, 0x12, 0xA4, 0x42]);
        assert_eq!(&data[8..], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let header = MessageHeader::from_bytes(&data).unwrap();
        assert_eq!(header.get_type(), mtype);
        assert_eq!(header.transaction_id(), tid);
        assert_eq!(header.data_length(), 44);
    }

    #[test]
    fn header_wrong_magic() {
        let _log = crate::tests::test_init_log();
        let mut data = [0; 20];
        MessageHeader::new(
            MessageType::from_class_method(MessageClass::Request, BINDING),
            0.into(),
            0,
        )
        .write_into(&mut data);
        data[5] = 0;
        assert!(matches!(
            MessageHeader::from_bytes(&data),
            Err(StunParseError::NotStun)
        ));
    }

    #[test]
    fn header_truncated() {
        let _log = crate::tests::test_init_log();
        assert!(matches!(
            MessageHeader::from_bytes(&[0; 19]),
            Err(StunParseError::Truncated {
                expected: 20,
                actual: 19
            })
        ));
    }

    #[test]
    fn transaction_id_layout() {
        let _log = crate::tests::test_init_log();
        let generator = TransactionIdGenerator::new();
        let first = generator.generate().to_bytes();
        let second = generator.generate().to_bytes();
        assert_eq!(first[..4], [0; 4]);
        assert_eq!(second[..4], [0; 4]);
        let first = BigEndian::read_u64(&first[4..]);
        let second = BigEndian::read_u64(&second[4..]);
        assert!(second > first);
    }

    #[test]
    fn transaction_id_random_prefix() {
        let _log = crate::tests::test_init_log();
        let generator = TransactionIdGenerator::with_random_prefix();
        let prefix = generator.prefix().to_be_bytes();
        for _ in 0..16 {
            assert_eq!(generator.generate().to_bytes()[..4], prefix);
        }
    }

    #[test]
    fn transaction_id_unique() {
        let _log = crate::tests::test_init_log();
        let generator = TransactionIdGenerator::new();
        let ids: HashSet<_> = (0..10_000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn transaction_id_unique_across_generators() {
        let _log = crate::tests::test_init_log();
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let generator = TransactionIdGenerator::new();
            assert!(ids.insert(generator.generate()));
            assert!(ids.insert(generator.generate()));
        }
        assert!(ids.insert(TransactionIdGenerator::global().generate()));
        assert!(ids.insert(TransactionId::generate()));
    }

    #[test]
    fn transaction_id_unique_threaded() {
        let _log = crate::tests::test_init_log();
        let generator = Arc::new(TransactionIdGenerator::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..2_000)
                        .map(|_| generator.generate())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut ids = HashSet::new();
        for thread in threads {
            for id in thread.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 16_000);
    }

    #[test]
    fn transaction_id_bytes_roundtrip() {
        let _log = crate::tests::test_init_log();
        let id = TransactionId::generate();
        assert_eq!(TransactionId::from_bytes(&id.to_bytes()).unwrap(), id);
        assert!(matches!(
            TransactionId::from_bytes(&[0; 11]),
            Err(StunParseError::Truncated {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn long_term_key() {
        let _log = crate::tests::test_init_log();
        // RFC 5769 2.4
        let credentials = MessageIntegrityCredentials::from(LongTermCredentials::new(
            "\u{30DE}\u{30C8}\u{30EA}\u{30C3}\u{30AF}\u{30B9}".to_owned(),
            "TheMatrIX".to_owned(),
            "example.org".to_owned(),
        ));
        let key = credentials.make_hmac_key();
        assert_eq!(key.len(), 16);
        let short = MessageIntegrityCredentials::from(ShortTermCredentials::new("pass".to_owned()));
        assert_eq!(short.make_hmac_key(), b"pass");
    }
}
