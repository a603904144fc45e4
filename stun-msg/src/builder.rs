// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Writing STUN messages
//!
//! A [`MessageBuilder`] writes a STUN message directly into a caller provided buffer.  The
//! length of the buffer is the capacity of the message (never more than
//! [`STUN_MAXMSG`](crate::message::STUN_MAXMSG) bytes are used).
//!
//! Building a message happens in three steps:
//!
//! 1. Initialize the header with one of the constructors:
//!    [`request`](MessageBuilder::request), [`indication`](MessageBuilder::indication),
//!    [`success`](MessageBuilder::success), [`error`](MessageBuilder::error) or
//!    [`error_unknown_attributes`](MessageBuilder::error_unknown_attributes).
//! 2. Append any number of attributes.
//! 3. Finalize the message with one of the `finish*` functions which appends the
//!    MESSAGE-INTEGRITY (optional) and FINGERPRINT trailers and returns the length of the
//!    message.
//!
//! An attribute that does not fit in the buffer produces
//! [`StunWriteError::BufferTooSmall`] and leaves the message unchanged.
//!
//! ## Examples
//!
//! ```
//! use stun_msg::attribute::{PRIORITY, USE_CANDIDATE};
//! use stun_msg::builder::MessageBuilder;
//! use stun_msg::message::{MessageHeader, TransactionIdGenerator, BINDING};
//!
//! let generator = TransactionIdGenerator::new();
//! let mut buf = [0; 548];
//! let mut builder = MessageBuilder::request(&mut buf, BINDING, &generator).unwrap();
//! builder.append_u32(PRIORITY, 0x6e0001ff).unwrap();
//! builder.append_flag(USE_CANDIDATE).unwrap();
//! let len = builder.finish_short(Some("remote:local"), Some("password"), None).unwrap();
//!
//! let header = MessageHeader::from_bytes(&buf[..len]).unwrap();
//! assert_eq!(header.data_length() as usize + MessageHeader::LENGTH, len);
//! ```

use byteorder::{BigEndian, ByteOrder};
use smallvec::SmallVec;

use crate::address::SocketAddress;
use crate::attribute::{
    find_unknown, padded_attr_len, padding, AttributeHeader, AttributeType, ErrorCode,
    Fingerprint, MessageIntegrity, ERROR_CODE, FINGERPRINT, MESSAGE_INTEGRITY, NONCE, REALM,
    UNKNOWN_ATTRIBUTES, USERNAME,
};
use crate::message::{
    LongTermCredentials, MessageClass, MessageHeader, MessageIntegrityCredentials, MessageType,
    Method, StunWriteError, TransactionId, TransactionIdGenerator, MAGIC_COOKIE, STUN_MAXMSG,
};

use tracing::{debug, trace, warn};

/// The stage of a [`MessageBuilder`].
///
/// Attributes can only be appended while [`Stage::Building`].  The remaining stages are
/// entered while the trailers are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Attributes may be appended
    Building,
    /// The MESSAGE-INTEGRITY attribute has been reserved
    IntegrityPending,
    /// The FINGERPRINT attribute has been reserved
    FingerprintPending,
    /// The message is complete
    Finalized,
}

/// Writes a STUN message into a mutable slice.
#[derive(Debug)]
pub struct MessageBuilder<'a> {
    buf: &'a mut [u8],
    stage: Stage,
}

fn request_header(request: &[u8], response: &str) -> MessageHeader {
    let header = match MessageHeader::from_bytes(request) {
        Ok(header) => header,
        Err(e) => panic!("{response} message was attempted to be created from an invalid message: {e}"),
    };
    if !header.get_type().has_class(MessageClass::Request) {
        panic!("{response} message was attempted to be created from a non-request message");
    }
    header
}

fn unknown_attributes(
    request: &[u8],
    known: &[AttributeType],
) -> (MessageHeader, Vec<AttributeType>) {
    let header = request_header(request, "An error response");
    let unknown = match find_unknown(request, known) {
        Ok(unknown) => unknown,
        Err(e) => panic!("Failed to read the attributes of the request: {e}"),
    };
    assert!(
        !unknown.is_empty(),
        "An unknown attribute error response was attempted to be created for a request without unknown attributes"
    );
    (header, unknown)
}

fn check_header_fits(buf: &[u8]) -> Result<(), StunWriteError> {
    if buf.len() < MessageHeader::LENGTH {
        debug!(
            "buffer of {} bytes cannot hold a STUN message header",
            buf.len()
        );
        return Err(StunWriteError::BufferTooSmall {
            expected: MessageHeader::LENGTH,
            actual: buf.len(),
        });
    }
    Ok(())
}

impl<'a> MessageBuilder<'a> {
    fn init(
        buf: &'a mut [u8],
        mtype: MessageType,
        transaction_id: TransactionId,
    ) -> Result<Self, StunWriteError> {
        check_header_fits(buf)?;
        MessageHeader::new(mtype, transaction_id, 0).write_into(buf);
        trace!("initialized {mtype} with transaction {transaction_id}");
        Ok(Self {
            buf,
            stage: Stage::Building,
        })
    }

    /// Initialize a request with a new transaction ID taken from `generator`.
    ///
    /// # Errors
    ///
    /// - If `buf` is smaller than a message header
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::builder::MessageBuilder;
    /// # use stun_msg::message::{MessageHeader, MessageClass, TransactionIdGenerator, BINDING};
    /// let mut buf = [0; 20];
    /// let builder = MessageBuilder::request(&mut buf, BINDING, TransactionIdGenerator::global())
    ///     .unwrap();
    /// assert_eq!(builder.len(), 20);
    /// let header = MessageHeader::from_bytes(&buf).unwrap();
    /// assert!(header.get_type().has_class(MessageClass::Request));
    /// ```
    pub fn request(
        buf: &'a mut [u8],
        method: Method,
        generator: &TransactionIdGenerator,
    ) -> Result<Self, StunWriteError> {
        Self::init(
            buf,
            MessageType::from_class_method(MessageClass::Request, method),
            generator.generate(),
        )
    }

    /// Initialize an indication with a new transaction ID taken from `generator`.
    pub fn indication(
        buf: &'a mut [u8],
        method: Method,
        generator: &TransactionIdGenerator,
    ) -> Result<Self, StunWriteError> {
        Self::init(
            buf,
            MessageType::from_class_method(MessageClass::Indication, method),
            generator.generate(),
        )
    }

    /// Initialize a success response to `request`.  The method and transaction ID are copied
    /// from `request`.
    ///
    /// # Panics
    ///
    /// - If `request` is not a STUN request message
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::builder::MessageBuilder;
    /// # use stun_msg::message::{MessageHeader, MessageClass, TransactionIdGenerator, BINDING};
    /// let mut request = [0; 20];
    /// MessageBuilder::request(&mut request, BINDING, TransactionIdGenerator::global()).unwrap();
    /// let mut response = [0; 20];
    /// MessageBuilder::success(&mut response, &request).unwrap();
    /// let header = MessageHeader::from_bytes(&response).unwrap();
    /// assert!(header.get_type().has_class(MessageClass::Success));
    /// assert_eq!(header.transaction_id(), MessageHeader::from_bytes(&request).unwrap().transaction_id());
    /// ```
    pub fn success(buf: &'a mut [u8], request: &[u8]) -> Result<Self, StunWriteError> {
        let header = request_header(request, "A success response");
        Self::init(
            buf,
            MessageType::from_class_method(MessageClass::Success, header.get_type().method()),
            header.transaction_id(),
        )
    }

    /// Initialize a success response over the request currently stored in `buf`.
    ///
    /// # Panics
    ///
    /// - If `buf` does not contain a STUN request message
    pub fn success_in_place(buf: &'a mut [u8]) -> Result<Self, StunWriteError> {
        check_header_fits(buf)?;
        let header = request_header(buf, "A success response");
        Self::init(
            buf,
            MessageType::from_class_method(MessageClass::Success, header.get_type().method()),
            header.transaction_id(),
        )
    }

    /// Initialize an error response to `request` containing an ERROR-CODE attribute for `code`.
    ///
    /// # Panics
    ///
    /// - If `request` is not a STUN request message
    /// - If the class of `code` (`code / 100`) is larger than 7
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::ErrorCode;
    /// # use stun_msg::builder::MessageBuilder;
    /// # use stun_msg::message::{MessageHeader, MessageClass, TransactionIdGenerator, BINDING};
    /// let mut request = [0; 20];
    /// MessageBuilder::request(&mut request, BINDING, TransactionIdGenerator::global()).unwrap();
    /// let mut response = [0; 64];
    /// let builder = MessageBuilder::error(&mut response, &request, ErrorCode::BAD_REQUEST).unwrap();
    /// assert_eq!(builder.len(), 20 + 4 + 16);
    /// ```
    pub fn error(buf: &'a mut [u8], request: &[u8], code: u16) -> Result<Self, StunWriteError> {
        let header = request_header(request, "An error response");
        let mut builder = Self::init(
            buf,
            MessageType::from_class_method(MessageClass::Error, header.get_type().method()),
            header.transaction_id(),
        )?;
        builder.append_error(code)?;
        Ok(builder)
    }

    /// Initialize an error response over the request currently stored in `buf`.
    ///
    /// # Panics
    ///
    /// - If `buf` does not contain a STUN request message
    /// - If the class of `code` (`code / 100`) is larger than 7
    pub fn error_in_place(buf: &'a mut [u8], code: u16) -> Result<Self, StunWriteError> {
        check_header_fits(buf)?;
        let header = request_header(buf, "An error response");
        let mut builder = Self::init(
            buf,
            MessageType::from_class_method(MessageClass::Error, header.get_type().method()),
            header.transaction_id(),
        )?;
        builder.append_error(code)?;
        Ok(builder)
    }

    /// Initialize an error response to `request` with the error code 420 (Unknown attribute)
    /// and an UNKNOWN-ATTRIBUTES attribute listing each comprehension-required attribute of
    /// `request` that is not in `known`.
    ///
    /// # Panics
    ///
    /// - If `request` is not a STUN request message
    /// - If `request` does not contain any unknown comprehension-required attributes
    pub fn error_unknown_attributes(
        buf: &'a mut [u8],
        request: &[u8],
        known: &[AttributeType],
    ) -> Result<Self, StunWriteError> {
        let (header, unknown) = unknown_attributes(request, known);
        Self::init_unknown_attributes(buf, header, &unknown)
    }

    /// Initialize an unknown attribute error response over the request currently stored in
    /// `buf`.
    ///
    /// # Panics
    ///
    /// - If `buf` does not contain a STUN request message
    /// - If the request does not contain any unknown comprehension-required attributes
    pub fn error_unknown_attributes_in_place(
        buf: &'a mut [u8],
        known: &[AttributeType],
    ) -> Result<Self, StunWriteError> {
        check_header_fits(buf)?;
        let (header, unknown) = unknown_attributes(buf, known);
        Self::init_unknown_attributes(buf, header, &unknown)
    }

    fn init_unknown_attributes(
        buf: &'a mut [u8],
        request: MessageHeader,
        unknown: &[AttributeType],
    ) -> Result<Self, StunWriteError> {
        let mut builder = Self::init(
            buf,
            MessageType::from_class_method(MessageClass::Error, request.get_type().method()),
            request.transaction_id(),
        )?;
        builder.append_error(ErrorCode::UNKNOWN_ATTRIBUTE)?;
        builder.append_unknown_attributes(unknown)?;
        Ok(builder)
    }

    /// The current [`Stage`] of this builder
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The [`TransactionId`] of the message being written
    pub fn transaction_id(&self) -> TransactionId {
        let mut bytes = [0; 16];
        bytes[4..].copy_from_slice(&self.buf[8..MessageHeader::LENGTH]);
        u128::from_be_bytes(bytes).into()
    }

    /// The [`MessageType`] of the message being written
    pub fn message_type(&self) -> MessageType {
        MessageType::from_raw([self.buf[0], self.buf[1]])
    }

    fn data_length(&self) -> usize {
        BigEndian::read_u16(&self.buf[2..4]) as usize
    }

    fn set_data_length(&mut self, len: usize) {
        BigEndian::write_u16(&mut self.buf[2..4], len as u16);
    }

    /// The number of bytes of the message written so far.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        MessageHeader::LENGTH + self.data_length()
    }

    /// The number of bytes available for the message
    pub fn capacity(&self) -> usize {
        self.buf.len().min(STUN_MAXMSG)
    }

    /// The bytes of the message written so far.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    fn check_building(&self) -> Result<(), StunWriteError> {
        match self.stage {
            Stage::Building => Ok(()),
            Stage::IntegrityPending => Err(StunWriteError::MessageIntegrityExists),
            Stage::FingerprintPending | Stage::Finalized => Err(StunWriteError::FingerprintExists),
        }
    }

    fn reserve_unchecked_stage(
        &mut self,
        atype: AttributeType,
        len: usize,
    ) -> Result<&mut [u8], StunWriteError> {
        let offset = self.len();
        let actual = self.capacity();
        if len > u16::MAX as usize {
            let expected = offset
                .saturating_add(AttributeHeader::LENGTH)
                .saturating_add(len);
            debug!("attribute {atype} with a length of {len} exceeds the attribute length field");
            return Err(StunWriteError::BufferTooSmall { expected, actual });
        }
        let expected = offset + AttributeHeader::LENGTH + padded_attr_len(len);
        if expected > actual {
            debug!("attribute {atype} with a length of {len} does not fit, expected {expected}, actual {actual}");
            return Err(StunWriteError::BufferTooSmall { expected, actual });
        }
        AttributeHeader::new(atype, len as u16)
            .write_into(&mut self.buf[offset..offset + AttributeHeader::LENGTH]);
        let value_start = offset + AttributeHeader::LENGTH;
        self.buf[value_start + len..value_start + len + padding(len)].fill(0);
        self.set_data_length(expected - MessageHeader::LENGTH);
        trace!("appended attribute {atype} with a length of {len}");
        Ok(&mut self.buf[value_start..value_start + len])
    }

    /// Reserve space for an attribute with a value of `len` bytes.  The attribute header and
    /// padding are written and the header length is updated.  Returns the slice the value
    /// should be written into.
    ///
    /// # Errors
    ///
    /// - If the attribute does not fit into the buffer
    /// - If the message trailers have already been written
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::AttributeType;
    /// # use stun_msg::builder::MessageBuilder;
    /// # use stun_msg::message::{TransactionIdGenerator, BINDING};
    /// let mut buf = [0; 32];
    /// let mut builder = MessageBuilder::request(&mut buf, BINDING, TransactionIdGenerator::global())
    ///     .unwrap();
    /// let value = builder.reserve(AttributeType::new(0x8123), 3).unwrap();
    /// value.copy_from_slice(&[1, 2, 3]);
    /// assert_eq!(builder.len(), 28);
    /// assert_eq!(&buf[20..28], &[0x81, 0x23, 0x00, 0x03, 1, 2, 3, 0]);
    /// ```
    pub fn reserve(&mut self, atype: AttributeType, len: usize) -> Result<&mut [u8], StunWriteError> {
        self.check_building()?;
        self.reserve_unchecked_stage(atype, len)
    }

    /// Append an attribute without a value.
    pub fn append_flag(&mut self, atype: AttributeType) -> Result<(), StunWriteError> {
        self.reserve(atype, 0).map(|_| ())
    }

    /// Append an attribute containing a big endian 32-bit value.
    pub fn append_u32(&mut self, atype: AttributeType, value: u32) -> Result<(), StunWriteError> {
        let dest = self.reserve(atype, 4)?;
        BigEndian::write_u32(dest, value);
        Ok(())
    }

    /// Append an attribute containing a big endian 64-bit value.
    pub fn append_u64(&mut self, atype: AttributeType, value: u64) -> Result<(), StunWriteError> {
        let dest = self.reserve(atype, 8)?;
        BigEndian::write_u64(dest, value);
        Ok(())
    }

    /// Append an attribute containing the UTF-8 bytes of `value`.
    pub fn append_string(&mut self, atype: AttributeType, value: &str) -> Result<(), StunWriteError> {
        self.append_bytes(atype, value.as_bytes())
    }

    /// Append an attribute containing `value`.
    pub fn append_bytes(&mut self, atype: AttributeType, value: &[u8]) -> Result<(), StunWriteError> {
        let dest = self.reserve(atype, value.len())?;
        dest.copy_from_slice(value);
        Ok(())
    }

    /// Append an address attribute (e.g. MAPPED-ADDRESS or ALTERNATE-SERVER).
    ///
    /// # Errors
    ///
    /// - If the address family is neither IPv4 nor IPv6
    /// - If the address bytes are shorter than the family requires
    /// - If the attribute does not fit into the buffer
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::net::SocketAddr;
    /// # use stun_msg::attribute::MAPPED_ADDRESS;
    /// # use stun_msg::builder::MessageBuilder;
    /// # use stun_msg::message::{TransactionIdGenerator, BINDING};
    /// let mut buf = [0; 32];
    /// let mut builder = MessageBuilder::request(&mut buf, BINDING, TransactionIdGenerator::global())
    ///     .unwrap();
    /// let addr: SocketAddr = "192.0.2.1:3478".parse().unwrap();
    /// builder.append_address(MAPPED_ADDRESS, &addr).unwrap();
    /// assert_eq!(&buf[24..32], &[0x00, 0x01, 0x0d, 0x96, 192, 0, 2, 1]);
    /// ```
    pub fn append_address(
        &mut self,
        atype: AttributeType,
        addr: &impl SocketAddress,
    ) -> Result<(), StunWriteError> {
        let (family, port, octets) = address_parts(addr)?;
        self.write_address(atype, family, port, &octets)
    }

    /// Append an XOR-ed address attribute (e.g. XOR-MAPPED-ADDRESS).
    ///
    /// The port is XOR-ed with the most significant 16 bits of the magic cookie.  An IPv4
    /// address is XOR-ed with the magic cookie and an IPv6 address is XOR-ed with the magic
    /// cookie followed by the transaction ID of this message.  `addr` is not modified.
    ///
    /// # Errors
    ///
    /// - If the address family is neither IPv4 nor IPv6
    /// - If the address bytes are shorter than the family requires
    /// - If the attribute does not fit into the buffer
    pub fn append_xor_address(
        &mut self,
        atype: AttributeType,
        addr: &impl SocketAddress,
    ) -> Result<(), StunWriteError> {
        let (family, port, mut octets) = address_parts(addr)?;
        let mut mask = [0; 16];
        mask[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        mask[4..].copy_from_slice(&self.buf[8..MessageHeader::LENGTH]);
        for (byte, mask) in octets.iter_mut().zip(mask.iter()) {
            *byte ^= mask;
        }
        let port = port ^ (MAGIC_COOKIE >> 16) as u16;
        self.write_address(atype, family, port, &octets)
    }

    fn write_address(
        &mut self,
        atype: AttributeType,
        family: u8,
        port: u16,
        octets: &[u8],
    ) -> Result<(), StunWriteError> {
        let dest = self.reserve(atype, 4 + octets.len())?;
        dest[0] = 0;
        dest[1] = family;
        BigEndian::write_u16(&mut dest[2..4], port);
        dest[4..].copy_from_slice(octets);
        Ok(())
    }

    /// Append an UNKNOWN-ATTRIBUTES attribute listing `attributes`.
    pub fn append_unknown_attributes(
        &mut self,
        attributes: &[AttributeType],
    ) -> Result<(), StunWriteError> {
        let dest = self.reserve(UNKNOWN_ATTRIBUTES, attributes.len() * 2)?;
        for (chunk, atype) in dest.chunks_exact_mut(2).zip(attributes) {
            BigEndian::write_u16(chunk, (*atype).into());
        }
        Ok(())
    }

    /// Append an ERROR-CODE attribute for `code` with the default reason phrase of
    /// [`ErrorCode::default_reason_for_code`].
    ///
    /// # Panics
    ///
    /// - If the class of `code` (`code / 100`) is larger than 7
    pub fn append_error(&mut self, code: u16) -> Result<(), StunWriteError> {
        assert!(code / 100 <= 7, "Error code {code} is out of range");
        let dest = self.reserve(ERROR_CODE, ErrorCode::value_len(code))?;
        ErrorCode::write_value(code, dest);
        Ok(())
    }

    /// Finalize the message.
    ///
    /// Appends the REALM, USERNAME and NONCE attributes when provided, a MESSAGE-INTEGRITY
    /// attribute when `key` is provided and always a FINGERPRINT attribute.  Returns the total
    /// length of the message.
    ///
    /// The HMAC-SHA1 of MESSAGE-INTEGRITY covers the message up to the MESSAGE-INTEGRITY
    /// attribute with the header length already covering both trailers.  The FINGERPRINT
    /// covers everything before the FINGERPRINT attribute.
    ///
    /// # Errors
    ///
    /// - If any of the attributes do not fit into the buffer.  The message is restored to its
    ///   length before this call.
    /// - If the message has already been finalized
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::builder::{MessageBuilder, Stage};
    /// # use stun_msg::message::{TransactionIdGenerator, BINDING};
    /// let mut buf = [0; 128];
    /// let mut builder = MessageBuilder::request(&mut buf, BINDING, TransactionIdGenerator::global())
    ///     .unwrap();
    /// let len = builder
    ///     .finish_long(Some("realm"), Some("user"), Some(b"key".as_slice()), Some(b"nonce".as_slice()))
    ///     .unwrap();
    /// // REALM(12) + USERNAME(8) + NONCE(12) + MESSAGE-INTEGRITY(24) + FINGERPRINT(8)
    /// assert_eq!(len, 20 + 12 + 8 + 12 + 24 + 8);
    /// assert_eq!(builder.stage(), Stage::Finalized);
    /// ```
    #[tracing::instrument(
        name = "message_finish",
        level = "trace",
        err(level = "debug"),
        skip(self, key, nonce),
        fields(
            msg.transaction = %self.transaction_id(),
        )
    )]
    pub fn finish_long(
        &mut self,
        realm: Option<&str>,
        username: Option<&str>,
        key: Option<&[u8]>,
        nonce: Option<&[u8]>,
    ) -> Result<usize, StunWriteError> {
        self.check_building()?;
        let entry_length = self.data_length();
        match self.write_trailers(realm, username, key, nonce) {
            Ok(len) => {
                debug!(
                    "finished {} message of {len} bytes, integrity: {}",
                    self.message_type(),
                    key.is_some()
                );
                Ok(len)
            }
            Err(e) => {
                self.set_data_length(entry_length);
                self.stage = Stage::Building;
                Err(e)
            }
        }
    }

    fn write_trailers(
        &mut self,
        realm: Option<&str>,
        username: Option<&str>,
        key: Option<&[u8]>,
        nonce: Option<&[u8]>,
    ) -> Result<usize, StunWriteError> {
        if let Some(realm) = realm {
            self.append_string(REALM, realm)?;
        }
        if let Some(username) = username {
            self.append_string(USERNAME, username)?;
        }
        if let Some(nonce) = nonce {
            self.append_bytes(NONCE, nonce)?;
        }
        if key.is_some() {
            self.reserve_unchecked_stage(MESSAGE_INTEGRITY, MessageIntegrity::LENGTH)?;
            self.stage = Stage::IntegrityPending;
        }
        self.reserve_unchecked_stage(FINGERPRINT, Fingerprint::LENGTH)?;
        self.stage = Stage::FingerprintPending;

        let len = self.len();
        let fingerprint_start = len - AttributeHeader::LENGTH - Fingerprint::LENGTH;
        if let Some(key) = key {
            let integrity_start =
                fingerprint_start - AttributeHeader::LENGTH - MessageIntegrity::LENGTH;
            let hmac = MessageIntegrity::compute(&self.buf[..integrity_start], key)?;
            self.buf[fingerprint_start - MessageIntegrity::LENGTH..fingerprint_start]
                .copy_from_slice(&hmac);
        }
        let fingerprint = Fingerprint::compute(&self.buf[..fingerprint_start]);
        self.buf[len - Fingerprint::LENGTH..len].copy_from_slice(&fingerprint);
        self.stage = Stage::Finalized;
        Ok(len)
    }

    /// Finalize the message using the short-term credential mechanism.  `password` is used as
    /// the MESSAGE-INTEGRITY key.  See [`finish_long`](Self::finish_long).
    pub fn finish_short(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
        nonce: Option<&[u8]>,
    ) -> Result<usize, StunWriteError> {
        self.finish_long(None, username, password.map(str::as_bytes), nonce)
    }

    /// Finalize the message with only a FINGERPRINT attribute.  See
    /// [`finish_long`](Self::finish_long).
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::Fingerprint;
    /// # use stun_msg::builder::MessageBuilder;
    /// # use stun_msg::message::{TransactionIdGenerator, BINDING};
    /// let mut buf = [0; 28];
    /// let mut builder = MessageBuilder::request(&mut buf, BINDING, TransactionIdGenerator::global())
    ///     .unwrap();
    /// assert_eq!(builder.finish().unwrap(), 28);
    /// assert!(Fingerprint::verify(&buf[..20], &buf[24..28]));
    /// ```
    pub fn finish(&mut self) -> Result<usize, StunWriteError> {
        self.finish_long(None, None, None, None)
    }

    /// Finalize the message using the long-term credential mechanism.  The REALM and USERNAME
    /// attributes are taken from `credentials` and the MESSAGE-INTEGRITY key is
    /// MD5(username ":" realm ":" password).
    pub fn finish_long_term(
        &mut self,
        credentials: &LongTermCredentials,
        nonce: Option<&[u8]>,
    ) -> Result<usize, StunWriteError> {
        let key = credentials.make_hmac_key();
        self.finish_long(
            Some(credentials.realm()),
            Some(credentials.username()),
            Some(key.as_slice()),
            nonce,
        )
    }

    /// Finalize the message using the provided [`MessageIntegrityCredentials`].
    pub fn finish_with(
        &mut self,
        credentials: &MessageIntegrityCredentials,
        nonce: Option<&[u8]>,
    ) -> Result<usize, StunWriteError> {
        match credentials {
            MessageIntegrityCredentials::ShortTerm(short) => {
                self.finish_short(short.username(), Some(short.password()), nonce)
            }
            MessageIntegrityCredentials::LongTerm(long) => self.finish_long_term(long, nonce),
        }
    }
}

fn address_parts(addr: &impl SocketAddress) -> Result<(u8, u16, SmallVec<[u8; 16]>), StunWriteError> {
    let family = addr.family();
    let (Some(byte), Some(expected)) = (family.to_byte(), family.address_len()) else {
        warn!("cannot write an address with family {family}");
        return Err(StunWriteError::InvalidAddressFamily(family));
    };
    let mut octets = addr.octets();
    if octets.len() < expected {
        return Err(StunWriteError::InvalidAddressLength {
            expected,
            actual: octets.len(),
        });
    }
    octets.truncate(expected);
    Ok((byte, addr.port(), octets))
}
