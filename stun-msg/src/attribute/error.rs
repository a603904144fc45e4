// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::message::StunParseError;

use super::{RawAttribute, ERROR_CODE};

/// The ERROR-CODE attribute as found in an error response.
///
/// The value consists of two zero bytes, the error class (hundreds digit), the error number
/// (the last two digits) and a UTF-8 reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    code: u16,
    reason: String,
}

impl ErrorCode {
    /// Try alternate server
    pub const TRY_ALTERNATE: u16 = 300;
    /// Bad request
    pub const BAD_REQUEST: u16 = 400;
    /// Authorization required
    pub const UNAUTHORIZED: u16 = 401;
    /// Unknown attribute
    pub const UNKNOWN_ATTRIBUTE: u16 = 420;
    /// Authentication expired
    pub const STALE_CREDENTIALS: u16 = 430;
    /// Incorrect username/password
    pub const INTEGRITY_CHECK_FAILURE: u16 = 431;
    /// Username required
    pub const MISSING_USERNAME: u16 = 432;
    /// Secure connection required
    pub const USE_TLS: u16 = 433;
    /// Authentication domain required
    pub const MISSING_REALM: u16 = 434;
    /// Authentication token missing
    pub const MISSING_NONCE: u16 = 435;
    /// Unknown user name
    pub const UNKNOWN_USERNAME: u16 = 436;
    /// Authentication token expired
    pub const STALE_NONCE: u16 = 438;
    /// Role conflict
    pub const ROLE_CONFLICT: u16 = 487;
    /// Temporary server error
    pub const SERVER_ERROR: u16 = 500;
    /// Unrecoverable failure
    pub const GLOBAL_FAILURE: u16 = 600;

    /// The error code value
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The error code reason string
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the reason phrase written for an error code value.
    ///
    /// Codes without a known phrase use "Unknown error".
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::ErrorCode;
    /// assert_eq!(ErrorCode::default_reason_for_code(ErrorCode::BAD_REQUEST), "Bad request");
    /// assert_eq!(ErrorCode::default_reason_for_code(599), "Unknown error");
    /// ```
    pub fn default_reason_for_code(code: u16) -> &'static str {
        match code {
            Self::TRY_ALTERNATE => "Try alternate server",
            Self::BAD_REQUEST => "Bad request",
            Self::UNAUTHORIZED => "Authorization required",
            Self::UNKNOWN_ATTRIBUTE => "Unknown attribute",
            Self::STALE_CREDENTIALS => "Authentication expired",
            Self::INTEGRITY_CHECK_FAILURE => "Incorrect username/password",
            Self::MISSING_USERNAME => "Username required",
            Self::USE_TLS => "Secure connection required",
            Self::MISSING_REALM => "Authentication domain required",
            Self::MISSING_NONCE => "Authentication token missing",
            Self::UNKNOWN_USERNAME => "Unknown user name",
            Self::STALE_NONCE => "Authentication token expired",
            Self::ROLE_CONFLICT => "Role conflict",
            Self::SERVER_ERROR => "Temporary server error",
            Self::GLOBAL_FAILURE => "Unrecoverable failure",
            _ => "Unknown error",
        }
    }

    /// The number of value bytes the ERROR-CODE attribute for `code` occupies (unpadded).
    pub(crate) fn value_len(code: u16) -> usize {
        4 + Self::default_reason_for_code(code).len()
    }

    /// Write the value of an ERROR-CODE attribute for `code` into `dest`.
    ///
    /// Panics if the error class (`code / 100`) does not fit in 3 bits.
    pub(crate) fn write_value(code: u16, dest: &mut [u8]) {
        let class = code / 100;
        assert!(class <= 7, "Error code {code} has an out of range class {class}");
        let reason = Self::default_reason_for_code(code);
        dest[0] = 0;
        dest[1] = 0;
        dest[2] = class as u8;
        dest[3] = (code % 100) as u8;
        dest[4..4 + reason.len()].copy_from_slice(reason.as_bytes());
    }
}

impl TryFrom<&RawAttribute<'_>> for ErrorCode {
    type Error = StunParseError;

    fn try_from(raw: &RawAttribute) -> Result<Self, Self::Error> {
        if raw.get_type() != ERROR_CODE {
            return Err(StunParseError::WrongAttributeType {
                expected: ERROR_CODE,
                actual: raw.get_type(),
            });
        }
        if raw.value.len() < 4 {
            return Err(StunParseError::Truncated {
                expected: 4,
                actual: raw.value.len(),
            });
        }
        let code = (raw.value[2] & 0x7) as u16 * 100 + raw.value[3] as u16;
        Ok(Self {
            code,
            reason: String::from_utf8_lossy(&raw.value[4..]).into_owned(),
        })
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} '{}'", ERROR_CODE, self.code, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_value() {
        let _log = crate::tests::test_init_log();
        let mut data = [0xff; 32];
        let len = ErrorCode::value_len(ErrorCode::ROLE_CONFLICT);
        assert_eq!(len, 4 + "Role conflict".len());
        ErrorCode::write_value(ErrorCode::ROLE_CONFLICT, &mut data);
        assert_eq!(&data[..4], &[0, 0, 4, 87]);
        assert_eq!(&data[4..len], b"Role conflict");

        let raw = RawAttribute {
            header: super::super::AttributeHeader::new(ERROR_CODE, len as u16),
            value: &data[..len],
        };
        let err = ErrorCode::try_from(&raw).unwrap();
        assert_eq!(err.code(), 487);
        assert_eq!(err.reason(), "Role conflict");

        let raw = RawAttribute {
            header: super::super::AttributeHeader::new(super::super::SOFTWARE, len as u16),
            value: &data[..len],
        };
        assert!(matches!(
            ErrorCode::try_from(&raw),
            Err(StunParseError::WrongAttributeType {
                expected: ERROR_CODE,
                actual: super::super::SOFTWARE,
            })
        ));
    }

    #[test]
    fn error_code_reasons() {
        let _log = crate::tests::test_init_log();
        let table = [
            (300, "Try alternate server"),
            (400, "Bad request"),
            (401, "Authorization required"),
            (420, "Unknown attribute"),
            (430, "Authentication expired"),
            (431, "Incorrect username/password"),
            (432, "Username required"),
            (433, "Secure connection required"),
            (434, "Authentication domain required"),
            (435, "Authentication token missing"),
            (436, "Unknown user name"),
            (438, "Authentication token expired"),
            (487, "Role conflict"),
            (500, "Temporary server error"),
            (600, "Unrecoverable failure"),
            (437, "Unknown error"),
        ];
        for (code, reason) in table {
            assert_eq!(ErrorCode::default_reason_for_code(code), reason);
        }
    }

    #[test]
    #[should_panic(expected = "out of range class")]
    fn error_code_class_too_large() {
        let _log = crate::tests::test_init_log();
        let mut data = [0; 32];
        ErrorCode::write_value(800, &mut data);
    }
}
