// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::message::StunWriteError;

/// The MESSAGE-INTEGRITY attribute: an HMAC-SHA1 over the preceding message bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageIntegrity;

impl MessageIntegrity {
    /// The length of the MESSAGE-INTEGRITY value.
    pub const LENGTH: usize = 20;

    /// Compute the HMAC-SHA1 of `data` using `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::MessageIntegrity;
    /// let hmac = MessageIntegrity::compute(b"data", b"key").unwrap();
    /// assert_eq!(hmac.len(), MessageIntegrity::LENGTH);
    /// ```
    #[tracing::instrument(
        name = "MessageIntegrity::compute",
        level = "trace",
        err,
        skip(data, key)
    )]
    pub fn compute(data: &[u8], key: &[u8]) -> Result<[u8; 20], StunWriteError> {
        use hmac::{Hmac, Mac};
        let mut hmac =
            Hmac::<sha1::Sha1>::new_from_slice(key).map_err(|_| StunWriteError::IntegrityFailed)?;
        hmac.update(data);
        Ok(hmac.finalize().into_bytes().into())
    }

    /// Check `expected` against the HMAC-SHA1 of `data` using `key`.
    pub fn verify(data: &[u8], key: &[u8], expected: &[u8]) -> bool {
        use hmac::{Hmac, Mac};
        let Ok(mut hmac) = Hmac::<sha1::Sha1>::new_from_slice(key) else {
            return false;
        };
        hmac.update(data);
        hmac.verify_slice(expected).is_ok()
    }
}

/// The FINGERPRINT attribute: a CRC-32 of the preceding message bytes XOR-ed with a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint;

impl Fingerprint {
    /// The length of the FINGERPRINT value.
    pub const LENGTH: usize = 4;

    /// The value the CRC-32 is XOR-ed with.
    pub const XOR_CONSTANT: u32 = 0x5354554e;

    /// Compute the FINGERPRINT value for `data` as written into a message.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stun_msg::attribute::Fingerprint;
    /// // CRC-32 of an empty slice is 0
    /// assert_eq!(Fingerprint::compute(&[]), [0x53, 0x54, 0x55, 0x4e]);
    /// ```
    pub fn compute(data: &[u8]) -> [u8; 4] {
        use crc::{Crc, CRC_32_ISO_HDLC};
        const CRC_ALGO: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);
        (CRC_ALGO.checksum(data) ^ Self::XOR_CONSTANT).to_be_bytes()
    }

    /// Check whether `fingerprint` matches the FINGERPRINT value of `data`.
    pub fn verify(data: &[u8], fingerprint: &[u8]) -> bool {
        Self::compute(data) == fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_known_value() {
        let _log = crate::tests::test_init_log();
        // RFC 2202 test case 2
        let hmac = MessageIntegrity::compute(b"what do ya want for nothing?", b"Jefe").unwrap();
        assert_eq!(
            hmac,
            [
                0xef, 0xfc, 0xdf, 0x6a, 0xe5, 0xeb, 0x2f, 0xa2, 0xd2, 0x74, 0x16, 0xd5, 0xf1,
                0x84, 0xdf, 0x9c, 0x25, 0x9a, 0x7c, 0x79
            ]
        );
        assert!(MessageIntegrity::verify(
            b"what do ya want for nothing?",
            b"Jefe",
            &hmac
        ));
        assert!(!MessageIntegrity::verify(b"what do ya want", b"Jefe", &hmac));
    }

    #[test]
    fn crc_known_value() {
        let _log = crate::tests::test_init_log();
        // CRC-32 of "123456789" is 0xcbf43926
        let expected = (0xcbf43926u32 ^ Fingerprint::XOR_CONSTANT).to_be_bytes();
        assert_eq!(Fingerprint::compute(b"123456789"), expected);
        assert!(Fingerprint::verify(b"123456789", &expected));
        assert!(!Fingerprint::verify(b"12345678", &expected));
    }
}
