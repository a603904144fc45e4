// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # stun-msg
//!
//! Writing STUN messages ([RFC5389]) into caller provided buffers.
//!
//! - [`message`]: the message header, transaction identifiers, errors and credentials
//! - [`attribute`]: attribute types, padding and reading attributes of existing messages
//! - [`builder`]: the [`MessageBuilder`](builder::MessageBuilder) writing requests,
//!   indications, responses and their MESSAGE-INTEGRITY and FINGERPRINT trailers
//! - [`address`]: socket addresses that can be written into address attributes
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389
//!
//! ## Examples
//!
//! ```
//! use stun_msg::attribute::XOR_MAPPED_ADDRESS;
//! use stun_msg::builder::MessageBuilder;
//! use stun_msg::message::{TransactionIdGenerator, BINDING};
//!
//! let generator = TransactionIdGenerator::with_random_prefix();
//! let mut request = [0; 548];
//! let len = MessageBuilder::request(&mut request, BINDING, &generator)
//!     .unwrap()
//!     .finish()
//!     .unwrap();
//!
//! // answer with a success response
//! let mut response = [0; 548];
//! let mut builder = MessageBuilder::success(&mut response, &request[..len]).unwrap();
//! let mapped: std::net::SocketAddr = "192.0.2.1:40000".parse().unwrap();
//! builder.append_xor_address(XOR_MAPPED_ADDRESS, &mapped).unwrap();
//! let response_len = builder.finish_short(None, Some("password"), None).unwrap();
//! assert_eq!(response_len, 20 + 12 + 24 + 8);
//! ```

pub mod address;
pub mod attribute;
pub mod builder;
pub mod message;

/// Traits commonly needed when writing addresses
pub mod prelude {
    pub use crate::address::SocketAddress;
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static TRACING: Once = Once::new();

    pub fn test_init_log() {
        TRACING.call_once(|| {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                tracing_subscriber::fmt().with_env_filter(filter).init();
            }
        });
    }
}
