// Copyright (C) 2024 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::net::SocketAddr;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stun_msg::attribute::*;
use stun_msg::builder::MessageBuilder;
use stun_msg::message::{
    LongTermCredentials, MessageIntegrityCredentials, ShortTermCredentials,
    TransactionIdGenerator, BINDING,
};

fn request_with_address<'a>(
    buf: &'a mut [u8],
    generator: &TransactionIdGenerator,
    addr: &SocketAddr,
) -> MessageBuilder<'a> {
    let mut builder = MessageBuilder::request(buf, BINDING, generator).unwrap();
    builder.append_xor_address(XOR_MAPPED_ADDRESS, addr).unwrap();
    builder
}

fn bench_message_write(c: &mut Criterion) {
    let generator = TransactionIdGenerator::new();
    let addr: SocketAddr = "192.168.10.200:9876".parse().unwrap();
    let short_term_integrity =
        MessageIntegrityCredentials::ShortTerm(ShortTermCredentials::new("password".to_owned()));
    let long_term_integrity = MessageIntegrityCredentials::LongTerm(LongTermCredentials::new(
        "user".to_owned(),
        "password".to_owned(),
        "example.org".to_owned(),
    ));

    let mut group = c.benchmark_group("Message/Build");

    let mut buf = [0; 548];
    group.throughput(criterion::Throughput::Bytes(
        request_with_address(&mut buf, &generator, &addr).len() as u64,
    ));
    group.bench_with_input(
        BenchmarkId::from_parameter("XorMappedAddress"),
        &addr,
        |b, addr| {
            b.iter(|| {
                request_with_address(&mut buf, &generator, addr);
            })
        },
    );
    group.bench_with_input(
        BenchmarkId::from_parameter("Attributes/8"),
        &addr,
        |b, addr| {
            b.iter(|| {
                let mut builder = request_with_address(&mut buf, &generator, addr);
                builder.append_string(SOFTWARE, "stun-msg").unwrap();
                builder.append_bytes(NONCE, b"nonce").unwrap();
                builder.append_address(ALTERNATE_SERVER, addr).unwrap();
                builder.append_u32(PRIORITY, 100).unwrap();
                builder.append_u64(ICE_CONTROLLED, 200).unwrap();
                builder.append_u64(ICE_CONTROLLING, 300).unwrap();
                builder.append_flag(USE_CANDIDATE).unwrap();
                builder.len()
            })
        },
    );
    group.bench_with_input(
        BenchmarkId::from_parameter("XorMappedAddress+Fingerprint"),
        &addr,
        |b, addr| {
            b.iter(|| {
                let mut builder = request_with_address(&mut buf, &generator, addr);
                builder.finish().unwrap()
            })
        },
    );
    group.bench_with_input(
        BenchmarkId::from_parameter("XorMappedAddress+ShortTermIntegrity+Fingerprint"),
        &(&addr, &short_term_integrity),
        |b, &(addr, short_term_integrity)| {
            b.iter(|| {
                let mut builder = request_with_address(&mut buf, &generator, addr);
                builder.finish_with(short_term_integrity, None).unwrap()
            })
        },
    );
    group.bench_with_input(
        BenchmarkId::from_parameter("XorMappedAddress+LongTermIntegrity+Fingerprint"),
        &(&addr, &long_term_integrity),
        |b, &(addr, long_term_integrity)| {
            b.iter(|| {
                let mut builder = request_with_address(&mut buf, &generator, addr);
                builder.finish_with(long_term_integrity, Some(b"nonce".as_slice())).unwrap()
            })
        },
    );
    group.finish();
}

criterion_group!(message_write, bench_message_write);
criterion_main!(message_write);
