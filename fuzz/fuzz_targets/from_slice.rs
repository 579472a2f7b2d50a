#![no_main]
#[macro_use]
extern crate libfuzzer_sys;

use std::net::{Ipv4Addr, SocketAddr};

fuzz_target!(|data: &[u8]| {
    let server = SocketAddr::from((Ipv4Addr::LOCALHOST, 53));

    // Decoding never fails, and whatever comes out must print and re-encode.
    let response = stubdns::Response::from_slice(server, data);
    let _ = response.to_string();
    let _ = response.to_vec();
});
