//! Implements the Display trait for the various types, so they output
//! in `dig` style.
// Refer to https://github.com/tigeli/bind-utils/blob/master/bin/dig/dig.c for reference.

use crate::resource::*;
use crate::types::{Question, Record, Section};
use crate::Response;
use chrono::prelude::*;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Displays this message in a format resembling `dig` output.
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.error.is_empty() {
            writeln!(f, ";; ERROR: {}", self.error)?;
        }

        self.fmt_header(f)?;

        // Always display the question section, but optionally
        // display the other sections.
        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.questions {
            question.fmt(f)?;
        }
        writeln!(f)?;

        for (section, records) in [
            (Section::Answer, &self.answers),
            (Section::Authority, &self.authorities),
            (Section::Additional, &self.additionals),
        ] {
            if !records.is_empty() {
                writeln!(f, ";; {} SECTION:", section)?;
                for record in records {
                    record.fmt(f)?;
                }
                writeln!(f)?;
            }
        }

        let when: DateTime<Local> = self.timestamp.into();
        // ;; WHEN: Sat Jun 12 12:14:21 PDT 2021
        writeln!(f, ";; SERVER: {}", self.server)?;
        writeln!(f, ";; WHEN: {}", when.format("%a %b %-d %H:%M:%S %z %-Y"))?;
        writeln!(f, ";; MSG SIZE rcvd: {}", self.message_size)
    }
}

impl Response {
    fn fmt_header(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let header = &self.header;
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {opcode}, status: {rcode}, id: {id}",
            opcode = header.opcode(),
            rcode = header.rcode(),
            id = header.id,
        )?;

        let mut flags = String::new();

        if header.qr() {
            flags.push_str(" qr")
        }
        if header.aa() {
            flags.push_str(" aa")
        }
        if header.tc() {
            flags.push_str(" tc")
        }
        if header.rd() {
            flags.push_str(" rd")
        }
        if header.ra() {
            flags.push_str(" ra")
        }

        writeln!(f, ";; flags:{flags}; QUERY: {qd_count}, ANSWER: {an_count}, AUTHORITY: {ns_count}, ADDITIONAL: {ar_count}",
            flags = flags,
            qd_count = header.question_count,
            an_count = header.answer_count,
            ns_count = header.authority_count,
            ar_count = header.additional_count,
        )?;

        writeln!(f)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match self {
            Section::Answer => "ANSWER",
            Section::Authority => "AUTHORITY",
            Section::Additional => "ADDITIONAL",
        })
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "; {name:<18}      {class:4} {type:6}",
            name = self.name(),
            class = self.class,
            r#type = self.r#type,
        )
    }
}

/// Shows the remaining (not the received) TTL.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{name:<20} {ttl:>4} {class:4} {type:6} {resource}",
            name = self.name,
            ttl = self.ttl().as_secs(),
            class = self.class,
            r#type = self.r#type(),
            resource = self.resource,
        )
    }
}

/// Bytes in the RFC 3597 generic form, for example `\# 2 ABCD`.
struct Generic<'a>(&'a [u8]);

impl fmt::Display for Generic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {}", self.0.len())?;
        if !self.0.is_empty() {
            write!(f, " {}", hex::encode_upper(self.0))?;
        }
        Ok(())
    }
}

/// A `<character-string>` in double quotes.
struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self.0.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn base64(data: &[u8]) -> String {
    base64::encode(data)
}

fn types_list(bitmap: &[u8]) -> String {
    types_from_bitmap(bitmap)
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::A(ip) => ip.fmt(f),
            Resource::AAAA(ip) => ip.fmt(f),

            Resource::NS(name)
            | Resource::MD(name)
            | Resource::MF(name)
            | Resource::CNAME(name)
            | Resource::MB(name)
            | Resource::MG(name)
            | Resource::MR(name)
            | Resource::PTR(name)
            | Resource::NSAPPTR(name)
            | Resource::DNAME(name) => name.fmt(f),

            Resource::SOA(soa) => soa.fmt(f),
            Resource::TXT(txts) | Resource::SPF(txts) => txts.fmt(f),
            Resource::MX(mx) => mx.fmt(f),
            Resource::KX(kx) => kx.fmt(f),
            Resource::SRV(srv) => srv.fmt(f),
            Resource::LOC(loc) => loc.fmt(f),
            Resource::APL(items) => {
                let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "{}", items.join(" "))
            }

            Resource::NULL(data) => write!(f, "...binary data... ({}) bytes", data.len()),
            Resource::NSAP(data) => write!(f, "0x{}", hex::encode_upper(data)),
            Resource::EID(data) | Resource::NIMLOC(data) => write!(f, "{}", hex::encode_upper(data)),
            Resource::DHCID(data) => write!(f, "{}", base64(data)),
            Resource::UINFO(data) => Quoted(&crate::io::latin1(data)).fmt(f),
            Resource::UNSPEC(data) => Generic(data).fmt(f),

            Resource::WKS(wks) => write!(f, "{} {}", wks.address, wks.protocol),
            Resource::HINFO(hinfo) => write!(f, "CPU={} OS={}", hinfo.cpu, hinfo.os),
            Resource::MINFO(minfo) => write!(f, "{} {}", minfo.rmailbx, minfo.emailbx),
            Resource::RP(rp) => write!(f, "{} {}", rp.mbox, rp.txt),
            Resource::AFSDB(afsdb) => write!(f, "{} {}", afsdb.subtype, afsdb.hostname),
            Resource::X25(address) => Quoted(address).fmt(f),
            Resource::ISDN(isdn) => match &isdn.subaddress {
                Some(sub) => write!(f, "{} {}", Quoted(&isdn.address), Quoted(sub)),
                None => Quoted(&isdn.address).fmt(f),
            },
            Resource::RT(rt) => write!(f, "{} {}", rt.preference, rt.intermediate),
            Resource::SIG(sig) | Resource::RRSIG(sig) => write!(
                f,
                "{} {} {} {} {} {} {} {} {}",
                sig.type_covered,
                sig.algorithm,
                sig.labels,
                sig.original_ttl,
                sig.expiration,
                sig.inception,
                sig.key_tag,
                sig.signer_name,
                base64(&sig.signature),
            ),
            Resource::KEY(key) | Resource::DNSKEY(key) => write!(
                f,
                "{} {} {} {}",
                key.flags,
                key.protocol,
                key.algorithm,
                base64(&key.public_key)
            ),
            Resource::PX(px) => write!(f, "{} {} {}", px.preference, px.map822, px.mapx400),
            Resource::GPOS(gpos) => write!(
                f,
                "{} {} {}",
                Quoted(&gpos.longitude),
                Quoted(&gpos.latitude),
                Quoted(&gpos.altitude)
            ),
            Resource::NXT(nxt) => write!(f, "{} {}", nxt.next_domain, types_list(&nxt.bitmap)),
            Resource::ATMA(atma) => write!(f, "{} {}", atma.format, hex::encode_upper(&atma.address)),
            Resource::NAPTR(naptr) => write!(
                f,
                "{} {} {} {} {} {}",
                naptr.order,
                naptr.preference,
                Quoted(&naptr.flags),
                Quoted(&naptr.services),
                Quoted(&naptr.regexp),
                naptr.replacement,
            ),
            Resource::CERT(cert) => write!(
                f,
                "{} {} {} {}",
                cert.cert_type,
                cert.key_tag,
                cert.algorithm,
                base64(&cert.certificate)
            ),
            Resource::A6(a6) => {
                write!(f, "{} {}", a6.prefix_len, a6.address)?;
                if let Some(name) = &a6.prefix_name {
                    write!(f, " {}", name)?;
                }
                Ok(())
            }
            Resource::SINK(sink) => write!(f, "{} {} {}", sink.coding, sink.subcoding, base64(&sink.data)),
            Resource::OPT(options) => {
                let options: Vec<String> = options
                    .iter()
                    .map(|o| format!("{}:{}", o.code, hex::encode_upper(&o.data)))
                    .collect();
                write!(f, "{}", options.join(" "))
            }
            Resource::DS(ds) => write!(
                f,
                "{} {} {} {}",
                ds.key_tag,
                ds.algorithm,
                ds.digest_type,
                hex::encode_upper(&ds.digest)
            ),
            Resource::SSHFP(sshfp) => write!(
                f,
                "{} {} {}",
                sshfp.algorithm,
                sshfp.fingerprint_type,
                hex::encode_upper(&sshfp.fingerprint)
            ),
            Resource::IPSECKEY(key) => {
                let gateway = match &key.gateway {
                    Gateway::None | Gateway::Unknown(_) => ".".to_string(),
                    Gateway::V4(ip) => ip.to_string(),
                    Gateway::V6(ip) => ip.to_string(),
                    Gateway::Name(name) => name.to_string(),
                };
                write!(
                    f,
                    "{} {} {} {} {}",
                    key.precedence,
                    key.gateway.gateway_type(),
                    key.algorithm,
                    gateway,
                    base64(&key.public_key)
                )
            }
            Resource::NSEC(nsec) => write!(f, "{} {}", nsec.next_domain, types_list(&nsec.type_bitmap)),
            Resource::NSEC3(nsec3) => write!(
                f,
                "{} {} {} {} {} {}",
                nsec3.hash_algorithm,
                nsec3.flags,
                nsec3.iterations,
                salt(&nsec3.salt),
                hex::encode_upper(&nsec3.next_hashed_owner),
                types_list(&nsec3.type_bitmap),
            ),
            Resource::NSEC3PARAM(param) => write!(
                f,
                "{} {} {} {}",
                param.hash_algorithm,
                param.flags,
                param.iterations,
                salt(&param.salt)
            ),
            Resource::HIP(hip) => {
                write!(
                    f,
                    "{} {} {}",
                    hip.public_key_algorithm,
                    hex::encode_upper(&hip.hit),
                    base64(&hip.public_key)
                )?;
                for server in &hip.rendezvous_servers {
                    write!(f, " {}", server)?;
                }
                Ok(())
            }
            Resource::UID(id) | Resource::GID(id) => id.fmt(f),
            Resource::TKEY(tkey) => write!(
                f,
                "{} {} {} {} {}",
                tkey.algorithm, tkey.inception, tkey.expiration, tkey.mode, tkey.error
            ),
            Resource::TSIG(tsig) => tsig.fmt(f),
            Resource::Unknown { data, .. } => Generic(data).fmt(f),
        }
    }
}

fn salt(salt: &[u8]) -> String {
    if salt.is_empty() {
        "-".to_string()
    } else {
        hex::encode_upper(salt)
    }
}

impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // "10 aspmx.l.google.com."
        write!(
            f,
            "{preference} {exchange}",
            preference = self.preference,
            exchange = self.exchange,
        )
    }
}

impl fmt::Display for KX {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchanger)
    }
}

impl fmt::Display for SOA {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // "ns1.google.com. dns-admin.google.com. 376337657 900 900 1800 60"
        write!(
            f,
            "{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}",
            mname = self.mname,
            rname = self.rname,
            serial = self.serial,
            refresh = self.refresh.as_secs(),
            retry = self.retry.as_secs(),
            expire = self.expire.as_secs(),
            minimum = self.minimum.as_secs(),
        )
    }
}

impl fmt::Display for SRV {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // "5 0 389 ldap.google.com."
        write!(
            f,
            "{priority} {weight} {port} {name}",
            priority = self.priority,
            weight = self.weight,
            port = self.port,
            name = self.name,
        )
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let output = self
            .strings()
            .iter()
            .map(|txt| Quoted(txt).to_string())
            .collect::<Vec<String>>()
            .join(" ");

        write!(f, "{}", output)
    }
}

impl fmt::Display for APItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.negation {
            write!(f, "!")?;
        }

        let mut octets = self.address.clone();
        match self.family {
            1 => {
                octets.resize(4, 0);
                let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
                write!(f, "1:{}/{}", ip, self.prefix)
            }
            2 => {
                octets.resize(16, 0);
                let mut array = [0; 16];
                array.copy_from_slice(&octets);
                write!(f, "2:{}/{}", Ipv6Addr::from(array), self.prefix)
            }
            family => write!(f, "{}:{}/{}", family, hex::encode_upper(&octets), self.prefix),
        }
    }
}

/// Midpoint of the latitude and longitude ranges (the equator and prime meridian).
const LOC_MID: u32 = 1 << 31;

impl LOC {
    // "{base}{zeros}{unit}", such as "1m" or "10000m".
    fn size_to_string(s: u8) -> String {
        let base = s >> 4;
        let mut pow = s & 0x0F;
        let mut unit = "cm";
        if pow >= 2 {
            pow -= 2;
            unit = "m";
        }
        format!("{}{}{}", base, "0".repeat(pow.into()), unit)
    }

    fn angle_to_string(value: u32, below: char, above: char) -> String {
        let (dir, value) = if value > LOC_MID {
            (above, value - LOC_MID)
        } else {
            (below, LOC_MID - value)
        };

        let h = f64::from(value) / 3_600_000.0;
        let m = 60.0 * (h - h.trunc());
        let s = 60.0 * (m - m.trunc());
        format!("{} {} {:.3} {}", h as u32, m as u32, s, dir)
    }
}

impl fmt::Display for LOC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let altitude = f64::from(self.altitude) / 100.0 - 100_000.0;
        write!(
            f,
            "{} {} {:.2}m {} {} {}",
            Self::angle_to_string(self.latitude, 'S', 'N'),
            Self::angle_to_string(self.longitude, 'W', 'E'),
            altitude,
            Self::size_to_string(self.size),
            Self::size_to_string(self.horizontal_precision),
            Self::size_to_string(self.vertical_precision),
        )
    }
}

impl fmt::Display for TSIG {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let signed = i64::try_from(self.time_signed)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        match signed {
            Some(signed) => write!(f, "{} {}", self.algorithm, signed.format("%Y-%m-%d %H:%M:%S"))?,
            None => write!(f, "{} {}", self.algorithm, self.time_signed)?,
        }

        write!(f, " {} {} {}", self.fudge, self.original_id, self.error)
    }
}

#[cfg(test)]
mod tests {
    use crate::resource::*;
    use crate::types::Type;
    use core::time::Duration;
    use pretty_assertions::assert_eq;

    lazy_static! {
        static ref DISPLAY_TESTS : Vec<(Resource, &'static str)> = {
            vec![
                (
                    Resource::A("172.217.164.100".parse().unwrap()),
                    "172.217.164.100",
                ),
                (
                    Resource::AAAA("2607:f8b0:4005:805::2004".parse().unwrap()),
                    "2607:f8b0:4005:805::2004",
                ),
                (
                    Resource::CNAME("code.l.google.com.".to_string()),
                    "code.l.google.com.",
                ),
                (
                    Resource::NS("ns4.google.com.".to_string()),
                    "ns4.google.com.",
                ),
                (Resource::PTR("dns.google.".to_string()), "dns.google."),
                (
                    Resource::SOA(SOA {
                        mname: "ns1.google.com.".to_string(),
                        rname: "dns-admin.google.com.".to_string(),

                        serial: 379031418,

                        refresh: Duration::from_secs(900),
                        retry: Duration::from_secs(900),
                        expire: Duration::from_secs(1800),
                        minimum: Duration::from_secs(60),
                    }),
                    "ns1.google.com. dns-admin.google.com. 379031418 900 900 1800 60",
                ),
                (
                    Resource::MX(MX {
                        preference: 10,
                        exchange: "aspmx.l.google.com.".to_string(),
                    }),
                    "10 aspmx.l.google.com.",
                ),
                (
                    Resource::KX(KX {
                        preference: 10,
                        exchanger: "kx.example.com.".to_string(),
                    }),
                    "10 kx.example.com.",
                ),
                (
                    Resource::SRV(SRV {
                        priority: 5,
                        weight: 0,
                        port: 389,
                        name: "ldap.google.com.".to_string(),
                    }),
                    "5 0 389 ldap.google.com.",
                ),
                (
                    Resource::TXT(TXT::from("v=spf1 include:_spf.google.com ~all")),
                    "\"v=spf1 include:_spf.google.com ~all\"",
                ),
                (
                    // Example from TXT s1024._domainkey.yahoo.com.
                    Resource::TXT(TXT::from(&[
                        "k=rsa;  p=MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDrEee0Ri4Juz+QfiWYui/E9UGSXau/2P8LjnTD8V4Unn+2FAZVGE3kL23bzeoULYv4PeleB3gfm",
                        "JiDJOKU3Ns5L4KJAUUHjFwDebt0NP+sBK0VKeTATL2Yr/S3bT/xhy+1xtj4RkdV7fVxTn56Lb4udUnwuxK4V5b5PdOKj/+XcwIDAQAB; n=A 1024 bit key;"
                    ][..])),
                    "\"k=rsa;  p=MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDrEee0Ri4Juz+QfiWYui/E9UGSXau/2P8LjnTD8V4Unn+2FAZVGE3kL23bzeoULYv4PeleB3gfm\" \"JiDJOKU3Ns5L4KJAUUHjFwDebt0NP+sBK0VKeTATL2Yr/S3bT/xhy+1xtj4RkdV7fVxTn56Lb4udUnwuxK4V5b5PdOKj/+XcwIDAQAB; n=A 1024 bit key;\"",
                ),
                (
                    Resource::SPF(TXT::from("v=spf1 -all")),
                    "\"v=spf1 -all\"",
                ),
            ]
        };

        /// Types which only display (there is no parsing back from text).
        static ref DISPLAY_ONLY_TESTS : Vec<(Resource, &'static str)> = {
            vec![
                (
                    Resource::DS(DS {
                        key_tag: 60485,
                        algorithm: 5,
                        digest_type: 1,
                        digest: vec![0x2b, 0xb1, 0x83, 0xaf],
                    }),
                    "60485 5 1 2BB183AF",
                ),
                (
                    Resource::CERT(CERT {
                        cert_type: 1,
                        key_tag: 0,
                        algorithm: 0,
                        certificate: b"hello".to_vec(),
                    }),
                    "1 0 0 aGVsbG8=",
                ),
                (
                    Resource::HINFO(HINFO {
                        cpu: "INTEL-386".to_string(),
                        os: "UNIX".to_string(),
                    }),
                    "CPU=INTEL-386 OS=UNIX",
                ),
                (
                    Resource::NAPTR(NAPTR {
                        order: 100,
                        preference: 10,
                        flags: "u".to_string(),
                        services: "E2U+sip".to_string(),
                        regexp: "!^.*$!sip:info@example.com!".to_string(),
                        replacement: ".".to_string(),
                    }),
                    "100 10 \"u\" \"E2U+sip\" \"!^.*$!sip:info@example.com!\" .",
                ),
                (
                    // cambridge-net.kei.com from rfc1876.
                    Resource::LOC(LOC {
                        version: 0,
                        size: 0x33,
                        horizontal_precision: 0x16,
                        vertical_precision: 0x13,
                        latitude: 0x8917_2FC4,
                        longitude: 0x70BE_14F6,
                        altitude: 0x0098_8D20,
                    }),
                    "42 21 54.500 N 71 6 18.250 W -24.00m 30m 10000m 10m",
                ),
                (
                    Resource::NSEC(NSEC {
                        next_domain: "host.example.com.".to_string(),
                        type_bitmap: vec![0x00, 0x06, 0x40, 0x01, 0x00, 0x00, 0x00, 0x03],
                    }),
                    "host.example.com. A MX RRSIG NSEC",
                ),
                (
                    Resource::APL(vec![
                        APItem { family: 1, prefix: 21, negation: false, address: vec![192, 168, 32] },
                        APItem { family: 1, prefix: 28, negation: true, address: vec![192, 168, 38] },
                    ]),
                    "1:192.168.32.0/21 !1:192.168.38.0/28",
                ),
                (
                    Resource::TSIG(TSIG {
                        algorithm: "hmac-md5.sig-alg.reg.int.".to_string(),
                        time_signed: 1_000_000_000,
                        fudge: 300,
                        mac: vec![],
                        original_id: 1234,
                        error: 0,
                        other: vec![],
                    }),
                    "hmac-md5.sig-alg.reg.int. 2001-09-09 01:46:40 300 1234 0",
                ),
                (
                    Resource::NULL(vec![0; 7]),
                    "...binary data... (7) bytes",
                ),
                (
                    Resource::Unknown { r#type: 65280, data: vec![0xAB, 0xCD] },
                    "\\# 2 ABCD",
                ),
            ]
        };
    }

    #[test]
    fn test_display() {
        for (resource, display) in DISPLAY_TESTS.iter().chain(DISPLAY_ONLY_TESTS.iter()) {
            assert_eq!(format!("{}", resource), *display);
        }
    }

    #[test]
    fn test_from_str() {
        for (resource, display) in (*DISPLAY_TESTS).iter() {
            match Resource::from_str(resource.r#type(), display) {
                Ok(got) => assert_eq!(&got, resource),
                Err(err) => panic!(
                    "from_str({}, '{}') failed: {}",
                    resource.r#type(),
                    display,
                    err
                ),
            }
        }
    }

    /// Test resource->display->from_string to make sure we can round trip between types.
    #[test]
    fn test_identity() {
        for (resource, _) in (*DISPLAY_TESTS).iter() {
            let display = format!("{}", resource);
            match Resource::from_str(resource.r#type(), &display) {
                Ok(got) => assert_eq!(&got, resource),
                Err(err) => panic!(
                    "from_str({}, '{}') failed: {}",
                    resource.r#type(),
                    display,
                    err
                ),
            }
        }
    }

    #[test]
    fn test_unsupported_from_str() {
        assert!(Resource::from_str(Type::DS, "60485 5 1 2BB183AF").is_err());
    }
}
