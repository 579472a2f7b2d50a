//! The RDATA of every supported record type.
//!
//! Decoding is driven by [`Resource::read`] which never fails: fields that
//! run past the end of the RDATA (or the message) are zero filled, and the
//! caller realigns the reader to RDLENGTH afterwards.

use crate::errors::Result;
use crate::io::{latin1, DNSWriteExt, RecordReader};
use crate::types::Type;
use byteorder::{WriteBytesExt, BE};
use std::cmp::{self, Ordering};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// The decoded RDATA of a resource record.
///
/// This should be kept in sync with [`Type`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Resource {
    A(Ipv4Addr),
    NS(String),
    MD(String),
    MF(String),
    CNAME(String),
    SOA(SOA),
    MB(String),
    MG(String),
    MR(String),
    NULL(Vec<u8>),
    WKS(WKS),
    PTR(String),
    HINFO(HINFO),
    MINFO(MINFO),
    MX(MX),
    TXT(TXT),
    RP(RP),
    AFSDB(AFSDB),
    X25(String),
    ISDN(ISDN),
    RT(RT),
    NSAP(Vec<u8>),
    NSAPPTR(String),
    SIG(SIG),
    KEY(KEY),
    PX(PX),
    GPOS(GPOS),
    AAAA(Ipv6Addr),
    LOC(LOC),
    NXT(NXT),
    EID(Vec<u8>),
    NIMLOC(Vec<u8>),
    SRV(SRV),
    ATMA(ATMA),
    NAPTR(NAPTR),
    KX(KX),
    CERT(CERT),
    A6(A6),
    DNAME(String),
    SINK(SINK),
    OPT(Vec<EdnsOption>),
    APL(Vec<APItem>),
    DS(DS),
    SSHFP(SSHFP),
    IPSECKEY(IPSECKEY),
    RRSIG(SIG),
    NSEC(NSEC),
    DNSKEY(KEY),
    DHCID(Vec<u8>),
    NSEC3(NSEC3),
    NSEC3PARAM(NSEC3PARAM),
    HIP(HIP),
    SPF(TXT),
    UINFO(Vec<u8>),
    UID(u32),
    GID(u32),
    UNSPEC(Vec<u8>),
    TKEY(TKEY),
    TSIG(TSIG),

    /// Any type without a decoder, kept as raw bytes.
    Unknown { r#type: u16, data: Vec<u8> },
}

/// Start of a zone of authority. See [rfc1035#section-3.3.13].
///
/// [rfc1035#section-3.3.13]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.13
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SOA {
    /// The name server that was the original or primary source of data for this zone.
    pub mname: String,

    /// The mailbox of the person responsible for this zone, with the `@`
    /// written as a dot.
    pub rname: String,

    pub serial: u32,
    pub refresh: Duration,
    pub retry: Duration,
    pub expire: Duration,
    pub minimum: Duration,
}

/// Well known services. See [rfc1035#section-3.4.2].
///
/// [rfc1035#section-3.4.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.4.2
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WKS {
    pub address: Ipv4Addr,
    pub protocol: u8,
    pub bitmap: Vec<u8>,
}

/// Host information. See [rfc1035#section-3.3.2].
///
/// [rfc1035#section-3.3.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.2
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HINFO {
    pub cpu: String,
    pub os: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MINFO {
    pub rmailbx: String,
    pub emailbx: String,
}

/// Mail EXchanger. See [rfc1035#section-3.3.9].
///
/// Ordered by preference, then by (case insensitive) exchange.
///
/// [rfc1035#section-3.3.9]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.9
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MX {
    /// The preference given to this RR among others at the same owner.
    /// Lower values are preferred.
    pub preference: u16,

    /// A host willing to act as a mail exchange for the owner name.
    pub exchange: String,
}

/// Key eXchanger. See [rfc2230].
///
/// Ordered the same way as [`MX`].
///
/// [rfc2230]: https://datatracker.ietf.org/doc/html/rfc2230
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KX {
    pub preference: u16,
    pub exchanger: String,
}

/// Route Through. See [rfc1183#section-3.3].
///
/// [rfc1183#section-3.3]: https://datatracker.ietf.org/doc/html/rfc1183#section-3.3
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RT {
    pub preference: u16,
    pub intermediate: String,
}

/// One or more `<character-string>`s. Used by TXT and SPF.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TXT(pub Vec<Vec<u8>>);

/// Responsible Person. See [rfc1183#section-2.2].
///
/// [rfc1183#section-2.2]: https://datatracker.ietf.org/doc/html/rfc1183#section-2.2
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RP {
    pub mbox: String,
    pub txt: String,
}

/// AFS Data Base location. See [rfc1183#section-1].
///
/// [rfc1183#section-1]: https://datatracker.ietf.org/doc/html/rfc1183#section-1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AFSDB {
    pub subtype: u16,
    pub hostname: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ISDN {
    pub address: String,
    pub subaddress: Option<String>,
}

/// Signature, used by both SIG ([rfc2535]) and RRSIG ([rfc4034]).
///
/// [rfc2535]: https://datatracker.ietf.org/doc/html/rfc2535
/// [rfc4034]: https://datatracker.ietf.org/doc/html/rfc4034#section-3
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SIG {
    pub type_covered: Type,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,

    /// Seconds since the epoch.
    pub expiration: u32,

    /// Seconds since the epoch.
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

/// Public key, used by both KEY ([rfc2535]) and DNSKEY ([rfc4034]).
///
/// [rfc2535]: https://datatracker.ietf.org/doc/html/rfc2535
/// [rfc4034]: https://datatracker.ietf.org/doc/html/rfc4034#section-2
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KEY {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

/// X.400 mail mapping. See [rfc2163].
///
/// [rfc2163]: https://datatracker.ietf.org/doc/html/rfc2163
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PX {
    pub preference: u16,
    pub map822: String,
    pub mapx400: String,
}

/// Geographical position. See [rfc1712].
///
/// [rfc1712]: https://datatracker.ietf.org/doc/html/rfc1712
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GPOS {
    pub longitude: String,
    pub latitude: String,
    pub altitude: String,
}

/// Location information. See [rfc1876].
///
/// [rfc1876]: https://datatracker.ietf.org/doc/html/rfc1876
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LOC {
    /// Must be zero.
    pub version: u8,

    /// Diameter of the enclosing sphere, as a base and power of ten in centimeters.
    pub size: u8,
    pub horizontal_precision: u8,
    pub vertical_precision: u8,

    /// Thousandths of a second of arc, 2^31 is the equator.
    pub latitude: u32,

    /// Thousandths of a second of arc, 2^31 is the prime meridian.
    pub longitude: u32,

    /// Centimeters from 100,000m below the WGS 84 reference spheroid.
    pub altitude: u32,
}

/// Next domain (obsolete). See [rfc2535#section-5].
///
/// [rfc2535#section-5]: https://datatracker.ietf.org/doc/html/rfc2535#section-5
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NXT {
    pub next_domain: String,
    pub bitmap: Vec<u8>,
}

/// Service location. See [rfc2782].
///
/// [rfc2782]: https://datatracker.ietf.org/doc/html/rfc2782
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SRV {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub name: String,
}

/// ATM address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ATMA {
    pub format: u8,
    pub address: Vec<u8>,
}

/// Naming authority pointer. See [rfc3403].
///
/// [rfc3403]: https://datatracker.ietf.org/doc/html/rfc3403#section-4
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NAPTR {
    pub order: u16,
    pub preference: u16,
    pub flags: String,
    pub services: String,
    pub regexp: String,
    pub replacement: String,
}

/// Certificate or CRL. See [rfc4398].
///
/// [rfc4398]: https://datatracker.ietf.org/doc/html/rfc4398
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CERT {
    pub cert_type: u16,
    pub key_tag: u16,
    pub algorithm: u8,
    pub certificate: Vec<u8>,
}

/// IPv6 address with an (optional) prefix name. See [rfc2874].
///
/// [rfc2874]: https://datatracker.ietf.org/doc/html/rfc2874#section-3.1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct A6 {
    pub prefix_len: u8,

    /// Only the bits after `prefix_len` are carried on the wire.
    pub address: Ipv6Addr,
    pub prefix_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SINK {
    pub coding: u8,
    pub subcoding: u8,
    pub data: Vec<u8>,
}

/// A single EDNS(0) option. See [rfc6891#section-6.1.2].
///
/// [rfc6891#section-6.1.2]: https://datatracker.ietf.org/doc/html/rfc6891#section-6.1.2
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

/// One address prefix of an APL record. See [rfc3123].
///
/// [rfc3123]: https://datatracker.ietf.org/doc/html/rfc3123#section-4
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct APItem {
    /// 1 for IPv4, 2 for IPv6.
    pub family: u16,
    pub prefix: u8,
    pub negation: bool,

    /// The address with trailing zero bytes removed.
    pub address: Vec<u8>,
}

/// Delegation signer. See [rfc4034#section-5].
///
/// [rfc4034#section-5]: https://datatracker.ietf.org/doc/html/rfc4034#section-5
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DS {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

/// SSH key fingerprint. See [rfc4255].
///
/// [rfc4255]: https://datatracker.ietf.org/doc/html/rfc4255
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SSHFP {
    pub algorithm: u8,
    pub fingerprint_type: u8,
    pub fingerprint: Vec<u8>,
}

/// IPsec keying material. See [rfc4025].
///
/// [rfc4025]: https://datatracker.ietf.org/doc/html/rfc4025
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IPSECKEY {
    pub precedence: u8,
    pub algorithm: u8,
    pub gateway: Gateway,
    pub public_key: Vec<u8>,
}

/// The gateway of an [`IPSECKEY`], tagged by its gateway type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gateway {
    None,
    V4(Ipv4Addr),
    V6(Ipv6Addr),
    Name(String),

    /// A gateway type without a known encoding. No gateway bytes are read.
    Unknown(u8),
}

/// Next secure record. See [rfc4034#section-4].
///
/// [rfc4034#section-4]: https://datatracker.ietf.org/doc/html/rfc4034#section-4
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NSEC {
    pub next_domain: String,
    pub type_bitmap: Vec<u8>,
}

/// Hashed next secure record. See [rfc5155#section-3].
///
/// [rfc5155#section-3]: https://datatracker.ietf.org/doc/html/rfc5155#section-3
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NSEC3 {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed_owner: Vec<u8>,
    pub type_bitmap: Vec<u8>,
}

/// See [rfc5155#section-4].
///
/// [rfc5155#section-4]: https://datatracker.ietf.org/doc/html/rfc5155#section-4
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NSEC3PARAM {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

/// Host identity protocol. See [rfc5205#section-5].
///
/// [rfc5205#section-5]: https://datatracker.ietf.org/doc/html/rfc5205#section-5
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HIP {
    pub hit: Vec<u8>,
    pub public_key_algorithm: u8,
    pub public_key: Vec<u8>,
    pub rendezvous_servers: Vec<String>,
}

/// Transaction key. See [rfc2930].
///
/// [rfc2930]: https://datatracker.ietf.org/doc/html/rfc2930#section-2
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TKEY {
    pub algorithm: String,
    pub inception: u32,
    pub expiration: u32,
    pub mode: u16,
    pub error: u16,
    pub key: Vec<u8>,
    pub other: Vec<u8>,
}

/// Transaction signature. See [rfc2845].
///
/// [rfc2845]: https://datatracker.ietf.org/doc/html/rfc2845#section-2.3
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TSIG {
    pub algorithm: String,

    /// Seconds since the epoch, 48 bits on the wire.
    pub time_signed: u64,
    pub fudge: u16,
    pub mac: Vec<u8>,
    pub original_id: u16,
    pub error: u16,
    pub other: Vec<u8>,
}

impl Resource {
    /// Returns the [`Type`] of this resource.
    pub fn r#type(&self) -> Type {
        match self {
            Resource::A(_) => Type::A,
            Resource::NS(_) => Type::NS,
            Resource::MD(_) => Type::MD,
            Resource::MF(_) => Type::MF,
            Resource::CNAME(_) => Type::CNAME,
            Resource::SOA(_) => Type::SOA,
            Resource::MB(_) => Type::MB,
            Resource::MG(_) => Type::MG,
            Resource::MR(_) => Type::MR,
            Resource::NULL(_) => Type::NULL,
            Resource::WKS(_) => Type::WKS,
            Resource::PTR(_) => Type::PTR,
            Resource::HINFO(_) => Type::HINFO,
            Resource::MINFO(_) => Type::MINFO,
            Resource::MX(_) => Type::MX,
            Resource::TXT(_) => Type::TXT,
            Resource::RP(_) => Type::RP,
            Resource::AFSDB(_) => Type::AFSDB,
            Resource::X25(_) => Type::X25,
            Resource::ISDN(_) => Type::ISDN,
            Resource::RT(_) => Type::RT,
            Resource::NSAP(_) => Type::NSAP,
            Resource::NSAPPTR(_) => Type::NSAPPTR,
            Resource::SIG(_) => Type::SIG,
            Resource::KEY(_) => Type::KEY,
            Resource::PX(_) => Type::PX,
            Resource::GPOS(_) => Type::GPOS,
            Resource::AAAA(_) => Type::AAAA,
            Resource::LOC(_) => Type::LOC,
            Resource::NXT(_) => Type::NXT,
            Resource::EID(_) => Type::EID,
            Resource::NIMLOC(_) => Type::NIMLOC,
            Resource::SRV(_) => Type::SRV,
            Resource::ATMA(_) => Type::ATMA,
            Resource::NAPTR(_) => Type::NAPTR,
            Resource::KX(_) => Type::KX,
            Resource::CERT(_) => Type::CERT,
            Resource::A6(_) => Type::A6,
            Resource::DNAME(_) => Type::DNAME,
            Resource::SINK(_) => Type::SINK,
            Resource::OPT(_) => Type::OPT,
            Resource::APL(_) => Type::APL,
            Resource::DS(_) => Type::DS,
            Resource::SSHFP(_) => Type::SSHFP,
            Resource::IPSECKEY(_) => Type::IPSECKEY,
            Resource::RRSIG(_) => Type::RRSIG,
            Resource::NSEC(_) => Type::NSEC,
            Resource::DNSKEY(_) => Type::DNSKEY,
            Resource::DHCID(_) => Type::DHCID,
            Resource::NSEC3(_) => Type::NSEC3,
            Resource::NSEC3PARAM(_) => Type::NSEC3PARAM,
            Resource::HIP(_) => Type::HIP,
            Resource::SPF(_) => Type::SPF,
            Resource::UINFO(_) => Type::UINFO,
            Resource::UID(_) => Type::UID,
            Resource::GID(_) => Type::GID,
            Resource::UNSPEC(_) => Type::UNSPEC,
            Resource::TKEY(_) => Type::TKEY,
            Resource::TSIG(_) => Type::TSIG,
            Resource::Unknown { r#type, .. } => Type::from(*r#type),
        }
    }

    /// Decodes the RDATA of a record of type `r#type`.
    ///
    /// Must be called with the reader positioned directly after the
    /// RDLENGTH field, as the raw decoders re-read it.
    pub(crate) fn read(r: &mut RecordReader, r#type: Type, rdlength: u16) -> Resource {
        let end = cmp::min(r.position() + rdlength as usize, r.len());
        let rdlength = rdlength as usize;

        match r#type {
            Type::A => Resource::A(r.read_array::<4>().into()),
            Type::NS => Resource::NS(r.read_domain_name()),
            Type::MD => Resource::MD(r.read_domain_name()),
            Type::MF => Resource::MF(r.read_domain_name()),
            Type::CNAME => Resource::CNAME(r.read_domain_name()),
            Type::SOA => Resource::SOA(SOA {
                mname: r.read_domain_name(),
                rname: r.read_domain_name(),
                serial: r.read_u32(),
                refresh: read_duration(r),
                retry: read_duration(r),
                expire: read_duration(r),
                minimum: read_duration(r),
            }),
            Type::MB => Resource::MB(r.read_domain_name()),
            Type::MG => Resource::MG(r.read_domain_name()),
            Type::MR => Resource::MR(r.read_domain_name()),
            Type::NULL => Resource::NULL(read_raw(r)),
            Type::WKS => Resource::WKS(WKS {
                address: r.read_array::<4>().into(),
                protocol: r.read_byte(),
                bitmap: r.read_bytes(rdlength.saturating_sub(5)),
            }),
            Type::PTR => Resource::PTR(r.read_domain_name()),
            Type::HINFO => Resource::HINFO(HINFO {
                cpu: r.read_string(),
                os: r.read_string(),
            }),
            Type::MINFO => Resource::MINFO(MINFO {
                rmailbx: r.read_domain_name(),
                emailbx: r.read_domain_name(),
            }),
            Type::MX => Resource::MX(MX {
                preference: r.read_u16(),
                exchange: r.read_domain_name(),
            }),
            Type::TXT => Resource::TXT(read_txt(r, end)),
            Type::RP => Resource::RP(RP {
                mbox: r.read_domain_name(),
                txt: r.read_domain_name(),
            }),
            Type::AFSDB => Resource::AFSDB(AFSDB {
                subtype: r.read_u16(),
                hostname: r.read_domain_name(),
            }),
            Type::X25 => Resource::X25(r.read_string()),
            Type::ISDN => {
                let address = r.read_string();
                let subaddress = if r.position() < end {
                    Some(r.read_string())
                } else {
                    None
                };
                Resource::ISDN(ISDN {
                    address,
                    subaddress,
                })
            }
            Type::RT => Resource::RT(RT {
                preference: r.read_u16(),
                intermediate: r.read_domain_name(),
            }),
            Type::NSAP => Resource::NSAP(read_raw(r)),
            Type::NSAPPTR => Resource::NSAPPTR(r.read_domain_name()),
            Type::SIG => Resource::SIG(read_sig(r, end)),
            Type::KEY => Resource::KEY(read_key(r, rdlength)),
            Type::PX => Resource::PX(PX {
                preference: r.read_u16(),
                map822: r.read_domain_name(),
                mapx400: r.read_domain_name(),
            }),
            Type::GPOS => Resource::GPOS(GPOS {
                longitude: r.read_string(),
                latitude: r.read_string(),
                altitude: r.read_string(),
            }),
            Type::AAAA => Resource::AAAA(r.read_array::<16>().into()),
            Type::LOC => Resource::LOC(LOC {
                version: r.read_byte(),
                size: r.read_byte(),
                horizontal_precision: r.read_byte(),
                vertical_precision: r.read_byte(),
                latitude: r.read_u32(),
                longitude: r.read_u32(),
                altitude: r.read_u32(),
            }),
            Type::NXT => Resource::NXT(NXT {
                next_domain: r.read_domain_name(),
                bitmap: r.read_to(end),
            }),
            Type::EID => Resource::EID(read_raw(r)),
            Type::NIMLOC => Resource::NIMLOC(read_raw(r)),
            Type::SRV => Resource::SRV(SRV {
                priority: r.read_u16(),
                weight: r.read_u16(),
                port: r.read_u16(),
                name: r.read_domain_name(),
            }),
            Type::ATMA => Resource::ATMA(ATMA {
                format: r.read_byte(),
                address: r.read_to(end),
            }),
            Type::NAPTR => Resource::NAPTR(NAPTR {
                order: r.read_u16(),
                preference: r.read_u16(),
                flags: r.read_string(),
                services: r.read_string(),
                regexp: r.read_string(),
                replacement: r.read_domain_name(),
            }),
            Type::KX => Resource::KX(KX {
                preference: r.read_u16(),
                exchanger: r.read_domain_name(),
            }),
            Type::CERT => Resource::CERT(CERT {
                cert_type: r.read_u16(),
                key_tag: r.read_u16(),
                algorithm: r.read_byte(),
                certificate: r.read_bytes(rdlength.saturating_sub(5)),
            }),
            Type::A6 => Resource::A6(read_a6(r)),
            Type::DNAME => Resource::DNAME(r.read_domain_name()),
            Type::SINK => Resource::SINK(SINK {
                coding: r.read_byte(),
                subcoding: r.read_byte(),
                data: r.read_to(end),
            }),
            Type::OPT => {
                let mut options = Vec::new();
                while r.position() < end {
                    let code = r.read_u16();
                    let len = r.read_u16();
                    options.push(EdnsOption {
                        code,
                        data: r.read_bytes(len.into()),
                    });
                }
                Resource::OPT(options)
            }
            Type::APL => {
                let mut items = Vec::new();
                while r.position() < end {
                    let family = r.read_u16();
                    let prefix = r.read_byte();
                    let len = r.read_byte();
                    items.push(APItem {
                        family,
                        prefix,
                        negation: len & 0x80 != 0,
                        address: r.read_bytes((len & 0x7F).into()),
                    });
                }
                Resource::APL(items)
            }
            Type::DS => Resource::DS(DS {
                key_tag: r.read_u16(),
                algorithm: r.read_byte(),
                digest_type: r.read_byte(),
                digest: r.read_bytes(rdlength.saturating_sub(4)),
            }),
            Type::SSHFP => Resource::SSHFP(SSHFP {
                algorithm: r.read_byte(),
                fingerprint_type: r.read_byte(),
                fingerprint: r.read_to(end),
            }),
            Type::IPSECKEY => {
                let precedence = r.read_byte();
                let gateway_type = r.read_byte();
                let algorithm = r.read_byte();
                let gateway = match gateway_type {
                    0 => Gateway::None,
                    1 => Gateway::V4(r.read_array::<4>().into()),
                    2 => Gateway::V6(r.read_array::<16>().into()),
                    3 => Gateway::Name(r.read_domain_name()),
                    n => Gateway::Unknown(n),
                };
                Resource::IPSECKEY(IPSECKEY {
                    precedence,
                    algorithm,
                    gateway,
                    public_key: r.read_to(end),
                })
            }
            Type::RRSIG => Resource::RRSIG(read_sig(r, end)),
            Type::NSEC => Resource::NSEC(NSEC {
                next_domain: r.read_domain_name(),
                type_bitmap: r.read_to(end),
            }),
            Type::DNSKEY => Resource::DNSKEY(read_key(r, rdlength)),
            Type::DHCID => Resource::DHCID(read_raw(r)),
            Type::NSEC3 => Resource::NSEC3(NSEC3 {
                hash_algorithm: r.read_byte(),
                flags: r.read_byte(),
                iterations: r.read_u16(),
                salt: r.read_character_string(),
                next_hashed_owner: r.read_character_string(),
                type_bitmap: r.read_to(end),
            }),
            Type::NSEC3PARAM => Resource::NSEC3PARAM(NSEC3PARAM {
                hash_algorithm: r.read_byte(),
                flags: r.read_byte(),
                iterations: r.read_u16(),
                salt: r.read_character_string(),
            }),
            Type::HIP => {
                let hit_len = r.read_byte();
                let public_key_algorithm = r.read_byte();
                let public_key_len = r.read_u16();
                let hit = r.read_bytes(hit_len.into());
                let public_key = r.read_bytes(public_key_len.into());

                let mut rendezvous_servers = Vec::new();
                while r.position() < end {
                    rendezvous_servers.push(r.read_domain_name());
                }

                Resource::HIP(HIP {
                    hit,
                    public_key_algorithm,
                    public_key,
                    rendezvous_servers,
                })
            }
            Type::SPF => Resource::SPF(read_txt(r, end)),
            Type::UINFO => Resource::UINFO(read_raw(r)),
            Type::UID => Resource::UID(r.read_u32()),
            Type::GID => Resource::GID(r.read_u32()),
            Type::UNSPEC => Resource::UNSPEC(read_raw(r)),
            Type::TKEY => {
                let algorithm = r.read_domain_name();
                let inception = r.read_u32();
                let expiration = r.read_u32();
                let mode = r.read_u16();
                let error = r.read_u16();
                let key_len = r.read_u16();
                let key = r.read_bytes(key_len.into());
                let other_len = r.read_u16();
                Resource::TKEY(TKEY {
                    algorithm,
                    inception,
                    expiration,
                    mode,
                    error,
                    key,
                    other: r.read_bytes(other_len.into()),
                })
            }
            Type::TSIG => {
                let algorithm = r.read_domain_name();
                let high = u64::from(r.read_u16());
                let low = u64::from(r.read_u32());
                let fudge = r.read_u16();
                let mac_len = r.read_u16();
                let mac = r.read_bytes(mac_len.into());
                let original_id = r.read_u16();
                let error = r.read_u16();
                let other_len = r.read_u16();
                Resource::TSIG(TSIG {
                    algorithm,
                    time_signed: high << 32 | low,
                    fudge,
                    mac,
                    original_id,
                    error,
                    other: r.read_bytes(other_len.into()),
                })
            }

            // The query only types, and anything else.
            _ => Resource::Unknown {
                r#type: r#type.into(),
                data: read_raw(r),
            },
        }
    }

    /// Encodes the RDATA (without the RDLENGTH prefix). Names are never compressed.
    pub fn write<W: io::Write>(&self, w: &mut W) -> Result<()> {
        match self {
            Resource::A(ip) => w.write_all(&ip.octets())?,
            Resource::AAAA(ip) => w.write_all(&ip.octets())?,

            Resource::NS(name)
            | Resource::MD(name)
            | Resource::MF(name)
            | Resource::CNAME(name)
            | Resource::MB(name)
            | Resource::MG(name)
            | Resource::MR(name)
            | Resource::PTR(name)
            | Resource::NSAPPTR(name)
            | Resource::DNAME(name) => w.write_qname(name)?,

            Resource::NULL(data)
            | Resource::NSAP(data)
            | Resource::EID(data)
            | Resource::NIMLOC(data)
            | Resource::DHCID(data)
            | Resource::UINFO(data)
            | Resource::UNSPEC(data)
            | Resource::Unknown { data, .. } => w.write_all(data)?,

            Resource::SOA(soa) => {
                w.write_qname(&soa.mname)?;
                w.write_qname(&soa.rname)?;
                w.write_u32::<BE>(soa.serial)?;
                write_duration(w, soa.refresh)?;
                write_duration(w, soa.retry)?;
                write_duration(w, soa.expire)?;
                write_duration(w, soa.minimum)?;
            }
            Resource::WKS(wks) => {
                w.write_all(&wks.address.octets())?;
                w.write_u8(wks.protocol)?;
                w.write_all(&wks.bitmap)?;
            }
            Resource::HINFO(hinfo) => {
                write_string(w, &hinfo.cpu)?;
                write_string(w, &hinfo.os)?;
            }
            Resource::MINFO(minfo) => {
                w.write_qname(&minfo.rmailbx)?;
                w.write_qname(&minfo.emailbx)?;
            }
            Resource::MX(mx) => {
                w.write_u16::<BE>(mx.preference)?;
                w.write_qname(&mx.exchange)?;
            }
            Resource::KX(kx) => {
                w.write_u16::<BE>(kx.preference)?;
                w.write_qname(&kx.exchanger)?;
            }
            Resource::RT(rt) => {
                w.write_u16::<BE>(rt.preference)?;
                w.write_qname(&rt.intermediate)?;
            }
            Resource::TXT(txt) | Resource::SPF(txt) => {
                for s in &txt.0 {
                    w.write_character_string(s)?;
                }
            }
            Resource::RP(rp) => {
                w.write_qname(&rp.mbox)?;
                w.write_qname(&rp.txt)?;
            }
            Resource::AFSDB(afsdb) => {
                w.write_u16::<BE>(afsdb.subtype)?;
                w.write_qname(&afsdb.hostname)?;
            }
            Resource::X25(address) => write_string(w, address)?,
            Resource::ISDN(isdn) => {
                write_string(w, &isdn.address)?;
                if let Some(subaddress) = &isdn.subaddress {
                    write_string(w, subaddress)?;
                }
            }
            Resource::SIG(sig) | Resource::RRSIG(sig) => {
                w.write_u16::<BE>(sig.type_covered.into())?;
                w.write_u8(sig.algorithm)?;
                w.write_u8(sig.labels)?;
                w.write_u32::<BE>(sig.original_ttl)?;
                w.write_u32::<BE>(sig.expiration)?;
                w.write_u32::<BE>(sig.inception)?;
                w.write_u16::<BE>(sig.key_tag)?;
                w.write_qname(&sig.signer_name)?;
                w.write_all(&sig.signature)?;
            }
            Resource::KEY(key) | Resource::DNSKEY(key) => {
                w.write_u16::<BE>(key.flags)?;
                w.write_u8(key.protocol)?;
                w.write_u8(key.algorithm)?;
                w.write_all(&key.public_key)?;
            }
            Resource::PX(px) => {
                w.write_u16::<BE>(px.preference)?;
                w.write_qname(&px.map822)?;
                w.write_qname(&px.mapx400)?;
            }
            Resource::GPOS(gpos) => {
                write_string(w, &gpos.longitude)?;
                write_string(w, &gpos.latitude)?;
                write_string(w, &gpos.altitude)?;
            }
            Resource::LOC(loc) => {
                w.write_u8(loc.version)?;
                w.write_u8(loc.size)?;
                w.write_u8(loc.horizontal_precision)?;
                w.write_u8(loc.vertical_precision)?;
                w.write_u32::<BE>(loc.latitude)?;
                w.write_u32::<BE>(loc.longitude)?;
                w.write_u32::<BE>(loc.altitude)?;
            }
            Resource::NXT(nxt) => {
                w.write_qname(&nxt.next_domain)?;
                w.write_all(&nxt.bitmap)?;
            }
            Resource::SRV(srv) => {
                w.write_u16::<BE>(srv.priority)?;
                w.write_u16::<BE>(srv.weight)?;
                w.write_u16::<BE>(srv.port)?;
                w.write_qname(&srv.name)?;
            }
            Resource::ATMA(atma) => {
                w.write_u8(atma.format)?;
                w.write_all(&atma.address)?;
            }
            Resource::NAPTR(naptr) => {
                w.write_u16::<BE>(naptr.order)?;
                w.write_u16::<BE>(naptr.preference)?;
                write_string(w, &naptr.flags)?;
                write_string(w, &naptr.services)?;
                write_string(w, &naptr.regexp)?;
                w.write_qname(&naptr.replacement)?;
            }
            Resource::CERT(cert) => {
                w.write_u16::<BE>(cert.cert_type)?;
                w.write_u16::<BE>(cert.key_tag)?;
                w.write_u8(cert.algorithm)?;
                w.write_all(&cert.certificate)?;
            }
            Resource::A6(a6) => {
                let prefix_len = cmp::min(a6.prefix_len, 128);
                w.write_u8(prefix_len)?;
                w.write_all(&a6.address.octets()[16 - a6_suffix_len(prefix_len)..])?;
                if prefix_len > 0 {
                    w.write_qname(a6.prefix_name.as_deref().unwrap_or("."))?;
                }
            }
            Resource::SINK(sink) => {
                w.write_u8(sink.coding)?;
                w.write_u8(sink.subcoding)?;
                w.write_all(&sink.data)?;
            }
            Resource::OPT(options) => {
                for option in options {
                    w.write_u16::<BE>(option.code)?;
                    w.write_u16::<BE>(option.data.len() as u16)?;
                    w.write_all(&option.data)?;
                }
            }
            Resource::APL(items) => {
                for item in items {
                    let len = cmp::min(item.address.len(), 0x7F);
                    w.write_u16::<BE>(item.family)?;
                    w.write_u8(item.prefix)?;
                    w.write_u8(len as u8 | if item.negation { 0x80 } else { 0 })?;
                    w.write_all(&item.address[..len])?;
                }
            }
            Resource::DS(ds) => {
                w.write_u16::<BE>(ds.key_tag)?;
                w.write_u8(ds.algorithm)?;
                w.write_u8(ds.digest_type)?;
                w.write_all(&ds.digest)?;
            }
            Resource::SSHFP(sshfp) => {
                w.write_u8(sshfp.algorithm)?;
                w.write_u8(sshfp.fingerprint_type)?;
                w.write_all(&sshfp.fingerprint)?;
            }
            Resource::IPSECKEY(key) => {
                w.write_u8(key.precedence)?;
                w.write_u8(key.gateway.gateway_type())?;
                w.write_u8(key.algorithm)?;
                match &key.gateway {
                    Gateway::None | Gateway::Unknown(_) => (),
                    Gateway::V4(ip) => w.write_all(&ip.octets())?,
                    Gateway::V6(ip) => w.write_all(&ip.octets())?,
                    Gateway::Name(name) => w.write_qname(name)?,
                }
                w.write_all(&key.public_key)?;
            }
            Resource::NSEC(nsec) => {
                w.write_qname(&nsec.next_domain)?;
                w.write_all(&nsec.type_bitmap)?;
            }
            Resource::NSEC3(nsec3) => {
                w.write_u8(nsec3.hash_algorithm)?;
                w.write_u8(nsec3.flags)?;
                w.write_u16::<BE>(nsec3.iterations)?;
                w.write_character_string(&nsec3.salt)?;
                w.write_character_string(&nsec3.next_hashed_owner)?;
                w.write_all(&nsec3.type_bitmap)?;
            }
            Resource::NSEC3PARAM(param) => {
                w.write_u8(param.hash_algorithm)?;
                w.write_u8(param.flags)?;
                w.write_u16::<BE>(param.iterations)?;
                w.write_character_string(&param.salt)?;
            }
            Resource::HIP(hip) => {
                w.write_u8(hip.hit.len() as u8)?;
                w.write_u8(hip.public_key_algorithm)?;
                w.write_u16::<BE>(hip.public_key.len() as u16)?;
                w.write_all(&hip.hit)?;
                w.write_all(&hip.public_key)?;
                for server in &hip.rendezvous_servers {
                    w.write_qname(server)?;
                }
            }
            Resource::UID(id) | Resource::GID(id) => w.write_u32::<BE>(*id)?,
            Resource::TKEY(tkey) => {
                w.write_qname(&tkey.algorithm)?;
                w.write_u32::<BE>(tkey.inception)?;
                w.write_u32::<BE>(tkey.expiration)?;
                w.write_u16::<BE>(tkey.mode)?;
                w.write_u16::<BE>(tkey.error)?;
                w.write_u16::<BE>(tkey.key.len() as u16)?;
                w.write_all(&tkey.key)?;
                w.write_u16::<BE>(tkey.other.len() as u16)?;
                w.write_all(&tkey.other)?;
            }
            Resource::TSIG(tsig) => {
                w.write_qname(&tsig.algorithm)?;
                w.write_u16::<BE>((tsig.time_signed >> 32) as u16)?;
                w.write_u32::<BE>(tsig.time_signed as u32)?;
                w.write_u16::<BE>(tsig.fudge)?;
                w.write_u16::<BE>(tsig.mac.len() as u16)?;
                w.write_all(&tsig.mac)?;
                w.write_u16::<BE>(tsig.original_id)?;
                w.write_u16::<BE>(tsig.error)?;
                w.write_u16::<BE>(tsig.other.len() as u16)?;
                w.write_all(&tsig.other)?;
            }
        }

        Ok(())
    }
}

/// RDATA bytes, re-reading RDLENGTH from just before the current position.
fn read_raw(r: &mut RecordReader) -> Vec<u8> {
    let len = r.reread_rdlength();
    r.read_bytes(len.into())
}

fn read_duration(r: &mut RecordReader) -> Duration {
    Duration::from_secs(r.read_u32().into())
}

fn write_duration<W: io::Write>(w: &mut W, d: Duration) -> io::Result<()> {
    w.write_u32::<BE>(cmp::min(d.as_secs(), u32::MAX.into()) as u32)
}

fn write_string<W: io::Write>(w: &mut W, s: &str) -> io::Result<()> {
    // Strings are read byte per char, so write them back the same way.
    let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
    w.write_character_string(&bytes)
}

fn read_txt(r: &mut RecordReader, end: usize) -> TXT {
    let mut txts = Vec::new();
    while r.position() < end && r.remaining() > 0 {
        txts.push(r.read_character_string());
    }
    TXT(txts)
}

fn read_sig(r: &mut RecordReader, end: usize) -> SIG {
    SIG {
        type_covered: r.read_u16().into(),
        algorithm: r.read_byte(),
        labels: r.read_byte(),
        original_ttl: r.read_u32(),
        expiration: r.read_u32(),
        inception: r.read_u32(),
        key_tag: r.read_u16(),
        signer_name: r.read_domain_name(),
        signature: r.read_to(end),
    }
}

fn read_key(r: &mut RecordReader, rdlength: usize) -> KEY {
    KEY {
        flags: r.read_u16(),
        protocol: r.read_byte(),
        algorithm: r.read_byte(),
        public_key: r.read_bytes(rdlength.saturating_sub(4)),
    }
}

/// Number of address bytes carried by an A6 record with this prefix length.
fn a6_suffix_len(prefix_len: u8) -> usize {
    (128 - cmp::min(prefix_len, 128) as usize + 7) / 8
}

fn read_a6(r: &mut RecordReader) -> A6 {
    let prefix_len = r.read_byte();
    let suffix_len = a6_suffix_len(prefix_len);

    let mut octets = [0; 16];
    octets[16 - suffix_len..].copy_from_slice(&r.read_bytes(suffix_len));

    let prefix_name = if prefix_len > 0 {
        Some(r.read_domain_name())
    } else {
        None
    };

    A6 {
        prefix_len,
        address: octets.into(),
        prefix_name,
    }
}

impl Gateway {
    pub fn gateway_type(&self) -> u8 {
        match self {
            Gateway::None => 0,
            Gateway::V4(_) => 1,
            Gateway::V6(_) => 2,
            Gateway::Name(_) => 3,
            Gateway::Unknown(n) => *n,
        }
    }
}

/// Decodes a NSEC style type bitmap ([rfc4034#section-4.1.2]) into the types it lists.
///
/// [rfc4034#section-4.1.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-4.1.2
pub fn types_from_bitmap(bitmap: &[u8]) -> Vec<Type> {
    let mut types = Vec::new();
    let mut r = RecordReader::new(bitmap);

    while r.remaining() >= 2 {
        let window = u16::from(r.read_byte());
        let len = r.read_byte();
        for (i, b) in r.read_bytes(len.into()).iter().enumerate() {
            for bit in 0..8 {
                if *b & (0x80u8 >> bit) != 0 {
                    types.push(Type::from(window << 8 | (i * 8 + bit) as u16));
                }
            }
        }
    }

    types
}

impl TXT {
    /// Returns each string, treating every byte as one character.
    pub fn strings(&self) -> Vec<String> {
        self.0.iter().map(|s| latin1(s)).collect()
    }
}

impl From<&str> for TXT {
    fn from(txt: &str) -> Self {
        TXT(vec![txt.as_bytes().to_vec()])
    }
}

impl From<&[&str]> for TXT {
    fn from(txts: &[&str]) -> Self {
        TXT(txts.iter().map(|txt| txt.as_bytes().to_vec()).collect())
    }
}

fn cmp_exchange(a_pref: u16, a: &str, b_pref: u16, b: &str) -> Ordering {
    a_pref
        .cmp(&b_pref)
        .then_with(|| a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
        .then_with(|| a.cmp(b))
}

impl Ord for MX {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_exchange(
            self.preference,
            &self.exchange,
            other.preference,
            &other.exchange,
        )
    }
}

impl PartialOrd for MX {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KX {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_exchange(
            self.preference,
            &self.exchanger,
            other.preference,
            &other.exchanger,
        )
    }
}

impl PartialOrd for KX {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
