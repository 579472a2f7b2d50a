use crate::errors::Result;
use crate::io::{DNSWriteExt, RecordReader};
use crate::resource::Resource;
use byteorder::{WriteBytesExt, BE};
use derivative::Derivative;
use std::cmp;
use std::io;
use std::time::Duration;
use strum_macros::EnumString;

/// Declares a wire enum: one unit variant per known code, and an `Unknown`
/// variant carrying any other code, so decoding never fails and encoding
/// is lossless.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty, $unknown:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumString)]
        #[allow(clippy::upper_case_acronyms)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*

            /// A code without a variant of its own.
            #[strum(disabled)]
            Unknown($repr),
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                match value {
                    $( $value => $name::$variant, )*
                    _ => $name::Unknown(value),
                }
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> Self {
                match value {
                    $( $name::$variant => $value, )*
                    $name::Unknown(value) => value,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                match self {
                    $( $name::$variant => f.pad(stringify!($variant)), )*
                    $name::Unknown(value) => f.pad(&format!(concat!($unknown, "{}"), value)),
                }
            }
        }
    };
}

wire_enum! {
    /// Specifies kind of query in this message. See [rfc1035], [rfc6895] and <https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-5>
    ///
    /// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
    /// [rfc6895]: https://datatracker.ietf.org/doc/html/rfc6895
    pub enum Opcode: u8, "OPCODE" {
        /// Query.
        Query = 0,

        /// Inverse Query (OBSOLETE). See [rfc3425].
        ///
        /// [rfc3425]: https://datatracker.ietf.org/doc/html/rfc3425
        IQuery = 1,
        Status = 2,

        /// See [rfc1996]
        ///
        /// [rfc1996]: https://datatracker.ietf.org/doc/html/rfc1996
        Notify = 4,

        /// See [rfc2136]
        ///
        /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
        Update = 5,

        /// DNS Stateful Operations (DSO). See [rfc8490]
        ///
        /// [rfc8490]: https://datatracker.ietf.org/doc/html/rfc8490
        DSO = 6,
    }
}

impl Default for Opcode {
    fn default() -> Self {
        Opcode::Query
    }
}

wire_enum! {
    /// Response Codes.
    /// See [rfc1035] and <https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-6>
    ///
    /// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
    pub enum Rcode: u8, "RCODE" {
        /// No Error
        NoError = 0,

        /// Format Error
        FormErr = 1,

        /// Server Failure
        ServFail = 2,

        /// Non-Existent Domain
        NXDomain = 3,

        /// Not Implemented
        NotImp = 4,

        /// Query Refused
        Refused = 5,

        /// Name Exists when it should not. See [rfc2136] and [rfc6672].
        ///
        /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
        /// [rfc6672]: https://datatracker.ietf.org/doc/html/rfc6672
        YXDomain = 6,

        /// RR Set Exists when it should not. See [rfc2136].
        ///
        /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
        YXRRSet = 7,

        /// RR Set that should exist does not. See [rfc2136].
        ///
        /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
        NXRRSet = 8,

        /// Either "Not Authoritative" [rfc2136] or "Not Authorized" [rfc2845].
        ///
        /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
        /// [rfc2845]: https://datatracker.ietf.org/doc/html/rfc2845
        NotAuth = 9,

        /// Name not contained in zone. See [rfc2136].
        ///
        /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
        NotZone = 10,

        /// DSO-TYPE Not Implemented. See [rfc8490].
        ///
        /// [rfc8490]: https://datatracker.ietf.org/doc/html/rfc8490
        DSOTYPENI = 11,
        // 12-15 Unassigned
    }
}

impl Default for Rcode {
    fn default() -> Self {
        Rcode::NoError
    }
}

wire_enum! {
    /// Resource Record Type, for example, A, CNAME or SOA. Also used as the
    /// QTYPE, which adds the transfer and wildcard codes.
    ///
    /// See <https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4>
    //
    // When adding a Type, a decoder must be added in resource.rs.
    pub enum Type: u16, "TYPE" {
        /// IPv4 Address.
        A = 1,
        NS = 2,
        MD = 3,
        MF = 4,
        CNAME = 5,
        SOA = 6,
        MB = 7,
        MG = 8,
        MR = 9,
        NULL = 10,
        WKS = 11,

        /// Domain name pointer.
        PTR = 12,
        HINFO = 13,
        MINFO = 14,

        /// Mail exchange.
        MX = 15,

        /// Text strings.
        TXT = 16,
        RP = 17,
        AFSDB = 18,
        X25 = 19,
        ISDN = 20,
        RT = 21,
        NSAP = 22,
        NSAPPTR = 23,
        SIG = 24,
        KEY = 25,
        PX = 26,
        GPOS = 27,

        /// IPv6 Address.
        AAAA = 28,
        LOC = 29,
        NXT = 30,
        EID = 31,
        NIMLOC = 32,

        /// Server Selection
        SRV = 33,
        ATMA = 34,
        NAPTR = 35,
        KX = 36,
        CERT = 37,
        A6 = 38,
        DNAME = 39,
        SINK = 40,

        /// EDNS(0) Opt type. See [rfc3225] and [rfc6891].
        ///
        /// [rfc3225]: https://datatracker.ietf.org/doc/html/rfc3225
        /// [rfc6891]: https://datatracker.ietf.org/doc/html/rfc6891
        OPT = 41,
        APL = 42,
        DS = 43,
        SSHFP = 44,
        IPSECKEY = 45,
        RRSIG = 46,
        NSEC = 47,
        DNSKEY = 48,
        DHCID = 49,
        NSEC3 = 50,
        NSEC3PARAM = 51,
        HIP = 55,
        SPF = 99,
        UINFO = 100,
        UID = 101,
        GID = 102,
        UNSPEC = 103,
        TKEY = 249,
        TSIG = 250,

        /// Incremental zone transfer. Only valid as a Question Type.
        IXFR = 251,

        /// Full zone transfer. Only valid as a Question Type.
        AXFR = 252,
        MAILB = 253,
        MAILA = 254,

        /// Any record type.
        /// Only valid as a Question Type.
        ANY = 255,
    }
}

impl Default for Type {
    fn default() -> Self {
        Type::A
    }
}

wire_enum! {
    /// Resource Record Class, for example Internet.
    pub enum Class: u16, "CLASS" {
        /// (Default) The Internet (IN), see [rfc1035].
        ///
        /// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
        IN = 1,

        /// CSNET (CS), obsolete (used only for examples in some obsolete RFCs).
        CS = 2,

        /// Chaosnet (CH), obsolete LAN protocol created at MIT in the mid-1970s.
        CH = 3,

        /// Hesiod (HS), an information service developed by MIT's Project Athena.
        HS = 4,

        /// See [rfc2136]
        ///
        /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
        NONE = 254,

        /// * (ANY) See [rfc1035]. Only valid as a Question Class.
        ///
        /// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
        ANY = 255,
    }
}

impl Default for Class {
    fn default() -> Self {
        Class::IN
    }
}

/// The section of a message a record was found in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

/// DNS Question. See [rfc1035#section-4.1.2].
///
/// [rfc1035#section-4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Question {
    // Always ends with a dot.
    name: String,
    pub r#type: Type,
    pub class: Class,
}

/// Appends the trailing dot if it is missing.
pub(crate) fn fully_qualify(name: &str) -> String {
    let mut name = name.to_string();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

impl Question {
    pub fn new(name: &str, r#type: Type, class: Class) -> Question {
        Question {
            name: fully_qualify(name),
            r#type,
            class,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = fully_qualify(name);
    }

    pub(crate) fn read(r: &mut RecordReader) -> Question {
        Question {
            name: r.read_domain_name(),
            r#type: r.read_u16().into(),
            class: r.read_u16().into(),
        }
    }

    pub(crate) fn write<W: io::Write>(&self, w: &mut W) -> Result<()> {
        w.write_qname(&self.name)?;
        w.write_u16::<BE>(self.r#type.into())?;
        w.write_u16::<BE>(self.class.into())?;
        Ok(())
    }
}

/// Resource Record (RR). See [rfc1035#section-4.1.3].
///
/// The record type is not stored, it is always the type of [`Record::resource`].
///
/// [rfc1035#section-4.1.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.3
#[derive(Derivative)]
#[derivative(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub class: Class,

    // As received.
    ttl: Duration,

    /// Length of the RDATA on the wire, as received.
    pub rdlength: u16,

    pub resource: Resource,

    /// How long this record has been held in a cache.
    #[derivative(PartialEq = "ignore")]
    pub time_lived: Duration,
}

impl Record {
    pub fn new(name: &str, class: Class, ttl: Duration, resource: Resource) -> Record {
        Record {
            name: fully_qualify(name),
            class,
            ttl: Duration::from_secs(ttl.as_secs()),
            rdlength: 0,
            resource,
            time_lived: Duration::ZERO,
        }
    }

    pub fn r#type(&self) -> Type {
        self.resource.r#type()
    }

    /// The number of seconds that the resource record may still be cached
    /// before the source of the information should again be consulted.
    ///
    /// This is the received TTL less [`Record::time_lived`], and never negative.
    pub fn ttl(&self) -> Duration {
        self.ttl.saturating_sub(self.time_lived)
    }

    /// The TTL as received, ignoring any time spent in a cache.
    pub fn original_ttl(&self) -> Duration {
        self.ttl
    }

    /// Reads one record. The reader always ends up exactly RDLENGTH bytes
    /// past the start of the RDATA (or at the end of the buffer).
    pub(crate) fn read(r: &mut RecordReader) -> Record {
        let name = r.read_domain_name();
        let r#type = Type::from(r.read_u16());
        let class = Class::from(r.read_u16());
        let ttl = Duration::from_secs(r.read_u32().into());
        let rdlength = r.read_u16();

        let start = r.position();
        let resource = Resource::read(r, r#type, rdlength);
        r.set_position(cmp::min(start + rdlength as usize, r.len()));

        Record {
            name,
            class,
            ttl,
            rdlength,
            resource,
            time_lived: Duration::ZERO,
        }
    }

    /// Writes the record with an uncompressed name and the received TTL.
    pub(crate) fn write<W: io::Write>(&self, w: &mut W) -> Result<()> {
        let mut rdata = Vec::new();
        self.resource.write(&mut rdata)?;

        w.write_qname(&self.name)?;
        w.write_u16::<BE>(self.r#type().into())?;
        w.write_u16::<BE>(self.class.into())?;
        w.write_u32::<BE>(cmp::min(self.ttl.as_secs(), u32::MAX.into()) as u32)?;
        w.write_u16::<BE>(rdata.len() as u16)?;
        w.write_all(&rdata)?;
        Ok(())
    }
}
