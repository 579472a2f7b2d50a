//! Parses the presentation (zone file) form that `Display` prints, for the
//! record types where that form is unambiguous.

use crate::resource::{Resource, AFSDB, KX, MINFO, MX, RP, RT, SOA, SRV, TXT};
use crate::types::Type;
use core::num::ParseIntError;
use core::str::{FromStr, SplitWhitespace};
use regex::Regex;
use std::net::AddrParseError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FromStrError {
    #[error("{0} records can't be parsed from text")]
    UnsupportedType(Type),

    #[error("expected {0}")]
    InvalidFormat(&'static str),

    #[error(transparent)]
    ParseIntError(#[from] ParseIntError),

    #[error(transparent)]
    AddrParseError(#[from] AddrParseError),
}

impl Resource {
    /// Parses `s` as the RDATA of a `r#type` record.
    ///
    /// Needs the type, as the same text can be valid for several of them.
    pub fn from_str(r#type: Type, s: &str) -> Result<Self, FromStrError> {
        let s = s.trim();
        Ok(match r#type {
            Type::A => Resource::A(s.parse()?),
            Type::AAAA => Resource::AAAA(s.parse()?),

            Type::NS => Resource::NS(name(s)?),
            Type::MD => Resource::MD(name(s)?),
            Type::MF => Resource::MF(name(s)?),
            Type::CNAME => Resource::CNAME(name(s)?),
            Type::MB => Resource::MB(name(s)?),
            Type::MG => Resource::MG(name(s)?),
            Type::MR => Resource::MR(name(s)?),
            Type::PTR => Resource::PTR(name(s)?),
            Type::NSAPPTR => Resource::NSAPPTR(name(s)?),
            Type::DNAME => Resource::DNAME(name(s)?),

            Type::SOA => Resource::SOA(s.parse()?),
            Type::MINFO => Resource::MINFO(s.parse()?),
            Type::MX => Resource::MX(s.parse()?),
            Type::RP => Resource::RP(s.parse()?),
            Type::AFSDB => Resource::AFSDB(s.parse()?),
            Type::RT => Resource::RT(s.parse()?),
            Type::KX => Resource::KX(s.parse()?),
            Type::SRV => Resource::SRV(s.parse()?),
            Type::TXT => Resource::TXT(s.parse()?),
            Type::SPF => Resource::SPF(s.parse()?),

            _ => return Err(FromStrError::UnsupportedType(r#type)),
        })
    }
}

/// A single domain name, with nothing after it.
fn name(s: &str) -> Result<String, FromStrError> {
    let mut fields = Fields::new(s, "a domain name");
    let name = fields.next_str()?;
    fields.finish()?;
    Ok(name)
}

/// Whitespace separated fields, erroring with `expected` when there are too
/// few or too many.
struct Fields<'a> {
    iter: SplitWhitespace<'a>,
    expected: &'static str,
}

impl<'a> Fields<'a> {
    fn new(s: &'a str, expected: &'static str) -> Fields<'a> {
        Fields {
            iter: s.split_whitespace(),
            expected,
        }
    }

    fn next_str(&mut self) -> Result<String, FromStrError> {
        match self.iter.next() {
            Some(field) => Ok(field.to_string()),
            None => Err(FromStrError::InvalidFormat(self.expected)),
        }
    }

    fn next<T>(&mut self) -> Result<T, FromStrError>
    where
        T: FromStr,
        FromStrError: From<T::Err>,
    {
        match self.iter.next() {
            Some(field) => Ok(field.parse()?),
            None => Err(FromStrError::InvalidFormat(self.expected)),
        }
    }

    fn next_secs(&mut self) -> Result<Duration, FromStrError> {
        Ok(Duration::from_secs(self.next::<u32>()?.into()))
    }

    fn finish(mut self) -> Result<(), FromStrError> {
        match self.iter.next() {
            Some(_) => Err(FromStrError::InvalidFormat(self.expected)),
            None => Ok(()),
        }
    }
}

impl FromStr for SOA {
    type Err = FromStrError;

    /// `ns1.google.com. dns-admin.google.com. 376337657 900 900 1800 60`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields::new(
            s,
            "mname rname serial refresh retry expire minimum",
        );
        let soa = SOA {
            mname: fields.next_str()?,
            rname: fields.next_str()?,
            serial: fields.next()?,
            refresh: fields.next_secs()?,
            retry: fields.next_secs()?,
            expire: fields.next_secs()?,
            minimum: fields.next_secs()?,
        };
        fields.finish()?;
        Ok(soa)
    }
}

/// Implements FromStr for a record of a number followed by a domain name.
macro_rules! number_and_name {
    ($type:ident, $number:ident, $name:ident) => {
        impl FromStr for $type {
            type Err = FromStrError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut fields = Fields::new(s, concat!(stringify!($number), " ", stringify!($name)));
                let record = $type {
                    $number: fields.next()?,
                    $name: fields.next_str()?,
                };
                fields.finish()?;
                Ok(record)
            }
        }
    };
}

number_and_name!(MX, preference, exchange);
number_and_name!(KX, preference, exchanger);
number_and_name!(RT, preference, intermediate);
number_and_name!(AFSDB, subtype, hostname);

impl FromStr for MINFO {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields::new(s, "rmailbx emailbx");
        let minfo = MINFO {
            rmailbx: fields.next_str()?,
            emailbx: fields.next_str()?,
        };
        fields.finish()?;
        Ok(minfo)
    }
}

impl FromStr for RP {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields::new(s, "mbox txt");
        let rp = RP {
            mbox: fields.next_str()?,
            txt: fields.next_str()?,
        };
        fields.finish()?;
        Ok(rp)
    }
}

impl FromStr for SRV {
    type Err = FromStrError;

    /// `5 0 389 ldap.google.com.`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields::new(s, "priority weight port target");
        let srv = SRV {
            priority: fields.next()?,
            weight: fields.next()?,
            port: fields.next()?,
            name: fields.next_str()?,
        };
        fields.finish()?;
        Ok(srv)
    }
}

impl FromStr for TXT {
    type Err = FromStrError;

    /// One or more double quoted strings, where `\"` and `\\` are escapes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref QUOTED: Regex = Regex::new(r#"\s*"((?:[^"\\]|\\.)*)"\s*"#).unwrap();
            static ref ESCAPE: Regex = Regex::new(r"\\(.)").unwrap();
        }

        // Every byte must belong to a quoted string.
        let mut end = 0;
        let mut strings = Vec::new();
        for caps in QUOTED.captures_iter(s) {
            let m = caps.get(0).map_or(0..0, |m| m.start()..m.end());
            if m.start != end {
                return Err(FromStrError::InvalidFormat("quoted strings"));
            }
            end = m.end;
            strings.push(ESCAPE.replace_all(&caps[1], "$1").as_bytes().to_vec());
        }

        if strings.is_empty() || end != s.len() {
            return Err(FromStrError::InvalidFormat("quoted strings"));
        }

        Ok(TXT(strings))
    }
}
