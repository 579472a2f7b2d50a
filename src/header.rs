//! The fixed 12 byte message header. See [rfc1035#section-4.1.1].
//!
//! [rfc1035#section-4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1

use crate::io::RecordReader;
use crate::types::{Opcode, Rcode};
use byteorder::{WriteBytesExt, BE};
use std::io;

/// The header of every DNS message.
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// 16-bit identifier assigned by the program that generates any kind of
    /// query. This identifier is copied into the corresponding reply.
    pub id: u16,

    flags: u16,

    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

/// Size of the header on the wire.
pub const HEADER_LEN: usize = 12;

/// Extracts `length` bits of `value` starting at bit `position` (0 is the
/// least significant bit).
///
/// Spans with a zero length, or starting outside the word, read as 0.
pub fn get_bits(value: u16, position: u32, length: u32) -> u16 {
    if length == 0 || position >= 16 {
        return 0;
    }
    let mask = mask(length);
    (value >> position) & mask
}

/// Returns `value` with `length` bits starting at `position` replaced by
/// `new`. Bits outside the span are left untouched.
pub fn set_bits(value: u16, position: u32, length: u32, new: u16) -> u16 {
    if length == 0 || position >= 16 {
        return value;
    }
    let mask = mask(length).checked_shl(position).unwrap_or(0);
    (value & !mask) | ((new << position) & mask)
}

fn mask(length: u32) -> u16 {
    if length >= 16 {
        u16::MAX
    } else {
        (1 << length) - 1
    }
}

macro_rules! flag {
    ($get:ident, $set:ident, $position:expr, $doc:expr) => {
        #[doc = $doc]
        pub fn $get(&self) -> bool {
            get_bits(self.flags, $position, 1) == 1
        }

        pub fn $set(&mut self, value: bool) {
            self.flags = set_bits(self.flags, $position, 1, value as u16);
        }
    };
}

impl Header {
    pub fn new(id: u16) -> Header {
        Header {
            id,
            ..Default::default()
        }
    }

    /// Reads the header from the start of the message.
    pub fn read(r: &mut RecordReader) -> Header {
        Header {
            id: r.read_u16(),
            flags: r.read_u16(),
            question_count: r.read_u16(),
            answer_count: r.read_u16(),
            authority_count: r.read_u16(),
            additional_count: r.read_u16(),
        }
    }

    pub fn write<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<BE>(self.id)?;
        w.write_u16::<BE>(self.flags)?;
        w.write_u16::<BE>(self.question_count)?;
        w.write_u16::<BE>(self.answer_count)?;
        w.write_u16::<BE>(self.authority_count)?;
        w.write_u16::<BE>(self.additional_count)
    }

    /// The raw flags word (everything between ID and QDCOUNT).
    pub fn flags(&self) -> u16 {
        self.flags
    }

    flag!(qr, set_qr, 15, "Query (false) or Response (true).");
    flag!(aa, set_aa, 10, "Authoritative Answer.");
    flag!(tc, set_tc, 9, "TrunCation, the message was longer than the transport allowed.");
    flag!(rd, set_rd, 8, "Recursion Desired.");
    flag!(ra, set_ra, 7, "Recursion Available.");

    pub fn opcode(&self) -> Opcode {
        Opcode::from(get_bits(self.flags, 11, 4) as u8)
    }

    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.flags = set_bits(self.flags, 11, 4, u8::from(opcode).into());
    }

    /// Reserved bits. Must be zero in all queries and responses.
    pub fn z(&self) -> u8 {
        get_bits(self.flags, 4, 3) as u8
    }

    pub fn set_z(&mut self, z: u8) {
        self.flags = set_bits(self.flags, 4, 3, z.into());
    }

    pub fn rcode(&self) -> Rcode {
        Rcode::from(get_bits(self.flags, 0, 4) as u8)
    }

    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.flags = set_bits(self.flags, 0, 4, u8::from(rcode).into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_set_bits() {
        assert_eq!(get_bits(0b1011_0000, 4, 4), 0b1011);
        assert_eq!(set_bits(0xFFFF, 4, 4, 0), 0xFF0F);
        assert_eq!(set_bits(0, 15, 1, 1), 0x8000);

        // Out of range spans are ignored.
        assert_eq!(get_bits(0xFFFF, 16, 1), 0);
        assert_eq!(get_bits(0xFFFF, 3, 0), 0);
        assert_eq!(set_bits(0x1234, 16, 4, 0xF), 0x1234);
        assert_eq!(set_bits(0x1234, 0, 0, 0xF), 0x1234);
    }

    const FLAGS: [(&str, u16); 5] = [
        ("qr", 0x8000),
        ("aa", 0x0400),
        ("tc", 0x0200),
        ("rd", 0x0100),
        ("ra", 0x0080),
    ];

    fn set_flag(h: &mut Header, name: &str, value: bool) {
        match name {
            "qr" => h.set_qr(value),
            "aa" => h.set_aa(value),
            "tc" => h.set_tc(value),
            "rd" => h.set_rd(value),
            "ra" => h.set_ra(value),
            _ => unreachable!(),
        }
    }

    fn get_flag(h: &Header, name: &str) -> bool {
        match name {
            "qr" => h.qr(),
            "aa" => h.aa(),
            "tc" => h.tc(),
            "rd" => h.rd(),
            "ra" => h.ra(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_flags_are_independent() {
        for (name, bit) in FLAGS {
            let mut h = Header::default();
            set_flag(&mut h, name, true);
            assert!(get_flag(&h, name), "{} should be set", name);
            assert_eq!(h.flags(), bit, "{} set the wrong bit", name);

            // All other flags set, then clear just this one.
            let mut h = Header::default();
            for (other, _) in FLAGS {
                set_flag(&mut h, other, true);
            }
            h.set_rcode(Rcode::Refused);
            h.set_opcode(Opcode::Status);
            set_flag(&mut h, name, false);

            assert!(!get_flag(&h, name), "{} should be clear", name);
            for (other, _) in FLAGS {
                if other != name {
                    assert!(get_flag(&h, other), "clearing {} disturbed {}", name, other);
                }
            }
            assert_eq!(h.rcode(), Rcode::Refused);
            assert_eq!(h.opcode(), Opcode::Status);
        }
    }

    #[test]
    fn test_fields() {
        let mut h = Header::default();
        h.set_opcode(Opcode::Update);
        assert_eq!(h.opcode(), Opcode::Update);
        assert_eq!(h.flags(), 5 << 11);

        h.set_rcode(Rcode::NXDomain);
        assert_eq!(h.rcode(), Rcode::NXDomain);
        assert_eq!(h.opcode(), Opcode::Update);

        h.set_z(0b101);
        assert_eq!(h.z(), 0b101);
        assert_eq!(h.rcode(), Rcode::NXDomain);

        h.set_rcode(Rcode::Unknown(15));
        assert_eq!(h.rcode(), Rcode::Unknown(15));
        assert_eq!(h.z(), 0b101);
    }

    #[test]
    fn test_round_trip() {
        let mut h = Header::new(0xBEEF);
        h.set_qr(true);
        h.set_rd(true);
        h.set_ra(true);
        h.set_rcode(Rcode::ServFail);
        h.question_count = 1;
        h.answer_count = 2;
        h.authority_count = 3;
        h.additional_count = 4;

        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(&buf[..4], &[0xBE, 0xEF, 0x81, 0x82]);

        let got = Header::read(&mut RecordReader::new(&buf));
        assert_eq!(got, h);
    }

    #[test]
    fn test_truncated() {
        let got = Header::read(&mut RecordReader::new(&[0x12, 0x34, 0x80]));
        assert_eq!(got.id, 0x1234);
        assert!(got.qr());
        assert_eq!(got.question_count, 0);
    }
}
