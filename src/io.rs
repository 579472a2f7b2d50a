//! Byte level helpers for reading and writing DNS messages.
//!
//! Reading is deliberately lenient: any read past the end of the buffer
//! yields zero bytes instead of an error. A truncated message therefore
//! decodes into a structurally complete (but wrong) value, and callers are
//! expected to cross check the section counts and the response code.

use crate::errors::Error;
use byteorder::{ByteOrder, WriteBytesExt, BE};
use std::cmp;
use std::io;

/// Maximum number of compression pointers followed while reading one name.
pub const MAX_POINTER_JUMPS: usize = 64;

/// Longest encoded domain name allowed by [rfc1035#section-2.3.4].
///
/// [rfc1035#section-2.3.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-2.3.4
pub const MAX_NAME_LEN: usize = 255;

/// Longest label allowed by [rfc1035#section-2.3.4].
///
/// [rfc1035#section-2.3.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-2.3.4
pub const MAX_LABEL_LEN: usize = 63;

/// A sequential read cursor over a complete DNS message.
///
/// The cursor keeps a reference to the whole message (not just the part
/// being read) so compression pointers can be resolved.
#[derive(Clone, Debug)]
pub struct RecordReader<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_position(buf, 0)
    }

    /// Creates a reader starting at `position` (clamped to the buffer length).
    pub fn with_position(buf: &'a [u8], position: usize) -> Self {
        RecordReader {
            buf,
            position: cmp::min(position, buf.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor, clamped to the buffer length.
    pub fn set_position(&mut self, position: usize) {
        self.position = cmp::min(position, self.buf.len());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the number of bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    /// Reads a single byte, or 0 once the end of the buffer has been reached.
    pub fn read_byte(&mut self) -> u8 {
        match self.buf.get(self.position) {
            Some(b) => {
                self.position += 1;
                *b
            }
            None => 0,
        }
    }

    pub fn read_char(&mut self) -> char {
        self.read_byte() as char
    }

    pub fn read_u16(&mut self) -> u16 {
        BE::read_u16(&self.read_span(2))
    }

    pub fn read_u32(&mut self) -> u32 {
        BE::read_u32(&self.read_span(4))
    }

    /// Reads `len` bytes. Bytes past the end of the buffer are returned as zero.
    pub fn read_bytes(&mut self, len: usize) -> Vec<u8> {
        self.read_span(len)
    }

    /// Same as [`RecordReader::read_bytes`] but for a fixed size array.
    pub fn read_array<const N: usize>(&mut self) -> [u8; N] {
        let mut array = [0; N];
        array.copy_from_slice(&self.read_span(N));
        array
    }

    fn read_span(&mut self, len: usize) -> Vec<u8> {
        let start = self.position;
        let end = cmp::min(start.saturating_add(len), self.buf.len());

        let mut span = Vec::with_capacity(len);
        span.extend_from_slice(&self.buf[start..end]);
        span.resize(len, 0);

        self.position = end;
        span
    }

    /// Reads all bytes from the current position up to the absolute offset `end`.
    pub fn read_to(&mut self, end: usize) -> Vec<u8> {
        let len = end.saturating_sub(self.position);
        self.read_bytes(len)
    }

    /// Reads a `<character-string>`: one length octet followed by that many bytes.
    pub fn read_character_string(&mut self) -> Vec<u8> {
        let len = self.read_byte();
        self.read_bytes(len.into())
    }

    /// Reads a `<character-string>` as text.
    pub fn read_string(&mut self) -> String {
        latin1(&self.read_character_string())
    }

    /// Steps back over the RDLENGTH field that was just read, and reads it again.
    ///
    /// The record header has already consumed RDLENGTH by the time a RDATA
    /// decoder runs. Decoders whose layout depends on it use this instead of
    /// having it passed along.
    pub fn reread_rdlength(&mut self) -> u16 {
        self.position = self.position.saturating_sub(2);
        self.read_u16()
    }

    /// Reads a (possibly compressed) domain name. See [rfc1035#section-4.1.4].
    ///
    /// The result is always dot terminated, and the root is returned as `"."`.
    /// Compression pointers are only followed when they point strictly before
    /// the pointer itself and before the previous pointer's target, and at
    /// most [`MAX_POINTER_JUMPS`] times. A pointer that breaks either rule
    /// ends the name at that point. Labels that would take the name past
    /// [`MAX_NAME_LEN`] are skipped.
    ///
    /// [rfc1035#section-4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
    pub fn read_domain_name(&mut self) -> String {
        let mut name = String::new();

        // Cursor that follows the pointers. Self only moves past the first one.
        let mut cur = self.clone();
        let mut jumps = 0;
        let mut jumped = false;
        let mut target = usize::MAX;
        let mut full = false;

        loop {
            let at = cur.position;
            let len = cur.read_byte();
            if len == 0 {
                break;
            }

            if len & 0xC0 == 0xC0 {
                let ptr = ((len as usize & 0x3F) << 8) | cur.read_byte() as usize;

                if !jumped {
                    self.position = cur.position;
                    jumped = true;
                }

                // Targets must keep decreasing, so the reader can never cycle.
                jumps += 1;
                if full || ptr >= at || ptr >= target || jumps > MAX_POINTER_JUMPS {
                    break;
                }

                target = ptr;
                cur.position = ptr;
                continue;
            }

            if full {
                if jumped {
                    break;
                }
                // Still step over the labels, so the record after the name lines up.
                cur.position = cmp::min(cur.position + len as usize, cur.buf.len());
                continue;
            }

            let label: String = (0..len).map(|_| cur.read_char()).collect();
            if name.len() + label.len() + 1 > MAX_NAME_LEN {
                full = true;
                continue;
            }

            name.push_str(&label);
            name.push('.');
        }

        if !jumped {
            self.position = cur.position;
        }

        if name.is_empty() {
            name.push('.'); // Root domain
        }

        name
    }
}

/// Maps each byte to the char with the same code point.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// All types that implement `Write` get methods defined in `DNSWriteExt` for free.
impl<W: io::Write + ?Sized> DNSWriteExt for W {}

/// Extensions to io::Write to add some DNS specific types.
pub trait DNSWriteExt: io::Write {
    /// Writes a domain name without compression.
    ///
    /// The name may or may not end with a dot; `""` and `"."` are the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] for empty, non-ASCII or overlong labels,
    /// or when the encoded name would be longer than [`MAX_NAME_LEN`].
    fn write_qname(&mut self, domain: &str) -> Result<(), Error> {
        let invalid = |reason| Error::InvalidName {
            name: domain.to_string(),
            reason,
        };

        let mut encoded = Vec::with_capacity(domain.len() + 2);

        if !domain.is_empty() && domain != "." {
            for label in domain.split_terminator('.') {
                if label.is_empty() {
                    return Err(invalid("empty label"));
                }
                if !label.is_ascii() {
                    return Err(invalid("label is not ascii"));
                }
                if label.len() > MAX_LABEL_LEN {
                    return Err(invalid("label longer than 63 characters"));
                }

                encoded.push(label.len() as u8);
                encoded.extend_from_slice(label.as_bytes());
            }
        }
        encoded.push(0);

        if encoded.len() > MAX_NAME_LEN {
            return Err(invalid("name longer than 255 bytes"));
        }

        self.write_all(&encoded)?;
        Ok(())
    }

    /// Writes a `<character-string>`. Strings longer than 255 bytes are truncated.
    fn write_character_string(&mut self, s: &[u8]) -> io::Result<()> {
        let len = cmp::min(s.len(), u8::MAX as usize);
        self.write_u8(len as u8)?;
        self.write_all(&s[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_byte() {
        let tests: Vec<(&[u8], usize, u8)> = vec![
            (&[1], 0, 1),
            (&[1, 2, 3], 2, 3),
            (&[1], 1, 0),
            (&[], 0, 0),
        ];

        for (input, position, want) in tests {
            let mut r = RecordReader::with_position(input, position);
            assert_eq!(r.read_byte(), want, "read_byte({:?}) at {}", input, position);
        }
    }

    #[test]
    fn test_read_byte_past_end_does_not_advance() {
        let mut r = RecordReader::new(&[7]);
        assert_eq!(r.read_byte(), 7);
        assert_eq!(r.read_byte(), 0);
        assert_eq!(r.read_byte(), 0);
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn test_read_integers() {
        assert_eq!(RecordReader::new(&[0, 0]).read_u16(), 0);
        assert_eq!(RecordReader::new(&[1, 2]).read_u16(), 258);
        assert_eq!(RecordReader::new(&[1]).read_u16(), 256);
        assert_eq!(RecordReader::new(&[1, 2, 3, 4]).read_u32(), 16909060);
        assert_eq!(RecordReader::new(&[0, 0, 0, 0]).read_u32(), 0);
    }

    #[test]
    fn test_read_string() {
        assert_eq!(RecordReader::new(&[3, 65, 66, 67]).read_string(), "ABC");
        assert_eq!(RecordReader::new(&[65]).read_char(), 'A');
    }

    #[test]
    fn test_read_bytes() {
        let input = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let tests: Vec<(usize, usize, Vec<u8>, usize)> = vec![
            (0, 3, vec![0, 1, 2], 3),
            (3, 3, vec![3, 4, 5], 6),
            (8, 5, vec![8, 9, 0, 0, 0], 10),
        ];

        for (position, len, want, want_position) in tests {
            let mut r = RecordReader::with_position(&input, position);
            assert_eq!(r.read_bytes(len), want);
            assert_eq!(r.position(), want_position);
        }
    }

    #[test]
    fn test_reread_rdlength() {
        let mut r = RecordReader::with_position(&[0, 5, 0xff], 2);
        assert_eq!(r.reread_rdlength(), 5);
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn test_name_round_trip() {
        let names = ["example.com.", "a.b.c.d.", "SomeName.With.Dots.", "x-1_2.net.", "."];

        for name in names {
            let mut buf = Vec::new();
            buf.write_qname(name).unwrap();
            assert_eq!(RecordReader::new(&buf).read_domain_name(), name);
        }
    }

    #[test]
    fn test_write_qname() {
        let mut buf = Vec::new();
        buf.write_qname("bramp.net").unwrap();
        assert_eq!(buf, b"\x05bramp\x03net\x00");

        let mut buf = Vec::new();
        buf.write_qname(".").unwrap();
        assert_eq!(buf, vec![0]);
    }

    #[test]
    fn test_write_qname_invalid() {
        let long_label = "a".repeat(64) + ".com.";
        let long_name = vec!["abcdefghi"; 30].join(".");

        for name in ["a..com.", ".com", "ünicode.com.", long_label.as_str(), long_name.as_str()] {
            let mut buf = Vec::new();
            assert!(buf.write_qname(name).is_err(), "'{}' should not encode", name);
        }
    }

    #[test]
    fn test_read_compressed_name() {
        // Offset 0: "example.com." spelt out, offset 13: "www" + pointer to 0.
        let mut buf = Vec::new();
        buf.write_qname("example.com.").unwrap();
        buf.extend_from_slice(b"\x03www\xC0\x00");
        buf.push(0xAA); // Something after the name

        let mut r = RecordReader::new(&buf);
        assert_eq!(r.read_domain_name(), "example.com.");
        assert_eq!(r.position(), 13);

        assert_eq!(r.read_domain_name(), "www.example.com.");
        assert_eq!(r.position(), 19, "only the two pointer bytes are consumed");
        assert_eq!(r.read_byte(), 0xAA);
    }

    #[test]
    fn test_compressed_matches_uncompressed() {
        let mut compressed = Vec::new();
        compressed.write_qname("mail.example.org.").unwrap();
        compressed.extend_from_slice(b"\xC0\x00");

        let mut plain = Vec::new();
        plain.write_qname("mail.example.org.").unwrap();

        let mut r = RecordReader::with_position(&compressed, plain.len());
        assert_eq!(
            r.read_domain_name(),
            RecordReader::new(&plain).read_domain_name()
        );
    }

    #[test]
    fn test_self_pointer_terminates() {
        let buf = [0x03, b'f', b'o', b'o', 0xC0, 0x04];
        let mut r = RecordReader::new(&buf);
        assert_eq!(r.read_domain_name(), "foo.");
        assert_eq!(r.position(), 6);
    }

    #[test]
    fn test_forward_pointer_terminates() {
        let buf = [0xC0, 0x04, 0x00, 0x00, 0x03, b'b', b'a', b'r', 0x00];
        let mut r = RecordReader::new(&buf);
        assert_eq!(r.read_domain_name(), ".");
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn test_pointer_loop_terminates() {
        // Two pointers pointing at each other. Only the backwards one is followed.
        let buf = [0xC0, 0x02, 0xC0, 0x00];
        let mut r = RecordReader::with_position(&buf, 2);
        assert_eq!(r.read_domain_name(), ".");
        assert_eq!(r.position(), 4);
    }

    #[test]
    fn test_decreasing_pointer_targets() {
        // "ef" + pointer to "cd" + pointer to "ab": each target before the last.
        let buf = [
            0x02, b'a', b'b', 0x00, // 0
            0x02, b'c', b'd', 0xC0, 0x00, // 4
            0x02, b'e', b'f', 0xC0, 0x04, // 9
        ];
        let mut r = RecordReader::with_position(&buf, 9);
        assert_eq!(r.read_domain_name(), "ef.cd.ab.");
        assert_eq!(r.position(), buf.len());

        // A run ending in a pointer to its own start is read once more, not 64 times.
        let buf = [0x00, 0x01, b'x', 0xC0, 0x01, 0xC0, 0x03];
        let mut r = RecordReader::with_position(&buf, 5);
        assert_eq!(r.read_domain_name(), "x.");
    }

    #[test]
    fn test_self_looping_run_is_bounded() {
        // A message header's worth of padding, then 200 full labels ending in
        // a pointer back to the first of them.
        let mut buf = vec![0; 12];
        for _ in 0..200 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.extend_from_slice(&[0xC0, 0x0C]);
        let end = buf.len();

        // Names made only of a pointer into the run.
        buf.extend_from_slice(&[0xC0, 0x0C]);

        let mut r = RecordReader::with_position(&buf, 12);
        let name = r.read_domain_name();
        assert!(name.len() <= MAX_NAME_LEN, "name is {} bytes", name.len());
        assert_eq!(name, ("a".repeat(63) + ".").repeat(3));
        assert_eq!(r.position(), end, "the whole run is still consumed");

        let name = r.read_domain_name();
        assert!(name.len() <= MAX_NAME_LEN);
        assert_eq!(r.position(), buf.len());
    }

    #[test]
    fn test_truncated_name() {
        let buf = [0x07, b'e', b'x', b'a'];
        let mut r = RecordReader::new(&buf);
        assert_eq!(r.read_domain_name(), "exa\0\0\0\0.");
        assert_eq!(r.position(), 4);

        assert_eq!(RecordReader::new(&[]).read_domain_name(), ".");
    }
}
