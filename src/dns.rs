use crate::errors::Result;
use crate::header::Header;
use crate::io::RecordReader;
use crate::types::{Opcode, Question, Rcode, Record, Section, Type};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::SystemTime;

/// A query to be sent to a name server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub header: Header,
    pub questions: Vec<Question>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Creates a standard query with no questions.
    pub fn new() -> Request {
        let mut header = Header::default();
        header.set_opcode(Opcode::Query);

        Request {
            header,
            questions: Vec::new(),
        }
    }

    /// Appends a question, keeping the header's question count in step.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
        self.header.question_count = self.questions.len() as u16;
    }

    /// True when the first question asks for a zone transfer.
    pub fn is_zone_transfer(&self) -> bool {
        matches!(self.questions.first(), Some(q) if q.r#type == Type::AXFR)
    }

    /// Encodes this request into wire format.
    ///
    /// The question count is always taken from `questions`, whatever the
    /// header currently says.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.question_count = self.questions.len() as u16;
        header.answer_count = 0;
        header.authority_count = 0;
        header.additional_count = 0;

        let mut buf = Vec::with_capacity(512);
        header.write(&mut buf)?;
        for question in &self.questions {
            question.write(&mut buf)?;
        }

        Ok(buf)
    }
}

/// A reply from a name server, or the outcome of a query that could not get one.
///
/// Decoding never fails. When no reply could be obtained `error` holds the
/// reason and every other field is empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub header: Header,

    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,

    /// Empty on success.
    pub error: String,

    /// Number of bytes received. Summed across messages for zone transfers.
    pub message_size: usize,

    /// When the response was received.
    pub timestamp: SystemTime,

    /// The server that sent it.
    pub server: SocketAddr,
}

impl Default for Response {
    fn default() -> Self {
        Response {
            header: Header::default(),
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
            error: String::new(),
            message_size: 0,
            timestamp: SystemTime::now(),
            server: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        }
    }
}

// A helper class to hold state while the parsing is happening.
struct MessageParser<'a> {
    r: RecordReader<'a>,
    m: Response,
}

impl<'a> MessageParser<'a> {
    fn new(server: SocketAddr, buf: &'a [u8]) -> MessageParser<'a> {
        MessageParser {
            r: RecordReader::new(buf),
            m: Response {
                message_size: buf.len(),
                server,
                ..Default::default()
            },
        }
    }

    /// Consume the MessageParser and returned the resulting Response.
    fn parse(mut self) -> Response {
        self.m.header = Header::read(&mut self.r);

        let qd_count = self.m.header.question_count;
        let an_count = self.m.header.answer_count;
        let ns_count = self.m.header.authority_count;
        let ar_count = self.m.header.additional_count;

        // Wire order, which must not change.
        self.read_questions(qd_count);
        self.read_records(an_count, Section::Answer);
        self.read_records(ns_count, Section::Authority);
        self.read_records(ar_count, Section::Additional);

        if self.r.remaining() > 0 {
            log::debug!(
                "finished parsing reply from {} with {} bytes left over",
                self.m.server,
                self.r.remaining()
            );
        }

        self.m
    }

    /// Limits up front allocation, as counts come straight off the wire.
    fn capacity(&self, count: u16) -> usize {
        usize::from(count).min(self.r.remaining())
    }

    fn read_questions(&mut self, count: u16) {
        self.m.questions.reserve_exact(self.capacity(count));

        for _ in 0..count {
            let question = Question::read(&mut self.r);
            self.m.questions.push(question);
        }
    }

    fn read_records(&mut self, count: u16, section: Section) {
        let capacity = self.capacity(count);
        let records = match section {
            Section::Answer => &mut self.m.answers,
            Section::Authority => &mut self.m.authorities,
            Section::Additional => &mut self.m.additionals,
        };
        records.reserve_exact(capacity);

        for _ in 0..count {
            records.push(Record::read(&mut self.r));
        }
    }
}

impl Response {
    /// Decodes a reply received from `server`.
    pub fn from_slice(server: SocketAddr, buf: &[u8]) -> Response {
        MessageParser::new(server, buf).parse()
    }

    /// A response carrying only an error.
    pub fn failed(error: impl Into<String>) -> Response {
        Response {
            error: error.into(),
            ..Default::default()
        }
    }

    /// True if a reply was received and its RCODE is NoError.
    pub fn is_ok(&self) -> bool {
        self.error.is_empty() && self.header.rcode() == Rcode::NoError
    }

    /// All records, in wire order, with the section they came from.
    pub fn records(&self) -> impl Iterator<Item = (Section, &Record)> {
        let answers = self.answers.iter().map(|r| (Section::Answer, r));
        let authorities = self.authorities.iter().map(|r| (Section::Authority, r));
        let additionals = self.additionals.iter().map(|r| (Section::Additional, r));

        answers.chain(authorities).chain(additionals)
    }

    /// The answers of the given type.
    pub fn answers_of_type(&self, r#type: Type) -> impl Iterator<Item = &Record> {
        self.answers.iter().filter(move |r| r.r#type() == r#type)
    }

    /// Sets each header count to the length of its section.
    pub(crate) fn update_counts(&mut self) {
        self.header.question_count = self.questions.len() as u16;
        self.header.answer_count = self.answers.len() as u16;
        self.header.authority_count = self.authorities.len() as u16;
        self.header.additional_count = self.additionals.len() as u16;
    }

    /// Encodes this response into wire format, without name compression.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.question_count = self.questions.len() as u16;
        header.answer_count = self.answers.len() as u16;
        header.authority_count = self.authorities.len() as u16;
        header.additional_count = self.additionals.len() as u16;

        let mut buf = Vec::with_capacity(512);
        header.write(&mut buf)?;
        for question in &self.questions {
            question.write(&mut buf)?;
        }
        for (_, record) in self.records() {
            record.write(&mut buf)?;
        }

        Ok(buf)
    }
}
