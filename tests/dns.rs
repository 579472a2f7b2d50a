use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use stubdns::{Rcode, Record, Response, Type};

const TEST_DATA_FILENAME: &str = "tests/test_data.yaml";

#[derive(Deserialize)]
struct TestCase {
    // Name of the test case.
    name: String,

    question: String,

    r#type: String,

    // Question, answer, authority and additional counts.
    counts: [usize; 4],

    // Record types, in order.
    answers: Vec<String>,
    additionals: Vec<String>,

    // Base64 encoded message.
    binary: String,
}

fn load() -> Vec<TestCase> {
    let s = fs::read(TEST_DATA_FILENAME).expect("failed read test input");
    serde_yaml::from_slice(&s).expect("failed to deserialise test input")
}

fn server() -> SocketAddr {
    "192.168.1.1:53".parse().unwrap()
}

fn decode(case: &TestCase) -> Vec<u8> {
    match base64::decode(&case.binary) {
        Err(e) => panic!("{}: Invalid test case input: {}", case.name, e),
        Ok(i) => i,
    }
}

fn types(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.r#type().to_string()).collect()
}

#[test]
fn tests() {
    for case in load() {
        test_from_slice(&case);
        test_to_vec(&case);
        test_truncated(&case);
    }
}

fn test_from_slice(case: &TestCase) {
    let input = decode(case);
    let m = Response::from_slice(server(), &input);

    assert!(m.error.is_empty(), "{}: unexpected error", case.name);
    assert_eq!(m.header.rcode(), Rcode::NoError, "{}", case.name);
    assert_eq!(m.message_size, input.len(), "{}", case.name);

    let got = [
        m.questions.len(),
        m.answers.len(),
        m.authorities.len(),
        m.additionals.len(),
    ];
    assert_eq!(got, case.counts, "{}: section lengths", case.name);

    let header = [
        m.header.question_count,
        m.header.answer_count,
        m.header.authority_count,
        m.header.additional_count,
    ]
    .map(usize::from);
    assert_eq!(header, case.counts, "{}: header counts", case.name);

    assert_eq!(m.questions[0].name(), case.question, "{}", case.name);
    assert_eq!(
        m.questions[0].r#type,
        Type::from_str(&case.r#type).unwrap(),
        "{}",
        case.name
    );

    assert_eq!(types(&m.answers), case.answers, "{}: answer types", case.name);
    assert_eq!(
        types(&m.additionals),
        case.additionals,
        "{}: additional types",
        case.name
    );

    let display = format!("{}", m);
    assert!(display.contains(";; QUESTION SECTION:"), "{}", case.name);
    assert!(display.contains(";; ANSWER SECTION:"), "{}", case.name);
    assert!(display.contains(&format!(";; MSG SIZE rcvd: {}", input.len())));
}

// Names are written uncompressed, so only compare what the records say.
fn test_to_vec(case: &TestCase) {
    let m = Response::from_slice(server(), &decode(case));
    let again = Response::from_slice(server(), &m.to_vec().unwrap());

    assert_eq!(again.header, m.header, "{}", case.name);
    assert_eq!(again.questions, m.questions, "{}", case.name);

    let summary = |m: &Response| -> Vec<String> {
        m.records()
            .map(|(section, r)| format!("{:?} {} {:?}", section, r.name, r.resource))
            .collect()
    };
    assert_eq!(summary(&again), summary(&m), "{}", case.name);
}

fn test_truncated(case: &TestCase) {
    let input = decode(case);
    for len in (0..input.len()).step_by(7) {
        let m = Response::from_slice(server(), &input[..len]);
        if len >= 12 {
            assert_eq!(m.questions.len(), case.counts[0], "{}: at {}", case.name, len);
            assert_eq!(m.answers.len(), case.counts[1], "{}: at {}", case.name, len);
        }
    }
}

/// Mixed sections with a chain of compressed names.
#[test]
fn test_compressed_sections() {
    let input: Vec<u8> = [
        &[0x00, 0x07, 0x84, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00][..],
        // Question: mx.example.org. MX IN
        &b"\x02mx\x07example\x03org\x00\x00\x0f\x00\x01"[..],
        // Answer: ptr to mx.example.org., MX 10 mail.(ptr to example.org.)
        &b"\xc0\x0c\x00\x0f\x00\x01\x00\x00\x0e\x10\x00\x09\x00\x0a\x04mail\xc0\x0f"[..],
        // Authority: ptr to example.org., NS ns1.(ptr to example.org.)
        &b"\xc0\x0f\x00\x02\x00\x01\x00\x00\x0e\x10\x00\x06\x03ns1\xc0\x0f"[..],
    ]
    .concat();

    let m = Response::from_slice(server(), &input);
    assert_eq!(m.questions[0].name(), "mx.example.org.");
    assert_eq!(m.answers[0].name, "mx.example.org.");
    assert_eq!(m.answers[0].resource.to_string(), "10 mail.example.org.");
    assert_eq!(m.authorities[0].name, "example.org.");
    assert_eq!(m.authorities[0].resource.to_string(), "ns1.example.org.");
    assert_eq!(m.answers[0].ttl().as_secs(), 3600);
}

/// A question name of long labels that points back at itself, reused by every answer.
#[test]
fn test_looping_names_stay_bounded() {
    let answers: u16 = 500;

    let mut input = vec![0x12, 0x34, 0x84, 0x00, 0x00, 0x01];
    input.extend_from_slice(&answers.to_be_bytes());
    input.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    for _ in 0..200 {
        input.push(63);
        input.extend_from_slice(&[b'x'; 63]);
    }
    input.extend_from_slice(b"\xc0\x0c\x00\x01\x00\x01");
    for _ in 0..answers {
        // Name, A, IN, TTL 60, 4 bytes of address.
        input.extend_from_slice(b"\xc0\x0c\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x04\xc0\x00\x02\x01");
    }

    let m = Response::from_slice(server(), &input);
    assert!(m.questions[0].name().len() <= stubdns::io::MAX_NAME_LEN);
    assert_eq!(m.answers.len(), usize::from(answers));
    for answer in &m.answers {
        assert!(answer.name.len() <= stubdns::io::MAX_NAME_LEN);
        assert_eq!(answer.resource.to_string(), "192.0.2.1");
    }
}
