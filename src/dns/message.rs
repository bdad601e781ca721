//! DNS wire format
//!
//! Builds single-question queries and parses responses, including name
//! compression pointers.

use crate::{DnsError, DnsResult};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Record type for IPv4 host addresses
pub const TYPE_A: u16 = 1;

/// Record type for IPv6 host addresses
pub const TYPE_AAAA: u16 = 28;

/// The Internet class
pub const CLASS_IN: u16 = 1;

const HEADER_LEN: usize = 12;
const MAX_LABEL_LEN: usize = 63;
const MAX_POINTER_HOPS: usize = 10;
const POINTER_MASK: u8 = 0xC0;

/// Header flags of a DNS message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub is_response: bool,
    pub opcode: u8,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub response_code: u8,
}

impl Flags {
    fn from_bits(bits: u16) -> Self {
        Self {
            is_response: bits & 0x8000 != 0,
            opcode: ((bits >> 11) & 0x0F) as u8,
            recursion_desired: bits & 0x0100 != 0,
            recursion_available: bits & 0x0080 != 0,
            response_code: (bits & 0x000F) as u8,
        }
    }
}

/// The question section entry echoed back by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

/// Decoded resource data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    /// Any other type, read as a (possibly compressed) domain name
    Name(String),
    /// Resource data that is not a readable name
    Raw(Vec<u8>),
}

impl RecordData {
    /// Renders the data the way the resolver reports addresses
    ///
    /// IPv6 addresses are written as eight zero-padded hex groups.
    pub fn render(&self) -> String {
        match self {
            Self::A(addr) => addr.to_string(),
            Self::Aaaa(addr) => addr
                .segments()
                .iter()
                .map(|group| format!("{:04x}", group))
                .collect::<Vec<_>>()
                .join(":"),
            Self::Name(name) => name.clone(),
            Self::Raw(bytes) => hex::encode(bytes),
        }
    }
}

/// A single resource record from any section of the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    /// Returns true for A and AAAA records
    pub fn is_address(&self) -> bool {
        matches!(self.data, RecordData::A(_) | RecordData::Aaaa(_))
    }
}

/// A parsed DNS response
#[derive(Debug, Clone)]
pub struct DnsMessage {
    pub id: u16,
    pub flags: Flags,
    pub questions: Vec<Question>,
    /// Answer, authority and additional records, in wire order
    pub records: Vec<ResourceRecord>,
}

impl DnsMessage {
    /// Name of the first echoed question, if any
    pub fn question_name(&self) -> Option<&str> {
        self.questions.first().map(|q| q.name.as_str())
    }

    /// A and AAAA records across all sections
    pub fn address_records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.iter().filter(|record| record.is_address())
    }
}

/// Builds an A/IN query for `hostname`
///
/// Empty labels (a trailing dot) are skipped.
pub fn build_query(id: u16, hostname: &str, recursion_desired: bool) -> DnsResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_LEN + hostname.len() + 6);

    let flags: u16 = if recursion_desired { 0x0100 } else { 0 };
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&flags.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    buf.extend_from_slice(&[0; 6]); // ANCOUNT, NSCOUNT, ARCOUNT

    for label in hostname.split('.').filter(|label| !label.is_empty()) {
        if label.len() > MAX_LABEL_LEN {
            return Err(DnsError::NameTooLong {
                label: label.to_string(),
            });
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);

    buf.extend_from_slice(&TYPE_A.to_be_bytes());
    buf.extend_from_slice(&CLASS_IN.to_be_bytes());

    Ok(buf)
}

/// Parses a DNS response
pub fn parse_response(buf: &[u8]) -> DnsResult<DnsMessage> {
    let id = read_u16(buf, 0)?;
    let flags = Flags::from_bits(read_u16(buf, 2)?);
    let question_count = read_u16(buf, 4)?;
    let answer_count = read_u16(buf, 6)? as usize;
    let authority_count = read_u16(buf, 8)? as usize;
    let additional_count = read_u16(buf, 10)? as usize;

    let mut pos = HEADER_LEN;

    let mut questions = Vec::with_capacity(question_count as usize);
    for _ in 0..question_count {
        let (labels, next) = read_name(buf, pos)?;
        questions.push(Question {
            name: labels.join("."),
            qtype: read_u16(buf, next)?,
            qclass: read_u16(buf, next + 2)?,
        });
        pos = next + 4;
    }

    let total = answer_count + authority_count + additional_count;
    let mut records = Vec::with_capacity(total);
    for _ in 0..total {
        let (record, next) = read_record(buf, pos)?;
        records.push(record);
        pos = next;
    }

    Ok(DnsMessage {
        id,
        flags,
        questions,
        records,
    })
}

/// Reads one resource record starting at `offset`
fn read_record(buf: &[u8], offset: usize) -> DnsResult<(ResourceRecord, usize)> {
    let (labels, next) = read_name(buf, offset)?;
    let rtype = read_u16(buf, next)?;
    let class = read_u16(buf, next + 2)?;
    let ttl = read_u32(buf, next + 4)?;
    let rdlength = read_u16(buf, next + 8)? as usize;

    let rdata_start = next + 10;
    let rdata = buf
        .get(rdata_start..rdata_start + rdlength)
        .ok_or(DnsError::Truncated {
            offset: rdata_start,
        })?;

    let data = match rtype {
        TYPE_A => {
            let octets: [u8; 4] = rdata.try_into().map_err(|_| DnsError::MalformedAddress {
                rtype,
                len: rdata.len(),
            })?;
            RecordData::A(Ipv4Addr::from(octets))
        }
        TYPE_AAAA => {
            let octets: [u8; 16] =
                rdata.try_into().map_err(|_| DnsError::MalformedAddress {
                    rtype,
                    len: rdata.len(),
                })?;
            RecordData::Aaaa(Ipv6Addr::from(octets))
        }
        _ if rdata.is_empty() => RecordData::Raw(Vec::new()),
        _ => match read_name(buf, rdata_start) {
            Ok((labels, _)) => RecordData::Name(labels.join(".")),
            Err(_) => RecordData::Raw(rdata.to_vec()),
        },
    };

    let record = ResourceRecord {
        name: labels.join("."),
        rtype,
        class,
        ttl,
        data,
    };

    Ok((record, rdata_start + rdlength))
}

/// Decodes a domain name starting at `offset`
///
/// Returns the labels and the offset just past the name as it appears at
/// `offset`. When the name ends in a compression pointer, that is two bytes
/// past the first pointer, regardless of where the pointer chain leads.
/// At most ten pointers are followed.
pub fn read_name(buf: &[u8], offset: usize) -> DnsResult<(Vec<String>, usize)> {
    let mut labels = Vec::new();
    let mut pos = offset;
    let mut resume_at: Option<usize> = None;
    let mut hops = 0;

    loop {
        let len = read_u8(buf, pos)?;

        if len == 0 {
            let next = resume_at.unwrap_or(pos + 1);
            return Ok((labels, next));
        }

        if len & POINTER_MASK == POINTER_MASK {
            if hops == MAX_POINTER_HOPS {
                return Err(DnsError::PointerLoop { offset: pos });
            }
            hops += 1;

            let target = (read_u16(buf, pos)? & 0x3FFF) as usize;
            if resume_at.is_none() {
                resume_at = Some(pos + 2);
            }
            pos = target;
            continue;
        }

        // 0x40 and 0x80 label types are reserved
        if len as usize > MAX_LABEL_LEN {
            return Err(DnsError::InvalidLabel {
                offset: pos,
                byte: len,
            });
        }

        let start = pos + 1;
        let end = start + len as usize;
        let label = buf
            .get(start..end)
            .ok_or(DnsError::Truncated { offset: start })?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos = end;
    }
}

fn read_u8(buf: &[u8], offset: usize) -> DnsResult<u8> {
    buf.get(offset)
        .copied()
        .ok_or(DnsError::Truncated { offset })
}

fn read_u16(buf: &[u8], offset: usize) -> DnsResult<u16> {
    buf.get(offset..offset + 2)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
        .ok_or(DnsError::Truncated { offset })
}

fn read_u32(buf: &[u8], offset: usize) -> DnsResult<u32> {
    buf.get(offset..offset + 4)
        .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .ok_or(DnsError::Truncated { offset })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Turns a query into a response header and appends raw answer bytes
    pub(crate) fn respond(query: &[u8], answer_count: u16, answers: &[u8]) -> Vec<u8> {
        let mut response = query.to_vec();
        response[2..4].copy_from_slice(&0x8180u16.to_be_bytes());
        response[6..8].copy_from_slice(&answer_count.to_be_bytes());
        response.extend_from_slice(answers);
        response
    }

    /// An answer whose name points at the question (offset 12)
    pub(crate) fn pointer_answer(rtype: u16, ttl: u32, rdata: &[u8]) -> Vec<u8> {
        let mut answer = vec![0xC0, 0x0C];
        answer.extend_from_slice(&rtype.to_be_bytes());
        answer.extend_from_slice(&CLASS_IN.to_be_bytes());
        answer.extend_from_slice(&ttl.to_be_bytes());
        answer.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        answer.extend_from_slice(rdata);
        answer
    }

    #[test]
    fn test_build_query_layout() {
        let query = build_query(0xABCD, "example.com", true).unwrap();

        assert_eq!(&query[0..2], &[0xAB, 0xCD]);
        assert_eq!(&query[2..4], &[0x01, 0x00]);
        assert_eq!(&query[4..6], &[0x00, 0x01]);
        assert_eq!(&query[6..12], &[0; 6]);
        assert_eq!(&query[12..25], b"\x07example\x03com\x00");
        assert_eq!(&query[25..29], &[0x00, 0x01, 0x00, 0x01]);
        assert_eq!(query.len(), 29);
    }

    #[test]
    fn test_build_query_without_recursion() {
        let query = build_query(1, "example.com.", false).unwrap();
        assert_eq!(&query[2..4], &[0x00, 0x00]);
        // Trailing dot does not produce an empty label
        assert_eq!(&query[12..25], b"\x07example\x03com\x00");
    }

    #[test]
    fn test_build_query_rejects_long_label() {
        let hostname = format!("{}.com", "a".repeat(64));
        assert!(matches!(
            build_query(1, &hostname, true),
            Err(DnsError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_parse_single_a_record() {
        let query = build_query(7, "example.com", true).unwrap();
        let response = respond(&query, 1, &pointer_answer(TYPE_A, 3600, &[93, 184, 216, 34]));

        let message = parse_response(&response).unwrap();
        assert_eq!(message.id, 7);
        assert!(message.flags.is_response);
        assert!(message.flags.recursion_desired);
        assert!(message.flags.recursion_available);
        assert_eq!(message.flags.response_code, 0);
        assert_eq!(message.question_name(), Some("example.com"));

        let addresses: Vec<_> = message.address_records().collect();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].data.render(), "93.184.216.34");
        assert_eq!(addresses[0].ttl, 3600);
        assert_eq!(addresses[0].name, "example.com");
    }

    #[test]
    fn test_second_answer_pointer_decodes_to_question_name() {
        let query = build_query(9, "www.example.com", true).unwrap();

        // First answer spells out its name, second one points at the question
        let mut answers = Vec::new();
        answers.extend_from_slice(b"\x05alias\x07example\x03com\x00");
        answers.extend_from_slice(&TYPE_A.to_be_bytes());
        answers.extend_from_slice(&CLASS_IN.to_be_bytes());
        answers.extend_from_slice(&60u32.to_be_bytes());
        answers.extend_from_slice(&4u16.to_be_bytes());
        answers.extend_from_slice(&[10, 0, 0, 1]);
        answers.extend_from_slice(&pointer_answer(TYPE_A, 120, &[10, 0, 0, 2]));

        let message = parse_response(&respond(&query, 2, &answers)).unwrap();
        assert_eq!(message.records.len(), 2);
        assert_eq!(message.records[0].name, "alias.example.com");
        assert_eq!(message.records[1].name, "www.example.com");
        assert_eq!(message.records[1].name, message.questions[0].name);
        assert_eq!(message.records[1].data.render(), "10.0.0.2");
    }

    #[test]
    fn test_parse_aaaa_record() {
        let query = build_query(3, "example.com", true).unwrap();
        let mut rdata = [0u8; 16];
        rdata[0] = 0x20;
        rdata[1] = 0x01;
        rdata[2] = 0x0d;
        rdata[3] = 0xb8;
        rdata[15] = 0x01;
        let response = respond(&query, 1, &pointer_answer(TYPE_AAAA, 300, &rdata));

        let message = parse_response(&response).unwrap();
        let record = message.address_records().next().unwrap();
        assert_eq!(
            record.data.render(),
            "2001:0db8:0000:0000:0000:0000:0000:0001"
        );
        assert!(record
            .data
            .render()
            .parse::<std::net::Ipv6Addr>()
            .is_ok());
    }

    #[test]
    fn test_cname_kept_but_not_an_address() {
        let query = build_query(4, "www.example.com", true).unwrap();

        // CNAME www.example.com -> example.com (pointer into the question at 16)
        let cname = pointer_answer(5, 300, &[0xC0, 0x10]);
        let a = pointer_answer(TYPE_A, 300, &[1, 2, 3, 4]);
        let mut answers = cname;
        answers.extend_from_slice(&a);

        let message = parse_response(&respond(&query, 2, &answers)).unwrap();
        assert_eq!(message.records.len(), 2);
        assert_eq!(
            message.records[0].data,
            RecordData::Name("example.com".to_string())
        );
        assert!(!message.records[0].is_address());
        assert_eq!(message.address_records().count(), 1);
    }

    #[test]
    fn test_unreadable_rdata_kept_raw() {
        let query = build_query(5, "example.com", true).unwrap();
        // TXT payload whose first byte looks like a reserved label type
        let txt = pointer_answer(16, 60, &[0x45, b'h', b'i']);
        let a = pointer_answer(TYPE_A, 60, &[5, 6, 7, 8]);
        let mut answers = txt;
        answers.extend_from_slice(&a);

        let message = parse_response(&respond(&query, 2, &answers)).unwrap();
        assert_eq!(
            message.records[0].data,
            RecordData::Raw(vec![0x45, b'h', b'i'])
        );
        assert_eq!(message.records[1].data.render(), "5.6.7.8");
    }

    #[test]
    fn test_pointer_loop_is_bounded() {
        // A name at offset 12 that points at itself
        let mut buf = vec![0u8; 12];
        buf.extend_from_slice(&[0xC0, 0x0C]);
        assert!(matches!(
            read_name(&buf, 12),
            Err(DnsError::PointerLoop { .. })
        ));
    }

    #[test]
    fn test_pointer_chain_advances_two_bytes() {
        // "example.com" at 0, "www" + pointer to 0 at 13
        let mut buf = b"\x07example\x03com\x00".to_vec();
        buf.extend_from_slice(b"\x03www\xC0\x00");
        buf.push(0xFF);

        let (labels, next) = read_name(&buf, 13).unwrap();
        assert_eq!(labels.join("."), "www.example.com");
        assert_eq!(next, 19);
    }

    #[test]
    fn test_truncated_message() {
        let query = build_query(6, "example.com", true).unwrap();
        let mut response = respond(&query, 1, &pointer_answer(TYPE_A, 60, &[1, 2, 3, 4]));
        response.truncate(response.len() - 2);

        assert!(matches!(
            parse_response(&response),
            Err(DnsError::Truncated { .. })
        ));
        assert!(matches!(
            parse_response(&[0, 1, 2]),
            Err(DnsError::Truncated { .. })
        ));
    }

    #[test]
    fn test_malformed_a_record() {
        let query = build_query(8, "example.com", true).unwrap();
        let response = respond(&query, 1, &pointer_answer(TYPE_A, 60, &[1, 2, 3]));
        assert!(matches!(
            parse_response(&response),
            Err(DnsError::MalformedAddress { rtype: TYPE_A, len: 3 })
        ));
    }
}
