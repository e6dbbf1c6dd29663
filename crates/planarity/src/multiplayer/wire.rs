use std::fmt::Write;

use crate::geometry::Point;
use crate::graph::{Edge, GraphError, MAX_EDGES, MIN_EDGES, NODE_COUNT, Nodes};

/// Topic both peers publish and subscribe on.
pub const TOPIC: &str = "planarity/connecting";

/// Terminator of the node payload.
pub const SENTINEL: u8 = b'e';

/// Control messages exchanged during the rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Join,
    Host,
    HostReady,
    JoinReady,
    HostWon,
    JoinWon,
    Received,
}

impl Token {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "Join",
            Self::Host => "Host",
            Self::HostReady => "HostReady",
            Self::JoinReady => "JoinReady",
            Self::HostWon => "HostWon",
            Self::JoinWon => "JoinWon",
            Self::Received => "Received",
        }
    }

    /// Match the start of `message` against the tokens, longest first.
    pub fn parse(message: &str) -> Option<Token> {
        const BY_LENGTH: [Token; 7] = [
            Token::HostReady,
            Token::JoinReady,
            Token::Received,
            Token::HostWon,
            Token::JoinWon,
            Token::Host,
            Token::Join,
        ];
        BY_LENGTH
            .into_iter()
            .find(|token| message.starts_with(token.as_str()))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload contains no digits")]
    Empty,

    #[error("unexpected {found:?} at byte {pos}")]
    UnexpectedChar { pos: usize, found: char },

    #[error("payload ends mid-tuple at byte {pos}")]
    Truncated { pos: usize },

    #[error("number at byte {pos} does not fit")]
    InvalidNumber { pos: usize },

    #[error("expected {expected} nodes, found {found}")]
    WrongNodeCount { expected: usize, found: usize },

    #[error("expected at least {min} edges, found {found}")]
    TooFewEdges { min: usize, found: usize },

    #[error("node payload is missing its 'e' terminator")]
    MissingSentinel,

    #[error("node {index} at {point} lies outside the playfield")]
    OutOfBounds { index: usize, point: Point },

    #[error("invalid edge: {0}")]
    Graph(#[from] GraphError),

    #[error("trailing data after terminator at byte {pos}")]
    TrailingData { pos: usize },
}

/// `"<x>,<y>;"` per node in index order, then `e`.
pub fn encode_nodes(nodes: &Nodes) -> String {
    let mut out = String::with_capacity(NODE_COUNT * 8 + 1);
    for (_, p) in nodes.iter() {
        let _ = write!(out, "{},{};", p.x, p.y);
    }
    out.push(SENTINEL as char);
    out
}

/// `"<src>,<dst>;"` per edge in order, no terminator.
pub fn encode_edges(edges: &[Edge]) -> String {
    let mut out = String::with_capacity(edges.len() * 4);
    for edge in edges {
        let (a, b) = edge.endpoints();
        let _ = write!(out, "{a},{b};");
    }
    out
}

/// Decode a node payload: exactly six tuples, the terminator, all inside the playfield.
pub fn decode_nodes(payload: &str) -> Result<Nodes, DecodeError> {
    let scan = Scanner::new(payload)?.tuples()?;
    if !scan.terminated {
        return Err(DecodeError::MissingSentinel);
    }
    if scan.tuples.len() != NODE_COUNT {
        return Err(DecodeError::WrongNodeCount {
            expected: NODE_COUNT,
            found: scan.tuples.len(),
        });
    }

    let mut nodes = Nodes::default();
    for (index, &(x, y)) in scan.tuples.iter().enumerate() {
        let point = Point::new(x, y);
        if !point.in_playfield() {
            return Err(DecodeError::OutOfBounds { index, point });
        }
        nodes.0[index] = point;
    }
    Ok(nodes)
}

/// Decode an edge payload of ten to twelve tuples. A trailing terminator
/// is tolerated.
pub fn decode_edges(payload: &str) -> Result<Vec<Edge>, DecodeError> {
    let scan = Scanner::new(payload)?.tuples()?;
    let found = scan.tuples.len();
    if found > MAX_EDGES {
        return Err(GraphError::TooManyEdges(found).into());
    }
    if found < MIN_EDGES {
        return Err(DecodeError::TooFewEdges {
            min: MIN_EDGES,
            found,
        });
    }
    // The scanner only yields unsigned numbers.
    scan.tuples
        .into_iter()
        .map(|(a, b)| Edge::from_indices(a as usize, b as usize).map_err(DecodeError::from))
        .collect()
}

struct Scan {
    tuples: Vec<(i32, i32)>,
    terminated: bool,
}

/// Byte cursor over a payload.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Position the cursor on the first digit, as the payload may carry a
    /// prefix from the broker client.
    fn new(payload: &'a str) -> Result<Self, DecodeError> {
        let bytes = payload
            .trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
            .as_bytes();
        let pos = bytes
            .iter()
            .position(u8::is_ascii_digit)
            .ok_or(DecodeError::Empty)?;
        Ok(Self { bytes, pos })
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn unexpected(&self, found: u8) -> DecodeError {
        DecodeError::UnexpectedChar {
            pos: self.pos,
            found: found as char,
        }
    }

    fn number(&mut self) -> Result<i32, DecodeError> {
        let start = self.pos;
        match self.peek() {
            None => return Err(DecodeError::Truncated { pos: self.pos }),
            Some(b) if !b.is_ascii_digit() => return Err(self.unexpected(b)),
            Some(_) => {}
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|digits| digits.parse().ok())
            .ok_or(DecodeError::InvalidNumber { pos: start })
    }

    fn expect(&mut self, want: u8) -> Result<(), DecodeError> {
        match self.peek() {
            None => Err(DecodeError::Truncated { pos: self.pos }),
            Some(b) if b == want => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.unexpected(b)),
        }
    }

    /// `(<n>,<n>;)*` optionally followed by the terminator.
    fn tuples(mut self) -> Result<Scan, DecodeError> {
        let mut tuples = Vec::new();
        loop {
            self.skip_spaces();
            match self.peek() {
                None => {
                    return Ok(Scan {
                        tuples,
                        terminated: false,
                    });
                }
                Some(SENTINEL) => {
                    self.pos += 1;
                    self.skip_spaces();
                    if self.peek().is_some() {
                        return Err(DecodeError::TrailingData { pos: self.pos });
                    }
                    return Ok(Scan {
                        tuples,
                        terminated: true,
                    });
                }
                Some(_) => {}
            }

            let first = self.number()?;
            self.skip_spaces();
            self.expect(b',')?;
            self.skip_spaces();
            let second = self.number()?;
            self.skip_spaces();
            self.expect(b';')?;
            tuples.push((first, second));
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn token_prefers_longest_match() {
        assert_eq!(Token::parse("HostReady"), Some(Token::HostReady));
        assert_eq!(Token::parse("HostWon"), Some(Token::HostWon));
        assert_eq!(Token::parse("Host"), Some(Token::Host));
        assert_eq!(Token::parse("Join\0\0"), Some(Token::Join));
        assert_eq!(Token::parse("join"), None);
        assert_eq!(Token::parse("12,40;"), None);
    }

    #[test]
    fn scanner_skips_prefix_and_padding() {
        let nodes = decode_nodes("  \u{1}5,41;6,42;7,43;8,44;9,45;10,46;e\0\0").unwrap();
        assert_eq!(nodes.0[0], Point::new(5, 41));
        assert_eq!(nodes.0[5], Point::new(10, 46));
    }

    #[test]
    fn spaces_inside_tuples_are_allowed() {
        let payload = format!("0, 1; 1 ,2;{}", "0,3;".repeat(8));
        let edges = decode_edges(&payload).unwrap();
        assert_eq!(edges.len(), 10);
        assert_eq!(edges[1], Edge::from_indices(1, 2).unwrap());
    }

    #[test]
    fn missing_comma_is_unexpected() {
        assert_eq!(
            decode_edges("0;1;"),
            Err(DecodeError::UnexpectedChar { pos: 1, found: ';' })
        );
    }

    #[test]
    fn cut_off_tuple_is_truncated() {
        assert_eq!(decode_edges("0,1;2,"), Err(DecodeError::Truncated { pos: 6 }));
    }

    #[test]
    fn huge_number_is_invalid() {
        assert_eq!(
            decode_edges("99999999999,1;"),
            Err(DecodeError::InvalidNumber { pos: 0 })
        );
    }
}
