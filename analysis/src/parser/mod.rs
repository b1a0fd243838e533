//! Tokenizer for text trace lines.
//!
//! A line is a leading event-name token followed by fields. Fields are
//! separated by any run of spaces, commas and opening parentheses; closing
//! parentheses are not separators and end the readable part of a line.

use std::str::FromStr;

use pest::Parser;

use crate::{memory::Address, AnalysisError};


#[derive(pest_derive::Parser)]
#[grammar = "parser/trace.pest"]
struct TraceParser;

const SEPARATORS: [char; 3] = [' ', ',', '('];

/// Reading position inside one trace line.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    line: &'a str,
    pos: usize,
    strict_addresses: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            pos: 0,
            strict_addresses: false,
        }
    }

    /// Makes malformed hexadecimal addresses fatal instead of best effort.
    pub fn strict(mut self, strict_addresses: bool) -> Self {
        self.strict_addresses = strict_addresses;
        self
    }

    /// The unread part of the line.
    pub fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    pub fn skip_separators(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start_matches(SEPARATORS).len();
    }

    fn read_token(&mut self, rule: Rule, what: &str) -> Result<&'a str, AnalysisError> {
        self.skip_separators();
        let rest = self.rest();
        let token = TraceParser::parse(rule, rest)
            .ok()
            .and_then(|mut pairs| pairs.next())
            .map(|pair| pair.as_str())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AnalysisError::MalformedTrace(format!(
                    "expected {what} at column {}, found `{rest}`",
                    self.pos + 1
                ))
            })?;
        self.pos += token.len();
        Ok(token)
    }

    /// Reads a maximal run of alphanumerics, `_`, `-`, `.` and `:`.
    pub fn read_name(&mut self) -> Result<&'a str, AnalysisError> {
        self.read_token(Rule::name, "a name")
    }

    /// Reads a base-16 address.
    ///
    /// Unless the cursor is strict, a malformed token yields the value of its
    /// longest hexadecimal prefix.
    pub fn read_address(&mut self) -> Result<Address, AnalysisError> {
        let token = self.read_name()?;
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);

        if self.strict_addresses {
            return Address::from_str_radix(digits, 16).map_err(|e| {
                AnalysisError::MalformedTrace(format!("bad address `{token}`: {e}"))
            });
        }
        Ok(parse_hex_prefix(digits))
    }

    /// Reads a decimal integer of the requested width.
    pub fn read_integer<T: FromStr>(&mut self) -> Result<T, AnalysisError> {
        let token = self.read_name()?;
        token
            .parse()
            .map_err(|_| AnalysisError::MalformedTrace(format!("bad integer `{token}`")))
    }

    pub fn read_float(&mut self) -> Result<f64, AnalysisError> {
        let token = self.read_token(Rule::float, "a float")?;
        token
            .parse()
            .map_err(|_| AnalysisError::MalformedTrace(format!("bad float `{token}`")))
    }
}

/// Value of the longest run of leading hex digits, saturating on overflow.
fn parse_hex_prefix(digits: &str) -> Address {
    let end = digits
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return 0;
    }
    Address::from_str_radix(digits, 16).unwrap_or(Address::MAX)
}
