//! Line parser for plain G-code words.
//!
//! A line is a sequence of whitespace separated words, each an uppercase
//! letter followed by a number (`G1 X10.5 E-0.2`). Everything after `;` is a
//! comment.

use std::collections::BTreeMap;

use super::GCodeError;

/// The words of one line, letter -> value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    words: BTreeMap<char, f64>,
}

impl Command {
    pub fn get(&self, letter: char) -> Option<f64> {
        self.words.get(&letter).copied()
    }

    pub fn has(&self, letter: char) -> bool {
        self.words.contains_key(&letter)
    }

    /// True when `letter` carries exactly the integer code `code`, e.g. `G1`.
    pub fn is(&self, letter: char, code: u32) -> bool {
        self.get(letter) == Some(code as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

pub fn parse_line(line: &str) -> Result<Command, GCodeError> {
    let code = match line.find(';') {
        Some(comment) => &line[..comment],
        None => line,
    };

    let mut words = BTreeMap::new();
    for token in code.split_whitespace() {
        let mut chars = token.chars();
        let letter = chars.next().filter(char::is_ascii_uppercase);
        let value = chars.as_str().parse::<f64>().ok();
        match (letter, value) {
            (Some(letter), Some(value)) => {
                words.insert(letter, value);
            }
            _ => {
                return Err(GCodeError::Parse {
                    line: line.trim_end().to_string(),
                    token: token.to_string(),
                })
            }
        }
    }
    Ok(Command { words })
}
