//! Rule notation parser
//!
//! Production rules are plain data, never evaluated as code. Two notations:
//! - arrow: `F -> FF+[+F-F-F]-[-F+F+F]; G = F` (entries split on `;` or newlines)
//! - mapping literal: `{'F': 'FF+[+F-F-F]-[-F+F+F]', "G": "F"}`
//!
//! Keys must be exactly one character. Replacements may be empty.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CamoError, Result};

/// Ordered `symbol -> replacement` table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<char, String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; a second rule for the same symbol is an error
    pub fn insert(&mut self, symbol: char, replacement: impl Into<String>) -> Result<()> {
        if self.rules.contains_key(&symbol) {
            return Err(CamoError::grammar(format!(
                "duplicate rule for symbol '{}'",
                symbol
            )));
        }
        self.rules.insert(symbol, replacement.into());
        Ok(())
    }

    pub fn get(&self, symbol: char) -> Option<&str> {
        self.rules.get(&symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.rules.iter().map(|(&k, v)| (k, v.as_str()))
    }

    /// Parse either notation; blank text is an empty rule set
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Ok(Self::new())
        } else if trimmed.starts_with('{') {
            parse_literal(trimmed)
        } else {
            parse_arrows(trimmed)
        }
    }

    /// Validate a string-keyed map, e.g. one deserialized from YAML
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut rules = Self::new();
        for (key, replacement) in map {
            rules.insert(single_symbol(key)?, replacement.clone())?;
        }
        Ok(rules)
    }
}

impl FromStr for RuleSet {
    type Err = CamoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .rules
            .iter()
            .map(|(symbol, replacement)| format!("{} -> {}", symbol, replacement))
            .collect();
        write!(f, "{}", entries.join("; "))
    }
}

/// Rules as they appear in a config file: a YAML map or a notation string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesSpec {
    Map(BTreeMap<String, String>),
    Text(String),
}

impl RulesSpec {
    pub fn to_rule_set(&self) -> Result<RuleSet> {
        match self {
            RulesSpec::Map(map) => RuleSet::from_map(map),
            RulesSpec::Text(text) => RuleSet::parse(text),
        }
    }
}

impl Default for RulesSpec {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert("F".to_string(), "FF+[+F-F-F]-[-F+F+F]".to_string());
        RulesSpec::Map(map)
    }
}

fn single_symbol(key: &str) -> Result<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CamoError::grammar(format!(
            "rule key '{}' must be exactly one symbol",
            key
        ))),
    }
}

fn parse_arrows(text: &str) -> Result<RuleSet> {
    let mut rules = RuleSet::new();

    let entries = text
        .split(|c: char| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|e| !e.is_empty());

    for (index, entry) in entries.enumerate() {
        let arrow = entry.find("->").map(|at| (at, 2));
        let equals = entry.find('=').map(|at| (at, 1));

        // Whichever separator comes first splits key from replacement
        let (at, width) = match (arrow, equals) {
            (Some(a), Some(e)) => {
                if a.0 < e.0 {
                    a
                } else {
                    e
                }
            }
            (Some(a), None) => a,
            (None, Some(e)) => e,
            (None, None) => {
                return Err(CamoError::grammar(format!(
                    "rule {} ('{}') is missing '->' or '='",
                    index + 1,
                    entry
                )))
            }
        };

        let key = entry[..at].trim();
        let replacement = entry[at + width..].trim();
        rules.insert(single_symbol(key)?, replacement)?;
    }

    Ok(rules)
}

fn parse_literal(text: &str) -> Result<RuleSet> {
    let mut scanner = Scanner::new(text);
    let mut rules = RuleSet::new();

    scanner.expect('{')?;
    scanner.skip_ws();
    if scanner.peek() == Some('}') {
        scanner.bump();
    } else {
        loop {
            let key = scanner.quoted()?;
            let symbol = single_symbol(&key)?;
            scanner.expect(':')?;
            let replacement = scanner.quoted()?;
            rules.insert(symbol, replacement)?;

            scanner.skip_ws();
            match scanner.bump() {
                Some(',') => {
                    // Trailing comma before the closing brace
                    scanner.skip_ws();
                    if scanner.peek() == Some('}') {
                        scanner.bump();
                        break;
                    }
                }
                Some('}') => break,
                other => return Err(scanner.error(format!("expected ',' or '}}', found {}", describe(other)))),
            }
        }
    }

    scanner.skip_ws();
    if let Some(c) = scanner.peek() {
        return Err(scanner.error(format!("unexpected '{}' after closing brace", c)));
    }

    Ok(rules)
}

fn describe(c: Option<char>) -> String {
    match c {
        Some(c) => format!("'{}'", c),
        None => "end of input".to_string(),
    }
}

/// Character cursor over a mapping literal
struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            other => Err(self.error(format!("expected '{}', found {}", wanted, describe(other)))),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        self.skip_ws();
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            other => return Err(self.error(format!("expected quoted string, found {}", describe(other)))),
        };

        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn error(&self, msg: impl fmt::Display) -> CamoError {
        CamoError::grammar(format!("{} at position {}", msg, self.pos))
    }
}
