//! Script text and the command invocations parsed from it.

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

/// An automation script: one command invocation per non-blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Script {
    text: String,
    lines: Vec<String>,
}

impl Script {
    /// Build a script from its text.
    ///
    /// The text is trimmed as a whole before it is split into lines, so
    /// leading and trailing blank lines never count as script lines.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = split_lines(&text);
        Self { text, lines }
    }

    /// The text exactly as it was supplied.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines, blank ones included.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at `index`, trimmed.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of lines that carry a command.
    pub fn command_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.is_empty()).count()
    }
}

fn split_lines(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(|l| l.trim().to_string()).collect()
}

impl From<&str> for Script {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Script {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<Script> for String {
    fn from(script: Script) -> Self {
        script.text
    }
}

/// One parsed script line: `NAME arg1 arg2 ...`.
///
/// Arguments are separated by whitespace. A double-quoted argument may contain
/// whitespace and uses JSON string escapes, which is the form the authoring
/// path writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    name: String,
    args: Vec<String>,
    raw_args: String,
}

impl CommandInvocation {
    /// Parse a script line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ScriptError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let args = tokenize(rest).ok_or_else(|| ScriptError::UnterminatedQuote(line.to_string()))?;

        Ok(Some(Self {
            name: name.to_string(),
            args,
            raw_args: rest.to_string(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Argument text after the name, as written in the script.
    pub fn raw_args(&self) -> &str {
        &self.raw_args
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Split arguments on whitespace, honouring double quotes. `None` when a
/// quote is left open.
fn tokenize(input: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let end = if rest.starts_with('"') {
            closing_quote(rest)? + 1
        } else {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        };
        let (token, tail) = rest.split_at(end);
        args.push(if token.starts_with('"') {
            unquote(token)
        } else {
            token.to_string()
        });
        rest = tail.trim_start();
    }

    Some(args)
}

/// Byte offset of the quote closing the one at offset 0.
fn closing_quote(quoted: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in quoted.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Decode a quoted argument as a JSON string. Escapes JSON does not know are
/// kept as the escaped character.
fn unquote(quoted: &str) -> String {
    if let Ok(decoded) = serde_json::from_str::<String>(quoted) {
        return decoded;
    }
    let inner = &quoted[1..quoted.len() - 1];
    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => decoded.extend(chars.next()),
            other => decoded.push(other),
        }
    }
    decoded
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
