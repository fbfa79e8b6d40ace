//! Descriptor (`index.md`) header editing.
//!
//! A descriptor is split into a header block between the first two delimiter
//! lines and an opaque body after them:
//!
//! ```text
//! ---                        <- open
//! title: Alps 2024           <- HeaderLine::Field
//! lastmod: "2024-06-01T..."  <- the only line ever rewritten
//!   - nested: yaml           <- HeaderLine::Opaque
//! ---                        <- close
//! body...                    <- kept verbatim
//! ```
//!
//! Rendering is a pure text transform: apart from the `lastmod` line, every
//! byte of the input is reproduced, including line endings.

use super::DescriptorError;
use std::{fs, path::Path};

/// Header key maintained by this tool.
pub const LASTMOD_KEY: &str = "lastmod";

/// [`LASTMOD_KEY`] followed by its separator.
pub const LASTMOD_PREFIX: &str = "lastmod:";

/// One line of the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// A top-level `key: value` line.
    Field { key: String, raw: String },
    /// Anything else: nested values, comments, blank lines.
    Opaque(String),
}

impl HeaderLine {
    fn parse(raw: &str) -> Self {
        let key = raw
            .split_once(':')
            .map(|(key, _)| key)
            .filter(|key| is_top_level_key(key));
        match key {
            Some(key) => Self::Field {
                key: key.to_owned(),
                raw: raw.to_owned(),
            },
            None => Self::Opaque(raw.to_owned()),
        }
    }

    /// The line exactly as read.
    pub fn raw(&self) -> &str {
        match self {
            Self::Field { raw, .. } | Self::Opaque(raw) => raw,
        }
    }

    /// Key of a field line.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Field { key, .. } => Some(key.as_str()),
            Self::Opaque(_) => None,
        }
    }

    /// A top-level key equal to `lastmod` is exactly a line starting with `lastmod:`.
    #[inline]
    fn is_lastmod(&self) -> bool {
        self.key() == Some(LASTMOD_KEY)
    }
}

fn is_top_level_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with(|c: char| c.is_whitespace() || c == '#' || c == '-')
}

/// A parsed descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Lines before the opening delimiter.
    pub preamble: Vec<String>,
    /// Opening delimiter line as read.
    pub open: String,
    pub header: Vec<HeaderLine>,
    /// Closing delimiter line as read.
    pub close: String,
    pub body: Vec<String>,
}

impl Descriptor {
    /// Split `text` on the first two lines equal to `delim` after trimming.
    pub fn parse(text: &str, delim: &str) -> Result<Self, DescriptorError> {
        let delim = delim.trim();
        let lines: Vec<&str> = text.split('\n').collect();

        let mut found = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.trim() == delim)
            .map(|(index, _)| index);

        let (open, close) = match (found.next(), found.next()) {
            (Some(open), Some(close)) if close > open => (open, close),
            (first, _) => {
                return Err(DescriptorError::MissingDelimiters(
                    delim.to_owned(),
                    usize::from(first.is_some()),
                ));
            }
        };

        let to_owned =
            |lines: &[&str]| -> Vec<String> { lines.iter().map(|s| (*s).to_owned()).collect() };

        Ok(Self {
            preamble: to_owned(&lines[..open]),
            open: lines[open].to_owned(),
            header: lines[open + 1..close]
                .iter()
                .map(|line| HeaderLine::parse(line))
                .collect(),
            close: lines[close].to_owned(),
            body: to_owned(&lines[close + 1..]),
        })
    }

    /// Read and parse the descriptor at `path`.
    pub fn read(path: &Path, delim: &str) -> Result<Self, DescriptorError> {
        let text = fs::read_to_string(path)
            .map_err(|err| DescriptorError::Read(path.to_path_buf(), err))?;
        Self::parse(&text, delim)
    }

    /// Current `lastmod` value, `None` when absent or empty.
    ///
    /// Leading whitespace and double quotes are dropped; trailing spaces are
    /// part of the value.
    pub fn lastmod(&self) -> Option<String> {
        let line = self.header.iter().find(|line| line.is_lastmod())?;
        let raw = line.raw();
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let value: String = raw[LASTMOD_PREFIX.len()..]
            .trim_start()
            .chars()
            .filter(|&c| c != '"')
            .collect();
        (!value.is_empty()).then_some(value)
    }

    /// Render the descriptor with `lastmod` set to `value`.
    ///
    /// Replaces the first `lastmod:` line, or appends one to the header.
    pub fn render(&self, value: &str) -> String {
        let mut out: Vec<String> = Vec::with_capacity(
            self.preamble.len() + self.header.len() + self.body.len() + 3,
        );
        out.extend(self.preamble.iter().cloned());
        out.push(self.open.clone());

        let mut replaced = false;
        for line in &self.header {
            if !replaced && line.is_lastmod() {
                out.push(lastmod_line(value, line_ending(line.raw())));
                replaced = true;
            } else {
                out.push(line.raw().to_owned());
            }
        }
        if !replaced {
            out.push(lastmod_line(value, line_ending(&self.open)));
        }

        out.push(self.close.clone());
        out.extend(self.body.iter().cloned());
        out.join("\n")
    }
}

/// `"\r"` for CRLF lines, `""` otherwise.
fn line_ending(line: &str) -> &'static str {
    if line.ends_with('\r') { "\r" } else { "" }
}

fn lastmod_line(value: &str, ending: &str) -> String {
    format!("{LASTMOD_PREFIX} \"{value}\"{ending}")
}
