//! `wg-quick` style `.ini` sections.

use std::fmt;
use std::io::{self, Write};

use wgf_secrets::secret::REDACTED;

const SECRET_ENTRIES: [&str; 2] = ["PrivateKey", "PresharedKey"];

/// One `[Title]` block of a `WireGuard` configuration file.
///
/// Entries keep their insertion order. `Debug` redacts key material.
#[derive(Clone, PartialEq, Eq)]
pub struct IniSection {
    title: &'static str,
    entries: Vec<(&'static str, String)>,
}

impl IniSection {
    /// Creates an empty section.
    #[must_use]
    pub const fn new(title: &'static str) -> Self {
        Self {
            title,
            entries: Vec::new(),
        }
    }

    /// Appends an entry.
    pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.entries.push((key, value.into()));
    }

    /// Appends an entry when `value` is present.
    pub fn push_opt(&mut self, key: &'static str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Section title, without brackets.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Entries in order.
    #[must_use]
    pub fn entries(&self) -> &[(&'static str, String)] {
        &self.entries
    }

    /// First value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn multi_line_entry(&self) -> Option<(&'static str, &'static str)> {
        self.entries
            .iter()
            .find(|(_, value)| value.contains(['\n', '\r']))
            .map(|(key, _)| (self.title, *key))
    }

    /// Renders the section as `[Title]` followed by `Key = Value` lines.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("[{}]\n", self.title);
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

impl fmt::Debug for IniSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entry(&"title", &self.title);
        for (key, value) in &self.entries {
            if SECRET_ENTRIES.contains(key) {
                map.entry(key, &REDACTED);
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Renders sections separated by a blank line.
#[must_use]
pub fn render_ini(sections: &[IniSection]) -> String {
    sections
        .iter()
        .map(IniSection::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes sections one at a time, producing the same bytes as [`render_ini`].
///
/// Nothing is written if any value holds a line break.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] naming the first multi-line entry,
/// or propagates any error from `writer`.
pub fn write_ini<W: Write>(writer: &mut W, sections: &[IniSection]) -> io::Result<()> {
    if let Some((title, key)) = sections.iter().find_map(IniSection::multi_line_entry) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("[{title}] {key} must fit on one line"),
        ));
    }
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            writer.write_all(b"\n")?;
        }
        writer.write_all(section.render().as_bytes())?;
    }
    writer.flush()
}
