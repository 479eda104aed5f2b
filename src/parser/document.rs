//! Generic document parser for `key=value` configuration files
//!
//! Lines live in a `Vec` and the key index stores positions into it, so no
//! line is ever shared or referenced by pointer. Any structural change to
//! the vector rebuilds the index.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::line::ConfigLine;
use crate::backup::sidecar::write_sidecar;
use crate::error::{NetconfError, NetconfResult};
use crate::storage::file_io::{current_mode, read_text_optional, write_text_atomic};

/// An ordered set of lines plus a key -> line index
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    lines: Vec<ConfigLine>,
    index: HashMap<String, usize>,
    backed_by_file: bool,
}

impl ConfigDocument {
    /// Parse the file at `path`
    ///
    /// A missing file yields an empty document that can still be filled in
    /// and written. Any other read failure is a `Read` error.
    pub fn parse(path: impl Into<PathBuf>) -> NetconfResult<Self> {
        let path = path.into();

        match read_text_optional(&path)? {
            Some(text) => {
                let mut doc = Self::from_text(path, &text);
                doc.backed_by_file = true;
                info!(
                    "Parsed {} lines, {} keys from {}",
                    doc.lines.len(),
                    doc.index.len(),
                    doc.path.display()
                );
                Ok(doc)
            }
            None => {
                warn!("{} does not exist, starting empty", path.display());
                Ok(Self::empty(path))
            }
        }
    }

    /// Create an empty document that is not yet backed by a file
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
            index: HashMap::new(),
            backed_by_file: false,
        }
    }

    /// Build a document from in-memory text destined for `path`
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .enumerate()
            .map(|(i, raw)| ConfigLine::parse(raw, i + 1))
            .collect();

        let mut doc = Self {
            path: path.into(),
            lines,
            index: HashMap::new(),
            backed_by_file: false,
        };
        doc.reindex();
        doc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the document was read from an existing file
    pub fn is_backed_by_file(&self) -> bool {
        self.backed_by_file
    }

    pub fn lines(&self) -> &[ConfigLine] {
        &self.lines
    }

    /// Current value for `key`, quotes included
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .and_then(|&i| self.lines[i].value())
    }

    /// Current value for `key`, or `default` when absent
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Indexed keys in file order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(move |(i, line)| match line.key() {
                Some(key) if self.index.get(key) == Some(&i) => Some(key),
                _ => None,
            })
    }

    /// Every indexed key with its value
    pub fn all(&self) -> BTreeMap<String, String> {
        self.index
            .iter()
            .filter_map(|(key, &i)| self.lines[i].value().map(|v| (key.clone(), v.to_string())))
            .collect()
    }

    /// Set `key` to `value`
    ///
    /// An existing key is rewritten on its own line, keeping its position. A
    /// new key is appended as the last line.
    pub fn set(&mut self, key: &str, value: &str, comment: Option<&str>) {
        if let Some(&i) = self.index.get(key) {
            if self.lines[i].update(value, comment) {
                debug!("Updated {} on line {}", key, i + 1);
            }
            return;
        }

        if let Some(last) = self.lines.last_mut() {
            last.terminate();
        }
        let number = self.lines.len() + 1;
        self.lines
            .push(ConfigLine::assignment(key, value, comment, number));
        self.index.insert(key.to_string(), number - 1);
        debug!("Appended {} as line {}", key, number);
    }

    /// Remove the line holding `key`; returns whether anything was removed
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(i) = self.index.remove(key) else {
            return false;
        };

        self.lines.remove(i);
        for (n, line) in self.lines.iter_mut().enumerate() {
            line.set_number(n + 1);
        }
        self.reindex();
        debug!("Deleted {} from line {}", key, i + 1);
        true
    }

    /// Append a full-line comment
    pub fn add_comment(&mut self, text: &str) {
        if let Some(last) = self.lines.last_mut() {
            last.terminate();
        }
        let number = self.lines.len() + 1;
        self.lines.push(ConfigLine::comment(text, number));
    }

    /// Append an empty line
    pub fn add_blank_line(&mut self) {
        if let Some(last) = self.lines.last_mut() {
            last.terminate();
        }
        let number = self.lines.len() + 1;
        self.lines.push(ConfigLine::blank(number));
    }

    /// Structural problems; currently keys that appear more than once
    pub fn validate(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for key in self.lines.iter().filter_map(ConfigLine::key) {
            *counts.entry(key).or_default() += 1;
        }

        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, count)| format!("Duplicate key: {} (appears {} times)", key, count))
            .collect()
    }

    /// The serialized form: every line's raw text, in order
    pub fn to_text(&self) -> String {
        self.lines.iter().map(ConfigLine::raw).collect()
    }

    /// Validate, optionally take a `.bak` sidecar, then replace the file atomically
    ///
    /// On failure the file on disk is untouched and the document stays usable.
    pub fn write(&mut self, backup: bool) -> NetconfResult<()> {
        let problems = self.validate();
        if !problems.is_empty() {
            return Err(NetconfError::Validation(problems));
        }

        if backup && self.path.exists() {
            write_sidecar(&self.path)?;
        }

        write_text_atomic(&self.path, &self.to_text(), current_mode(&self.path))?;
        self.backed_by_file = true;

        info!("Wrote {} lines to {}", self.lines.len(), self.path.display());
        Ok(())
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, line) in self.lines.iter().enumerate() {
            if let Some(key) = line.key() {
                self.index.insert(key.to_string(), i);
            }
        }
    }
}
