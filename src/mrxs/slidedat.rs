//! Slidedat.ini parser
//!
//! MRXS slides describe their layout in an INI file. Section and key names
//! are case-sensitive, values are trimmed, `;` and `#` start comment lines,
//! and indented lines continue the previous value.

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::{ScrubError, ScrubResult};

lazy_static! {
    static ref SECTION_LINE: Regex = Regex::new(r"^\[(?P<name>[^\]]+)\]$")
        .expect("section pattern is valid");
    static ref KEY_LINE: Regex = Regex::new(r"^(?P<key>[^=:\s][^=:]*?)\s*[=:]\s*(?P<value>.*)$")
        .expect("key pattern is valid");
}

const UTF8_BOM: &str = "\u{feff}";

/// Parsed Slidedat.ini contents
#[derive(Debug, Clone, Default)]
pub struct Slidedat {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Slidedat {
    /// Parses INI text
    ///
    /// Duplicate sections or keys, keys outside a section, and lines that
    /// are neither sections, keys, comments nor continuations are rejected.
    pub fn parse(text: &str) -> ScrubResult<Self> {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut section: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if raw.starts_with(|c: char| c.is_whitespace()) {
                if let (Some(name), Some(key)) = (&section, &last_key) {
                    if let Some(value) = sections.get_mut(name).and_then(|s| s.get_mut(key)) {
                        value.push('\n');
                        value.push_str(line);
                        continue;
                    }
                }
            }

            if let Some(caps) = SECTION_LINE.captures(line) {
                let name = caps["name"].to_string();
                if sections.contains_key(&name) {
                    return Err(ScrubError::malformed(format!(
                        "Slidedat.ini line {}: duplicate section [{}]", number + 1, name)));
                }
                trace!("Slidedat section [{}]", name);
                sections.insert(name.clone(), HashMap::new());
                section = Some(name);
                last_key = None;
                continue;
            }

            if let Some(caps) = KEY_LINE.captures(line) {
                let name = section.as_ref().ok_or_else(|| ScrubError::malformed(format!(
                    "Slidedat.ini line {}: key outside of any section", number + 1)))?;
                let key = caps["key"].to_string();
                let values = sections.entry(name.clone()).or_default();
                if values.contains_key(&key) {
                    return Err(ScrubError::malformed(format!(
                        "Slidedat.ini line {}: duplicate key {} in [{}]", number + 1, key, name)));
                }
                values.insert(key.clone(), caps["value"].trim().to_string());
                last_key = Some(key);
                continue;
            }

            return Err(ScrubError::malformed(format!(
                "Slidedat.ini line {}: cannot parse '{}'", number + 1, line)));
        }

        Ok(Slidedat { sections })
    }

    /// Reads and parses the file at `path`
    pub fn load(path: &Path) -> ScrubResult<Self> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ScrubError::malformed(format!("{} is not UTF-8: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    /// Value that must be present
    pub fn require(&self, section: &str, key: &str) -> ScrubResult<&str> {
        self.get(section, key).ok_or_else(|| ScrubError::malformed(format!(
            "Slidedat.ini has no {} in [{}]", key, section)))
    }

    /// Non-negative integer value that must be present
    pub fn require_usize(&self, section: &str, key: &str) -> ScrubResult<usize> {
        let value = self.require(section, key)?;
        value.parse::<usize>().map_err(|_| ScrubError::malformed(format!(
            "Slidedat.ini [{}] {} = '{}' is not a non-negative integer", section, key, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}[GENERAL]\r\nSLIDE_ID = 1234\r\n; comment\r\n\r\n[HIERARCHICAL]\r\nINDEXFILE=Index.dat\r\nNONHIER_COUNT = 2\r\nNONHIER_0_NAME = Scan data layer\r\n";

    #[test]
    fn test_parse_sample() {
        let dat = Slidedat::parse(SAMPLE).unwrap();
        assert_eq!(dat.get("GENERAL", "SLIDE_ID"), Some("1234"));
        assert_eq!(dat.require("HIERARCHICAL", "INDEXFILE").unwrap(), "Index.dat");
        assert_eq!(dat.require_usize("HIERARCHICAL", "NONHIER_COUNT").unwrap(), 2);
        assert_eq!(dat.get("HIERARCHICAL", "NONHIER_0_NAME"), Some("Scan data layer"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let dat = Slidedat::parse("[A]\nKey = 1\n").unwrap();
        assert_eq!(dat.get("A", "Key"), Some("1"));
        assert_eq!(dat.get("A", "KEY"), None);
        assert_eq!(dat.get("a", "Key"), None);
    }

    #[test]
    fn test_continuation_lines() {
        let dat = Slidedat::parse("[A]\nKey = first\n  second\n").unwrap();
        assert_eq!(dat.get("A", "Key"), Some("first\nsecond"));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(Slidedat::parse("Key = 1\n").is_err());
        assert!(Slidedat::parse("[A]\nKey = 1\nKey = 2\n").is_err());
        assert!(Slidedat::parse("[A]\n[A]\n").is_err());
        assert!(Slidedat::parse("[A]\njust text\n").is_err());
    }

    #[test]
    fn test_require_usize_rejects_negative() {
        let dat = Slidedat::parse("[A]\nN = -1\n").unwrap();
        assert!(matches!(dat.require_usize("A", "N"), Err(ScrubError::MalformedContainer(_))));
        assert!(dat.require_usize("A", "Missing").is_err());
    }
}
