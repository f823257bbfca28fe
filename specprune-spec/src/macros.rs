//! Macro table used while parsing.
//!
//! Only the subset needed to evaluate `%define` / `%global` bodies is
//! implemented. Unknown macros and shell expansions are left literal, the way
//! rpm leaves undefined macros in place.

use crate::error::{SpecError, SpecResult};
use std::collections::BTreeMap;

/// Seed values for macros that real-world spec files redefine in terms of
/// themselves (`%global version %{version}`). The values are placeholders.
pub const BOOTSTRAP_MACROS: &[(&str, &str)] = &[
    ("release", "1"),
    ("version", "4.0.0"),
    ("commit", "x"),
    ("embedded_git_tag", "tag"),
    ("embedded_git_tree_state", "clean"),
];

pub const MAX_EXPANSION_DEPTH: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    defs: BTreeMap<String, String>,
}

#[derive(Debug)]
enum ExpandError {
    Unterminated,
    Recursion { name: String },
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table seeded with [`BOOTSTRAP_MACROS`].
    pub fn bootstrap() -> Self {
        BOOTSTRAP_MACROS.iter().copied().collect()
    }

    pub fn define(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.defs.insert(name.into(), body.into());
    }

    pub fn undefine(&mut self, name: &str) -> Option<String> {
        self.defs.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.defs.get(name).map(String::as_str)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand every macro reference in `text`.
    pub fn expand(&self, text: &str) -> SpecResult<String> {
        self.expand_at(text, 0)
    }

    pub(crate) fn expand_at(&self, text: &str, line: usize) -> SpecResult<String> {
        let mut out = String::with_capacity(text.len());
        self.expand_into(text, 0, &mut out)
            .map_err(|e| expand_error(e, line))?;
        Ok(out)
    }

    /// Evaluate one `%define`, `%global` or `%undefine` directive.
    pub(crate) fn apply_directive(&mut self, directive: &str, line: usize) -> SpecResult<()> {
        let directive = directive.trim();
        let (keyword, rest) = directive
            .split_once(char::is_whitespace)
            .unwrap_or((directive, ""));
        let rest = rest.trim_start();
        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let (name, after) = rest.split_at(name_end);
        if name.is_empty() {
            return Err(SpecError::Parse {
                line,
                message: format!("{keyword} without a macro name"),
            });
        }

        if keyword == "%undefine" {
            self.undefine(name);
            return Ok(());
        }

        // Parameterized macros are only expanded on use, with arguments we never have.
        if after.starts_with('(') {
            self.define(name, after.trim());
            return Ok(());
        }
        if !after.is_empty() && !after.starts_with(char::is_whitespace) {
            return Err(SpecError::Parse {
                line,
                message: format!("invalid macro name in '{directive}'"),
            });
        }

        let body = self.expand_at(after.trim(), line)?;
        if references(&body, name) {
            return Err(SpecError::SelfReferentialMacro {
                name: name.to_string(),
                line,
            });
        }
        self.define(name, body);
        Ok(())
    }

    fn expand_into(&self, text: &str, depth: usize, out: &mut String) -> Result<(), ExpandError> {
        let mut i = 0;
        while i < text.len() {
            let Some(off) = text[i..].find('%') else {
                out.push_str(&text[i..]);
                break;
            };
            out.push_str(&text[i..i + off]);
            i += off;
            let rest = &text[i + 1..];

            match rest.as_bytes().first() {
                Some(b'%') => {
                    out.push('%');
                    i += 2;
                }
                Some(b'{') => {
                    let close = matching(rest, b'{', b'}').ok_or(ExpandError::Unterminated)?;
                    self.expand_braced(&rest[1..close], depth, out)?;
                    i += close + 2;
                }
                Some(b'(') => {
                    let close = matching(rest, b'(', b')').ok_or(ExpandError::Unterminated)?;
                    out.push_str(&text[i..i + close + 2]);
                    i += close + 2;
                }
                Some(c) if c.is_ascii_alphabetic() || *c == b'_' => {
                    let len = rest
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(rest.len());
                    let name = &rest[..len];
                    match self.defs.get(name) {
                        Some(body) => self.expand_named(name, body, depth, out)?,
                        None => {
                            out.push('%');
                            out.push_str(name);
                        }
                    }
                    i += len + 1;
                }
                _ => {
                    out.push('%');
                    i += 1;
                }
            }
        }
        Ok(())
    }

    fn expand_braced(&self, inner: &str, depth: usize, out: &mut String) -> Result<(), ExpandError> {
        let mut negate = false;
        let mut conditional = false;
        let mut rest = inner;
        loop {
            if let Some(r) = rest.strip_prefix('!') {
                negate = true;
                rest = r;
            } else if let Some(r) = rest.strip_prefix('?') {
                conditional = true;
                rest = r;
            } else {
                break;
            }
        }
        let (name, alt) = match rest.split_once(':') {
            Some((name, alt)) => (name, Some(alt)),
            None => (rest, None),
        };

        if conditional {
            let defined = self.defs.get(name);
            match (defined.is_some() != negate, alt) {
                (false, _) => {}
                (true, Some(alt)) => self.expand_into(alt, depth, out)?,
                (true, None) => {
                    if let Some(body) = defined {
                        self.expand_named(name, body, depth, out)?;
                    }
                }
            }
            return Ok(());
        }

        match (self.defs.get(name), alt, negate) {
            (Some(body), None, false) => self.expand_named(name, body, depth, out),
            _ => {
                out.push_str("%{");
                out.push_str(inner);
                out.push('}');
                Ok(())
            }
        }
    }

    fn expand_named(
        &self,
        name: &str,
        body: &str,
        depth: usize,
        out: &mut String,
    ) -> Result<(), ExpandError> {
        if depth >= MAX_EXPANSION_DEPTH {
            return Err(ExpandError::Recursion {
                name: name.to_string(),
            });
        }
        self.expand_into(body, depth + 1, out)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MacroTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for MacroTable {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.define(k, v);
        }
    }
}

fn expand_error(err: ExpandError, line: usize) -> SpecError {
    match err {
        ExpandError::Unterminated => SpecError::Parse {
            line,
            message: "unterminated macro expression".to_string(),
        },
        ExpandError::Recursion { name } => SpecError::MacroRecursion {
            name,
            line,
            limit: MAX_EXPANSION_DEPTH,
        },
    }
}

/// Index in `s` of the delimiter closing the one at `s[0]`.
fn matching(s: &str, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, b) in s.bytes().enumerate() {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Whether `body` still contains an unconditional reference to `name`.
fn references(body: &str, name: &str) -> bool {
    let braced = format!("%{{{name}}}");
    if body.contains(&braced) {
        return true;
    }
    let bare = format!("%{name}");
    body.match_indices(&bare).any(|(idx, _)| {
        let escaped = idx > 0 && body.as_bytes()[idx - 1] == b'%';
        let next = body[idx + bare.len()..].chars().next();
        !escaped && !matches!(next, Some(c) if c.is_ascii_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_plain_and_braced() {
        let table: MacroTable = [("name", "microshift"), ("ver", "4.0.0")].into_iter().collect();
        assert_eq!(
            table.expand("%{name}-%ver.tar.gz").unwrap(),
            "microshift-4.0.0.tar.gz"
        );
        assert_eq!(table.expand("100%% done").unwrap(), "100% done");
    }

    #[test]
    fn undefined_references_stay_literal() {
        let table = MacroTable::new();
        assert_eq!(
            table.expand("%{_bindir}/x %_sysconfdir %(date)").unwrap(),
            "%{_bindir}/x %_sysconfdir %(date)"
        );
    }

    #[test]
    fn conditional_forms() {
        let table: MacroTable = [("with_x", "1")].into_iter().collect();
        assert_eq!(table.expand("[%{?with_x}]").unwrap(), "[1]");
        assert_eq!(table.expand("[%{?with_y}]").unwrap(), "[]");
        assert_eq!(table.expand("[%{?with_x:on}]").unwrap(), "[on]");
        assert_eq!(table.expand("[%{!?with_y:off}]").unwrap(), "[off]");
        assert_eq!(table.expand("[%{!?with_x:off}]").unwrap(), "[]");
    }

    #[test]
    fn nested_definitions_expand_at_definition_time() {
        let mut table = MacroTable::bootstrap();
        table.apply_directive("%global version %{version}", 1).unwrap();
        table
            .apply_directive("%global full %{version}-%{release}", 2)
            .unwrap();
        assert_eq!(table.get("version"), Some("4.0.0"));
        assert_eq!(table.get("full"), Some("4.0.0-1"));
    }

    #[test]
    fn self_reference_without_seed_fails() {
        let mut table = MacroTable::new();
        let err = table
            .apply_directive("%global version %{version}", 4)
            .unwrap_err();
        assert!(matches!(
            err,
            SpecError::SelfReferentialMacro { ref name, line: 4 } if name == "version"
        ));
    }

    #[test]
    fn mutual_recursion_is_caught() {
        let mut table = MacroTable::new();
        table.define("a", "%{b}");
        table.define("b", "%{a}");
        let err = table.expand("%{a}").unwrap_err();
        assert!(matches!(err, SpecError::MacroRecursion { .. }));
    }

    #[test]
    fn unterminated_brace_is_a_parse_error() {
        let mut table = MacroTable::new();
        let err = table.apply_directive("%define foo %{bar", 9).unwrap_err();
        assert!(matches!(err, SpecError::Parse { line: 9, .. }));
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let mut table = MacroTable::new();
        assert!(table.apply_directive("%define", 1).is_err());
        assert!(table.apply_directive("%global -x", 1).is_err());
    }

    #[test]
    fn undefine_and_parameterized() {
        let mut table = MacroTable::bootstrap();
        table.apply_directive("%undefine commit", 1).unwrap();
        assert!(!table.is_defined("commit"));
        table
            .apply_directive("%define cmd(a) echo %{1} %{cmd}", 2)
            .unwrap();
        assert_eq!(table.get("cmd"), Some("(a) echo %{1} %{cmd}"));
    }
}
