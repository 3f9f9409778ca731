//! Known-bad value patterns (L001–L004).
//!
//! Unlike the structural phases this one walks raw values, including keys the
//! typed model ignores, and the comment text that only survives in the source.

use serde_yaml::Value;

use crate::error::Phase;
use crate::parse::types::Document;
use crate::report::Finding;
use crate::rules::RuleSet;

pub fn validate_policy(document: &Document, rules: &RuleSet) -> Vec<Finding> {
    let mut findings = Vec::new();

    let mut walker = ValueWalker {
        rules,
        path: Vec::new(),
        findings: &mut findings,
    };
    walker.walk(&document.raw, None);

    if let Some(source) = &document.source {
        l002_ascii_comments(source, &mut findings);
    }

    findings
}

// ---------------------------------------------------------------------------
// Value walk (L001, L003, L004)
// ---------------------------------------------------------------------------

enum Segment {
    Key(String),
    Index(usize),
    Named(String),
}

struct ValueWalker<'a> {
    rules: &'a RuleSet,
    path: Vec<Segment>,
    findings: &'a mut Vec<Finding>,
}

impl ValueWalker<'_> {
    /// `key` is the nearest enclosing mapping key, carried through lists.
    fn walk(&mut self, value: &Value, key: Option<&str>) {
        match value {
            Value::Mapping(map) => {
                for (k, v) in map {
                    let Some(k) = k.as_str() else { continue };
                    self.path.push(Segment::Key(k.to_string()));
                    self.check_entry(k, v);
                    self.walk(v, Some(k));
                    self.path.pop();
                }
            }
            Value::Sequence(items) => {
                let names: Vec<Option<&str>> = items.iter().map(entry_name).collect();
                for (i, item) in items.iter().enumerate() {
                    // Shared names fall back to the position so locators stay unambiguous.
                    let segment = match names[i] {
                        Some(name) if names.iter().filter(|n| **n == Some(name)).count() == 1 => {
                            Segment::Named(name.to_string())
                        }
                        _ => Segment::Index(i),
                    };
                    self.path.push(segment);
                    if let (Some(k), Value::String(s)) = (key, item) {
                        self.check_path_value(k, s);
                    }
                    self.walk(item, key);
                    self.path.pop();
                }
            }
            Value::Tagged(tagged) => self.walk(&tagged.value, key),
            _ => {}
        }
    }

    fn locator(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                Segment::Key(k) if out.is_empty() => out.push_str(k),
                Segment::Key(k) => {
                    out.push('.');
                    out.push_str(k);
                }
                Segment::Index(i) => out.push_str(&format!("[{}]", i)),
                Segment::Named(n) => out.push_str(&format!("[{}]", n)),
            }
        }
        out
    }

    fn check_entry(&mut self, key: &str, value: &Value) {
        if let Some(forbidden) = self.rules.forbidden_keys.iter().find(|f| f.key == key) {
            let finding = Finding::error(
                Phase::Policy,
                "L001",
                format!("'{}' {}", key, forbidden.reason),
                Some(self.locator()),
            )
            .with_suggestion(format!("remove '{}'", key));
            self.findings.push(finding);
        }

        if let Value::String(s) = value {
            self.check_path_value(key, s);
        }
    }

    fn check_path_value(&mut self, key: &str, value: &str) {
        if key == self.rules.path_field {
            self.l003_path_prefix(value);
        }
        if is_path_key(key) {
            self.l004_deprecated_path(value);
        }
    }

    fn l003_path_prefix(&mut self, value: &str) {
        let bad = self.rules.forbidden_path_prefix;
        let good = self.rules.path_prefix_substitute;
        if !value.starts_with(bad) {
            return;
        }
        let fixed = if value.len() == bad.len_utf8() {
            good.to_string()
        } else {
            format!("{}{}", good, value)
        };
        let finding = Finding::error(
            Phase::Policy,
            "L003",
            format!(
                "{} '{}' cannot start with '{}'; use '{}' instead",
                self.rules.path_field, value, bad, good
            ),
            Some(self.locator()),
        )
        .with_suggestion(format!("{}: \"{}\"", self.rules.path_field, fixed));
        self.findings.push(finding);
    }

    fn l004_deprecated_path(&mut self, value: &str) {
        let trimmed = value.trim_start();
        let Some(deprecated) = self
            .rules
            .deprecated_paths
            .iter()
            .find(|d| trimmed.starts_with(d.prefix.as_str()))
        else {
            return;
        };
        let rewritten = format!(
            "{}{}",
            deprecated.replacement,
            &trimmed[deprecated.prefix.len()..]
        );
        let finding = Finding::warning(
            Phase::Policy,
            "L004",
            format!(
                "Field path '{}' uses the deprecated '{}' form",
                value, deprecated.prefix
            ),
            Some(self.locator()),
        )
        .with_suggestion(format!("use '{}'", rewritten));
        self.findings.push(finding);
    }
}

fn entry_name(item: &Value) -> Option<&str> {
    item.get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
}

/// Keys whose values are field paths.
fn is_path_key(key: &str) -> bool {
    key.ends_with("path") || key.ends_with("field") || key.ends_with("fields")
}

// ---------------------------------------------------------------------------
// Comment text (L002)
// ---------------------------------------------------------------------------

/// The remote API rejects non-ASCII symbols in comments.
fn l002_ascii_comments(source: &str, findings: &mut Vec<Finding>) {
    // Indentation of the key that owns an open block scalar.
    let mut block_parent: Option<usize> = None;

    for (line_no, line) in source.lines().enumerate() {
        if let Some(parent) = block_parent {
            if line.trim().is_empty() || indent_of(line) > parent {
                continue;
            }
            block_parent = None;
        }

        let comment = comment_start(line);
        block_parent = block_scalar_parent(line, comment.unwrap_or(line.len()));

        let Some(start) = comment else {
            continue;
        };
        let mut offending: Vec<char> = Vec::new();
        for c in line[start + 1..].chars().filter(|c| !c.is_ascii()) {
            if !offending.contains(&c) {
                offending.push(c);
            }
        }
        if offending.is_empty() {
            continue;
        }
        let listed = offending
            .iter()
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(
            Finding::error(
                Phase::Policy,
                "L002",
                format!("Comment contains non-ASCII characters ({})", listed),
                Some(format!("line {}", line_no + 1)),
            )
            .with_suggestion("use ASCII only in comments, e.g. '->' instead of '→'"),
        );
    }
}

/// Text after the `#` that starts a comment, ignoring `#` inside quoted scalars.
#[cfg(test)]
fn comment_text(line: &str) -> Option<&str> {
    comment_start(line).map(|i| &line[i + 1..])
}

/// Byte offset of the `#` that starts a comment on this line.
///
/// A quote opens a quoted scalar only where a scalar can begin; elsewhere, as in
/// `it's`, it is an ordinary character of a plain scalar.
fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut last_token: Option<char> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') => match c {
                '\\' => {
                    chars.next();
                }
                '"' => quote = None,
                _ => {}
            },
            Some(_) => {
                if c == '\'' {
                    // `''` is an escaped quote inside a single-quoted scalar.
                    if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            None => match c {
                '\'' | '"' if starts_scalar(last_token) => quote = Some(c),
                '#' if prev.is_none_or(char::is_whitespace) => return Some(i),
                _ => {}
            },
        }
        if !c.is_whitespace() {
            last_token = Some(c);
        }
        prev = Some(c);
    }
    None
}

/// True when the previous token leaves the parser at the start of a scalar.
fn starts_scalar(last_token: Option<char>) -> bool {
    matches!(last_token, None | Some(':' | '-' | '?' | '[' | '{' | ','))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// When the line's value is a `|` or `>` block scalar header, the indentation that the
/// scalar's content lines must exceed.
fn block_scalar_parent(line: &str, content_end: usize) -> Option<usize> {
    let content = line[..content_end].trim_end();
    let (head, token) = match content.rfind(char::is_whitespace) {
        Some(i) => (content[..i].trim_end(), &content[i + 1..]),
        None => ("", content),
    };

    let mut indicators = token.chars();
    if !matches!(indicators.next(), Some('|' | '>')) || token.len() > 3 {
        return None;
    }
    if !indicators.all(|c| c == '+' || c == '-' || c.is_ascii_digit()) {
        return None;
    }

    // `key: |` nests under the key, `- |` under the dash.
    let mut column = indent_of(line);
    let mut last_dash = None;
    while line[column..].starts_with("- ") {
        last_dash = Some(column);
        column += 1;
        column += indent_of(&line[column..]);
    }

    if head.ends_with(':') {
        Some(column)
    } else if head.ends_with('-') || head.is_empty() {
        Some(last_dash.unwrap_or(column))
    } else {
        None
    }
}
