//! Query sandbox.
//!
//! Input is matched in canonical form (comments stripped, whitespace
//! collapsed, lowercased) against two layers: the operator denylist from
//! settings and a fixed set of structurally dangerous patterns. The original
//! text is what gets executed; the canonical form is only for matching.

use crate::config::ValidatorSettings;
use crate::error::{Result, TrainerError};
use regex::Regex;

const DANGEROUS_SQL_PATTERNS: &[&str] = &[
    r"(?i);\s*(insert|update|delete|drop|create|alter|truncate)",
    r"(?i)union.*select.*into",
    r"(?i)into\s+(outfile|dumpfile)",
    r"(?i)load_file",
    r"(?i)\bcopy\b.*\bprogram\b",
];

const DANGEROUS_EXPRESSION_PATTERNS: &[&str] = &[
    r"(?i)\beval\s*\(",
    r"(?i)\bexec\s*\(",
    r"(?i)\bsystem\s*\(",
    r"`[^`]+`",
    r"%x\{",
    r"(?i)file\.(delete|unlink|write)",
    r"(?i)dir\.(delete|rmdir)",
    r"(?i)connection\.(execute|exec_query|exec_insert|exec_update|exec_delete)",
];

/// Which input surface is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Sql,
    Expression,
}

impl Surface {
    fn empty_message(self) -> &'static str {
        match self {
            Self::Sql => "SQL query cannot be empty.",
            Self::Expression => "Expression cannot be empty.",
        }
    }

    fn forbidden_message(self, verb: &str) -> String {
        match self {
            Self::Sql => format!("Forbidden SQL command: '{verb}'."),
            Self::Expression => format!("Forbidden expression method: '{verb}'."),
        }
    }

    fn dangerous_message(self, fragment: &str) -> String {
        match self {
            Self::Sql => format!("Dangerous SQL pattern detected: '{fragment}'."),
            Self::Expression => format!("Dangerous expression pattern detected: '{fragment}'."),
        }
    }
}

/// Stateless validator built once from settings.
#[derive(Debug, Clone)]
pub struct QueryValidator {
    forbidden_sql: Option<Regex>,
    forbidden_expression: Option<Regex>,
    dangerous_sql: Vec<Regex>,
    dangerous_expression: Vec<Regex>,
}

impl QueryValidator {
    pub fn new(settings: &ValidatorSettings) -> Result<Self> {
        let forbidden_sql = denylist_pattern(&settings.forbidden_sql_commands, |list| {
            format!(r"^\s*({list})(?:\s|;|$)")
        })?;
        let forbidden_expression =
            denylist_pattern(&settings.forbidden_expression_methods, |list| {
                format!(r"\.({list})(?:\(|\s|$)")
            })?;

        Ok(Self {
            forbidden_sql,
            forbidden_expression,
            dangerous_sql: compile_all(DANGEROUS_SQL_PATTERNS)?,
            dangerous_expression: compile_all(DANGEROUS_EXPRESSION_PATTERNS)?,
        })
    }

    /// Rejects SQL the sandbox does not allow.
    pub fn validate_sql(&self, query: &str) -> Result<()> {
        self.validate(
            query,
            Surface::Sql,
            self.forbidden_sql.as_ref(),
            &self.dangerous_sql,
        )
    }

    /// Rejects object-query expressions the sandbox does not allow.
    pub fn validate_expression(&self, expression: &str) -> Result<()> {
        self.validate(
            expression,
            Surface::Expression,
            self.forbidden_expression.as_ref(),
            &self.dangerous_expression,
        )
    }

    fn validate(
        &self,
        input: &str,
        surface: Surface,
        forbidden: Option<&Regex>,
        dangerous: &[Regex],
    ) -> Result<()> {
        if input.trim().is_empty() {
            return Err(TrainerError::validation(surface.empty_message()));
        }

        let forms = readings(input);

        if let Some(verb) = forbidden.and_then(|pattern| {
            forms
                .iter()
                .find_map(|form| pattern.captures(form).and_then(|caps| caps.get(1)))
        }) {
            return Err(TrainerError::validation(
                surface.forbidden_message(verb.as_str()),
            ));
        }

        if let Some(fragment) = forms
            .iter()
            .find_map(|form| dangerous.iter().find_map(|pattern| pattern.find(form)))
        {
            return Err(TrainerError::validation(
                surface.dangerous_message(fragment.as_str()),
            ));
        }

        Ok(())
    }
}

/// How a quoted literal escapes its own quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escapes {
    /// `'it''s'`, plus `$tag$...$tag$` bodies.
    Doubled,
    /// `'it\'s'` as well as doubled quotes.
    Backslash,
}

/// Comment-stripped, whitespace-collapsed, lowercased copy of `input`.
///
/// Quoted literals are copied through untouched, so comment markers inside
/// them do not hide the text that follows.
pub fn canonicalize(input: &str) -> String {
    strip_comments(input, Escapes::Doubled)
}

/// Forms the sandbox matches input against; a match in any one rejects it.
fn readings(input: &str) -> [String; 3] {
    [
        canonicalize(input),
        strip_comments(input, Escapes::Backslash),
        collapse(input),
    ]
}

fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn strip_comments(input: &str, escapes: Escapes) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\'' | '"' | '`' => i = copy_quoted(&chars, i, escapes, &mut out),
            '$' if escapes == Escapes::Doubled => match dollar_tag(&chars, i) {
                Some(tag_len) => i = copy_dollar_quoted(&chars, i, tag_len, &mut out),
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            '-' if next == Some('-') => {
                // Line comment runs to end of line.
                i = chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map_or(chars.len(), |offset| i + offset);
            }
            '/' if next == Some('*') => {
                let close = chars[i + 2..]
                    .windows(2)
                    .position(|pair| pair == ['*', '/']);
                match close {
                    Some(offset) => {
                        out.push(' ');
                        i += 2 + offset + 2;
                    }
                    None => {
                        // Unterminated: keep the rest as text.
                        out.extend(&chars[i..]);
                        i = chars.len();
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    collapse(&out)
}

/// Copies the literal opening at `start`; returns the index after it.
fn copy_quoted(chars: &[char], start: usize, escapes: Escapes, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if escapes == Escapes::Backslash && c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
        if c == quote {
            if chars.get(i) == Some(&quote) {
                out.push(quote);
                i += 1;
            } else {
                return i;
            }
        }
    }
    i
}

/// Length of a `$tag$` opener at `start`, if there is one.
fn dollar_tag(chars: &[char], start: usize) -> Option<usize> {
    let body = &chars[start + 1..];
    if body.first().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    let tag_len = body
        .iter()
        .position(|&c| !(c.is_alphanumeric() || c == '_'))?;
    (body[tag_len] == '$').then_some(tag_len + 2)
}

fn copy_dollar_quoted(chars: &[char], start: usize, tag_len: usize, out: &mut String) -> usize {
    let tag = &chars[start..start + tag_len];
    let body_start = start + tag_len;
    let end = chars[body_start..]
        .windows(tag_len)
        .position(|window| window == tag)
        .map_or(chars.len(), |offset| body_start + offset + tag_len);
    out.extend(&chars[start..end]);
    end
}

fn denylist_pattern(
    entries: &[String],
    shape: impl Fn(&str) -> String,
) -> Result<Option<Regex>> {
    let escaped: Vec<String> = entries
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .map(|e| regex::escape(&e))
        .collect();

    if escaped.is_empty() {
        return Ok(None);
    }

    Regex::new(&shape(&escaped.join("|")))
        .map(Some)
        .map_err(|e| TrainerError::configuration(format!("Invalid validator denylist: {e}")))
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| TrainerError::internal(format!("Invalid sandbox pattern {p}: {e}")))
        })
        .collect()
}
