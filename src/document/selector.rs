//! CSS selector subset used to find post time elements.
//!
//! Supported: comma-separated groups of compound selectors joined by
//! descendant (whitespace) or child (`>`) combinators. A compound selector is
//! an optional tag name or `*` followed by any number of `.class`, `#id`,
//! `[attr]` and `[attr=value]` conditions.

use crate::constants::DEFAULT_SELECTOR;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { name: String },
    Eq { name: String, value: String },
}

/// One compound selector such as `div.post-time[data-kind=created]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Part {
    pub(crate) compound: Compound,
    /// Relation to the part on the left, `None` for the first part
    pub(crate) combinator: Option<Combinator>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Vec<Part>>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self> {
        let source = selector.trim();
        if source.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }

        let groups = split_groups(source)?
            .into_iter()
            .map(|group| parse_chain(group, source))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: source.to_string(),
            groups,
        })
    }

    /// The selector text as given, trimmed
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn groups(&self) -> &[Vec<Part>] {
        &self.groups
    }
}

impl Default for Selector {
    /// `div.post-time`
    fn default() -> Self {
        Selector::parse(DEFAULT_SELECTOR).expect("Default post time selector should parse")
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split on commas that are not inside brackets or quotes.
fn split_groups(selector: &str) -> Result<Vec<&str>> {
    let mut groups = Vec::new();
    let mut start = 0usize;
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, ch) in selector.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if bracket_depth > 0 => quote = Some(ch),
            (None, '[') => bracket_depth += 1,
            (None, ']') => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::UnsupportedSelector(selector.to_string()))?;
            }
            (None, ',') if bracket_depth == 0 => {
                groups.push(selector[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if bracket_depth != 0 || quote.is_some() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    groups.push(selector[start..].trim());

    if groups.iter().any(|group| group.is_empty()) {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(groups)
}

/// Break a group into compound tokens and `>` markers.
fn tokenize(group: &str, source: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in group.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' if bracket_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::UnsupportedSelector(source.to_string()))?;
                current.push(ch);
            }
            c if c.is_whitespace() && bracket_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '>' if bracket_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            }
            '+' | '~' if bracket_depth == 0 => {
                return Err(Error::UnsupportedSelector(source.to_string()));
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_chain(group: &str, source: &str) -> Result<Vec<Part>> {
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(group, source)? {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(Error::UnsupportedSelector(source.to_string()));
            }
            pending = Some(Combinator::Child);
            continue;
        }

        let compound = parse_compound(&token, source)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part { compound, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(Error::UnsupportedSelector(source.to_string()));
    }
    Ok(parts)
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

fn take_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && is_ident_char(chars[*i]) {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

fn parse_compound(token: &str, source: &str) -> Result<Compound> {
    let unsupported = || Error::UnsupportedSelector(source.to_string());
    let chars: Vec<char> = token.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0usize;

    if chars.first() == Some(&'*') {
        i += 1;
    } else {
        let tag = take_ident(&chars, &mut i);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let class = take_ident(&chars, &mut i);
                if class.is_empty() {
                    return Err(unsupported());
                }
                compound.classes.push(class);
            }
            '#' => {
                i += 1;
                let id = take_ident(&chars, &mut i);
                if id.is_empty() || compound.id.is_some() {
                    return Err(unsupported());
                }
                compound.id = Some(id);
            }
            '[' => {
                let close = chars[i..].iter().position(|c| *c == ']').ok_or_else(unsupported)? + i;
                let body: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attr_condition(&body).ok_or_else(unsupported)?);
                i = close + 1;
            }
            _ => return Err(unsupported()),
        }
    }

    Ok(compound)
}

fn parse_attr_condition(body: &str) -> Option<AttrCondition> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (body.trim(), None),
    };
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    let name = name.to_ascii_lowercase();

    let Some(value) = value else {
        return Some(AttrCondition::Exists { name });
    };
    let unquoted = match value.chars().next() {
        Some(q @ ('"' | '\'')) => value.strip_prefix(q)?.strip_suffix(q)?,
        _ if !value.is_empty() && value.chars().all(is_ident_char) => value,
        _ => return None,
    };
    Some(AttrCondition::Eq {
        name,
        value: unquoted.to_string(),
    })
}
