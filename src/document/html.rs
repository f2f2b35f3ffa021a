use super::{Document, NodeId};
use crate::error::{Error, Result};

/// Open element on the tree builder's stack and where its content starts
struct Open {
    node: NodeId,
    inner_start: usize,
}

pub(super) fn parse(html: &str) -> Result<Document> {
    let mut doc = Document::empty(html);
    let mut stack: Vec<Open> = Vec::new();
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let parent = stack.last().map(|open| open.node).unwrap_or(doc.root);

        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| Error::HtmlParse(format!("unclosed HTML comment at byte {}", i)))?;
            doc.create_comment(parent, html[i + 4..end].to_string());
            i = end + 3;
            continue;
        }

        // Doctype, CDATA and processing instructions carry no content we need
        if starts_with_at(bytes, i, b"<!") || starts_with_at(bytes, i, b"<?") {
            let end = find_byte(bytes, i, b'>')
                .ok_or_else(|| Error::HtmlParse(format!("unclosed markup declaration at byte {}", i)))?;
            i = end + 1;
            continue;
        }

        if starts_with_at(bytes, i, b"</") {
            let (tag, next) = parse_end_tag(html, i)?;
            close_element(&mut doc, &mut stack, &tag, i);
            i = next;
            continue;
        }

        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            let node = doc.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) {
                let close = find_case_insensitive_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{}>", tag)))?;
                let body = &html[i..close];
                if !body.is_empty() {
                    let text = if is_escapable_raw_text_tag(&tag) {
                        decode_character_references(body)
                    } else {
                        body.to_string()
                    };
                    doc.create_text(node, text);
                }
                doc.set_inner_span(node, i..close);
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if is_void_tag(&tag) {
                continue;
            }
            if self_closing {
                doc.set_inner_span(node, i..i);
                continue;
            }
            stack.push(Open { node, inner_start: i });
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && !starts_markup(bytes, i) {
            i += 1;
        }
        doc.create_text(parent, decode_character_references(&html[text_start..i]));
    }

    // Whatever is still open runs to the end of the input
    while let Some(open) = stack.pop() {
        doc.set_inner_span(open.node, open.inner_start..html.len());
    }

    Ok(doc)
}

/// Pop up to and including the nearest open element named `tag`.
/// End tags with no matching open element are ignored.
fn close_element(doc: &mut Document, stack: &mut Vec<Open>, tag: &str, at: usize) {
    let Some(pos) = stack
        .iter()
        .rposition(|open| doc.tag_name(open.node).is_some_and(|name| name == tag))
    else {
        return;
    };

    for open in stack.drain(pos..) {
        doc.set_inner_span(open.node, open.inner_start..at);
    }
}

fn starts_markup(bytes: &[u8], at: usize) -> bool {
    if bytes[at] != b'<' {
        return false;
    }
    match bytes.get(at + 1) {
        Some(b) if b.is_ascii_alphabetic() => true,
        Some(b'/' | b'!' | b'?') => true,
        _ => false,
    }
}

fn parse_start_tag(html: &str, at: usize) -> Result<(String, Vec<(String, String)>, bool, usize)> {
    let bytes = html.as_bytes();
    let unclosed = || Error::HtmlParse(format!("unclosed start tag at byte {}", at));
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html[tag_start..i].to_ascii_lowercase();

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        match bytes.get(i) {
            None => return Err(unclosed()),
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') => {
                i += 1;
                skip_ws(bytes, &mut i);
                if bytes.get(i) == Some(&b'>') {
                    self_closing = true;
                    i += 1;
                    break;
                }
                continue;
            }
            Some(_) => {}
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let name = html[name_start..i].to_ascii_lowercase();

        skip_ws(bytes, &mut i);
        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            match bytes.get(i) {
                None => return Err(unclosed()),
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let end = find_byte(bytes, i + 1, quote).ok_or_else(unclosed)?;
                    let value = decode_character_references(&html[i + 1..end]);
                    i = end + 1;
                    value
                }
                Some(_) => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    decode_character_references(&html[value_start..i])
                }
            }
        } else {
            String::new()
        };

        // First occurrence wins, as in browsers
        if !name.is_empty() && !attrs.iter().any(|(existing, _)| *existing == name) {
            attrs.push((name, value));
        }
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html[tag_start..i].to_ascii_lowercase();
    let end = find_byte(bytes, i, b'>')
        .ok_or_else(|| Error::HtmlParse(format!("unclosed end tag at byte {}", at)))?;
    Ok((tag, end + 1))
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes.get(at..at + needle.len()) == Some(needle)
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes.get(from..)?.iter().position(|b| *b == needle).map(|pos| pos + from)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Position of the `</tag` that ends a raw-text element.
fn find_case_insensitive_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while let Some(lt) = find_subslice(bytes, i, b"</") {
        let name = bytes.get(lt + 2..lt + 2 + tag.len())?;
        let boundary = bytes.get(lt + 2 + tag.len()).map_or(true, |b| !is_tag_char(*b));
        if name.eq_ignore_ascii_case(tag) && boundary {
            return Some(lt);
        }
        i = lt + 2;
    }
    None
}

pub(super) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

/// Elements whose content is not parsed as markup
fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

fn is_escapable_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "textarea" | "title")
}

/// Elements whose text is serialized without escaping
pub(super) fn is_literal_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

pub(super) fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

pub(super) fn escape_attr_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Decode numeric and common named character references.
/// Unknown or malformed references are kept as written.
pub(super) fn decode_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest[1..]
            .find(';')
            .filter(|semi| *semi > 0 && *semi <= 32)
            .and_then(|semi| decode_reference(&rest[1..=semi]).map(|ch| (ch, semi + 2)));

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let codepoint = match numeric.strip_prefix(&['x', 'X'][..]) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(codepoint);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        "ensp" => Some('\u{2002}'),
        "emsp" => Some('\u{2003}'),
        "thinsp" => Some('\u{2009}'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        "trade" => Some('™'),
        "laquo" => Some('«'),
        "raquo" => Some('»'),
        "ldquo" => Some('“'),
        "rdquo" => Some('”'),
        "lsquo" => Some('‘'),
        "rsquo" => Some('’'),
        "hellip" => Some('…'),
        "middot" => Some('·'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "bull" => Some('•'),
        _ => None,
    }
}
