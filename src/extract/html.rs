//! HTML flattening and entity decoding.
//!
//! Everything here is plain string scanning. The provider serves
//! server-rendered markup that is far from standards-conformant, so a full DOM
//! is overkill; structural tags are treated as separators and the rest is
//! stripped. Case folding is ASCII-only so byte offsets into the original
//! document stay valid.

/// Lowercases ASCII letters only, leaving byte offsets intact.
pub fn ascii_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Finds the next `<name ...>`..`</name>` element at or after `from`.
///
/// `lower` must be the [`ascii_lower`] form of the document and `name` a
/// lowercase tag name. The open match requires a tag-name boundary, so
/// looking for `th` will not stop at `<thead>`. Returns byte offsets
/// `(start, end)` spanning the whole element including its close tag, valid
/// for slicing the original document.
pub fn next_element(lower: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut cursor = from;
    loop {
        let start = lower.get(cursor..)?.find(&open)? + cursor;
        let boundary = lower.as_bytes().get(start + open.len());
        if !matches!(
            boundary,
            None | Some(b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n')
        ) {
            cursor = start + open.len();
            continue;
        }
        let open_end = lower[start..].find('>')? + start + 1;
        let close_rel = lower[open_end..].find(&close)?;
        return Some((start, open_end + close_rel + close.len()));
    }
}

/// Content between a block's opening and closing tag, or `""` if malformed.
pub fn tag_inner(block: &str) -> &str {
    match (block.find('>'), block.rfind('<')) {
        (Some(open_end), Some(close_start)) if close_start > open_end => {
            &block[open_end + 1..close_start]
        }
        _ => "",
    }
}

/// Block elements whose *closing* tag implies a line break.
fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

/// Replaces markup with whitespace. Break tags and (when `breaks` is set)
/// closing block tags become `\n`; every other tag becomes a single space so
/// adjacent cell texts never fuse. Comments and `script`/`style` content are
/// dropped entirely. Unterminated constructs swallow the remainder rather
/// than erroring.
fn flatten(html: &str, breaks: bool) -> String {
    let lower = ascii_lower(html);
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    while i < lower.len() {
        if !lower[i..].starts_with('<') {
            let text_end = lower[i..].find('<').map_or(lower.len(), |r| i + r);
            out.push_str(&html[i..text_end]);
            i = text_end;
            continue;
        }

        if lower[i..].starts_with("<!--") {
            match lower[i + 4..].find("-->") {
                Some(rel) => i += 4 + rel + 3,
                None => break,
            }
            continue;
        }

        let tag_like = matches!(
            lower.as_bytes().get(i + 1),
            Some(c) if c.is_ascii_alphabetic() || *c == b'/' || *c == b'!'
        );
        if !tag_like {
            out.push('<');
            i += 1;
            continue;
        }

        let Some(gt_rel) = lower[i..].find('>') else {
            break;
        };
        let gt = i + gt_rel;
        let tag = &lower[i + 1..gt];
        let closing = tag.starts_with('/');
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();

        if !closing && (name == "script" || name == "style") {
            let close_pat = format!("</{name}");
            let Some(rel) = lower[gt + 1..].find(&close_pat) else {
                break;
            };
            let close_start = gt + 1 + rel;
            let Some(close_gt) = lower[close_start..].find('>') else {
                break;
            };
            out.push(' ');
            i = close_start + close_gt + 1;
            continue;
        }

        let is_break = name == "br" || (closing && is_block_tag(&name));
        out.push(if breaks && is_break { '\n' } else { ' ' });
        i = gt + 1;
    }
    out
}

/// Decodes the entity subset the provider actually emits: `nbsp`, `amp`,
/// `euro`, `quot`, `apos` plus decimal and hex character references.
/// Anything unrecognized passes through literally.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_one(tail) {
            Some((ch, used)) => {
                out.push(ch);
                rest = &tail[used..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_one(s: &str) -> Option<(char, usize)> {
    // Entities are short; a ';' further out means this '&' is plain text.
    let semi = s.bytes().take(12).position(|b| b == b';')?;
    let decoded = match &s[1..semi] {
        "nbsp" => Some(' '),
        "amp" => Some('&'),
        "euro" => Some('\u{20ac}'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        body => {
            let code = body.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    };
    decoded.map(|ch| (ch, semi + 1))
}

/// Collapses whitespace runs to single spaces and trims.
fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Flattens an HTML fragment into plain text: closing `p`/`div`/`li`/`tr`/
/// heading tags and any `br` become line breaks, remaining tags are stripped,
/// entities are decoded, whitespace is collapsed per line and empty lines are
/// dropped. Idempotent on already-plain input, empty in empty out.
pub fn normalize_html(html: &str) -> String {
    let lines: Vec<String> = decode_entities(&flatten(html, true))
        .split('\n')
        .map(collapse_ws)
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

/// One-line flat text of a fragment: tags stripped to spaces (no line
/// structure), entities decoded, whitespace collapsed.
pub fn strip_tags(s: &str) -> String {
    collapse_ws(&decode_entities(&flatten(s, false)))
}
