//! HTML to plain text conversion for rendered pages

/// Elements whose content never reaches the extracted text
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "nav", "footer", "header",
];

/// Marker appended to content cut at the length cap
pub const TRUNCATION_MARKER: &str = "... (content truncated)";

/// Convert rendered HTML to a single line of plain text
///
/// Drops script/style/nav/footer/header (and similar) subtrees, separates
/// text from adjacent elements with a space, decodes common entities and
/// collapses all whitespace runs to one space.
pub fn html_to_text(html: &str) -> String {
    let mut output = String::new();
    let mut skip_elements: Vec<String> = Vec::new();

    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let mut tag = String::new();
            while let Some(next) = chars.next() {
                if next == '>' && !is_open_comment(&tag) {
                    break;
                }
                tag.push(next);
            }

            // Element boundaries separate words
            if skip_elements.is_empty() {
                output.push(' ');
            }

            if tag.starts_with('!') || tag.starts_with('?') {
                // Comment, doctype or processing instruction
                continue;
            }

            let tag_lower = tag.to_lowercase();
            let is_closing = tag_lower.starts_with('/');
            let tag_name = tag_lower
                .trim_start_matches('/')
                .split(|ch: char| ch.is_whitespace() || ch == '/')
                .next()
                .unwrap_or("");

            if SKIP_TAGS.contains(&tag_name) {
                if is_closing {
                    if let Some(pos) = skip_elements.iter().rposition(|t| t == tag_name) {
                        skip_elements.truncate(pos);
                    }
                } else if !tag.ends_with('/') {
                    skip_elements.push(tag_name.to_string());
                }
            }
        } else if skip_elements.is_empty() {
            output.push(decode_entity(c, &mut chars));
        }
    }

    collapse_whitespace(&output)
}

/// True while a `<!-- ... -->` comment has not seen its terminator
fn is_open_comment(tag: &str) -> bool {
    tag.starts_with("!--") && !(tag.len() >= 5 && tag.ends_with("--"))
}

/// Decode HTML entity starting from ampersand
fn decode_entity(c: char, chars: &mut std::iter::Peekable<std::str::Chars>) -> char {
    if c != '&' {
        return c;
    }

    // Look ahead without consuming so a bare '&' keeps the following text
    let lookahead: String = chars.clone().take(12).collect();
    let Some(end) = lookahead.find(';') else {
        return '&';
    };
    let entity = &lookahead[..end];
    if entity.is_empty() || entity.chars().any(char::is_whitespace) {
        return '&';
    }

    let decoded = match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "copy" => Some('\u{a9}'),
        "reg" => Some('\u{ae}'),
        _ => decode_numeric_entity(entity),
    };

    match decoded {
        Some(ch) => {
            // Consume entity body and ';'
            for _ in 0..=entity.chars().count() {
                chars.next();
            }
            ch
        }
        None => '&',
    }
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let num = entity.strip_prefix('#')?;
    let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

/// Collapse every whitespace run to a single space and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, appending the marker
///
/// Returns the (possibly cut) text and whether truncation happened.
pub fn truncate_chars(text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            (cut, true)
        }
        None => (text, false),
    }
}

/// First `max_chars` characters of `text`
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
