//! Report text sanitization
//!
//! Generated reports use markdown emphasis; the PDF uses the standard
//! Helvetica fonts with a single-byte encoding. `clean_markdown` strips the
//! markup and `encode_latin1` maps each character to one byte.
//!
//! Fallback policy: any character outside Latin-1, and the C1 control range
//! U+0080..U+009F (which WinAnsi repurposes), becomes `FALLBACK_BYTE`.
//! Tabs become a space. Other C0 controls are dropped before markers are
//! stripped, so removing them cannot join two halves of a marker.

/// Placeholder for characters the encoding cannot represent
pub const FALLBACK_BYTE: u8 = b'?';

/// Two-character emphasis and heading markers
const MARKERS: [&str; 3] = ["**", "__", "##"];

/// Remove bold and heading markers and normalize bullets to `- `.
/// The result never contains a marker pair, however the input interleaves them.
pub fn clean_markdown(text: &str) -> String {
    let normalized: String = text
        .replace("\r\n", "\n")
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == '\n' || *c == '\t')
        .collect();

    let lines: Vec<String> = normalized
        .lines()
        .map(|line| {
            let indent_len = line.len() - line.trim_start().len();
            let (indent, body) = line.split_at(indent_len);

            let body = if let Some(rest) = strip_bullet(body) {
                format!("- {}", rest)
            } else {
                body.trim_start_matches('#').trim_start().to_string()
            };

            format!("{}{}", indent, body)
        })
        .collect();

    strip_markers(lines.join("\n").replace('•', "-"))
}

/// Remove marker pairs until none is left; one removal can join the
/// halves of another (`*##*`).
fn strip_markers(mut text: String) -> String {
    loop {
        let stripped = MARKERS
            .iter()
            .fold(text.clone(), |acc, marker| acc.replace(marker, ""));
        if stripped == text {
            return text;
        }
        text = stripped;
    }
}

fn strip_bullet(body: &str) -> Option<&str> {
    ["* ", "• ", "+ "]
        .iter()
        .find_map(|marker| body.strip_prefix(marker))
}

/// Encode to single bytes per the fallback policy above
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c as u32 {
            0x09 => Some(b' '),
            0x0A => Some(b'\n'),
            0x00..=0x1F | 0x7F => None,
            0x80..=0x9F => Some(FALLBACK_BYTE),
            code @ 0x20..=0xFF => Some(code as u8),
            _ => Some(FALLBACK_BYTE),
        })
        .collect()
}

/// `clean_markdown` then `encode_latin1`
pub fn sanitize_report_text(text: &str) -> Vec<u8> {
    encode_latin1(&clean_markdown(text))
}
