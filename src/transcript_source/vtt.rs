//! WebVTT caption flattening.

use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    // Cue markup such as <c>, </c>, <00:00:01.520> and <v Speaker>
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid regex"))
}

/// Flatten a WebVTT document into plain text.
///
/// Cue timings, identifiers, header/NOTE/STYLE blocks and inline markup are
/// dropped. Auto-generated captions repeat the previous line at the start of
/// each cue, so a line identical to the last emitted one is skipped.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for block in vtt.replace("\r\n", "\n").split("\n\n") {
        let block = block.trim();
        if block.is_empty()
            || block.starts_with("WEBVTT")
            || block.starts_with("NOTE")
            || block.starts_with("STYLE")
            || block.starts_with("REGION")
        {
            continue;
        }

        let mut in_payload = false;
        for line in block.lines() {
            if !in_payload {
                // Optional cue identifier precedes the timing line.
                if line.contains("-->") {
                    in_payload = true;
                }
                continue;
            }

            let text = decode_entities(&tag_regex().replace_all(line, ""));
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() || lines.last() == Some(&text) {
                continue;
            }
            lines.push(text);
        }
    }

    lines.join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
