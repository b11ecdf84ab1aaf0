use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // (Source: <document>, Page <n>) where the document name has no comma
    static ref CITATION_MARKER: Regex = Regex::new(r"\(Source: ([^,]+), Page (\d+)\)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub document: String,
    pub page: u32,
}

/// Reply text with its citation markers pulled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    pub content: String,
    pub citations: Vec<Citation>,
}

/// Splits `text` into prose and the citations it references.
///
/// Markers are matched left to right without overlap and removed together with
/// the spaces directly in front of them; everything else between them is kept
/// as-is. Citations come back in the order their markers start in `text`. A
/// marker whose page does not fit in a `u32` stays in the text, like any other
/// malformed marker.
pub fn parse_citations(text: &str) -> ParsedResponse {
    let mut content = text.to_string();
    let mut origin: Vec<usize> = (0..text.len()).collect();
    let mut found: Vec<(usize, Citation)> = Vec::new();

    // removing a marker can join its neighbours into a new one
    loop {
        let pass = strip_markers(&content, &origin);
        if pass.citations.is_empty() {
            break;
        }
        found.extend(pass.citations);
        content = pass.content;
        origin = pass.origin;
    }
    found.sort_by_key(|(at, _)| *at);

    ParsedResponse {
        content: content.trim().to_string(),
        citations: found.into_iter().map(|(_, citation)| citation).collect(),
    }
}

struct Pass {
    content: String,
    /// Byte offset in the caller's text for every byte of `content`.
    origin: Vec<usize>,
    citations: Vec<(usize, Citation)>,
}

fn strip_markers(text: &str, origin: &[usize]) -> Pass {
    let mut content = String::with_capacity(text.len());
    let mut kept = Vec::with_capacity(origin.len());
    let mut citations = Vec::new();
    let mut last_end = 0;

    for captures in CITATION_MARKER.captures_iter(text) {
        let whole = match captures.get(0) {
            Some(m) => m,
            None => continue,
        };
        let page = match captures[2].parse::<u32>() {
            Ok(page) => page,
            Err(_) => continue,
        };
        // the space that separated the marker from the prose goes with it
        let before = text[last_end..whole.start()]
            .trim_end_matches(|c: char| c == ' ' || c == '\t');
        content.push_str(before);
        kept.extend_from_slice(&origin[last_end..last_end + before.len()]);
        citations.push((
            origin[whole.start()],
            Citation {
                document: captures[1].trim().to_string(),
                page,
            },
        ));
        last_end = whole.end();
    }
    content.push_str(&text[last_end..]);
    kept.extend_from_slice(&origin[last_end..]);

    Pass {
        content,
        origin: kept,
        citations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflowing_page_is_left_in_place() {
        let text = "See (Source: Act, Page 99999999999).";
        let parsed = parse_citations(text);
        assert_eq!(parsed.content, text);
        assert!(parsed.citations.is_empty());
    }

    #[test]
    fn test_marker_between_sentences_keeps_one_space() {
        let parsed = parse_citations("First point (Source: A, Page 1) second point.");
        assert_eq!(parsed.content, "First point second point.");
    }

    #[test]
    fn test_newline_before_marker_is_kept() {
        let parsed = parse_citations("Para one.\n(Source: A, Page 1)\nPara two.");
        assert_eq!(parsed.content, "Para one.\n\nPara two.");
    }

    #[test]
    fn test_document_name_is_trimmed() {
        let parsed = parse_citations("x (Source:   Lease  , Page 3)");
        assert_eq!(parsed.citations[0].document, "Lease");
    }

    #[test]
    fn test_marker_formed_by_removal_is_also_extracted() {
        let parsed =
            parse_citations("Held (Source: Deed, Page 1 (Source: Lease, Page 2)) in full.");
        assert_eq!(parsed.content, "Held in full.");
        assert_eq!(
            parsed.citations,
            vec![
                Citation {
                    document: "Deed".to_string(),
                    page: 1
                },
                Citation {
                    document: "Lease".to_string(),
                    page: 2
                },
            ]
        );
    }
}
