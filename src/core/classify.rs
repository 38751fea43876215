//! Response Classification
//!
//! Decides what a raw assistant reply is (prose, fenced code, or a diagram
//! definition) and extracts fenced payloads. The diagram check is a keyword
//! heuristic over the whole reply; prose that happens to mention a keyword
//! is accepted as a false positive.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```([A-Za-z0-9_+-]*)[ \t]*\r?\n?").expect("valid regex"));

const DIAGRAM_KEYWORDS: [&str; 5] = [
    "sequencediagram",
    "graph",
    "classdiagram",
    "statediagram",
    "erdiagram",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Prose,
    Code,
    Diagram,
}

/// What a raw reply was classified as, with its extracted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedContent {
    pub kind: ContentKind,
    pub language: Option<String>,
    pub payload: String,
}

/// One fenced block found by [`scan_code_blocks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

/// First complete fenced block: `(language tag, trimmed inner text)`.
/// None when the reply holds no opener/closer pair.
fn fenced_block(response: &str) -> Option<(Option<String>, String)> {
    let open = RE_FENCE_OPEN.find(response)?;
    let rest = &response[open.end()..];
    let close = rest.find("```")?;

    let tag = open.as_str().trim_start_matches("```").trim();
    let language = if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    };

    Some((language, rest[..close].trim().to_string()))
}

/// Extract the first fenced payload, or hand the input back unchanged when
/// no complete fence pair exists. Total, never fails.
pub fn extract_fenced(response: &str) -> (Option<String>, String) {
    match fenced_block(response) {
        Some((language, inner)) => (language, inner),
        None => (None, response.to_string()),
    }
}

/// Classify a raw assistant reply.
pub fn classify(response: &str) -> ClassifiedContent {
    let lowered = response.to_lowercase();
    let block = fenced_block(response);
    let language = block.as_ref().and_then(|(lang, _)| lang.clone());

    let diagram = DIAGRAM_KEYWORDS.iter().any(|k| lowered.contains(k))
        || language
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("mermaid"));

    if diagram {
        let payload = match block {
            Some((_, inner)) => inner,
            None => response.to_string(),
        };
        return ClassifiedContent {
            kind: ContentKind::Diagram,
            language,
            payload,
        };
    }

    match block {
        Some((language, payload)) => ClassifiedContent {
            kind: ContentKind::Code,
            language,
            payload,
        },
        None => ClassifiedContent {
            kind: ContentKind::Prose,
            language: None,
            payload: response.to_string(),
        },
    }
}

/// All fenced blocks in left-to-right order, for rendering. Untagged blocks
/// are reported as `"plaintext"`.
pub fn scan_code_blocks(response: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut rest = response;

    while let Some(open) = RE_FENCE_OPEN.find(rest) {
        let tag = open.as_str().trim_start_matches("```").trim();
        let after = &rest[open.end()..];
        let Some(close) = after.find("```") else {
            break;
        };

        blocks.push(CodeBlock {
            language: if tag.is_empty() {
                "plaintext".to_string()
            } else {
                tag.to_string()
            },
            code: after[..close].trim().to_string(),
        });

        rest = &after[close + 3..];
    }

    blocks
}
