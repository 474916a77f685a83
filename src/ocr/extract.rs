use anyhow::{anyhow, Result};
use regex::Regex;

use super::engine::OcrLine;

/// Isolated single letters bounded by word boundaries: stray characters the
/// recognizer produces for icons and avatar fragments.
const NOISE_TOKEN_PATTERN: &str = r"\b[a-zA-Z]\b";

/// First integer or decimal substring in a comment.
const NUMBER_PATTERN: &str = r"\d+(\.\d+)?";

/// The recognizer consistently misreads the UI separator glyph between
/// username and comment as the word "pinned". The exact token is load-bearing;
/// do not generalize it.
const SEPARATOR_MISREAD: &str = "pinned";

/// Separator the misread token is rewritten to, and the split delimiter.
const FIELD_SEPARATOR: &str = " - ";

/// The two fields a cleaned comment screenshot yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedComment {
    pub username: String,
    pub comment: String,
}

/// Assembles recognized lines into the (username, comment) pair.
///
/// Lines are joined in recognizer order, stripped of single-letter noise
/// tokens, lowercased, the misread separator token is rewritten, whitespace
/// is collapsed, and the result is split on the separator. Anything other
/// than exactly two fields is malformed input: the image is not a comment
/// screenshot in the expected layout, or recognition degraded too far to
/// trust.
pub fn assemble_fields(lines: &[OcrLine]) -> Result<ParsedComment> {
    if lines.is_empty() {
        return Err(anyhow!("Recognizer returned no text"));
    }

    let joined = lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let cleaned = clean_text(&joined)?;

    let fields: Vec<&str> = cleaned.split(FIELD_SEPARATOR).collect();
    if fields.len() != 2 {
        return Err(anyhow!(
            "Expected username and comment, got {} field(s) in {:?}",
            fields.len(),
            cleaned
        ));
    }

    Ok(ParsedComment {
        username: fields[0].to_string(),
        comment: fields[1].to_string(),
    })
}

/// Noise removal, lowercasing, separator rewrite, whitespace collapse.
fn clean_text(raw: &str) -> Result<String> {
    let noise_regex = Regex::new(NOISE_TOKEN_PATTERN)?;
    let whitespace_regex = Regex::new(r"\s+")?;

    let stripped = noise_regex.replace_all(raw, "");
    let lowered = stripped.to_lowercase();
    let separated = lowered.replace(SEPARATOR_MISREAD, FIELD_SEPARATOR);
    let collapsed = whitespace_regex.replace_all(&separated, " ");

    Ok(collapsed.trim().to_string())
}

/// Derives the transaction value from a comment: the first numeric token
/// (spaces removed first, so split digits still match), scaled by 1000 and
/// truncated toward zero.
///
/// Returns `None` when the comment contains no numeric token. The ×1000
/// scaling is flat: magnitude does not change the multiplier.
pub fn derive_transaction_value(comment: &str) -> Option<i64> {
    let number_regex = Regex::new(NUMBER_PATTERN).ok()?;

    let despaced: String = comment.chars().filter(|c| !c.is_whitespace()).collect();
    let matched = number_regex.find(&despaced)?;
    let number: f64 = matched.as_str().parse().ok()?;

    Some((number * 1000.0) as i64)
}
