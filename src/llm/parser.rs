use std::collections::HashMap;

use regex::Regex;

use crate::llm::prompts::REVIEW_DELIMITER;
use crate::models::MIN_REVIEW_LEN;

// Extraction order: delimiter split, fence-stripped JSON array, bracket-span
// JSON array, then give up. Models rarely honor the format exactly, so every
// stage tolerates surrounding noise.
pub fn parse_reviews(raw: &str) -> Option<Vec<String>> {
    if raw.contains(REVIEW_DELIMITER) {
        let segments = split_delimited(raw);
        if !segments.is_empty() {
            return Some(segments);
        }
    }

    let stripped = strip_fences(raw);
    if let Ok(items) = serde_json::from_str::<Vec<String>>(stripped.trim()) {
        let cleaned = clean_segments(items.iter().map(|s| s.as_str()));
        if !cleaned.is_empty() {
            return Some(cleaned);
        }
    }

    if let Some(span) = bracket_span(&stripped) {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(span) {
            let cleaned = clean_segments(items.iter().map(|s| s.as_str()));
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }

    None
}

fn split_delimited(raw: &str) -> Vec<String> {
    clean_segments(raw.split(REVIEW_DELIMITER))
}

// Min-length filter with a salvage rule: if every non-empty segment is below
// the threshold, keep the non-empty ones rather than returning nothing.
fn clean_segments<'a>(segments: impl Iterator<Item = &'a str>) -> Vec<String> {
    let non_empty: Vec<&str> = segments
        .map(|s| s.trim().trim_matches('"').trim())
        .filter(|s| !s.is_empty())
        .collect();

    let long_enough: Vec<&str> = non_empty
        .iter()
        .copied()
        .filter(|s| s.len() >= MIN_REVIEW_LEN)
        .collect();

    let kept = if long_enough.is_empty() { non_empty } else { long_enough };
    kept.into_iter().map(|s| s.to_string()).collect()
}

fn strip_fences(text: &str) -> String {
    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim().to_string();
        }
    }
    if let Some(start) = text.find("```") {
        let start = start + 3;
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim().to_string();
        }
    }
    text.to_string()
}

// Lazy match: the first bracket-delimited span, not first-[ to last-].
// Prose after the array often contains its own brackets.
fn bracket_span(text: &str) -> Option<&str> {
    let re = Regex::new(r"\[[\s\S]*?\]").ok()?;
    re.find(text).map(|m| m.as_str())
}

// Multi-platform batch output: a JSON object keyed by platform name. Valid
// only when at least one requested platform maps to a non-empty array.
pub fn parse_batch(raw: &str, platforms: &[String]) -> Option<HashMap<String, Vec<String>>> {
    let stripped = strip_fences(raw);
    let object_text = if serde_json::from_str::<serde_json::Value>(stripped.trim()).is_ok() {
        stripped.trim().to_string()
    } else {
        brace_span(&stripped)?.to_string()
    };

    let value: serde_json::Value = serde_json::from_str(&object_text).ok()?;
    let object = value.as_object()?;

    let mut result = HashMap::new();
    for platform in platforms {
        let entry = object.iter().find(|(k, _)| k.eq_ignore_ascii_case(platform));
        let Some((_, v)) = entry else { continue };
        let Some(items) = v.as_array() else { continue };
        let texts = clean_segments(items.iter().filter_map(|i| i.as_str()));
        if !texts.is_empty() {
            result.insert(platform.clone(), texts);
        }
    }

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

// Pulls completed reviews out of streamed text as it arrives. A review is
// complete once the delimiter after it has been seen; the tail is flushed
// with finish().
pub struct ReviewScanner {
    buf: String,
}

impl ReviewScanner {
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buf.push_str(fragment);

        let mut completed = Vec::new();
        while let Some(idx) = self.buf.find(REVIEW_DELIMITER) {
            let segment: String = self.buf.drain(..idx + REVIEW_DELIMITER.len()).collect();
            let text = segment
                .trim_end_matches(REVIEW_DELIMITER)
                .trim()
                .trim_matches('"')
                .trim();
            if text.len() >= MIN_REVIEW_LEN {
                completed.push(text.to_string());
            }
        }
        completed
    }

    pub fn finish(mut self) -> Option<String> {
        let text = self.buf.split_off(0);
        let text = text.trim().trim_matches('"').trim();
        if text.len() >= MIN_REVIEW_LEN {
            Some(text.to_string())
        } else {
            None
        }
    }
}

impl Default for ReviewScanner {
    fn default() -> Self {
        Self::new()
    }
}
