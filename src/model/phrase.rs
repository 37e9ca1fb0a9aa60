//! Sample-phrase compilation.
//!
//! A template such as `play {Song}` compiles once, at model-build time, into
//! an anchored case-insensitive regex with one greedy capture per slot
//! placeholder. The `{literal text | SlotName}` form declares a placeholder
//! whose literal reading should also satisfy it; only the name after the pipe
//! is recorded. Punctuation never blocks a match: both the template and the
//! candidate utterance are stripped of a fixed punctuation set first.

use regex::Regex;

use crate::error::{HarnessError, Result};

const PUNCTUATION: &[char] = &[
    ',', ';', ':', '.', '!', '?', '\'', '"', '(', ')', '[', ']', '/',
];

/// Normalize text for matching: drop punctuation, treat hyphens as spaces,
/// collapse whitespace runs, trim.
pub fn clean(text: &str) -> String {
    let stripped: String = text
        .chars()
        .map(|c| if c == '-' { ' ' } else { c })
        .filter(|c| !PUNCTUATION.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One capture within a successful phrase match, with its span inside the
/// matched utterance.
#[derive(Debug, Clone)]
pub struct CaptureSpan {
    pub value: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct PhraseMatch {
    pub matched: String,
    pub captures: Vec<CaptureSpan>,
}

#[derive(Debug, Clone)]
pub struct SamplePhrase {
    pub intent: String,
    pub template: String,
    pub slot_names: Vec<String>,
    matcher: Regex,
}

impl SamplePhrase {
    pub fn compile(intent: &str, template: &str) -> Result<Self> {
        let mut pattern = String::from("^");
        let mut slot_names = Vec::new();
        let mut rest = template;

        // Left to right: literal segment, then placeholder, repeat.
        while let Some(open) = rest.find('{') {
            let close = rest[open..].find('}').map(|i| open + i).ok_or_else(|| {
                HarnessError::Model(format!(
                    "unterminated slot placeholder in sample phrase: {template}"
                ))
            })?;
            push_literal(&mut pattern, &rest[..open]);
            let inner = &rest[open + 1..close];
            let slot_name = match inner.rsplit_once('|') {
                Some((_literal, name)) => name.trim(),
                None => inner.trim(),
            };
            if slot_name.is_empty() {
                return Err(HarnessError::Model(format!(
                    "empty slot name in sample phrase: {template}"
                )));
            }
            slot_names.push(slot_name.to_string());
            pattern.push_str("(.*)");
            rest = &rest[close + 1..];
        }
        push_literal(&mut pattern, rest);
        pattern.push('$');

        let matcher = Regex::new(&format!("(?i){pattern}")).map_err(|e| {
            HarnessError::Model(format!("sample phrase {template:?} does not compile: {e}"))
        })?;
        Ok(SamplePhrase {
            intent: intent.to_string(),
            template: template.to_string(),
            slot_names,
            matcher,
        })
    }

    /// Apply the matcher to an already-cleaned, trimmed utterance.
    pub fn matches(&self, cleaned_utterance: &str) -> Option<PhraseMatch> {
        let caps = self.matcher.captures(cleaned_utterance)?;
        let matched = caps.get(0)?.as_str().to_string();
        let captures = (1..caps.len())
            .filter_map(|i| caps.get(i))
            .map(|m| CaptureSpan {
                value: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect();
        Some(PhraseMatch { matched, captures })
    }
}

fn push_literal(pattern: &mut String, raw: &str) {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        // Pure punctuation collapses away, but inter-word spacing must
        // survive, e.g. the gap in "a {X}, {Y}".
        if raw.chars().any(|c| c.is_whitespace()) && !pattern.ends_with(' ') && pattern.len() > 1 {
            pattern.push(' ');
        }
        return;
    }
    if raw.starts_with(char::is_whitespace) && !pattern.ends_with(' ') && pattern.len() > 1 {
        pattern.push(' ');
    }
    pattern.push_str(&regex::escape(&cleaned));
    if raw.ends_with(char::is_whitespace) {
        pattern.push(' ');
    }
}
