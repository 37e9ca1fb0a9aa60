//! Free-text utterance matching.
//!
//! Every sample phrase of every intent is a candidate. A candidate survives
//! only if its captures pass the slot-boundary check and resolve against
//! their declared slot types; survivors are scored so that phrases consuming
//! more literal text (and less slot-variable text) win, with a tie-break
//! toward phrases whose slots validated against a real type.

use std::collections::HashMap;

use tracing::debug;

use super::phrase::{clean, CaptureSpan, SamplePhrase};
use super::slots::{SlotMatch, SlotTypeRegistry};
use super::Intent;
use crate::error::{HarnessError, Result};

/// A slot captured from an utterance, with its resolution outcome.
#[derive(Debug, Clone)]
pub struct MatchedSlot {
    pub name: String,
    pub value: String,
    pub resolution: SlotMatch,
}

#[derive(Debug, Clone)]
pub struct UtteranceMatch {
    pub intent: String,
    pub slots: Vec<MatchedSlot>,
}

struct Candidate {
    intent: String,
    slots: Vec<MatchedSlot>,
    /// Literal characters consumed: match length minus slot-capture lengths.
    score: i64,
    /// Captures that validated against a real (non-free-form) type.
    typed_slots: usize,
}

pub fn match_utterance(
    phrases: &[SamplePhrase],
    intents: &HashMap<String, Intent>,
    registry: &SlotTypeRegistry,
    utterance: &str,
) -> Result<UtteranceMatch> {
    let cleaned = clean(utterance);
    let mut best: Option<Candidate> = None;

    for phrase in phrases {
        let Some(phrase_match) = phrase.matches(&cleaned) else {
            continue;
        };
        let Some(intent) = intents.get(&phrase.intent) else {
            continue;
        };
        let Some(candidate) = evaluate(phrase, intent, registry, &phrase_match.matched, &phrase_match.captures)
        else {
            continue;
        };
        debug!(
            intent = %candidate.intent,
            template = %phrase.template,
            score = candidate.score,
            typed = candidate.typed_slots,
            "utterance candidate"
        );
        let better = match &best {
            None => true,
            Some(b) => {
                candidate.score > b.score
                    || (candidate.score == b.score && candidate.typed_slots > b.typed_slots)
            }
        };
        if better {
            best = Some(candidate);
        }
    }

    match best {
        Some(c) => Ok(UtteranceMatch {
            intent: c.intent,
            slots: c.slots,
        }),
        None => Err(HarnessError::NoMatch {
            utterance: utterance.to_string(),
        }),
    }
}

fn evaluate(
    phrase: &SamplePhrase,
    intent: &Intent,
    registry: &SlotTypeRegistry,
    matched: &str,
    captures: &[CaptureSpan],
) -> Option<Candidate> {
    let mut slots = Vec::with_capacity(captures.len());
    let mut slot_chars = 0i64;
    let mut typed_slots = 0usize;

    for (name, capture) in phrase.slot_names.iter().zip(captures) {
        let capture = trimmed_span(capture);
        if !boundary_ok(matched, &capture) {
            return None;
        }
        let slot_type = intent.slot_type_of(name);
        let resolution = registry.resolve(slot_type, &capture.value);
        if !resolution.matched {
            return None;
        }
        if !resolution.untyped {
            typed_slots += 1;
        }
        slot_chars += capture.value.len() as i64;
        slots.push(MatchedSlot {
            name: name.clone(),
            value: resolution.value.clone(),
            resolution,
        });
    }

    Some(Candidate {
        intent: phrase.intent.clone(),
        slots,
        score: matched.len() as i64 - slot_chars,
        typed_slots,
    })
}

/// Shrink a capture to its non-whitespace core so the boundary check looks
/// at the characters around the actual slot value.
fn trimmed_span(capture: &CaptureSpan) -> CaptureSpan {
    let leading = capture.value.len() - capture.value.trim_start().len();
    let trimmed = capture.value.trim();
    CaptureSpan {
        value: trimmed.to_string(),
        start: capture.start + leading,
        end: capture.start + leading + trimmed.len(),
    }
}

/// A capture that is not the entire match must touch whitespace on at least
/// one side, so "slotfoo" never satisfies the template "slot{X}".
fn boundary_ok(matched: &str, capture: &CaptureSpan) -> bool {
    if capture.value == matched {
        return true;
    }
    let before = matched[..capture.start].chars().next_back();
    let after = matched[capture.end..].chars().next();
    matches!(before, Some(c) if c.is_whitespace()) || matches!(after, Some(c) if c.is_whitespace())
}
