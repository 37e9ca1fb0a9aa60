//! Platform builtin catalogs: slot-value tables for builtin slot types and
//! the audio-control intent set injected when a model opts into playback.

/// Long-form words accepted by `AMAZON.NUMBER` alongside the digit pattern.
/// The table is deliberately the common spoken range; digits cover the rest.
pub const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight",
    "nine", "ten", "eleven", "twelve", "thirteen", "fourteen", "fifteen",
    "sixteen", "seventeen", "eighteen", "nineteen", "twenty", "thirty",
    "forty", "fifty", "sixty", "seventy", "eighty", "ninety", "hundred",
    "thousand", "million",
];

pub const NUMBER_TYPE: &str = "AMAZON.NUMBER";
pub const NUMBER_PATTERN: &str = "^[0-9]+$";

pub const PAUSE_INTENT: &str = "AMAZON.PauseIntent";
pub const RESUME_INTENT: &str = "AMAZON.ResumeIntent";

/// Builtin intents synthesized when audio control is enabled, with their
/// canonical sample phrases. Pause/Resume are declared by the caller but
/// still need their phrase corpus merged in.
pub const AUDIO_BUILTIN_INTENTS: &[(&str, &[&str])] = &[
    ("AMAZON.CancelIntent", &["cancel", "never mind", "forget it"]),
    ("AMAZON.LoopOffIntent", &["loop off"]),
    ("AMAZON.LoopOnIntent", &["loop", "loop on", "keep repeating this song"]),
    ("AMAZON.NextIntent", &["next", "skip", "skip forward"]),
    ("AMAZON.PauseIntent", &["pause", "pause that"]),
    ("AMAZON.PreviousIntent", &["go back", "skip back", "back up"]),
    ("AMAZON.RepeatIntent", &["repeat", "say that again", "repeat that"]),
    ("AMAZON.ResumeIntent", &["resume", "continue", "keep going"]),
    ("AMAZON.ShuffleOffIntent", &["stop shuffling", "shuffle off", "turn off shuffle"]),
    ("AMAZON.ShuffleOnIntent", &["shuffle", "shuffle on", "shuffle the music", "shuffle mode"]),
    ("AMAZON.StartOverIntent", &["start over", "restart", "start again"]),
];

/// True for intent names the platform owns. Invoking one by name is legal
/// even when the model does not declare it.
pub fn is_builtin_intent(name: &str) -> bool {
    name.starts_with("AMAZON.")
}

pub fn is_builtin_slot_type(name: &str) -> bool {
    name.starts_with("AMAZON.")
}
