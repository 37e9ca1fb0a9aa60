use serde_json::json;
use skill_harness::{HarnessError, InteractionModel};

fn pet_model() -> InteractionModel {
    let model = json!({
        "interactionModel": {
            "languageModel": {
                "invocationName": "pet shop",
                "intents": [
                    {
                        "name": "PlayIntent",
                        "samples": ["play", "play next", "play {Song}", "play the song {Song}"],
                        "slots": [{ "name": "Song" }]
                    },
                    {
                        "name": "SlotIntent",
                        "samples": ["slot {Name}", "slot{Name}"],
                        "slots": [{ "name": "Name" }]
                    },
                    {
                        "name": "CountIntent",
                        "samples": ["count {Amount}"],
                        "slots": [{ "name": "Amount", "type": "AMAZON.NUMBER" }]
                    },
                    {
                        "name": "UntypedPickIntent",
                        "samples": ["pick {Thing}"],
                        "slots": [{ "name": "Thing" }]
                    },
                    {
                        "name": "TypedPickIntent",
                        "samples": ["pick {Color}"],
                        "slots": [{ "name": "Color", "type": "COLOR" }]
                    },
                    {
                        "name": "CountryIntent",
                        "samples": ["i live in {Country}"],
                        "slots": [{ "name": "Country", "type": "COUNTRY" }]
                    }
                ],
                "types": [
                    {
                        "name": "COLOR",
                        "values": [
                            { "name": { "value": "red" } },
                            { "name": { "value": "green" } }
                        ]
                    },
                    {
                        "name": "COUNTRY",
                        "values": [
                            { "id": "US", "name": { "value": "US", "synonyms": ["USA", "America", "US"] } },
                            { "id": "CA", "name": { "value": "Canada", "synonyms": ["CA"] } }
                        ]
                    }
                ]
            }
        }
    });
    InteractionModel::from_json(model).expect("model builds")
}

#[test]
fn literal_phrase_matches_case_and_punctuation_insensitive() {
    let model = pet_model();
    let matched = model.match_utterance("Play NEXT!").expect("should match");
    assert_eq!(matched.intent, "PlayIntent");
    assert!(matched.slots.is_empty());
}

#[test]
fn untyped_slot_captures_free_text() {
    let model = pet_model();
    let matched = model.match_utterance("slot value").expect("should match");
    assert_eq!(matched.intent, "SlotIntent");
    assert_eq!(matched.slots.len(), 1);
    assert_eq!(matched.slots[0].name, "Name");
    assert_eq!(matched.slots[0].value, "value");
}

#[test]
fn no_phrase_means_no_match() {
    let model = pet_model();
    let err = model.match_utterance("sing something").unwrap_err();
    match err {
        HarnessError::NoMatch { utterance } => assert_eq!(utterance, "sing something"),
        other => panic!("expected NoMatch, got {other:?}"),
    }
}

#[test]
fn more_literal_text_outscores_wider_slot_capture() {
    let model = pet_model();
    // Both "play {Song}" and "play the song {Song}" match; the latter
    // consumes more literal text and must win.
    let matched = model
        .match_utterance("play the song yesterday")
        .expect("should match");
    assert_eq!(matched.intent, "PlayIntent");
    assert_eq!(matched.slots[0].value, "yesterday");
}

#[test]
fn typed_slot_breaks_score_ties() {
    let model = pet_model();
    // "pick {Thing}" (untyped) and "pick {Color}" (typed) tie on score for
    // "pick red"; the typed candidate wins.
    let matched = model.match_utterance("pick red").expect("should match");
    assert_eq!(matched.intent, "TypedPickIntent");
    assert_eq!(matched.slots[0].value, "red");
}

#[test]
fn typed_candidate_rejected_falls_back_to_untyped() {
    let model = pet_model();
    // "blue" is not a COLOR value, so the typed phrase is rejected and the
    // untyped phrase is the only survivor.
    let matched = model.match_utterance("pick blue").expect("should match");
    assert_eq!(matched.intent, "UntypedPickIntent");
    assert_eq!(matched.slots[0].value, "blue");
}

#[test]
fn slot_capture_requires_a_whitespace_boundary() {
    let model = pet_model();
    // "slot{Name}" compiles, but "slotfoo" leaves the capture with no
    // natural boundary, so only whitespace-separated forms match.
    let err = model.match_utterance("slotfoo").unwrap_err();
    assert!(matches!(err, HarnessError::NoMatch { .. }));
}

#[test]
fn alternative_slot_form_records_the_name_after_the_pipe() {
    let model = json!({
        "intents": [{
            "name": "TravelIntent",
            "samples": ["travel to {home | Destination}"],
            "slots": [{ "name": "Destination" }]
        }]
    });
    let model = InteractionModel::from_json(model).expect("model builds");
    // The literal reading satisfies the placeholder...
    let matched = model.match_utterance("travel to home").expect("literal reading");
    assert_eq!(matched.intent, "TravelIntent");
    assert_eq!(matched.slots[0].name, "Destination");
    assert_eq!(matched.slots[0].value, "home");
    // ...as does any other capture.
    let matched = model.match_utterance("travel to Lisbon").expect("free text");
    assert_eq!(matched.slots[0].value, "Lisbon");
}

#[test]
fn number_slot_accepts_digits_and_words() {
    let model = pet_model();
    for utterance in ["count 19801", "count one", "count Thirteen"] {
        let matched = model.match_utterance(utterance).expect("number matches");
        assert_eq!(matched.intent, "CountIntent", "failed for {utterance:?}");
    }
    let err = model.match_utterance("count 19801a").unwrap_err();
    assert!(
        matches!(err, HarnessError::NoMatch { .. }),
        "19801a must not pass AMAZON.NUMBER"
    );
}

#[test]
fn synonym_resolution_yields_canonical_id() {
    let model = pet_model();
    let resolution = model.slot_types().resolve(Some("COUNTRY"), "america");
    assert!(resolution.matched);
    assert!(!resolution.untyped);
    assert_eq!(resolution.entities, vec![("US".to_string(), "US".to_string())]);
}

#[test]
fn overlapping_synonyms_yield_multiple_entities() {
    let model = json!({
        "intents": [{ "name": "A", "samples": ["go {Place}"], "slots": [{ "name": "Place", "type": "PLACE" }] }],
        "types": [{
            "name": "PLACE",
            "values": [
                { "id": "P1", "name": { "value": "park", "synonyms": ["green space"] } },
                { "id": "P2", "name": { "value": "garden", "synonyms": ["green space"] } }
            ]
        }]
    });
    let model = InteractionModel::from_json(model).expect("model builds");
    let resolution = model.slot_types().resolve(Some("PLACE"), "green space");
    assert_eq!(resolution.entities.len(), 2, "both authorities must survive");
}

#[test]
fn unmatched_custom_value_produces_no_match_record() {
    let model = pet_model();
    let resolution = model.slot_types().resolve(Some("COUNTRY"), "Narnia");
    assert!(!resolution.matched);
    let record = model
        .slot_types()
        .resolutions_per_authority(Some("COUNTRY"), &resolution, "app-id")
        .expect("custom type produces a record");
    assert_eq!(record[0]["status"]["code"], "ER_SUCCESS_NO_MATCH");
    assert_eq!(record[0]["values"].as_array().map(Vec::len), Some(0));
}

#[test]
fn builtin_only_types_produce_no_resolution_records() {
    let model = pet_model();
    let resolution = model.slot_types().resolve(Some("AMAZON.NUMBER"), "7");
    assert!(resolution.matched);
    let record =
        model
            .slot_types()
            .resolutions_per_authority(Some("AMAZON.NUMBER"), &resolution, "app-id");
    assert!(record.is_none());
}

#[test]
fn audio_builtin_phrases_join_the_corpus() {
    let model = json!({
        "intents": [
            { "name": "AMAZON.PauseIntent" },
            { "name": "AMAZON.ResumeIntent" },
            { "name": "PlayIntent", "samples": ["play"] }
        ]
    });
    let model = InteractionModel::from_json(model).expect("model builds");
    assert!(model.audio_control_enabled());
    let matched = model.match_utterance("skip forward").expect("builtin phrase");
    assert_eq!(matched.intent, "AMAZON.NextIntent");
    let matched = model.match_utterance("PAUSE").expect("builtin phrase");
    assert_eq!(matched.intent, "AMAZON.PauseIntent");
}

#[test]
fn pause_without_resume_disables_audio_control() {
    let model = json!({
        "intents": [
            { "name": "AMAZON.PauseIntent" },
            { "name": "PlayIntent", "samples": ["play"] }
        ]
    });
    let model = InteractionModel::from_json(model).expect("model builds");
    assert!(!model.audio_control_enabled());
    assert!(model.match_utterance("skip forward").is_err());
}

#[test]
fn phrase_slot_missing_from_intent_is_a_model_error() {
    let model = json!({
        "intents": [{ "name": "A", "samples": ["go {Nowhere}"], "slots": [] }]
    });
    let err = InteractionModel::from_json(model).unwrap_err();
    assert!(matches!(err, HarnessError::Model(_)));
}
