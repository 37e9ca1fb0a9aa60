use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use skill_harness::{
    ConfirmationStatus, DialogPhase, HarnessError, InteractionModel, SkillHarness,
};

fn pet_match_model() -> Value {
    json!({
        "interactionModel": {
            "languageModel": {
                "intents": [
                    {
                        "name": "PetMatchIntent",
                        "samples": ["get me a {size} dog", "get me a dog"],
                        "slots": [
                            { "name": "size", "type": "SIZE" },
                            { "name": "temperament", "type": "TEMPERAMENT" }
                        ]
                    },
                    { "name": "PlayIntent", "samples": ["play"] }
                ],
                "types": [
                    {
                        "name": "SIZE",
                        "values": [
                            { "name": { "value": "big" } },
                            { "name": { "value": "small" } }
                        ]
                    },
                    {
                        "name": "TEMPERAMENT",
                        "values": [
                            { "name": { "value": "guard" } },
                            { "name": { "value": "family" } }
                        ]
                    }
                ]
            },
            "dialog": {
                "intents": [{
                    "name": "PetMatchIntent",
                    "confirmationRequired": true,
                    "slots": [
                        {
                            "name": "size",
                            "type": "SIZE",
                            "elicitationRequired": true,
                            "prompts": { "elicitation": "Elicit.Slot.size" }
                        },
                        {
                            "name": "temperament",
                            "type": "TEMPERAMENT",
                            "elicitationRequired": true,
                            "prompts": { "elicitation": "Elicit.Slot.temperament" }
                        }
                    ]
                }]
            },
            "prompts": [
                {
                    "id": "Elicit.Slot.size",
                    "variations": [{ "type": "PlainText", "value": "What size dog?" }]
                },
                {
                    "id": "Elicit.Slot.temperament",
                    "variations": [{ "type": "PlainText", "value": "You want a {size} dog, but what temperament?" }]
                }
            ]
        }
    })
}

type Log = Arc<Mutex<Vec<Value>>>;

/// Harness wired to a handler that records every request and replies with a
/// fixed response (swappable mid-test through the shared slot).
fn harness_with_script(log: Log, script: Arc<Mutex<Value>>) -> SkillHarness {
    SkillHarness::builder()
        .interaction_model(pet_match_model())
        .handler(move |request: &Value| {
            log.lock().unwrap().push(request.clone());
            script.lock().unwrap().clone()
        })
        .build()
        .expect("harness builds")
}

fn empty_response() -> Value {
    json!({ "version": "1.0", "response": { "shouldEndSession": false } })
}

fn delegate_response() -> Value {
    json!({
        "version": "1.0",
        "response": {
            "shouldEndSession": false,
            "directives": [{ "type": "Dialog.Delegate" }]
        }
    })
}

#[tokio::test]
async fn delegate_advances_phase_monotonically() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(Mutex::new(delegate_response()));
    let mut harness = harness_with_script(log.clone(), script);

    harness.intend("PetMatchIntent").await.expect("turn 1");
    assert_eq!(harness.dialog().phase(), Some(DialogPhase::InProgress));

    harness.intend("PetMatchIntent").await.expect("turn 2");
    assert_eq!(
        harness.dialog().phase(),
        Some(DialogPhase::InProgress),
        "phase never regresses"
    );
    // The second request reports the in-progress dialog to the handler.
    let second = &log.lock().unwrap()[1];
    assert_eq!(second["request"]["dialogState"], "IN_PROGRESS");
}

#[tokio::test]
async fn confirm_intent_completes_the_dialog() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(Mutex::new(json!({
        "version": "1.0",
        "response": {
            "shouldEndSession": false,
            "directives": [{
                "type": "Dialog.ConfirmIntent",
                "updatedIntent": {
                    "name": "PetMatchIntent",
                    "confirmationStatus": "CONFIRMED",
                    "slots": {
                        "size": { "name": "size", "value": "big", "confirmationStatus": "CONFIRMED" }
                    }
                }
            }]
        }
    })));
    let mut harness = harness_with_script(log, script);

    harness.intend("PetMatchIntent").await.expect("turn");
    assert_eq!(harness.dialog().phase(), Some(DialogPhase::Completed));
    assert_eq!(harness.dialog().confirmation(), ConfirmationStatus::Confirmed);
    let size = harness.dialog().slot("size").expect("slot accumulated");
    assert_eq!(size.value.as_deref(), Some("big"));
}

#[tokio::test]
async fn confirmed_slot_survives_a_valueless_turn() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(Mutex::new(json!({
        "version": "1.0",
        "response": {
            "shouldEndSession": false,
            "directives": [{
                "type": "Dialog.ConfirmSlot",
                "updatedIntent": {
                    "name": "PetMatchIntent",
                    "slots": {
                        "size": { "name": "size", "value": "big", "confirmationStatus": "CONFIRMED" }
                    }
                }
            }]
        }
    })));
    let mut harness = harness_with_script(log.clone(), script.clone());

    harness.intend("PetMatchIntent").await.expect("turn 1");
    let size = harness.dialog().slot("size").expect("slot set");
    assert_eq!(size.confirmation, ConfirmationStatus::Confirmed);

    // Next turn supplies nothing for size; the handler sends a bare
    // placeholder back. The confirmed value must be untouched.
    *script.lock().unwrap() = json!({
        "version": "1.0",
        "response": {
            "shouldEndSession": false,
            "directives": [{
                "type": "Dialog.ConfirmSlot",
                "updatedIntent": {
                    "name": "PetMatchIntent",
                    "slots": { "size": { "name": "size" } }
                }
            }]
        }
    });
    harness.intend("PetMatchIntent").await.expect("turn 2");
    let size = harness.dialog().slot("size").expect("slot kept");
    assert_eq!(size.value.as_deref(), Some("big"));
    assert_eq!(size.confirmation, ConfirmationStatus::Confirmed);

    // And the outgoing turn-2 request replayed the accumulated value.
    let second = &log.lock().unwrap()[1];
    assert_eq!(second["request"]["intent"]["slots"]["size"]["value"], "big");
}

#[tokio::test]
async fn accumulated_slots_replay_into_later_requests() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(Mutex::new(delegate_response()));
    let mut harness = harness_with_script(log.clone(), script);

    harness
        .intend_with_slots(
            "PetMatchIntent",
            HashMap::from([("size".to_string(), "big".to_string())]),
        )
        .await
        .expect("turn 1");
    harness
        .intend_with_slots(
            "PetMatchIntent",
            HashMap::from([("temperament".to_string(), "guard".to_string())]),
        )
        .await
        .expect("turn 2");

    let second = &log.lock().unwrap()[1];
    let slots = &second["request"]["intent"]["slots"];
    assert_eq!(slots["size"]["value"], "big", "prior turn slot replayed");
    assert_eq!(slots["temperament"]["value"], "guard");
    // Slot values resolved against custom types carry resolution records.
    assert_eq!(
        slots["temperament"]["resolutionsPerAuthority"][0]["status"]["code"],
        "ER_SUCCESS_MATCH"
    );
}

#[tokio::test]
async fn directive_for_non_dialog_intent_is_fatal() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(Mutex::new(json!({
        "version": "1.0",
        "response": {
            "directives": [{
                "type": "Dialog.Delegate",
                "updatedIntent": { "name": "PlayIntent" }
            }]
        }
    })));
    let mut harness = harness_with_script(log, script);

    let err = harness.intend("PlayIntent").await.unwrap_err();
    assert!(matches!(err, HarnessError::Dialog(_)), "got {err:?}");
}

#[tokio::test]
async fn session_end_resets_dialog_state() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(Mutex::new(delegate_response()));
    let mut harness = harness_with_script(log, script.clone());

    harness
        .intend_with_slots(
            "PetMatchIntent",
            HashMap::from([("size".to_string(), "big".to_string())]),
        )
        .await
        .expect("turn");
    assert!(harness.dialog().slot("size").is_some());

    *script.lock().unwrap() = empty_response();
    harness.end_session().await.expect("session end");
    assert_eq!(harness.dialog().phase(), None);
    assert!(harness.dialog().slot("size").is_none());
}

#[test]
fn prompts_interpolate_current_slot_values() {
    let model = InteractionModel::from_json(pet_match_model()).expect("model builds");
    let prompt = model.prompt("Elicit.Slot.temperament").expect("prompt exists");
    let rendered = prompt.render(&HashMap::from([("size".to_string(), "big".to_string())]));
    assert_eq!(rendered, "You want a big dog, but what temperament?");
}

#[test]
fn dialog_intent_lookup_only_covers_declared_intents() {
    let model = InteractionModel::from_json(pet_match_model()).expect("model builds");
    assert!(model.dialog_intent("PetMatchIntent").is_some());
    assert!(model.dialog_intent("PlayIntent").is_none());
}
