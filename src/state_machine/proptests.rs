//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::conversation::{ChatTurn, Record, Speaker};
use crate::oracle::{InitialSnapshot, OracleReply};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("prop-session")
}

fn bot_turns(effects: &[Effect]) -> Vec<&ChatTurn> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::AppendTurn { turn } if turn.speaker == Speaker::Bot => Some(turn),
            _ => None,
        })
        .collect()
}

fn dispatches(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::RequestOracle { .. } | Effect::FetchInitial))
        .count()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_record() -> impl Strategy<Value = Record> {
    proptest::collection::vec(("[a-z_]{1,10}", "[a-zA-Z ]{0,12}"), 0..4).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(key, value)| (key, json!(value)))
            .collect()
    })
}

fn arb_reply() -> impl Strategy<Value = OracleReply> {
    (
        "[a-zA-Z !?]{0,40}",
        arb_record(),
        proptest::collection::vec("[a-zA-Z ]{1,10}", 0..4),
    )
        .prop_map(|(next_reply, record, options)| OracleReply {
            next_reply,
            record,
            options,
        })
}

fn arb_snapshot() -> impl Strategy<Value = InitialSnapshot> {
    (
        proptest::collection::vec("[a-zA-Z ]{1,20}".prop_map(ChatTurn::bot), 0..3),
        arb_record(),
    )
        .prop_map(|(history, record)| InitialSnapshot {
            history,
            record,
            options: vec![],
        })
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Uninitialized),
        any::<bool>().prop_map(|refresh| ConvState::Initializing { refresh }),
        Just(ConvState::Idle),
        Just(ConvState::AwaitingOracle),
        arb_reply().prop_map(|reply| ConvState::Revealing { reply }),
    ]
}

fn arb_busy_state() -> impl Strategy<Value = ConvState> {
    arb_state().prop_filter("busy phases only", ConvState::is_busy)
}

fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z]{1,5}[a-zA-Z ]{0,20}".prop_map(|text| Event::UserText { text }),
        "[a-zA-Z]{1,5}[a-zA-Z ]{0,20}".prop_map(|option| Event::OptionSelected { option }),
    ]
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,6}"
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::InitRequested),
        arb_snapshot().prop_map(|snapshot| Event::InitLoaded { snapshot }),
        "[a-z ]{1,20}".prop_map(|message| Event::InitFailed { message }),
        arb_user_event(),
        arb_reply().prop_map(|reply| Event::OracleReplied { reply }),
        "[a-z ]{1,20}".prop_map(|message| Event::OracleFailed { message }),
        "[a-zA-Z ]{0,10}".prop_map(|prefix| Event::RevealProgress { prefix }),
        Just(Event::RevealFinished),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Mutual exclusion: nothing new is dispatched while a call or reveal
    /// is outstanding
    #[test]
    fn prop_busy_rejects_user_input(state in arb_busy_state(), event in arb_user_event()) {
        let result = transition(&state, &test_context(), event);
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    /// A second initialize never overlaps an outstanding call or reveal
    #[test]
    fn prop_busy_rejects_initialize(state in arb_busy_state()) {
        let result = transition(&state, &test_context(), Event::InitRequested);
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    /// Blank input never changes anything
    #[test]
    fn prop_blank_input_is_noop(state in arb_state(), blank in arb_blank(), as_option in any::<bool>()) {
        let event = if as_option {
            Event::OptionSelected { option: blank }
        } else {
            Event::UserText { text: blank }
        };
        let result = transition(&state, &test_context(), event).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    /// Bot turns are only committed when a reveal finishes (the reply) or an
    /// advance fails (the apology)
    #[test]
    fn prop_bot_turns_follow_oracle_resolution(state in arb_state(), event in arb_event()) {
        let was_revealing = state.is_revealing();
        let was_awaiting = state == ConvState::AwaitingOracle;
        let finishing = matches!(event, Event::RevealFinished);
        let failing = matches!(event, Event::OracleFailed { .. });

        if let Ok(result) = transition(&state, &test_context(), event) {
            let bots = bot_turns(&result.effects);
            if !bots.is_empty() {
                prop_assert_eq!(bots.len(), 1);
                prop_assert!((was_revealing && finishing) || (was_awaiting && failing));
                prop_assert_eq!(result.new_state, ConvState::Idle);
            }
        }
    }

    /// At most one oracle call is dispatched per transition, and only from a
    /// phase with nothing in flight
    #[test]
    fn prop_single_dispatch(state in arb_state(), event in arb_event()) {
        let busy = state.is_busy();
        if let Ok(result) = transition(&state, &test_context(), event) {
            let count = dispatches(&result.effects);
            prop_assert!(count <= 1);
            if count == 1 {
                prop_assert!(!busy);
                prop_assert!(result.new_state.is_loading());
            }
        }
    }

    /// The record is only replaced on the way back to idle
    #[test]
    fn prop_record_replaced_only_when_settling(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            let replaces = result
                .effects
                .iter()
                .any(|e| matches!(e, Effect::ReplaceRecord { .. }));
            if replaces {
                prop_assert_eq!(result.new_state, ConvState::Idle);
            }
        }
    }

    /// A reveal always commits exactly the reply it was started with
    #[test]
    fn prop_reveal_commits_held_reply(reply in arb_reply()) {
        let context = test_context();
        let revealing = transition(
            &ConvState::AwaitingOracle,
            &context,
            Event::OracleReplied { reply: reply.clone() },
        ).unwrap();
        prop_assert_eq!(
            &revealing.effects,
            &vec![Effect::StartReveal { text: reply.next_reply.clone() }]
        );

        let done = transition(&revealing.new_state, &context, Event::RevealFinished).unwrap();
        prop_assert_eq!(&done.effects[0], &Effect::append_bot(reply.next_reply.clone()));
        prop_assert_eq!(&done.effects[1], &Effect::ReplaceRecord { record: reply.record.clone() });
        prop_assert_eq!(&done.effects[2], &Effect::ReplaceOptions { options: reply.options.clone() });
    }
}
