//! Property-based tests for the conversation store
//!
//! - Appending a user turn grows the history by exactly one user turn
//! - Stored text is the case-normalized input
//! - Existing turns are never reordered or modified by an append

use super::{Conversation, InputCase, Role};
use proptest::prelude::*;

fn arb_message() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.!?,ÄÖÜßéÈ]{1,80}"
}

fn arb_input_case() -> impl Strategy<Value = InputCase> {
    prop_oneof![Just(InputCase::Lowercase), Just(InputCase::Preserve)]
}

fn arb_context() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("SYSTEM: [a-zA-Z ]{0,40}", 0..4)
}

proptest! {
    #[test]
    fn append_grows_by_one_user_turn(context in arb_context(), message in arb_message()) {
        let mut conv = Conversation::new(context, InputCase::Lowercase);
        let before = conv.len();

        conv.append_user_turn(&message);

        prop_assert_eq!(conv.len(), before + 1);
        prop_assert_eq!(conv.last().unwrap().role, Role::User);
    }

    #[test]
    fn stored_text_is_lowercased(message in arb_message()) {
        let mut conv = Conversation::with_default_context();
        conv.append_user_turn(&message);
        prop_assert_eq!(conv.last().unwrap().text(), message.to_lowercase());
    }

    #[test]
    fn appends_preserve_order(
        context in arb_context(),
        case in arb_input_case(),
        messages in proptest::collection::vec(arb_message(), 1..10),
    ) {
        let mut conv = Conversation::new(context.clone(), case);
        let seeded = conv.turns().to_vec();

        for message in &messages {
            conv.append_user_turn(message);
        }

        prop_assert_eq!(conv.len(), context.len() + messages.len());
        prop_assert_eq!(&conv.turns()[..seeded.len()], seeded.as_slice());
        let stored: Vec<String> = conv.exchanged().iter().map(super::Turn::text).collect();
        let expected: Vec<String> = messages.iter().map(|m| case.apply(m)).collect();
        prop_assert_eq!(stored, expected);
    }
}
