use proptest::prelude::*;
use sdk::errors::{CapabilityError, PipelineErrorExt};
use sdk::types::{string_list, StepInput};
use serde_json::{json, Value};

// Every capability error carries a static, user-safe hint and is step-level.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            CapabilityError::MissingParameter(error_str.clone()),
            CapabilityError::InvalidParameter(error_str.clone()),
            CapabilityError::NotFound(error_str.clone()),
            CapabilityError::Network(error_str.clone()),
            CapabilityError::Format(error_str.clone()),
            CapabilityError::Provider(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!err.is_fatal());
            if !error_str.is_empty() {
                prop_assert!(!hint.contains(error_str.as_str()) || hint.len() >= error_str.len());
            }
        }
    }
}

// A list of strings always survives coercion unchanged and in order.
proptest! {
    #[test]
    fn test_string_list_preserves_string_lists(items in prop::collection::vec("[a-zA-Zéè ]{0,12}", 0..8)) {
        let value = Value::Array(items.iter().cloned().map(Value::String).collect());
        prop_assert_eq!(string_list(&value), items.clone());

        let input = StepInput::new().with_param("keywords", value);
        prop_assert_eq!(input.param_str_list("keywords"), items);
    }

    #[test]
    fn test_single_string_becomes_one_element(word in "[a-z]{1,10}") {
        prop_assert_eq!(string_list(&json!(word.clone())), vec![word]);
    }
}
