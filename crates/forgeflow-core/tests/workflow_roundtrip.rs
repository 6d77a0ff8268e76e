//! Serialization properties for the workflow model.

use forgeflow_core::{Binding, Step, WorkflowSpec};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_]{1,15}".prop_map(|s| format!("k_{s}"))
}

fn text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.]{0,30}"
}

fn binding() -> impl Strategy<Value = Option<Binding>> {
    prop_oneof![
        Just(None),
        identifier().prop_map(|k| Some(Binding::context(k))),
        (0usize..8, proptest::option::of(identifier())).prop_map(|(i, key)| {
            Some(Binding::StepOutput {
                source_step_index: i,
                source_key: key,
            })
        }),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    (
        identifier(),
        binding(),
        identifier(),
        proptest::option::of(identifier()),
        proptest::option::of(text()),
    )
        .prop_map(|(name, input_from, output_to, on_error, description)| Step {
            component_name: name,
            input_from,
            output_to,
            on_error,
            description,
        })
}

fn workflow() -> impl Strategy<Value = WorkflowSpec> {
    (
        identifier(),
        proptest::collection::vec(step(), 0..6),
        proptest::collection::btree_map(identifier(), identifier(), 0..3),
        proptest::collection::btree_map(identifier(), identifier(), 0..3),
        proptest::option::of(text()),
    )
        .prop_map(|(id, steps, inputs, outputs, description)| WorkflowSpec {
            id,
            steps,
            inputs,
            outputs,
            description,
        })
}

proptest! {
    #[test]
    fn json_round_trip_preserves_workflow(wf in workflow()) {
        let text = wf.to_json().unwrap();
        prop_assert_eq!(WorkflowSpec::from_json(&text).unwrap(), wf);
    }

    #[test]
    fn yaml_round_trip_preserves_workflow(wf in workflow()) {
        let text = wf.to_yaml().unwrap();
        prop_assert_eq!(WorkflowSpec::from_yaml(&text).unwrap(), wf);
    }
}
