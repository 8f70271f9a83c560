use docgraph_jsonc::{parse, pretty_print_value, PrettyOptions};
use proptest::prelude::*;
use serde_json::Value;

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z /*,\\]}]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z/]{1,6}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn pretty_output_reparses_to_same_value(value in arb_json(), max_line_width in 0usize..100) {
        let options = PrettyOptions { max_line_width, ..PrettyOptions::default() };
        let text = pretty_print_value(&value, &options);
        prop_assert_eq!(parse(&text).unwrap(), value);
    }

    #[test]
    fn wide_budget_keeps_output_on_one_line(value in arb_json()) {
        let options = PrettyOptions { max_line_width: usize::MAX / 2, ..PrettyOptions::default() };
        let text = pretty_print_value(&value, &options);
        prop_assert!(!text.contains('\n'));
    }
}
