use crate::integration_tests::_support::replay_app;
use objquery::query::Order;
use proptest::prelude::*;

fn any_order() -> impl Strategy<Value = Order> {
    prop_oneof![Just(Order::Asc), Just(Order::Desc)]
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_field_appears_at_most_once_with_last_direction(
        calls in proptest::collection::vec((0usize..4, any_order()), 0..20)
    ) {
        let fields = ["a", "b", "c", "d"];
        let (app, _gw) = replay_app(vec![]);
        let mut q = app.query("T");
        for (i, order) in &calls {
            q.order_by(fields[*i], *order);
        }
        let rendered = q.params().order.unwrap_or_default();
        let tokens: Vec<&str> = rendered.split(',').filter(|s| !s.is_empty()).collect();

        for (i, f) in fields.iter().enumerate() {
            let hits: Vec<&&str> = tokens.iter().filter(|t| t.trim_start_matches('-') == *f).collect();
            match calls.iter().rev().find(|(j, _)| *j == i) {
                None => prop_assert!(hits.is_empty()),
                Some((_, last)) => {
                    prop_assert_eq!(hits.len(), 1);
                    prop_assert_eq!(hits[0].starts_with('-'), *last == Order::Desc);
                }
            }
        }
    }
}
