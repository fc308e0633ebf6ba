use std::collections::BTreeSet;
use std::time::Duration;

use casebook::view::{
    DialogMode, DialogOrchestrator, FilterController, SelectionSet, SortKey, ViewFilterState,
};
use casebook::EntityId;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum FilterOp {
    Type(String),
    Filter(String, String),
    Status(String),
    Sort(Option<(String, bool)>),
    Page(u32),
    Next,
    Prev,
}

fn filter_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("all".to_string()),
        Just("ALL".to_string()),
        Just(String::new()),
        "[a-z]{1,8}",
    ]
}

fn filter_op() -> impl Strategy<Value = FilterOp> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(FilterOp::Type),
        (prop_oneof![Just("type"), Just("category")], filter_value())
            .prop_map(|(name, value)| FilterOp::Filter(name.to_string(), value)),
        filter_value().prop_map(FilterOp::Status),
        proptest::option::of(("[a-zA-Z]{1,10}", any::<bool>())).prop_map(FilterOp::Sort),
        (0u32..50).prop_map(FilterOp::Page),
        Just(FilterOp::Next),
        Just(FilterOp::Prev),
    ]
}

fn apply(controller: &mut FilterController, op: &FilterOp) {
    match op {
        FilterOp::Type(text) => controller.type_search(text),
        FilterOp::Filter(name, value) => {
            controller.set_filter(name, value);
        }
        FilterOp::Status(value) => {
            controller.set_status(value);
        }
        FilterOp::Sort(sort) => {
            controller.set_sort(sort.as_ref().map(|(field, asc)| {
                if *asc {
                    SortKey::asc(field)
                } else {
                    SortKey::desc(field)
                }
            }));
        }
        FilterOp::Page(page) => {
            controller.set_page(*page);
        }
        FilterOp::Next => {
            controller.next_page();
        }
        FilterOp::Prev => {
            controller.prev_page();
        }
    }
}

proptest! {
    #[test]
    fn clear_filters_always_restores_defaults(ops in prop::collection::vec(filter_op(), 0..30)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        runtime.block_on(async {
            let mut controller = FilterController::with_defaults(
                ViewFilterState::new(20),
                Duration::from_millis(300),
                true,
            );
            for op in &ops {
                apply(&mut controller, op);
            }
            // Let the debounce window pass so the last typed search is applied
            tokio::time::sleep(Duration::from_millis(400)).await;
            controller.poll_search();

            // Type again and clear before the window elapses
            controller.type_search("pending");
            controller.clear_filters();
            prop_assert_eq!(controller.state(), controller.defaults());
            prop_assert_eq!(controller.search_input(), "");
            prop_assert_eq!(controller.query().cache_key(), "page=1&limit=20");

            // The cancelled search never lands
            tokio::time::sleep(Duration::from_millis(400)).await;
            prop_assert!(!controller.poll_search());
            prop_assert_eq!(controller.state(), controller.defaults());

            // Idempotent
            prop_assert!(!controller.clear_filters());
            prop_assert_eq!(controller.state(), controller.defaults());
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn sentinel_values_never_reach_the_query(ops in prop::collection::vec(filter_op(), 0..30)) {
        let mut state = ViewFilterState::new(20);
        for op in &ops {
            match op {
                FilterOp::Filter(name, value) => { state.set_filter(name, value); }
                FilterOp::Status(value) => { state.set_status(value); }
                _ => {}
            }
        }
        let query = state.to_query();
        for (_, value) in query.params() {
            prop_assert!(!value.eq_ignore_ascii_case("all"));
            prop_assert!(!value.is_empty());
        }
    }

    #[test]
    fn toggle_is_an_involution(
        initial in prop::collection::btree_set("[a-z0-9]{1,4}", 0..10),
        id in "[a-z0-9]{1,4}",
    ) {
        let mut selection = SelectionSet::new();
        for existing in &initial {
            selection.select(&EntityId::from(existing.as_str()));
        }
        let before: BTreeSet<EntityId> = selection.iter().cloned().collect();

        let id = EntityId::from(id.as_str());
        let first = selection.toggle(&id);
        let second = selection.toggle(&id);

        prop_assert_ne!(first, second);
        let after: BTreeSet<EntityId> = selection.iter().cloned().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn dialog_target_always_matches_mode(ops in prop::collection::vec((0u8..7, "[a-c]"), 0..40)) {
        let mut dialogs = DialogOrchestrator::new(true);
        for (op, id) in ops {
            let id = EntityId::from(id.as_str());
            let _ = match op {
                0 => dialogs.open_add(),
                1 => dialogs.open_edit(id),
                2 => dialogs.open_view(id),
                3 => dialogs.open_delete(id),
                4 => { dialogs.close(); Ok(()) }
                5 => { dialogs.close_finished(); Ok(()) }
                _ => dialogs.open(DialogMode::Edit, None),
            };

            match dialogs.mounted() {
                Some(active) => {
                    prop_assert_eq!(active.mode().requires_target(), active.target().is_some());
                }
                None => {
                    prop_assert!(dialogs.is_closed());
                    prop_assert!(dialogs.target().is_none());
                }
            }
            if dialogs.is_open() {
                prop_assert_eq!(dialogs.mode(), dialogs.mounted().map(|d| d.mode()));
            }
        }
    }
}
