//! Phase machine properties, standalone and driven through a manager

use dash_loader::{
    allowed_transitions, validate_transition, DashboardPageManager, LoadOptions, LoadPhase,
    ReloadParams, StoreError,
};
use dash_test_utils::{v1_document, TestEnv};
use proptest::prelude::*;

fn arb_phase() -> impl Strategy<Value = LoadPhase> {
    prop_oneof![
        Just(LoadPhase::Idle),
        Just(LoadPhase::Loading),
        Just(LoadPhase::Loaded),
        Just(LoadPhase::Error),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Op {
    LoadOk,
    LoadMissing,
    LoadFailing,
    Reload,
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::LoadOk),
        Just(Op::LoadMissing),
        Just(Op::LoadFailing),
        Just(Op::Reload),
        Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn validation_matches_the_table(from in arb_phase(), to in arb_phase()) {
        let allowed = allowed_transitions(from).contains(&to);
        prop_assert_eq!(validate_transition(from, to).is_ok(), allowed);
    }

    #[test]
    fn results_are_only_reached_after_loading(walk in prop::collection::vec(arb_phase(), 1..20)) {
        let mut current = LoadPhase::Idle;
        let mut loaded_since_idle = false;
        for next in walk {
            if validate_transition(current, next).is_ok() {
                match next {
                    LoadPhase::Idle => loaded_since_idle = false,
                    LoadPhase::Loading => loaded_since_idle = true,
                    LoadPhase::Loaded | LoadPhase::Error => prop_assert!(loaded_since_idle),
                }
                current = next;
            }
        }
    }

    #[test]
    fn published_state_is_consistent(ops in prop::collection::vec(arb_op(), 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let env = TestEnv::new();
            env.store.insert(v1_document("ok", 1));
            env.store.fail("bad", StoreError::http(502, "bad gateway"));
            let manager = env.v1_manager();
            let mut updates = manager.subscribe();

            for op in ops {
                match op {
                    Op::LoadOk => manager.load_dashboard(&LoadOptions::uid("ok")).await.unwrap(),
                    Op::LoadMissing => manager.load_dashboard(&LoadOptions::uid("nope")).await.unwrap(),
                    Op::LoadFailing => manager.load_dashboard(&LoadOptions::uid("bad")).await.unwrap(),
                    Op::Reload => manager.reload_dashboard(&ReloadParams::default()).await.unwrap(),
                    Op::Clear => manager.clear_state(),
                }
                let state = manager.state();
                prop_assert!(!state.is_loading);
                match state.phase {
                    LoadPhase::Idle => prop_assert!(state.dashboard.is_none()),
                    LoadPhase::Loaded => prop_assert!(state.load_error.is_none()),
                    LoadPhase::Error => prop_assert!(state.load_error.is_some()),
                    LoadPhase::Loading => prop_assert!(false, "settled manager still loading"),
                }
                prop_assert_eq!(updates.borrow_and_update().phase, state.phase);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
