// tests/guard_properties.rs

use proptest::prelude::*;

use mqtt_exec::dispatch::{Admission, ExecutionGuard, RunState};

#[derive(Debug, Clone, Copy)]
enum Op {
    Trigger,
    Finish,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Trigger), Just(Op::Finish)]
}

proptest! {
    /// Whatever the interleaving of triggers and completions, a
    /// non-concurrent entry never has two admitted runs at once, and a
    /// trigger is only skipped while a run is outstanding.
    #[test]
    fn non_concurrent_guard_admits_one_at_a_time(
        ops in proptest::collection::vec(op_strategy(), 1..64)
    ) {
        let guard = ExecutionGuard::new(false);
        let mut held = Vec::new();

        for op in ops {
            match op {
                Op::Trigger => match guard.try_begin_or_skip() {
                    Admission::Admitted(permit) => {
                        prop_assert!(held.is_empty());
                        held.push(permit);
                    }
                    Admission::Skipped => prop_assert!(!held.is_empty()),
                },
                Op::Finish => {
                    if let Some(permit) = held.pop() {
                        permit.end();
                    }
                }
            }
            prop_assert_eq!(guard.is_executing(), !held.is_empty());
        }

        drop(held);
        prop_assert_eq!(guard.state(), RunState::Idle);
    }

    /// A concurrent entry admits every trigger and its in-flight count tracks
    /// outstanding runs exactly.
    #[test]
    fn concurrent_guard_counts_outstanding_runs(
        ops in proptest::collection::vec(op_strategy(), 1..64)
    ) {
        let guard = ExecutionGuard::new(true);
        let mut held = Vec::new();

        for op in ops {
            match op {
                Op::Trigger => {
                    let admission = guard.try_begin_or_skip();
                    prop_assert!(admission.is_admitted());
                    held.push(admission);
                }
                Op::Finish => {
                    held.pop();
                }
            }

            let expected = if held.is_empty() {
                RunState::Idle
            } else {
                RunState::Running { in_flight: held.len() }
            };
            prop_assert_eq!(guard.state(), expected);
        }
    }
}
