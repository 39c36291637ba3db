//! Progress never goes backwards, whatever signers try.

use crate::common::*;
use proptest::prelude::*;
use signing_engine::CommitRequest;
use signing_types::*;

#[derive(Debug, Clone)]
enum Action {
    Commit(u32),
    Reject(u32),
}

fn action_strategy(slots: u32) -> impl Strategy<Value = Vec<Action>> {
    proptest::collection::vec(
        prop_oneof![
            4 => (1..=slots).prop_map(Action::Commit),
            1 => (1..=slots).prop_map(Action::Reject),
        ],
        0..16,
    )
}

fn mode_strategy() -> impl Strategy<Value = SigningMode> {
    prop_oneof![
        Just(SigningMode::Sequential),
        Just(SigningMode::Parallel),
        Just(SigningMode::Hybrid),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn property_progress_is_monotonic(mode in mode_strategy(), actions in action_strategy(4)) {
        runtime().block_on(async move {
            let (_, engine) = engine();
            let signers = vec![
                SignerSpec::mandatory("s1").in_group(1),
                SignerSpec::optional("s2").in_group(1),
                SignerSpec::mandatory("s3").in_group(2),
                SignerSpec::mandatory("s4").in_group(2),
            ];
            let id = start(&engine, mode, signers).await;

            let mut last = engine.get_status(&id).await.unwrap().progress;
            for action in actions {
                let _ = match action {
                    Action::Commit(n) => engine
                        .commit_slot(&id, &slot(n), CommitRequest::new(format!("s{n}"), signature(n)))
                        .await
                        .map(|_| ()),
                    Action::Reject(n) => engine
                        .reject_slot(&id, &slot(n), "declined")
                        .await
                        .map(|_| ()),
                };

                let view = engine.get_status(&id).await.unwrap();
                assert!(view.progress.committed_mandatory >= last.committed_mandatory);
                assert_eq!(view.progress.total_mandatory, 3);
                assert!(view.progress.ratio() <= 1.0);
                if view.status == ProcessStatus::Completed {
                    assert!(view.progress.is_complete());
                }
                last = view.progress;
            }
        });
    }

    #[test]
    fn property_committed_slot_never_commits_twice(n in 1u32..=3, retries in 1usize..4) {
        runtime().block_on(async move {
            let (_, engine) = engine();
            let id = start(&engine, SigningMode::Parallel, mandatory(&["s1", "s2", "s3"])).await;
            sign(&engine, &id, n, &format!("s{n}")).await.unwrap();

            for _ in 0..retries {
                let err = sign(&engine, &id, n, &format!("s{n}")).await.unwrap_err();
                assert_eq!(err.code(), "DUPLICATE_COMMIT");
            }
            assert_eq!(engine.get_process(&id).await.unwrap().commit_count, 1);
        });
    }
}
