//! Hybrid mode: parallel inside a group, ordered across groups.

use crate::common::*;
use signing_engine::SigningError;
use signing_types::*;

fn two_groups() -> Vec<SignerSpec> {
    vec![
        SignerSpec::mandatory("legal").in_group(1),
        SignerSpec::mandatory("finance").in_group(1),
        SignerSpec::optional("observer").in_group(1),
        SignerSpec::mandatory("ceo").in_group(2),
    ]
}

#[tokio::test]
async fn second_group_waits_for_first_group_mandatory_slots() {
    let (_, engine) = engine();
    let id = start(&engine, SigningMode::Hybrid, two_groups()).await;

    let eligible: Vec<SlotId> = engine
        .get_status(&id)
        .await
        .unwrap()
        .eligible_slots
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(eligible, vec![slot(1), slot(2), slot(3)]);

    let err = sign(&engine, &id, 4, "ceo").await.unwrap_err();
    assert!(matches!(err, SigningError::InvalidSlotState { .. }));

    sign(&engine, &id, 2, "finance").await.unwrap();
    sign(&engine, &id, 1, "legal").await.unwrap();

    // The optional observer never blocks the next group
    let result = sign(&engine, &id, 4, "ceo").await.unwrap();
    assert_eq!(result.status, ProcessStatus::Completed);
    assert!(engine.verify(&id).await.unwrap().verified);
}

#[tokio::test]
async fn non_contiguous_groups_refused() {
    let (_, engine) = engine();
    let result = engine
        .create_process(
            contract(b"%PDF hybrid"),
            vec![
                SignerSpec::mandatory("a").in_group(2),
                SignerSpec::mandatory("b").in_group(1),
            ],
            SigningMode::Hybrid,
            chrono::Utc::now() + chrono::Duration::days(1),
            ProcessMetadata::new("initiator"),
        )
        .await;
    assert!(matches!(result, Err(SigningError::InvalidRequest(_))));
}
