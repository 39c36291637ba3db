//! Parallel composites depend on what was signed, not on who finished first.

use crate::common::*;
use proptest::prelude::*;
use signing_types::*;

fn permutation(n: u32) -> impl Strategy<Value = Vec<u32>> {
    Just((1..=n).collect::<Vec<u32>>()).prop_shuffle()
}

async fn composite(order: &[u32], n: u32) -> ContentHash {
    let (_, engine) = engine();
    let signers: Vec<SignerSpec> = (1..=n).map(|i| SignerSpec::mandatory(format!("p{i}"))).collect();
    let id = start(&engine, SigningMode::Parallel, signers).await;
    for &i in order {
        sign(&engine, &id, i, &format!("p{i}")).await.unwrap();
    }
    let process = engine.get_process(&id).await.unwrap();
    assert_eq!(process.status, ProcessStatus::Completed);
    assert!(engine.verify(&id).await.unwrap().verified);
    process.composite_hash.unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn property_parallel_composite_is_order_independent(order in permutation(5)) {
        let rt = runtime();
        let canonical = rt.block_on(composite(&[1, 2, 3, 4, 5], 5));
        let raced = rt.block_on(composite(&order, 5));
        prop_assert_eq!(canonical, raced);
    }
}
