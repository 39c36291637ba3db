//! Any single-bit change to sealed document content fails verification.

use crate::common::*;
use proptest::prelude::*;
use signing_types::*;

const BODY: &[u8] = b"%PDF-1.7 master services agreement between the parties";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn property_single_bit_flip_is_detected(index in 0..BODY.len(), bit in 0u8..8) {
        runtime().block_on(async move {
            let (storage, engine) = engine();
            let id = start_with(&engine, contract(BODY), SigningMode::Parallel, mandatory(&["s1", "s2"])).await;
            sign(&engine, &id, 2, "s2").await.unwrap();
            sign(&engine, &id, 1, "s1").await.unwrap();
            assert!(engine.verify(&id).await.unwrap().verified);

            let document_id = engine.get_process(&id).await.unwrap().document_id;
            let mut content = BODY.to_vec();
            content[index] ^= 1 << bit;
            storage.overwrite_document_content(&document_id, content).unwrap();

            let result = engine.verify(&id).await.unwrap();
            assert!(!result.verified);
            assert_eq!(result.mismatch_at, Some(MismatchLocation::Document { document_id }));
        });
    }
}
