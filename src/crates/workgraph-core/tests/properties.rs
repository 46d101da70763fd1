//! Property tests: invariants that should hold for any graph shape or input,
//! not just the handful of examples covered elsewhere.

use proptest::prelude::*;
use workgraph_core::{BuildError, ExecutionContext, GraphBuilder, JsonCodec, StateCodec, END};

async fn increment(_ctx: ExecutionContext, state: i32) -> Result<i32, workgraph_core::StepError> {
    Ok(state + 1)
}

proptest! {
    /// A linear chain of N increment nodes always lands on state == initial + N,
    /// regardless of how long the chain is.
    #[test]
    fn linear_chain_of_any_length_sums_correctly(len in 1usize..20) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let mut builder = GraphBuilder::<i32>::new();
            for i in 0..len {
                builder = builder.add_node(format!("n{i}"), increment).unwrap();
            }
            for i in 0..len.saturating_sub(1) {
                builder = builder.add_edge(format!("n{i}"), format!("n{}", i + 1)).unwrap();
            }
            builder = builder
                .add_edge(format!("n{}", len - 1), END)
                .unwrap()
                .set_entry("n0")
                .unwrap();

            let compiled = builder.compile().unwrap();
            let run = workgraph_core::Run::new(compiled);
            let outcome = run
                .execute(ExecutionContext::new(), 0, workgraph_core::RunOptions::default())
                .await;
            prop_assert!(outcome.is_ok());
            prop_assert_eq!(outcome.state, len as i32);
            Ok(())
        })?;
    }

    /// Re-adding the same simple edge with an identical target is always a
    /// no-op; re-adding it with any other target is always a DuplicateEdge.
    #[test]
    fn add_edge_is_idempotent_only_for_the_same_target(
        from in "[a-z]{1,8}",
        to_a in "[a-z]{1,8}",
        to_b in "[a-z]{1,8}",
    ) {
        prop_assume!(to_a != to_b);
        let builder = GraphBuilder::<i32>::new()
            .add_node(&from, increment).unwrap()
            .add_edge(&from, &to_a).unwrap();

        prop_assert!(builder.add_edge(&from, &to_a).is_ok());
        prop_assert!(matches!(
            builder.add_edge(&from, &to_b),
            Err(BuildError::DuplicateEdge(_))
        ));
    }

    /// Any state value round-trips losslessly through the default JSON codec.
    #[test]
    fn json_codec_round_trips_any_vector_of_i32(values in proptest::collection::vec(any::<i32>(), 0..50)) {
        let codec = JsonCodec::<Vec<i32>>::new();
        let bytes = codec.encode(&values).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        prop_assert_eq!(values, decoded);
    }
}
