//! Aggregation compilation scenarios: partial, pre-aggregation, and final
//! stages over base and joined origins.

mod support;

use strato_common::{ExecutorConfig, QueryId};
use strato_planner::advisor::StaticJoinAdvisor;
use strato_planner::physical::{JoinInput, Operator};
use strato_planner::plan::{JoinAlgorithm, JoinEndian, Table};
use strato_planner::PlanCompiler;
use strato_storage::Scheme;

use support::{aggregate_of, base, config, join_of, Fixture};

fn compile(root: Table, fixture: Fixture, cfg: ExecutorConfig) -> Operator {
    let compiler = PlanCompiler::new(
        QueryId(1),
        root,
        fixture.env(StaticJoinAdvisor::new(4), cfg),
        true,
        false,
    )
    .expect("compiler construction");
    compiler.compile().expect("compilation")
}

#[test]
fn wide_scan_aggregation_inserts_pre_aggregation() {
    let mut fixture = Fixture::new();
    fixture.add_base_table("tpch", "t", &["k", "v"], 120);

    let root = aggregate_of("agg", base("tpch", "t", &["k", "v"]), "/out/");
    let cfg = ExecutorConfig {
        pre_aggregate_threshold: 5,
        ..config(1, 4)
    };
    let operator = compile(root, fixture, cfg);

    let Operator::Aggregation(op) = &operator else {
        panic!("expected an aggregation operator");
    };
    assert!(op.child.is_none());

    // 120 splits over 4-way workers make 30 partial producers, which is
    // above the threshold of 5.
    assert_eq!(op.scan_inputs.len(), 30);
    for (i, scan) in op.scan_inputs.iter().enumerate() {
        assert!(scan.partial_aggregation_present);
        assert!(scan.partial_aggregation_info.is_some());
        assert_eq!(
            scan.output.path,
            format!("/inter/1/tpch/agg/{i}/partial_aggr")
        );
    }

    assert_eq!(op.pre_aggr_inputs.len(), 6);
    for (i, pre) in op.pre_aggr_inputs.iter().enumerate() {
        assert!(pre.input_files.len() <= 5);
        assert_eq!(pre.output.path, format!("/inter/1/tpch/agg/{i}/pre_aggr"));
        // Pre-aggregation keeps every group key.
        assert_eq!(pre.group_key_column_projection, vec![true]);
    }
    let total_merged: usize = op.pre_aggr_inputs.iter().map(|p| p.input_files.len()).sum();
    assert_eq!(total_merged, 30);

    assert_eq!(op.final_aggr_input.input_files.len(), 6);
    assert_eq!(op.final_aggr_input.output.path, "/out/final_aggr");
    assert_eq!(op.final_aggr_input.output.storage_info.scheme, Scheme::S3);
}

#[test]
fn join_origin_reuses_join_inputs_with_partial_aggregation() {
    let plan = || {
        join_of(
            "r_join_s",
            base("tpch", "r", &["r0", "r1"]),
            base("tpch", "s", &["s0", "s1"]),
            JoinAlgorithm::Broadcast,
            JoinEndian::SmallLeft,
        )
    };
    let fixture_for = || {
        let mut fixture = Fixture::new();
        fixture.add_base_table("tpch", "r", &["r0", "r1"], 4);
        fixture.add_base_table("tpch", "s", &["s0", "s1"], 8);
        fixture
    };

    // Compile the join alone, then the same join wrapped in an aggregation.
    let standalone = compile(plan(), fixture_for(), config(2, 2));
    let aggregated = compile(
        aggregate_of("agg", plan(), "/out/"),
        fixture_for(),
        config(2, 2),
    );

    let Operator::Aggregation(agg) = &aggregated else {
        panic!("expected an aggregation operator");
    };
    assert!(agg.scan_inputs.is_empty());
    let child = agg.child.as_deref().expect("join child operator");

    assert_eq!(child.join_inputs().len(), standalone.join_inputs().len());
    for (i, (wrapped, plain)) in child
        .join_inputs()
        .iter()
        .zip(standalone.join_inputs())
        .enumerate()
    {
        let (JoinInput::Broadcast(wrapped), JoinInput::Broadcast(plain)) = (wrapped, plain) else {
            panic!("expected broadcast inputs");
        };
        // Identical join shape, only the partial-aggregation directive and
        // the output destination differ.
        assert_eq!(wrapped.small_table, plain.small_table);
        assert_eq!(wrapped.large_table, plain.large_table);
        assert_eq!(wrapped.join_info, plain.join_info);
        assert!(wrapped.partial_aggregation_present);
        assert!(wrapped.partial_aggregation_info.is_some());
        assert_eq!(wrapped.output.path, "/inter/1/tpch/agg/");
        assert_eq!(wrapped.output.file_names, vec![format!("partial_aggr_{i}")]);
    }

    // Two producers at parallelism 2 stay below the default threshold: the
    // final stage reads the partial files directly.
    assert!(agg.pre_aggr_inputs.is_empty());
    assert_eq!(
        agg.final_aggr_input.input_files,
        vec![
            "/inter/1/tpch/agg/partial_aggr_0".to_string(),
            "/inter/1/tpch/agg/partial_aggr_1".to_string(),
        ]
    );
}

#[test]
fn final_in_server_routes_partials_to_the_endpoint() {
    let mut fixture = Fixture::new();
    fixture.add_base_table("tpch", "t", &["k", "v"], 4);

    let root = aggregate_of("agg", base("tpch", "t", &["k", "v"]), "/out/");
    let cfg = ExecutorConfig {
        compute_final_aggr_in_server: true,
        ..config(2, 2)
    };
    let operator = compile(root, fixture, cfg);

    let Operator::Aggregation(op) = &operator else {
        panic!("expected an aggregation operator");
    };
    // One producer, no pre-aggregation stage: partials may go straight to
    // the final endpoint.
    assert!(op.pre_aggr_inputs.is_empty());
    for (i, scan) in op.scan_inputs.iter().enumerate() {
        assert_eq!(scan.output.path, format!("/out/{i}/partial_aggr"));
    }
    assert_eq!(op.final_aggr_input.input_storage.scheme, Scheme::S3);
    assert_eq!(op.final_aggr_input.output.path, "/out/final_aggr");
}
