//! Worker-input descriptors are the wire contract: serialization must be
//! lossless and use the field names the worker runtime expects.

mod support;

use strato_common::QueryId;
use strato_planner::advisor::StaticJoinAdvisor;
use strato_planner::physical::{JoinInput, Operator};
use strato_planner::plan::{JoinAlgorithm, JoinEndian, Table};
use strato_planner::PlanCompiler;

use support::{aggregate_of, base, config, join_of, Fixture};

fn compile(root: Table, fixture: Fixture) -> Operator {
    let compiler = PlanCompiler::new(
        QueryId(1),
        root,
        fixture.env(StaticJoinAdvisor::new(4), config(2, 2)),
        true,
        false,
    )
    .expect("compiler construction");
    compiler.compile().expect("compilation")
}

fn chain_plan() -> (Table, Fixture) {
    let mut fixture = Fixture::new();
    fixture.add_base_table("tpch", "a", &["k", "v"], 2);
    fixture.add_base_table("tpch", "b", &["k", "v"], 2);
    fixture.add_base_table("tpch", "c", &["k", "v"], 8);
    let t1 = join_of(
        "t1",
        base("tpch", "a", &["k", "v"]),
        base("tpch", "b", &["k", "v"]),
        JoinAlgorithm::Broadcast,
        JoinEndian::SmallLeft,
    );
    let root = join_of(
        "t2",
        t1,
        base("tpch", "c", &["k", "v"]),
        JoinAlgorithm::Broadcast,
        JoinEndian::SmallLeft,
    );
    (root, fixture)
}

fn partitioned_plan() -> (Table, Fixture) {
    let mut fixture = Fixture::new();
    fixture.add_base_table("tpch", "a", &["k", "v"], 8);
    fixture.add_base_table("tpch", "b", &["k", "v"], 8);
    let root = join_of(
        "a_join_b",
        base("tpch", "a", &["k", "v"]),
        base("tpch", "b", &["k", "v"]),
        JoinAlgorithm::Partitioned,
        JoinEndian::SmallLeft,
    );
    (root, fixture)
}

#[test]
fn operator_trees_round_trip_through_json() {
    let (chain_root, chain_fixture) = chain_plan();
    let (part_root, part_fixture) = partitioned_plan();
    let mut agg_fixture = Fixture::new();
    agg_fixture.add_base_table("tpch", "t", &["k", "v"], 8);
    let agg_root = aggregate_of("agg", base("tpch", "t", &["k", "v"]), "/out/");

    for operator in [
        compile(chain_root, chain_fixture),
        compile(part_root, part_fixture),
        compile(agg_root, agg_fixture),
    ] {
        let json = serde_json::to_string(&operator).expect("serialize operator");
        let back: Operator = serde_json::from_str(&json).expect("deserialize operator");
        assert_eq!(operator, back);
    }
}

#[test]
fn broadcast_chain_input_uses_wire_field_names() {
    let (root, fixture) = chain_plan();
    let operator = compile(root, fixture);
    let JoinInput::BroadcastChain(input) = &operator.join_inputs()[0] else {
        panic!("expected a completed chain input");
    };
    let json = serde_json::to_string(input).unwrap();
    for field in [
        "\"queryId\"",
        "\"chainTables\"",
        "\"chainJoinInfos\"",
        "\"largeTable\"",
        "\"joinInfo\"",
        "\"keyColumnIds\"",
        "\"columnsToRead\"",
        "\"inputSplits\"",
        "\"startRowGroupIndex\"",
        "\"rowGroupCount\"",
        "\"postPartition\"",
        "\"fileNames\"",
    ] {
        assert!(json.contains(field), "missing field {field} in {json}");
    }
}

#[test]
fn partitioned_input_uses_wire_field_names() {
    let (root, fixture) = partitioned_plan();
    let operator = compile(root, fixture);
    let JoinInput::Partitioned(input) = &operator.join_inputs()[0] else {
        panic!("expected a partitioned input");
    };
    let json = serde_json::to_string(input).unwrap();
    for field in [
        "\"smallTable\"",
        "\"largeTable\"",
        "\"inputFiles\"",
        "\"parallelism\"",
        "\"numPartition\"",
        "\"hashValues\"",
        "\"storageInfo\"",
        "\"encoding\"",
    ] {
        assert!(json.contains(field), "missing field {field} in {json}");
    }
    // The join type crosses the wire in its canonical spelling.
    assert!(json.contains("\"INNER\""));
}
