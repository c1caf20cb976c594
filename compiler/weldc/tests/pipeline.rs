// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Whole-pipeline properties, driven from in-memory declaration dumps.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use weld_import::{JsonFrontend, SourceInput};
use weldc::{parse_flags, RunReport, Session};

fn dump(units: Value) -> String {
    json!({ "version": 1, "units": units }).to_string()
}

fn int(kind: &str) -> Value {
    json!({ "type": "int", "kind": kind })
}

fn decl(usr: &str) -> Value {
    json!({ "type": "decl", "usr": usr })
}

fn record(usr: &str, name: &str, fields: Value) -> Value {
    json!({ "kind": "record", "usr": usr, "name": name, "complete": true, "fields": fields })
}

fn run(text: &str, flags: &str) -> RunReport {
    let args: Vec<String> = flags.split_whitespace().map(str::to_owned).collect();
    let options = parse_flags(&args).unwrap();
    Session::new(SourceInput::new("test.decls.json", text), options).run(&JsonFrontend)
}

fn bindings(text: &str, flags: &str) -> String {
    let report = run(text, flags);
    match report.result {
        Ok(output) => output,
        Err(err) => panic!("run failed: {err}"),
    }
}

#[test]
fn interior_padding_on_x86_64() {
    let text = dump(json!([{ "file": "pair.h", "decls": [
        record("c:@S@pair", "pair", json!([
            { "name": "a", "type": int("int") },
            { "name": "b", "type": { "type": "float", "kind": "double" } }
        ]))
    ]}]));
    let output = bindings(&text, "");
    assert!(output.contains("pub __pad_1: [u8; 4],"), "{output}");
    assert!(output.contains("size_of::<pair>() == 16"), "{output}");
    assert!(output.contains("offset_of!(pair, b) == 8"), "{output}");
}

#[test]
fn bitfields_pack_into_one_unit() {
    let text = dump(json!([{ "file": "flags.h", "decls": [
        record("c:@S@flags", "flags", json!([
            { "name": "a", "type": int("unsigned_int"), "bit_width": 3 },
            { "name": "b", "type": int("unsigned_int"), "bit_width": 5 }
        ]))
    ]}]));
    let output = bindings(&text, "");
    assert_eq!(output.matches("pub _bitfield_").count(), 1, "{output}");
    assert!(output.contains("pub _bitfield_1: u32,"), "{output}");
    assert!(output.contains("size_of::<flags>() == 4"), "{output}");
}

#[test]
fn packed_bitfield_runs_past_sixteen_bytes() {
    let long = |name: &str| json!({ "name": name, "type": int("unsigned_long_long"), "bit_width": 63 });
    let text = dump(json!([{ "file": "wide.h", "decls": [{
        "kind": "record", "usr": "c:@S@wide", "name": "wide", "complete": true,
        "packed": true, "fields": [long("a"), long("b"), long("c")]
    }]}]));
    let output = bindings(&text, "");
    assert!(output.contains("pub _bitfield_1: [u8; 24],"), "{output}");
    assert!(output.contains("size_of::<wide>() == 24"), "{output}");
    assert!(!output.contains("bytes[..24]"), "{output}");
    assert!(
        output.contains("bytes[..9].copy_from_slice(&self._bitfield_1[15..24]);"),
        "{output}"
    );
    assert!(output.contains("((unit >> 6) & 0x7fffffffffffffff) as"), "{output}");
}

#[test]
fn oversized_aggregates_degrade_to_handles() {
    let text = dump(json!([{ "file": "big.h", "decls": [
        record("c:@S@big", "big", json!([
            { "name": "a", "type": int("int") },
            { "name": "b", "type": { "type": "array", "element": int("int"), "len": 1u64 << 61 } }
        ]))
    ]}]));
    let report = run(&text, "");
    assert!(report.diagnostics.iter().any(|d| d.code.as_str() == "E2002"));
    let output = report.result.unwrap();
    assert!(output.contains("pub struct big {"), "{output}");
    assert!(output.contains("_unused: [u8; 0],"), "{output}");
}

#[test]
fn repeated_inclusion_yields_one_declaration() {
    let point = record(
        "c:@S@point",
        "point",
        json!([{ "name": "x", "type": int("int") }]),
    );
    let text = dump(json!([
        { "file": "a.c", "decls": [point.clone(), point.clone()] },
        { "file": "b.c", "decls": [point] }
    ]));
    let output = bindings(&text, "");
    assert_eq!(output.matches("pub struct point {").count(), 1, "{output}");
}

#[test]
fn self_reference_through_pointer() {
    let text = dump(json!([{ "file": "list.h", "decls": [
        record("c:@S@node", "node", json!([
            { "name": "value", "type": int("int") },
            { "name": "next", "type": { "type": "pointer", "pointee": decl("c:@S@node") } }
        ]))
    ]}]));
    let output = bindings(&text, "");
    assert_eq!(output.matches("pub struct node {").count(), 1, "{output}");
    assert!(output.contains("pub next: *mut node,"), "{output}");
}

#[test]
fn same_named_enums_in_namespaces_get_distinct_names() {
    let mode = |ns: &str| {
        json!({ "kind": "namespace", "name": ns, "decls": [{
            "kind": "enum", "usr": format!("c:@N@{ns}@E@mode"), "name": "mode",
            "repr": "int", "variants": [{ "name": format!("{ns}_on"), "value": 1 }]
        }]})
    };
    let set = json!({
        "kind": "function", "usr": "c:@F@set", "name": "set",
        "params": [
            { "name": "x", "type": decl("c:@N@a@E@mode") },
            { "name": "y", "type": decl("c:@N@b@E@mode") }
        ]
    });
    let text = dump(json!([{ "file": "modes.hpp", "decls": [mode("a"), mode("b"), set] }]));

    let flat = bindings(&text, "--flatten-namespaces");
    assert!(flat.contains("pub enum mode {"), "{flat}");
    assert!(flat.contains("pub enum mode_1 {"), "{flat}");
    assert!(flat.contains("pub fn set(x: mode, y: mode_1);"), "{flat}");

    let nested = bindings(&text, "--keep-namespaces");
    assert!(nested.contains("pub mod a {"), "{nested}");
    assert!(nested.contains("pub mod b {"), "{nested}");
    assert_eq!(nested.matches("pub enum mode {").count(), 2, "{nested}");
    assert!(nested.contains("root::a::mode"), "{nested}");
    assert!(nested.contains("root::b::mode"), "{nested}");
}

#[test]
fn reemitting_is_idempotent() {
    let text = dump(json!([{ "file": "p.h", "decls": [
        record("c:@S@p", "p", json!([{ "name": "x", "type": int("long") }]))
    ]}]));
    assert_eq!(bindings(&text, ""), bindings(&text, ""));
}

#[test]
fn warnings_do_not_fail_the_run() {
    let text = dump(json!([{ "file": "ld.h", "decls": [{
        "kind": "function", "usr": "c:@F@scale", "name": "scale",
        "params": [{ "name": "v", "type": { "type": "float", "kind": "long_double" } }]
    }]}]));
    let report = run(&text, "");
    assert!(report.succeeded());
    assert!(!report.diagnostics.is_empty());
    assert!(!report.result.unwrap().contains("scale"));
}

const KINDS: &[&str] = &[
    "char",
    "unsigned_char",
    "short",
    "int",
    "unsigned_int",
    "long",
    "long_long",
];

/// Field names drawn from a small pool so that collisions with Rust
/// keywords and with each other happen often.
fn field_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "type", "self", "match", "x", "_", "fn"])
        .prop_map(str::to_owned)
}

fn field() -> impl Strategy<Value = Value> {
    (
        field_name(),
        prop::sample::select(KINDS.to_vec()),
        prop::option::of(1u32..8),
    )
        .prop_map(|(name, kind, bits)| match bits {
            Some(width) => json!({ "name": name, "type": int(kind), "bit_width": width }),
            None => json!({ "name": name, "type": int(kind) }),
        })
}

fn records() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(prop::collection::vec(field(), 0..6), 1..5).prop_map(|bodies| {
        bodies
            .into_iter()
            .enumerate()
            .map(|(i, fields)| record(&format!("c:@S@r{i}"), "rec", Value::Array(fields)))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn runs_are_deterministic(decls in records()) {
        let text = dump(json!([{ "file": "gen.h", "decls": decls }]));
        let first = run(&text, "");
        let second = run(&text, "");
        prop_assert!(first.succeeded());
        prop_assert_eq!(first.result.unwrap(), second.result.unwrap());
        prop_assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn colliding_names_stay_distinct(decls in records()) {
        let count = decls.len();
        let text = dump(json!([{ "file": "gen.h", "decls": decls }]));
        let output = bindings(&text, "--no-layout-tests");
        let mut structs: Vec<&str> = output
            .lines()
            .filter_map(|line| line.strip_prefix("pub struct "))
            .collect();
        prop_assert_eq!(structs.len(), count);
        structs.sort_unstable();
        structs.dedup();
        prop_assert_eq!(structs.len(), count);
    }
}
