//! Tests for cycle elision across whole object graphs

mod common;

use common::FakeTarget;
use svmprobe_core::cycles::{CycleGuard, CyclePolicy};
use svmprobe_core::types::{Address, ObjectHandle, PrimitiveKind, Value, ValueType};
use svmprobe_core::Session;

/// Ring of `Node`s holding `1..=len`, each pointing at the next and the
/// last one back at the first. Returns the first node.
fn ring(target: &mut FakeTarget, len: usize) -> Value
{
    target.define_class("Node", &[
        ("value", ValueType::Primitive(PrimitiveKind::Int)),
        ("next", ValueType::reference("Node")),
    ]);
    let nodes: Vec<Address> = (0..len).map(|_| target.new_object("Node")).collect();
    for (i, node) in nodes.iter().enumerate() {
        target.write_i32(*node + 8, i32::try_from(i + 1).unwrap());
        target.write_u64(*node + 16, nodes[(i + 1) % len].value());
    }
    Value::Reference(ObjectHandle::new(nodes[0], "Node"))
}

#[test]
fn test_self_loop()
{
    let mut target = FakeTarget::new();
    let value = ring(&mut target, 1);
    let mut session = Session::default();
    assert_eq!(session.render(&target, &value).unwrap(), "Node = {value = 1, next = Node = {...}}");
}

#[test]
fn test_three_node_ring_default_bound()
{
    let mut target = FakeTarget::new();
    let value = ring(&mut target, 3);
    let mut session = Session::default();
    // With one hop of lookback the third node is already cut.
    assert_eq!(
        session.render(&target, &value).unwrap(),
        "Node = {value = 1, next = Node = {value = 2, next = Node = {...}}}"
    );
}

#[test]
fn test_three_node_ring_wider_bound()
{
    let mut target = FakeTarget::new();
    let value = ring(&mut target, 3);
    let mut session = Session::default();
    session.apply_setting("svm-print-depth-limit", "5").unwrap();
    assert_eq!(
        session.render(&target, &value).unwrap(),
        "Node = {value = 1, next = Node = {value = 2, next = Node = {value = 3, next = Node = {...}}}}"
    );
}

#[test]
fn test_acyclic_chain_elided_at_default_bound()
{
    let mut target = FakeTarget::new();
    target.define_class("Node", &[
        ("value", ValueType::Primitive(PrimitiveKind::Int)),
        ("next", ValueType::reference("Node")),
    ]);
    let nodes: Vec<Address> = (0..3).map(|_| target.new_object("Node")).collect();
    for (i, node) in nodes.iter().enumerate() {
        target.write_i32(*node + 8, i32::try_from(i + 1).unwrap());
        if let Some(next) = nodes.get(i + 1) {
            target.write_u64(*node + 16, next.value());
        }
    }
    let value = Value::Reference(ObjectHandle::new(nodes[0], "Node"));
    let mut session = Session::default();

    // The bound runs out before the walk reaches the root, so the tail is
    // cut even though the list ends in null.
    assert_eq!(
        session.render(&target, &value).unwrap(),
        "Node = {value = 1, next = Node = {value = 2, next = Node = {...}}}"
    );
    session.apply_setting("svm-print-depth-limit", "2").unwrap();
    assert_eq!(
        session.render(&target, &value).unwrap(),
        "Node = {value = 1, next = Node = {value = 2, next = Node = {value = 3, next = null}}}"
    );
}

#[test]
fn test_render_starts_fresh()
{
    let mut target = FakeTarget::new();
    let value = ring(&mut target, 2);
    let mut session = Session::default();
    let first = session.render(&target, &value).unwrap();
    // Without a reset the root would already be marked and cut immediately.
    assert_eq!(session.render(&target, &value).unwrap(), first);
    assert_eq!(first, "Node = {value = 1, next = Node = {value = 2, next = Node = {...}}}");
}

#[test]
fn test_guard_reset()
{
    let policy = CyclePolicy::default();
    let (a, b) = (Address::from(0x1000), Address::from(0x2000));
    let mut guard = CycleGuard::new();
    guard.add_ref(policy, a, b);
    guard.add_ref(policy, b, a);
    assert!(guard.is_self_ref(policy, a));
    assert_eq!(guard.cyclic_count(), 1);

    guard.reset();
    assert!(!guard.is_self_ref(policy, a));
    assert_eq!(guard.cyclic_count(), 0);
}
