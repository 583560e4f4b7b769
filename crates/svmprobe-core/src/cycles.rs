//! # Cycle Guard
//!
//! Detects self-referential object graphs so a recursive decode terminates.
//!
//! The guard records one `child -> parent` edge per managed object as the
//! decoder expands it. Before recording an edge it walks the ancestor chain
//! of the parent for at most `depth_limit` hops looking for the child. A hit
//! marks the child's address as cyclic, and every later decode of that
//! address is cut short with ` = {...}`.
//!
//! ## Approximation
//!
//! The walk is bounded. When the bound runs out before the chain reaches a
//! root, the child is also marked cyclic. With the default bound of 1 this
//! means a grandchild whose grandparent has a parent of its own is elided
//! even in an acyclic graph. Raising `svm-print-depth-limit` trades work for
//! precision; expression resolution switches the check off.
//!
//! Entries are only meaningful within one top-level evaluation. The session
//! calls [`CycleGuard::reset`] between evaluations.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::types::Address;

/// Parameters the guard reads from the configuration on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePolicy
{
    /// Master switch; a disabled guard records nothing and reports nothing.
    pub enabled: bool,
    /// Ancestor hops examined per edge.
    pub depth_limit: usize,
}

impl Default for CyclePolicy
{
    fn default() -> Self
    {
        Self {
            enabled: true,
            depth_limit: 1,
        }
    }
}

/// Parent edges and cyclic addresses seen during one evaluation.
///
/// Callers only pass addresses of objects that carry a type header; the
/// decoder filters primitives and native values before calling in.
#[derive(Debug, Default, Clone)]
pub struct CycleGuard
{
    parents: HashMap<Address, Address>,
    cycles: HashSet<Address>,
}

impl CycleGuard
{
    /// Empty guard.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// `true` when `address` was marked cyclic.
    pub fn is_self_ref(&self, policy: CyclePolicy, address: Address) -> bool
    {
        policy.enabled && self.cycles.contains(&address)
    }

    /// Register `child` as reached from `parent`.
    ///
    /// Null children are ignored: they are rendered as `null` and never
    /// expanded.
    pub fn add_ref(&mut self, policy: CyclePolicy, parent: Address, child: Address)
    {
        if !policy.enabled || child.is_null() {
            return;
        }
        if self.reaches(policy.depth_limit, child, parent) {
            trace!(%child, %parent, "marking cyclic reference");
            self.cycles.insert(child);
        } else {
            self.parents.insert(child, parent);
        }
    }

    /// Forget every edge and every cyclic mark.
    pub fn reset(&mut self)
    {
        self.parents.clear();
        self.cycles.clear();
    }

    /// Number of addresses currently marked cyclic.
    pub fn cyclic_count(&self) -> usize
    {
        self.cycles.len()
    }

    // Whether `target` is `start` or one of its first `limit` ancestors.
    // Running out of hops before reaching a root counts as reachable.
    fn reaches(&self, limit: usize, target: Address, start: Address) -> bool
    {
        if target == start {
            return true;
        }

        let mut current = start;
        let mut depth = 0usize;
        // No loop-free chain is longer than the number of recorded edges.
        let hop_cap = self.parents.len().saturating_add(1);
        loop {
            if depth >= limit || depth > hop_cap {
                return true;
            }
            let Some(&parent) = self.parents.get(&current) else {
                return false;
            };
            if parent == target {
                return true;
            }
            current = parent;
            depth += 1;
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn addr(value: u64) -> Address
    {
        Address::from(value)
    }

    fn policy(depth_limit: usize) -> CyclePolicy
    {
        CyclePolicy {
            enabled: true,
            depth_limit,
        }
    }

    #[test]
    fn test_two_node_cycle()
    {
        let mut guard = CycleGuard::new();
        let p = policy(1);
        guard.add_ref(p, addr(0xa0), addr(0xb0));
        assert!(!guard.is_self_ref(p, addr(0xb0)));
        guard.add_ref(p, addr(0xb0), addr(0xa0));
        assert!(guard.is_self_ref(p, addr(0xa0)));
        assert_eq!(guard.cyclic_count(), 1);
    }

    #[test]
    fn test_direct_self_reference()
    {
        let mut guard = CycleGuard::new();
        guard.add_ref(policy(1), addr(0xa0), addr(0xa0));
        assert!(guard.is_self_ref(policy(1), addr(0xa0)));
    }

    #[test]
    fn test_depth_bound_is_conservative()
    {
        // a -> b -> c with a recorded parent for a: the walk from b runs out
        // of hops before reaching a root.
        let mut guard = CycleGuard::new();
        let p = policy(1);
        guard.add_ref(p, addr(0x10), addr(0xa0));
        guard.add_ref(p, addr(0xa0), addr(0xb0));
        assert!(guard.is_self_ref(p, addr(0xb0)));

        let mut guard = CycleGuard::new();
        let p = policy(4);
        guard.add_ref(p, addr(0x10), addr(0xa0));
        guard.add_ref(p, addr(0xa0), addr(0xb0));
        assert!(!guard.is_self_ref(p, addr(0xb0)));
    }

    #[test]
    fn test_disabled_guard_records_nothing()
    {
        let mut guard = CycleGuard::new();
        let off = CyclePolicy {
            enabled: false,
            depth_limit: 1,
        };
        guard.add_ref(off, addr(0xa0), addr(0xa0));
        assert!(!guard.is_self_ref(off, addr(0xa0)));
        assert!(!guard.is_self_ref(policy(1), addr(0xa0)));
    }

    #[test]
    fn test_null_child_ignored()
    {
        let mut guard = CycleGuard::new();
        guard.add_ref(policy(1), Address::ZERO, Address::ZERO);
        assert_eq!(guard.cyclic_count(), 0);
    }

    #[test]
    fn test_reset_clears_marks()
    {
        let mut guard = CycleGuard::new();
        let p = policy(1);
        guard.add_ref(p, addr(0xa0), addr(0xa0));
        guard.reset();
        assert!(!guard.is_self_ref(p, addr(0xa0)));
    }

    #[test]
    fn test_unbounded_walk_terminates_on_edge_loop()
    {
        let mut guard = CycleGuard::new();
        let p = policy(usize::MAX);
        guard.parents.insert(addr(0x1), addr(0x2));
        guard.parents.insert(addr(0x2), addr(0x1));
        guard.add_ref(p, addr(0x1), addr(0x3));
        assert!(guard.is_self_ref(p, addr(0x3)));
    }
}
