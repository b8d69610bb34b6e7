//! Candidate pool construction and ranking
//!
//! The pool is every port not reserved, assigned, ephemeral or blacklisted,
//! coalesced into contiguous ranges and ranked so the safest ranges come
//! first. Everything here is a pure function of its inputs.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use super::assignments::SYSTEM_PORT_LIMIT;
use super::range::{ranges_to_set, to_ranges, Blacklist, PortRange};
use super::PortContext;

/// Tuning for which ranges count as "good"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Ranges shorter than this are dropped
    pub min_range_len: u32,
    /// Ports trimmed from each end of a range
    pub border: u16,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_range_len: 20,
            border: 3,
        }
    }
}

impl PoolOptions {
    /// Keep every eligible range untouched
    pub fn exact() -> Self {
        Self {
            min_range_len: 1,
            border: 0,
        }
    }
}

/// Ranked view of the ports worth handing out
#[derive(Debug, Clone)]
pub struct CandidatePool<'a> {
    context: &'a PortContext,
    options: PoolOptions,
}

impl<'a> CandidatePool<'a> {
    pub fn new(context: &'a PortContext, options: PoolOptions) -> Self {
        Self { context, options }
    }

    /// Every port outside the system range, the assignment table, the
    /// ephemeral range and the blacklist
    pub fn available_ports(&self, blacklist: &Blacklist) -> BTreeSet<u16> {
        self.available_ports_within(
            PortRange {
                start: SYSTEM_PORT_LIMIT,
                end: u16::MAX,
            },
            blacklist,
        )
    }

    /// `available_ports` limited to `bounds`
    pub fn available_ports_within(&self, bounds: PortRange, blacklist: &Blacklist) -> BTreeSet<u16> {
        bounds
            .ports()
            .filter(|&port| !self.context.is_excluded(port) && !blacklist.contains(port))
            .collect()
    }

    /// Eligible ports coalesced into ranges, best first.
    ///
    /// Larger ranges rank higher, ties go to the lower start. A range whose
    /// bounds touch an assigned port ranks after all ranges that don't.
    pub fn good_ranges(&self, blacklist: &Blacklist) -> Vec<PortRange> {
        let mut ranked: Vec<(bool, PortRange)> = to_ranges(self.available_ports(blacklist))
            .into_iter()
            .filter_map(|range| {
                let adjacent = self.borders_assigned_port(range);
                trim_range(range, self.options).map(|trimmed| (adjacent, trimmed))
            })
            .collect();

        ranked.sort_by_key(|(adjacent, range)| (*adjacent, Reverse(range.len()), range.start));
        ranked.into_iter().map(|(_, range)| range).collect()
    }

    /// Flattened `good_ranges`
    pub fn good_ports(&self, blacklist: &Blacklist) -> BTreeSet<u16> {
        ranges_to_set(&self.good_ranges(blacklist))
    }

    /// Whether `port` is part of the good pool
    pub fn contains(&self, port: u16, blacklist: &Blacklist) -> bool {
        self.good_ranges(blacklist).iter().any(|r| r.contains(port))
    }

    fn borders_assigned_port(&self, range: PortRange) -> bool {
        let assignments = self.context.assignments();
        let below = range
            .start
            .checked_sub(1)
            .map_or(false, |p| assignments.is_assigned(p));
        let above = range
            .end
            .checked_add(1)
            .map_or(false, |p| assignments.is_assigned(p));
        below || above
    }
}

/// Drop short ranges and shave `border` ports off each end.
///
/// A trimmed range is kept only if it is still strictly longer than the
/// minimum. With a zero border ranges are kept as they are.
fn trim_range(range: PortRange, options: PoolOptions) -> Option<PortRange> {
    if range.len() < options.min_range_len {
        return None;
    }
    if options.border == 0 {
        return Some(range);
    }
    let border = u32::from(options.border);
    if range.len() <= 2 * border {
        return None;
    }
    let trimmed = PortRange {
        start: range.start + options.border,
        end: range.end - options.border,
    };
    (trimmed.len() > options.min_range_len).then_some(trimmed)
}
