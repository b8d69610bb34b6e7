use std::collections::HashSet;
use std::collections::VecDeque;

use rand::Rng;

use crate::networking::range::{normalize, Blacklist, PortRange};

/// Hands out candidate ports without repeats.
///
/// Candidates are grouped in tiers. Ports are drawn at random from the first
/// tier until it runs dry, then from the next one.
#[derive(Debug, Clone)]
pub struct CandidateDraw {
    tiers: VecDeque<Vec<PortRange>>,
    excluded: Blacklist,
    current: Vec<u16>,
    seen: HashSet<u16>,
}

impl CandidateDraw {
    fn with_tiers(tiers: VecDeque<Vec<PortRange>>, excluded: Blacklist) -> Self {
        Self {
            tiers,
            excluded,
            current: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// One tier per range, best range first
    pub fn ranked(ranges: Vec<PortRange>, excluded: Blacklist) -> Self {
        Self::with_tiers(ranges.into_iter().map(|r| vec![r]).collect(), excluded)
    }

    /// A single tier covering every range
    pub fn uniform(ranges: Vec<PortRange>, excluded: Blacklist) -> Self {
        let mut tiers = VecDeque::new();
        tiers.push_back(normalize(ranges));
        Self::with_tiers(tiers, excluded)
    }

    /// Ports strictly in the given order
    pub fn ordered(ports: &[u16], excluded: Blacklist) -> Self {
        let tiers = ports
            .iter()
            .map(|&port| vec![PortRange::single(port)])
            .collect();
        Self::with_tiers(tiers, excluded)
    }

    /// Next untried candidate, or `None` once every tier is used up
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<u16> {
        while self.current.is_empty() {
            let tier = self.tiers.pop_front()?;
            let excluded = &self.excluded;
            let seen = &self.seen;
            self.current = tier
                .iter()
                .flat_map(|r| r.ports())
                .filter(|port| !excluded.contains(*port) && !seen.contains(port))
                .collect();
        }
        let idx = rng.gen_range(0..self.current.len());
        let port = self.current.swap_remove(idx);
        self.seen.insert(port);
        Some(port)
    }
}
