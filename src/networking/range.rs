//! Port ranges and caller blacklists

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Inclusive range of ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidArgument(format!(
                "Invalid port range {}-{}: start is greater than end",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range holding a single port
    pub fn single(port: u16) -> Self {
        Self { start: port, end: port }
    }

    /// Number of ports in the range. Zero for a range built with
    /// `start > end`
    pub fn len(&self) -> u32 {
        (u32::from(self.end) + 1).saturating_sub(u32::from(self.start))
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Check if port is within this range
    pub fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for PortRange {
    type Err = Error;

    /// Parse `8080` or `9000-9010`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once('-') {
            Some((low, high)) => PortRange::new(parse_port(low)?, parse_port(high)?),
            None => Ok(PortRange::single(parse_port(s)?)),
        }
    }
}

/// Parse a single decimal port number
pub fn parse_port(s: &str) -> Result<u16> {
    let s = s.trim();
    s.parse::<u16>()
        .map_err(|_| Error::InvalidArgument(format!("Invalid port: {:?}", s)))
}

/// Coalesce sorted ports into maximal contiguous ranges
pub fn to_ranges<I>(ports: I) -> Vec<PortRange>
where
    I: IntoIterator<Item = u16>,
{
    let mut ranges: Vec<PortRange> = Vec::new();
    for port in ports {
        match ranges.last_mut() {
            Some(last) if u32::from(port) == u32::from(last.end) + 1 => last.end = port,
            Some(last) if last.contains(port) => {}
            _ => ranges.push(PortRange::single(port)),
        }
    }
    ranges
}

/// Flatten ranges into a set of ports
pub fn ranges_to_set(ranges: &[PortRange]) -> BTreeSet<u16> {
    ranges.iter().flat_map(|r| r.ports()).collect()
}

/// Sort ranges, drop empty ones and merge any that overlap or touch
pub fn normalize(mut ranges: Vec<PortRange>) -> Vec<PortRange> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort();
    let mut merged: Vec<PortRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if u32::from(range.start) <= u32::from(last.end) + 1 => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Ports and ranges a caller never wants handed out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    ranges: Vec<PortRange>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a blacklist from entries such as `8080` or `9000-9010`
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut blacklist = Self::new();
        for entry in entries {
            for part in entry.as_ref().split(',').filter(|p| !p.trim().is_empty()) {
                blacklist.add_range(part.parse()?);
            }
        }
        Ok(blacklist)
    }

    pub fn add_port(&mut self, port: u16) {
        self.add_range(PortRange::single(port));
    }

    pub fn add_range(&mut self, range: PortRange) {
        self.ranges.push(range);
        self.ranges = normalize(std::mem::take(&mut self.ranges));
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ranges.iter().any(|r| r.contains(port))
    }

    pub fn ranges(&self) -> &[PortRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<u16> for Blacklist {
    fn from_iter<T: IntoIterator<Item = u16>>(iter: T) -> Self {
        let mut ports: Vec<u16> = iter.into_iter().collect();
        ports.sort_unstable();
        Self {
            ranges: to_ranges(ports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_is_empty() {
        let range = PortRange { start: 9, end: 1 };

        assert_eq!(range.len(), 0);
        assert!(range.is_empty());
        assert!(!range.contains(5));
        assert_eq!(range.ports().count(), 0);
        assert!(PortRange::new(9, 1).is_err());
        assert_eq!(PortRange { start: 0, end: u16::MAX }.len(), 65536);
        assert_eq!(normalize(vec![range, PortRange::single(3)]), vec![PortRange::single(3)]);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("8080".parse::<PortRange>().unwrap(), PortRange::single(8080));
        assert_eq!(
            " 9000-9010 ".parse::<PortRange>().unwrap(),
            PortRange { start: 9000, end: 9010 }
        );
        assert!("9010-9000".parse::<PortRange>().is_err());
        assert!("70000".parse::<PortRange>().is_err());
        assert!("http".parse::<PortRange>().is_err());
    }

    #[test]
    fn test_to_ranges_coalesces() {
        let ranges = to_ranges(vec![1, 2, 3, 5, 7, 8]);
        assert_eq!(
            ranges,
            vec![
                PortRange { start: 1, end: 3 },
                PortRange::single(5),
                PortRange { start: 7, end: 8 },
            ]
        );
    }

    #[test]
    fn test_to_ranges_handles_top_of_port_space() {
        let ranges = to_ranges(vec![65534, 65535]);
        assert_eq!(ranges, vec![PortRange { start: 65534, end: 65535 }]);
    }

    #[test]
    fn test_normalize_merges_overlapping_and_touching() {
        let ranges = normalize(vec![
            PortRange { start: 20, end: 30 },
            PortRange { start: 1, end: 5 },
            PortRange { start: 6, end: 10 },
            PortRange { start: 25, end: 40 },
        ]);
        assert_eq!(
            ranges,
            vec![PortRange { start: 1, end: 10 }, PortRange { start: 20, end: 40 }]
        );
    }

    #[test]
    fn test_blacklist_parse_and_contains() {
        let blacklist = Blacklist::parse(&["8080", "9000-9002,9500"]).unwrap();
        assert!(blacklist.contains(8080));
        assert!(blacklist.contains(9001));
        assert!(blacklist.contains(9500));
        assert!(!blacklist.contains(9003));
        assert_eq!(blacklist.ranges().len(), 3);
    }

    #[test]
    fn test_range_len_covers_full_space() {
        let all = PortRange { start: 0, end: u16::MAX };
        assert_eq!(all.len(), 65536);
        assert_eq!(all.to_string(), "0-65535");
        assert_eq!(PortRange::single(80).to_string(), "80");
    }
}
