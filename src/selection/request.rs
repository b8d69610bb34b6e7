use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::networking::range::{parse_port, PortRange};

/// What ports a caller is willing to accept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRequest {
    /// Never return a port
    Disabled,
    /// Any good port from the candidate pool
    Any,
    /// Exactly this port, returned without checking it
    Exact(u16),
    /// The first available port, in the given order
    Set(Vec<u16>),
    /// A random available port in the range
    Range(PortRange),
    /// A random available port from any of the ranges or ports
    Mixed {
        ranges: Vec<PortRange>,
        ports: Vec<u16>,
    },
}

impl Default for PortRequest {
    fn default() -> Self {
        PortRequest::Any
    }
}

impl FromStr for PortRequest {
    type Err = Error;

    /// Parse `-1`/`none`, `any`/`auto`/empty, `8000`, `4001,4002`,
    /// `2000-3000` or a comma separated mix of ports and ranges
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "-1" | "none" => return Ok(PortRequest::Disabled),
            "" | "any" | "auto" => return Ok(PortRequest::Any),
            _ => {}
        }

        let mut ranges = Vec::new();
        let mut ports = Vec::new();
        for part in s.split(',').map(str::trim) {
            if part.is_empty() {
                return Err(Error::InvalidArgument(format!("Invalid ports: {:?}", s)));
            }
            if part.contains('-') {
                ranges.push(part.parse::<PortRange>()?);
            } else {
                ports.push(parse_port(part)?);
            }
        }

        Ok(match (ranges.len(), ports.len()) {
            (0, 1) => PortRequest::Exact(ports[0]),
            (0, _) => PortRequest::Set(ports),
            (1, 0) => PortRequest::Range(ranges[0]),
            _ => PortRequest::Mixed { ranges, ports },
        })
    }
}

impl fmt::Display for PortRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<String>| items.join(",");
        match self {
            PortRequest::Disabled => write!(f, "none"),
            PortRequest::Any => write!(f, "any"),
            PortRequest::Exact(port) => write!(f, "{}", port),
            PortRequest::Set(ports) => {
                write!(f, "{}", join(ports.iter().map(u16::to_string).collect()))
            }
            PortRequest::Range(range) => write!(f, "{}", range),
            PortRequest::Mixed { ranges, ports } => {
                let items = ranges
                    .iter()
                    .map(PortRange::to_string)
                    .chain(ports.iter().map(u16::to_string))
                    .collect();
                write!(f, "{}", join(items))
            }
        }
    }
}

/// A port request, optionally tied to a name in the store
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionRequest {
    pub ports: PortRequest,
    pub name: Option<String>,
}

impl SelectionRequest {
    /// Any port, not remembered
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new(ports: PortRequest) -> Self {
        Self { ports, name: None }
    }

    /// Sticky request for `name`
    pub fn named(name: &str, ports: PortRequest) -> Self {
        Self {
            ports,
            name: Some(name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentinels() {
        assert_eq!("-1".parse::<PortRequest>().unwrap(), PortRequest::Disabled);
        assert_eq!("None".parse::<PortRequest>().unwrap(), PortRequest::Disabled);
        assert_eq!("".parse::<PortRequest>().unwrap(), PortRequest::Any);
        assert_eq!("auto".parse::<PortRequest>().unwrap(), PortRequest::Any);
    }

    #[test]
    fn test_parse_exact_set_range() {
        assert_eq!("1234".parse::<PortRequest>().unwrap(), PortRequest::Exact(1234));
        assert_eq!(
            "4001, 4002,4003".parse::<PortRequest>().unwrap(),
            PortRequest::Set(vec![4001, 4002, 4003])
        );
        assert_eq!(
            "2000-3000".parse::<PortRequest>().unwrap(),
            PortRequest::Range(PortRange { start: 2000, end: 3000 })
        );
    }

    #[test]
    fn test_parse_mixed() {
        assert_eq!(
            "2000-3000,4001,4002".parse::<PortRequest>().unwrap(),
            PortRequest::Mixed {
                ranges: vec![PortRange { start: 2000, end: 3000 }],
                ports: vec![4001, 4002],
            }
        );
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["abc", "1,,2", "70000", "3000-2000"] {
            assert!(bad.parse::<PortRequest>().is_err(), "{:?} should fail", bad);
        }
    }

    #[test]
    fn test_display_matches_input_form() {
        let request: PortRequest = "2000-3000,4001".parse().unwrap();
        assert_eq!(request.to_string(), "2000-3000,4001");
        assert_eq!(PortRequest::Set(vec![1, 2]).to_string(), "1,2");
    }
}
