//! port-for picks local TCP ports that are free now and likely to stay free.
//!
//! Candidates avoid the system range, well-known service ports and the
//! kernel's ephemeral range. Ports can be remembered by name in a store file
//! shared between processes, so a service gets the same port after restarts.

pub mod cli;
pub mod config;
pub mod error;
pub mod networking;
pub mod selection;
pub mod store;

use std::collections::BTreeSet;

pub use error::{Error, Result};
pub use networking::port::port_is_used;
pub use networking::{Blacklist, PortContext, PortRange};
pub use selection::{PortRequest, PortSelector, SelectionRequest};
pub use store::{AssociationStore, FileStore};

use networking::range::to_ranges;
use networking::{CandidatePool, PoolOptions, PortProbe, SocketProbe};

/// Pick a random free port from `ports`, or from the good pool when `None`.
/// Ports in `exclude` are never picked
pub fn select_random(ports: Option<&[u16]>, exclude: &Blacklist) -> Result<u16> {
    let request = match ports {
        None => PortRequest::Any,
        Some(ports) => {
            let mut ports = ports.to_vec();
            ports.sort_unstable();
            PortRequest::Mixed {
                ranges: to_ranges(ports),
                ports: Vec::new(),
            }
        }
    };
    let context = PortContext::detect()?;
    let probe = SocketProbe::default();
    let selector = PortSelector::new(&context, &probe).with_blacklist(exclude.clone());
    selector
        .select(&SelectionRequest::new(request))?
        .ok_or_else(|| Error::Exhausted("no port selected".to_string()))
}

/// Whether `port` is outside every excluded range and free right now
pub fn is_available(port: u16) -> Result<bool> {
    let context = PortContext::detect()?;
    let eligible = CandidatePool::new(&context, PoolOptions::default())
        .available_ports_within(PortRange::single(port), &Blacklist::new())
        .contains(&port);
    Ok(eligible && SocketProbe::default().is_available(port))
}

/// Eligible ports from `low` to `high` inclusive, minus `exclude`
pub fn available_ports(low: u16, high: u16, exclude: &Blacklist) -> Result<BTreeSet<u16>> {
    let bounds = PortRange::new(low, high)?;
    let context = PortContext::detect()?;
    Ok(CandidatePool::new(&context, PoolOptions::default()).available_ports_within(bounds, exclude))
}

/// Resolve a port request. `Ok(None)` for `PortRequest::Disabled`
pub fn get_port(request: PortRequest) -> Result<Option<u16>> {
    let context = PortContext::detect()?;
    let probe = SocketProbe::default();
    PortSelector::new(&context, &probe).select(&SelectionRequest::new(request))
}

/// Good port ranges on this host, best first
pub fn good_port_ranges() -> Result<Vec<PortRange>> {
    let context = PortContext::detect()?;
    Ok(CandidatePool::new(&context, PoolOptions::default()).good_ranges(&Blacklist::new()))
}

/// Every port in the good pool on this host
pub fn available_good_ports() -> Result<BTreeSet<u16>> {
    let context = PortContext::detect()?;
    Ok(CandidatePool::new(&context, PoolOptions::default()).good_ports(&Blacklist::new()))
}
