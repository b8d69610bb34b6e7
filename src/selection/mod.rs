//! Port selection
//!
//! A request moves through
//! `ResolveRequest -> CheckSticky -> DrawCandidate -> Verify -> Commit -> Done`,
//! ending in `Done` or `Fail`. Each transition is one call to
//! `PortSelector::step`, so retry behaviour can be driven state by state.

use std::io::ErrorKind;

use log::{debug, info, warn};
use rand::rngs::ThreadRng;

use crate::error::{Error, Result};
use crate::networking::assignments::SYSTEM_PORT_LIMIT;
use crate::networking::range::{Blacklist, PortRange};
use crate::networking::{CandidatePool, PoolOptions, PortContext, PortProbe};
use crate::store::{AssociationStore, Claim};

pub mod draw;
pub mod request;

pub use draw::CandidateDraw;
pub use request::{PortRequest, SelectionRequest};

/// Default number of candidates verified before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorOptions {
    pub max_attempts: u32,
    pub pool: PoolOptions,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pool: PoolOptions::default(),
        }
    }
}

/// Selection states
#[derive(Debug)]
pub enum SelectionState {
    ResolveRequest,
    CheckSticky,
    DrawCandidate,
    Verify(u16),
    Commit(u16),
    Done(Option<u16>),
    Fail(Error),
}

impl SelectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SelectionState::Done(_) | SelectionState::Fail(_))
    }
}

/// Per-request bookkeeping carried between states
#[derive(Debug)]
pub struct Selection<'r> {
    request: &'r SelectionRequest,
    draw: Option<CandidateDraw>,
    attempts: u32,
    rng: ThreadRng,
}

impl<'r> Selection<'r> {
    pub fn new(request: &'r SelectionRequest) -> Self {
        Self {
            request,
            draw: None,
            attempts: 0,
            rng: rand::thread_rng(),
        }
    }

    /// Candidates verified so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn is_explicit(&self) -> bool {
        matches!(self.request.ports, PortRequest::Exact(_))
    }
}

/// Picks ports for requests
pub struct PortSelector<'a> {
    context: &'a PortContext,
    probe: &'a dyn PortProbe,
    store: Option<&'a dyn AssociationStore>,
    blacklist: Blacklist,
    options: SelectorOptions,
}

impl<'a> PortSelector<'a> {
    pub fn new(context: &'a PortContext, probe: &'a dyn PortProbe) -> Self {
        Self {
            context,
            probe,
            store: None,
            blacklist: Blacklist::new(),
            options: SelectorOptions::default(),
        }
    }

    /// Remember named selections in `store`
    pub fn with_store(mut self, store: &'a dyn AssociationStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }

    pub fn with_options(mut self, options: SelectorOptions) -> Self {
        self.options = options;
        self
    }

    /// Run a request to completion. `Ok(None)` only for `PortRequest::Disabled`
    pub fn select(&self, request: &SelectionRequest) -> Result<Option<u16>> {
        let mut selection = Selection::new(request);
        let mut state = SelectionState::ResolveRequest;
        while !state.is_terminal() {
            state = self.step(&mut selection, state);
        }
        debug!("Selection for {} took {} attempts", request.ports, selection.attempts());
        match state {
            SelectionState::Done(port) => Ok(port),
            SelectionState::Fail(err) => Err(err),
            other => Err(Error::InvalidArgument(format!(
                "Selection stopped in state {:?}",
                other
            ))),
        }
    }

    /// Advance one transition. Terminal states are returned unchanged
    pub fn step(&self, selection: &mut Selection<'_>, state: SelectionState) -> SelectionState {
        match state {
            SelectionState::ResolveRequest => self.resolve(selection),
            SelectionState::CheckSticky => self.check_sticky(selection),
            SelectionState::DrawCandidate => self.draw_candidate(selection),
            SelectionState::Verify(port) => self.verify(selection, port),
            SelectionState::Commit(port) => self.commit(selection, port),
            terminal => terminal,
        }
    }

    fn resolve(&self, selection: &mut Selection<'_>) -> SelectionState {
        let request = selection.request;
        if request.name.is_some() && self.store.is_none() {
            return SelectionState::Fail(Error::InvalidArgument(
                "Named selection requires an association store".to_string(),
            ));
        }

        match (&request.ports, &request.name) {
            (PortRequest::Disabled, _) => SelectionState::Done(None),
            (PortRequest::Exact(port), Some(_)) => SelectionState::Commit(*port),
            (PortRequest::Exact(port), None) => SelectionState::Done(Some(*port)),
            (_, Some(_)) => SelectionState::CheckSticky,
            (_, None) => self.prepare_draw(selection),
        }
    }

    fn check_sticky(&self, selection: &mut Selection<'_>) -> SelectionState {
        let request = selection.request;
        let (Some(store), Some(name)) = (self.store, request.name.as_deref()) else {
            return self.prepare_draw(selection);
        };
        match store.lookup(name) {
            Ok(Some(port)) => {
                debug!("{} is already bound to port {}", name, port);
                SelectionState::Done(Some(port))
            }
            Ok(None) => self.prepare_draw(selection),
            Err(e) => SelectionState::Fail(e),
        }
    }

    /// Build the candidate draw for the request and move to `DrawCandidate`
    fn prepare_draw(&self, selection: &mut Selection<'_>) -> SelectionState {
        let mut excluded = self.blacklist.clone();
        excluded.add_range(PortRange {
            start: 0,
            end: SYSTEM_PORT_LIMIT - 1,
        });
        if let Some(store) = self.store {
            match store.list() {
                Ok(associations) => associations.iter().for_each(|a| excluded.add_port(a.port)),
                // Unnamed requests only use the store to skip bound ports
                Err(Error::Io(e))
                    if e.kind() == ErrorKind::PermissionDenied && selection.request.name.is_none() =>
                {
                    warn!("Cannot read bound ports, not skipping them: {}", e);
                }
                Err(e) => return SelectionState::Fail(e),
            }
        }

        let draw = match &selection.request.ports {
            PortRequest::Any => {
                let pool = CandidatePool::new(self.context, self.options.pool);
                CandidateDraw::ranked(pool.good_ranges(&self.blacklist), excluded)
            }
            PortRequest::Set(ports) => CandidateDraw::ordered(ports, excluded),
            PortRequest::Range(range) => CandidateDraw::uniform(vec![*range], excluded),
            PortRequest::Mixed { ranges, ports } => {
                let mut all = ranges.clone();
                all.extend(ports.iter().map(|&p| PortRange::single(p)));
                CandidateDraw::uniform(all, excluded)
            }
            PortRequest::Disabled | PortRequest::Exact(_) => {
                return SelectionState::Fail(Error::InvalidArgument(format!(
                    "Nothing to draw for request {}",
                    selection.request.ports
                )))
            }
        };
        selection.draw = Some(draw);
        SelectionState::DrawCandidate
    }

    fn draw_candidate(&self, selection: &mut Selection<'_>) -> SelectionState {
        if selection.attempts >= self.options.max_attempts {
            return SelectionState::Fail(Error::Exhausted(format!(
                "no candidate for {} was free after {} attempts",
                selection.request.ports, selection.attempts
            )));
        }
        let Selection { draw, rng, .. } = selection;
        match draw.as_mut().and_then(|d| d.next(rng)) {
            Some(port) => {
                selection.attempts += 1;
                SelectionState::Verify(port)
            }
            None => SelectionState::Fail(Error::Exhausted(format!(
                "every candidate for {} was tried ({} attempts)",
                selection.request.ports, selection.attempts
            ))),
        }
    }

    fn verify(&self, selection: &mut Selection<'_>, port: u16) -> SelectionState {
        if !self.probe.is_available(port) {
            debug!("Port {} is in use, drawing another", port);
            return SelectionState::DrawCandidate;
        }
        if selection.request.name.is_some() {
            SelectionState::Commit(port)
        } else {
            SelectionState::Done(Some(port))
        }
    }

    fn commit(&self, selection: &mut Selection<'_>, port: u16) -> SelectionState {
        let request = selection.request;
        let (Some(store), Some(name)) = (self.store, request.name.as_deref()) else {
            return SelectionState::Done(Some(port));
        };

        if selection.is_explicit() {
            return match store.bind(name, port) {
                Ok(()) => SelectionState::Done(Some(port)),
                Err(e) => SelectionState::Fail(e),
            };
        }

        match store.claim(name, port) {
            Ok(claim) => {
                match claim {
                    Claim::Committed(port) => info!("Assigned port {} to {}", port, name),
                    Claim::Existing(existing) => info!(
                        "{} was bound to port {} concurrently, keeping it",
                        name, existing
                    ),
                }
                SelectionState::Done(Some(claim.port()))
            }
            Err(Error::PortTaken { port, owner }) => {
                debug!("Port {} was taken by {} meanwhile, drawing another", port, owner);
                SelectionState::DrawCandidate
            }
            Err(e) => SelectionState::Fail(e),
        }
    }
}
