use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::Result;
use crate::networking::{Blacklist, PortContext, SocketProbe};
use crate::selection::PortSelector;
use crate::store::FileStore;

pub mod commands;

/// port-for: pick free local TCP ports and remember them by name
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Settings file (JSON)
    #[arg(long, global = true, env = "PORT_FOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store file holding name to port associations
    #[arg(long, global = true, env = "PORT_FOR_STORE")]
    pub store: Option<PathBuf>,

    /// Ports or ranges never to hand out (e.g. 8080 or 9000-9010)
    #[arg(long, short = 'x', global = true)]
    pub exclude: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Commands for port-for
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Get the port bound to a name, picking and storing one if needed
    #[command(name = "bind")]
    Bind(commands::bind::BindCommand),

    /// Remove the port bound to a name
    #[command(name = "unbind")]
    Unbind(commands::unbind::UnbindCommand),

    /// List names and their ports
    #[command(name = "list")]
    List(commands::list::ListCommand),

    /// Pick a free port without remembering it
    #[command(name = "select")]
    Select(commands::select::SelectCommand),

    /// Show the pool of good port ranges
    #[command(name = "pool")]
    Pool(commands::pool::PoolCommand),
}

impl Cli {
    /// Settings file merged with command line overrides
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(store) = &self.store {
            settings.store = store.clone();
        }
        settings.exclude.extend(self.exclude.iter().cloned());
        settings.validate()?;
        Ok(settings)
    }
}

/// Everything a command needs, built once per invocation
#[derive(Debug)]
pub struct App {
    pub settings: Settings,
    pub context: PortContext,
    pub store: FileStore,
    pub probe: SocketProbe,
    pub blacklist: Blacklist,
}

impl App {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let context = PortContext::load(settings.assignments.as_deref())?;
        let store = FileStore::with_lock_timeout(&settings.store, settings.lock_timeout());
        let probe = SocketProbe::new(settings.connect_timeout());
        let blacklist = settings.blacklist()?;
        Ok(Self {
            settings,
            context,
            store,
            probe,
            blacklist,
        })
    }

    /// Selector wired to this invocation's context, probe and blacklist
    pub fn selector(&self) -> PortSelector<'_> {
        PortSelector::new(&self.context, &self.probe)
            .with_blacklist(self.blacklist.clone())
            .with_options(self.settings.selector_options())
    }
}
