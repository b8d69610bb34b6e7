use clap::Args;

use crate::cli::App;
use crate::error::Result;
use crate::selection::{PortRequest, SelectionRequest};

/// Get the port bound to a name, picking and storing one if needed
#[derive(Args, Debug)]
pub struct BindCommand {
    /// Name to bind
    pub name: String,

    /// Ports to choose from (8000, 4001,4002, 2000-3000, any or -1).
    /// A single port is stored as given, replacing any previous binding
    #[arg(long, short)]
    pub port: Option<String>,
}

impl BindCommand {
    /// Run the command
    pub fn execute(&self, app: &App) -> Result<()> {
        if let Some(port) = self.bind(app)? {
            println!("{}", port);
        }
        Ok(())
    }

    /// Resolve the port for the name without printing it
    pub fn bind(&self, app: &App) -> Result<Option<u16>> {
        let ports = match &self.port {
            Some(ports) => ports.parse()?,
            None => PortRequest::Any,
        };
        let request = SelectionRequest::named(&self.name, ports);

        app.selector().with_store(&app.store).select(&request)
    }
}
