use clap::Args;

use crate::cli::App;
use crate::error::Result;
use crate::selection::{PortRequest, SelectionRequest};

/// Pick a free port without remembering it
#[derive(Args, Debug)]
pub struct SelectCommand {
    /// Ports to choose from (8000, 4001,4002, 2000-3000, any or -1)
    #[arg(default_value = "any", allow_hyphen_values = true)]
    pub ports: String,
}

impl SelectCommand {
    /// Run the command
    pub fn execute(&self, app: &App) -> Result<()> {
        if let Some(port) = self.select(app)? {
            println!("{}", port);
        }
        Ok(())
    }

    pub fn select(&self, app: &App) -> Result<Option<u16>> {
        let ports: PortRequest = self.ports.parse()?;
        // Ports already bound to names are avoided when the store is readable
        let selector = app.selector().with_store(&app.store);
        selector.select(&SelectionRequest::new(ports))
    }
}
