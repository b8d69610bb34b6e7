use clap::Args;
use log::warn;

use crate::cli::App;
use crate::error::Result;
use crate::store::AssociationStore;

/// Remove the port bound to a name
#[derive(Args, Debug)]
pub struct UnbindCommand {
    /// Name to unbind
    pub name: String,
}

impl UnbindCommand {
    /// Run the command
    pub fn execute(&self, app: &App) -> Result<()> {
        if self.unbind(app)? {
            println!("{} unbound", self.name);
        } else {
            warn!(
                "No port is bound to {} in {}",
                self.name,
                app.store.path().display()
            );
        }
        Ok(())
    }

    /// Remove the binding. Returns whether there was one
    pub fn unbind(&self, app: &App) -> Result<bool> {
        app.store.unbind(&self.name)
    }
}
