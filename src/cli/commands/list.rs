use clap::Args;
use prettytable::format::consts::FORMAT_CLEAN;
use prettytable::{row, Table};

use crate::cli::App;
use crate::error::{Error, Result};
use crate::store::{Association, AssociationStore};

/// List names and their ports
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output format (json or text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

impl ListCommand {
    /// Run the command
    pub fn execute(&self, app: &App) -> Result<()> {
        let associations = app.store.list()?;
        print!("{}", self.render(&associations)?);
        Ok(())
    }

    /// Render associations in the requested format
    pub fn render(&self, associations: &[Association]) -> Result<String> {
        match self.format.as_str() {
            "json" => Ok(format!("{}\n", serde_json::to_string_pretty(associations)?)),
            "text" => Ok(Self::render_text(associations)),
            other => Err(Error::InvalidArgument(format!(
                "Invalid format: {}. Valid formats are: text, json",
                other
            ))),
        }
    }

    fn render_text(associations: &[Association]) -> String {
        let mut table = Table::new();
        table.set_format(*FORMAT_CLEAN);
        table.set_titles(row!["NAME", "PORT"]);
        for association in associations {
            table.add_row(row![association.name, association.port]);
        }
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Association> {
        vec![Association::new("foo", 37987), Association::new("aar", 41000)]
    }

    #[test]
    fn test_list_text_output() {
        let cmd = ListCommand {
            format: "text".to_string(),
        };

        let output = cmd.render(&sample()).unwrap();

        assert!(output.contains("NAME"));
        assert!(output.contains("foo"));
        assert!(output.contains("37987"));
        assert!(output.find("foo").unwrap() < output.find("aar").unwrap());
    }

    #[test]
    fn test_list_json_output() {
        let cmd = ListCommand {
            format: "json".to_string(),
        };

        let output = cmd.render(&sample()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed[0]["name"], "foo");
        assert_eq!(parsed[0]["port"], 37987);
        assert_eq!(parsed[1]["name"], "aar");
    }

    #[test]
    fn test_list_unknown_format() {
        let cmd = ListCommand {
            format: "yaml".to_string(),
        };
        assert!(matches!(cmd.render(&sample()), Err(Error::InvalidArgument(_))));
    }
}
