use clap::Args;

use crate::cli::App;
use crate::error::Result;
use crate::networking::{CandidatePool, PoolOptions, PortRange};

/// Show the pool of good port ranges
#[derive(Args, Debug)]
pub struct PoolCommand {
    /// Print only the number of good ports
    #[arg(long)]
    pub count: bool,

    /// Keep short ranges and range borders
    #[arg(long)]
    pub exact: bool,
}

impl PoolCommand {
    /// Run the command
    pub fn execute(&self, app: &App) -> Result<()> {
        let ranges = self.ranges(app);
        if self.count {
            println!("{}", ranges.iter().map(PortRange::len).sum::<u32>());
        } else {
            for range in &ranges {
                println!("{:<12} {}", range.to_string(), range.len());
            }
        }
        Ok(())
    }

    /// Good ranges, best first
    pub fn ranges(&self, app: &App) -> Vec<PortRange> {
        let options = if self.exact {
            PoolOptions::exact()
        } else {
            app.settings.pool_options()
        };
        CandidatePool::new(&app.context, options).good_ranges(&app.blacklist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::tests::create_test_app;
    use tempfile::TempDir;

    #[test]
    fn test_pool_ranges_avoid_excluded_ports() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let ranges = PoolCommand { count: false, exact: false }.ranges(&app);

        assert!(!ranges.is_empty());
        for range in &ranges {
            assert!(range.start >= 1024);
            assert!(!range.ports().any(|port| app.context.is_excluded(port)));
        }
    }

    #[test]
    fn test_pool_ranges_are_ranked() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let ranges = PoolCommand { count: true, exact: false }.ranges(&app);

        assert_eq!(ranges, PoolCommand { count: true, exact: false }.ranges(&app));
        assert!(PoolCommand { count: true, exact: false }.execute(&app).is_ok());
    }

    #[test]
    fn test_exact_pool_covers_trimmed_pool() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let trimmed = PoolCommand { count: false, exact: false }.ranges(&app);
        let exact = PoolCommand { count: false, exact: true }.ranges(&app);

        fn size(ranges: &[PortRange]) -> u32 {
            ranges.iter().map(PortRange::len).sum()
        }
        assert!(size(&exact) > size(&trimmed));
        for range in &trimmed {
            assert!(exact.iter().any(|r| r.contains(range.start) && r.contains(range.end)));
        }
    }
}
