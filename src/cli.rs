// src/cli.rs
use clap::Parser;

/// subsentry: Certificate Transparency subdomain monitor
///
/// Polls crt.sh for each configured parent domain, diffs the results against
/// a persisted baseline of known subdomains, and e-mails a report whenever
/// new names appear.
#[derive(Parser, Debug, Clone)]
#[command(name = "subsentry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to TOML config file
    #[arg(short = 'c', long = "config", default_value = "config.toml")]
    pub config: String,

    /// Path to the known-subdomains baseline file
    #[arg(short = 'b', long = "baseline", default_value = "known_subdomains.json")]
    pub baseline: String,

    /// Run a single discovery cycle and exit instead of looping
    #[arg(long = "once")]
    pub once: bool,

    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot use --verbose and --quiet together");
        }
        Ok(())
    }

    /// Effective log level, with CLI flags taking precedence.
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
