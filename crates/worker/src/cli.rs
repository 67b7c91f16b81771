//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// swcache - offline cache manager for the widgets application
///
/// Each invocation delivers one lifecycle event against the on-disk cache.
/// Results are printed as JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "swcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SWCACHE_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Treat the network as unreachable
    #[arg(long, global = true)]
    pub offline: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Precache the static assets into the current generation
    Install,

    /// Activate the installed generation and delete stale ones
    Activate,

    /// Deliver a fetch event and print the response
    Fetch(FetchArgs),

    /// List cache generations
    Caches,

    /// List entries stored in a generation
    Entries(EntriesArgs),

    /// Remove one cached response
    Evict(EvictArgs),

    /// Show worker registrations
    Status,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL or origin-relative path
    pub target: String,

    /// Send as a page navigation
    #[arg(long)]
    pub navigate: bool,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Include the body in the output (UTF-8, lossy)
    #[arg(long)]
    pub body: bool,
}

/// Arguments for the entries command
#[derive(Parser, Debug)]
pub struct EntriesArgs {
    /// Generation to list (default: the configured cache name)
    #[arg(long)]
    pub cache: Option<String>,
}

/// Arguments for the evict command
#[derive(Parser, Debug)]
pub struct EvictArgs {
    /// Absolute URL or origin-relative path of the cached request
    pub target: String,

    /// Generation to evict from (default: the configured cache name)
    #[arg(long)]
    pub cache: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "swcache",
            "--offline",
            "fetch",
            "/widgets",
            "--navigate",
            "-H",
            "Accept-Language: en",
        ])
        .unwrap();

        assert!(cli.offline);
        let Commands::Fetch(args) = cli.command else { panic!("expected fetch") };
        assert_eq!(args.target, "/widgets");
        assert!(args.navigate);
        assert_eq!(args.method, "GET");
        assert_eq!(args.headers, vec!["Accept-Language: en"]);
    }

    #[test]
    fn test_parse_entries_cache() {
        let cli = Cli::try_parse_from(["swcache", "entries", "--cache", "widgets-app-v0"]).unwrap();
        let Commands::Entries(args) = cli.command else { panic!("expected entries") };
        assert_eq!(args.cache.as_deref(), Some("widgets-app-v0"));
    }

    #[test]
    fn test_parse_evict() {
        let cli = Cli::try_parse_from(["swcache", "evict", "/widgets/7"]).unwrap();
        let Commands::Evict(args) = cli.command else { panic!("expected evict") };
        assert_eq!(args.target, "/widgets/7");
        assert!(args.cache.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["swcache", "status", "--config", "swcache.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Status));
        assert_eq!(cli.config, Some(PathBuf::from("swcache.toml")));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
