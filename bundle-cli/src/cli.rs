use bundle_cache::LoaderConfig;
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::parse_header;

/// Define CLI arguments
#[derive(Parser)]
#[command(
    version,
    about = "Call object bundle cache tool",
    long_about = "Fetches the call object bundle through the on-disk response cache.\n\
                  \n\
                  Fresh bundles are served from the cache, stale ones are revalidated with\n\
                  their ETag / Last-Modified validators, and anything else is downloaded\n\
                  and cached according to the response's cache-control max-age."
)]
pub struct CliArgs {
    /// Directory holding the cache files
    #[arg(
        long,
        env = "CALLOBJ_CACHE_DIR",
        help = "Directory where cached bundles are stored (default: <temp>/callobj-bundle-cache)"
    )]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Overall HTTP request timeout in seconds
    #[arg(long, default_value = "30", help = "Overall timeout for HTTP requests in seconds (0 disables)")]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, default_value = "10", help = "Timeout for establishing a connection in seconds (0 disables)")]
    pub connect_timeout: u64,

    /// Do not follow redirects
    #[arg(long, help = "Return redirect responses instead of following them")]
    pub no_redirects: bool,

    /// Custom User-Agent
    #[arg(long, help = "User-Agent header sent with requests")]
    pub user_agent: Option<String>,

    /// Extra request headers
    #[arg(
        short = 'H',
        long = "header",
        value_parser = parse_header,
        help = "Extra request header in the form \"Name: Value\" (repeatable)"
    )]
    pub headers: Vec<(HeaderName, HeaderValue)>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// HTTP settings for the bundle loader
    pub fn loader_config(&self) -> LoaderConfig {
        let headers: HeaderMap = self.headers.iter().cloned().collect();
        let config = LoaderConfig::default()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
            .with_follow_redirects(!self.no_redirects)
            .with_headers(headers);

        match &self.user_agent {
            Some(user_agent) => config.with_user_agent(user_agent.clone()),
            None => config,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a bundle, using the cache when possible
    Fetch {
        /// Bundle URL
        url: String,

        /// Write the bundle here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the cache state for a bundle URL
    Inspect {
        /// Bundle URL
        url: String,
    },

    /// Remove the cached bundle for a URL
    Purge {
        /// Bundle URL
        url: String,
    },
}
