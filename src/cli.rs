// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Global flags (token, API URL) live in `GitHubArgs` and are flattened into
// the top-level struct with `global = true`, so they can appear before or
// after the subcommand. Both can also come from the environment.
// =============================================================================

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use markview::cache::{CacheConfig, DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES};
use markview::config::{Config, DEFAULT_BIND};
use markview::github::{ClientConfig, DEFAULT_API_URL};

#[derive(Parser, Debug)]
#[command(
    name = "markview",
    version,
    about = "Browse the Markdown documentation of a GitHub repository",
    long_about = "markview lists, outlines and renders the Markdown files of a GitHub repository. \
                  Run `markview serve` to expose the same data as a JSON API."
)]
pub struct Cli {
    #[command(flatten)]
    pub github: GitHubArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GitHubArgs {
    /// GitHub token; raises the rate limit and unlocks private repositories
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl GitHubArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            token: self.token.clone().filter(|t| !t.trim().is_empty()),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// Config for one-shot commands: default cache, no server
    pub fn config(&self) -> Config {
        Config {
            client: self.client_config(),
            ..Config::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the JSON HTTP API
    ///
    /// Example: markview serve --bind 0.0.0.0:3000
    Serve(ServeArgs),

    /// List the Markdown files of a repository, grouped by directory
    ///
    /// Example: markview files rust-lang/book --include '^src/'
    Files {
        /// owner/repo or a GitHub URL (https://github.com/owner/repo/tree/<ref>)
        repo: String,

        /// Branch, tag or commit (defaults to the repository's default branch)
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Keep only paths matching this regular expression
        #[arg(long)]
        include: Option<String>,

        /// Drop paths matching this regular expression
        #[arg(long)]
        exclude: Option<String>,

        /// Apply a built-in filter (documentation, noTests, readmes, rootOnly)
        #[arg(long, conflicts_with_all = ["include", "exclude"])]
        preset: Option<String>,

        /// Match patterns case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Output JSON instead of a grouped listing
        #[arg(long)]
        json: bool,
    },

    /// Print the table of contents of one file
    ///
    /// Example: markview toc rust-lang/book src/ch01-00-getting-started.md
    Toc {
        repo: String,

        /// Path of the Markdown file inside the repository
        path: String,

        #[arg(long = "ref")]
        git_ref: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Render one file to HTML (heading ids and absolute image URLs)
    Render {
        repo: String,

        path: String,

        #[arg(long = "ref")]
        git_ref: Option<String>,
    },

    /// Print the table of contents of every Markdown file
    Outline {
        repo: String,

        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// How many files to fetch at once
        #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..=64))]
        concurrency: u16,
    },

    /// Show the current GitHub API quota
    RateLimit {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "MARKVIEW_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Most entries the response cache holds
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    pub cache_max_entries: usize,

    /// Most bytes (serialized) the response cache holds
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    pub cache_max_bytes: usize,

    /// Seconds an unused cache entry survives
    #[arg(long, default_value_t = 600)]
    pub cache_ttl_secs: u64,

    /// Seconds the rate-limit snapshot is reused
    #[arg(long, default_value_t = 60)]
    pub rate_limit_ttl_secs: u64,
}

impl ServeArgs {
    pub fn config(&self, github: &GitHubArgs) -> Config {
        Config {
            client: github.client_config(),
            cache: CacheConfig {
                max_entries: self.cache_max_entries,
                max_bytes: self.cache_max_bytes,
                ttl: Duration::from_secs(self.cache_ttl_secs),
            },
            rate_limit_ttl: Duration::from_secs(self.rate_limit_ttl_secs),
            bind: self.bind.clone(),
        }
    }
}
