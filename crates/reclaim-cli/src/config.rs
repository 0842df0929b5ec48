//! Command-line configuration.
//!
//! Every database URL can come from a flag or from the environment; `.env`
//! is loaded before parsing, so either works there too.

use clap::Parser;
use reclaim::{Mode, Result, ScopeOptions, UserId};

/// Restore one user's records lost between an archival and a live Postgres
/// database into an empty merge database.
///
/// Runs as a dry run unless `--real` is given.
#[derive(Parser, Debug)]
#[command(name = "reclaim", version)]
pub struct Cli {
    /// User whose records are compared and restored
    #[arg(long, allow_hyphen_values = true)]
    pub user_id: i64,

    /// Older snapshot, presumed complete
    #[arg(long, env = "RECLAIM_ARCHIVAL_URL")]
    pub archival_url: String,

    /// Current database, possibly missing records
    #[arg(long, env = "RECLAIM_LIVE_URL")]
    pub live_url: String,

    /// Empty database receiving restored records
    #[arg(long, env = "RECLAIM_MERGE_URL")]
    pub merge_url: String,

    /// Schema searched for user-scoped tables
    #[arg(long, default_value = "public")]
    pub schema: String,

    /// Column linking a row to its user
    #[arg(long, default_value = "user_id")]
    pub scope_column: String,

    /// Primary-key column shared by every table
    #[arg(long, default_value = "id")]
    pub id_column: String,

    /// Table holding the user record itself
    #[arg(long, default_value = "users")]
    pub parent_table: String,

    /// Copy missing records into the merge database
    #[arg(long)]
    pub real: bool,
}

impl Cli {
    pub fn user(&self) -> Result<UserId> {
        UserId::new(self.user_id)
    }

    pub fn mode(&self) -> Mode {
        if self.real { Mode::Real } else { Mode::DryRun }
    }

    pub fn scope_options(&self) -> ScopeOptions {
        ScopeOptions {
            schema: self.schema.clone(),
            scope_column: self.scope_column.clone(),
            id_column: self.id_column.clone(),
            parent_table: self.parent_table.clone(),
        }
    }
}

/// Mask the password in a database URL for display.
pub fn mask_password(url: &str) -> String {
    if let Some(start) = url.find("://") {
        if let Some(at) = url.rfind('@').filter(|&at| at > start) {
            let prefix = &url[..start + 3];
            let suffix = &url[at..];
            if let Some(colon) = url[start + 3..at].find(':') {
                let user = &url[start + 3..start + 3 + colon];
                return format!("{}{}:***{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
