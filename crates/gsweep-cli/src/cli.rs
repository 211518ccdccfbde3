use clap::{Args, Parser, Subcommand};
use gsweep::google::ShareRole;

#[derive(Parser, Debug)]
#[command(name = "gsweep", version, about = "Search, share and clean up Google Drive and Gmail")]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// OAuth access token (defaults to $GSWEEP_ACCESS_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Google Drive
    #[command(subcommand)]
    Files(FilesCommand),

    /// Gmail
    #[command(subcommand)]
    Mail(MailCommand),

    /// Sign in with Google
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Run input through the sanitizers without calling Google
    #[command(subcommand)]
    Check(CheckCommand),
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// Find files by name
    Search { query: String },

    /// Share a file with someone
    Share {
        file_id: String,
        email: String,
        #[arg(long, default_value = "reader", value_parser = parse_role)]
        role: ShareRole,
    },

    /// Move files to the trash
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Delete permanently instead of trashing
        #[arg(long)]
        permanent: bool,
    },

    /// Create a folder in My Drive
    Mkdir { name: String },

    /// Sort loose files in My Drive into Documents, Spreadsheets, Images and Videos
    Organize,

    /// Trash files not modified in the given number of days
    Clean(CleanArgs),
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Age in days (1-3650)
    #[arg(long, default_value = "365")]
    pub days: String,
}

#[derive(Subcommand, Debug)]
pub enum MailCommand {
    /// Search messages with Gmail search syntax
    Search { query: String },

    /// Apply a label to messages, creating it if needed
    Label {
        label: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Move messages to the trash
    Trash {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Permanently delete everything in Spam
    PurgeSpam,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Print the authorization URL to inspect scopes and redirect. Nothing
    /// listens for the redirect, so use `login` to actually sign in.
    Url,

    /// Run the browser sign-in and print the access token
    Login,
}

#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate an email address
    Email { address: String },

    /// Is this an https Google URL?
    Url { url: String },

    /// Sanitize a file name
    Filename { name: String },

    /// Sanitize search text for Drive (default) or Gmail
    Query {
        text: String,
        #[arg(long)]
        gmail: bool,
    },
}

fn parse_role(s: &str) -> Result<ShareRole, String> {
    s.parse()
}
