use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default request body limit: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "zipcast")]
#[command(version)]
#[command(about = "Bundle uploaded files into a single ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipcast serve --port 8080              accept uploads on POST /api/zip\n  \
  zipcast pack -o notes.zip a.txt b.txt  archive local files\n  \
  zipcast list -v notes.zip              list archive contents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Archive local files into a ZIP file
    Pack {
        /// Output archive path
        #[arg(short = 'o', long, value_name = "OUT")]
        output: PathBuf,

        /// Files to archive
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,
    },

    /// List the entries of a ZIP file
    List {
        /// ZIP file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// List verbosely
        #[arg(short = 'v')]
        verbose: bool,
    },
}

/// HTTP server settings, from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, env = "ZIPCAST_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short = 'p', long, env = "ZIPCAST_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "ZIPCAST_MAX_UPLOAD_SIZE", default_value_t = DEFAULT_MAX_UPLOAD_SIZE)]
    pub max_upload_size: usize,
}
