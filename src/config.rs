//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Name of the counter document inside the data directory.
pub const VIEWS_FILE: &str = "views.json";
/// Name of the honour wall document inside the data directory.
pub const HONOUR_FILE: &str = "honour.json";
/// Name of the goodbyes document inside the data directory.
pub const GOODBYES_FILE: &str = "goodbyes.json";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about = "Serves the thank-you site")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "SITE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "SITE_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding views.json, honour.json and goodbyes.json.
    #[arg(long, env = "SITE_DATA_DIR", default_value = "Data")]
    pub data_dir: PathBuf,

    /// Directory of Markdown diary entries.
    #[arg(long, env = "SITE_DIARY_DIR", default_value = "diaries")]
    pub diary_dir: PathBuf,

    /// Activity log file.
    #[arg(long, env = "SITE_LOG_FILE", default_value = "activity.log")]
    pub log_file: PathBuf,

    /// Rotate the activity log once it reaches this many bytes (0 disables rotation).
    #[arg(long, env = "SITE_LOG_MAX_BYTES", default_value_t = 1_000_000)]
    pub log_max_bytes: u64,

    /// Number of rotated activity logs to keep.
    #[arg(long, env = "SITE_LOG_BACKUPS", default_value_t = 3)]
    pub log_backups: usize,

    /// Only write the activity log file, not the console.
    #[arg(long, env = "SITE_NO_CONSOLE_LOG")]
    pub no_console_log: bool,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn views_path(&self) -> PathBuf {
        self.data_dir.join(VIEWS_FILE)
    }

    pub fn honour_path(&self) -> PathBuf {
        self.data_dir.join(HONOUR_FILE)
    }

    pub fn goodbyes_path(&self) -> PathBuf {
        self.data_dir.join(GOODBYES_FILE)
    }
}
