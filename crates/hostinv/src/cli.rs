//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "hostinv", version)]
#[command(about = "Manage a host inventory stored in etcd", long_about = None)]
pub struct Cli {
    /// Config file (default: $HOSTINV_CONFIG, ./hostinv.toml, /etc/hostinv/hostinv.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// etcd host, replacing the host of the configured endpoint
    #[arg(long, global = true)]
    pub etcd_host: Option<String>,

    /// etcd port, replacing the port of the configured endpoint
    #[arg(long, global = true)]
    pub etcd_port: Option<u16>,

    /// etcd gateway URL (overrides --etcd-host/--etcd-port)
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Key prefix holding the hosts
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Store request timeout
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Output format: table, json, xml, csv, rfc4180-csv, typed-csv, block, script
    #[arg(short, long, global = true, value_name = "FORMAT")]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Add a host from a JSON object, an XML fragment or key=value pairs
    Create {
        host: String,
        /// Host data; several key=value arguments are joined
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        data: Vec<String>,
    },

    /// Set one attribute of a host
    #[command(visible_alias = "modify")]
    Update {
        host: String,
        field: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Store the value as a string instead of inferring its type
        #[arg(long)]
        string: bool,
    },

    /// Remove one attribute from a host
    Unset { host: String, field: String },

    /// Delete a host
    Remove { host: String },

    /// Show one host
    Show {
        host: String,
        /// Comma-separated attributes to show, in order
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },

    /// List hosts, optionally filtered
    List {
        /// Filter expression, e.g. "processor=='intel' && cores>=4"
        #[arg(short, long)]
        filter: Option<String>,
        /// Comma-separated attributes to show, in order
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },
}

impl Cli {
    /// Settings that override the config file
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            etcd_host: self.etcd_host.clone(),
            etcd_port: self.etcd_port,
            endpoint: self.endpoint.clone(),
            prefix: self.prefix.clone(),
            timeout_secs: self.timeout,
            output: self.output.clone(),
        }
    }
}
