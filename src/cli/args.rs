use std::{net::IpAddr, path::PathBuf};

use clap::{Parser, Subcommand};

use crate::cidr::NetworkAddress;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Client identification for network file servers: CIDR checks and cached reverse DNS"
)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Number of address cache partitions (prime, 1-51)
    #[arg(long = "index-size", value_name = "N", global = true)]
    pub index_size: Option<usize>,

    /// Seconds before a cached hostname expires (1-86400)
    #[arg(long = "expiration-time", value_name = "SECS", global = true)]
    pub expiration_time: Option<u64>,

    /// Additional client network allowed to use the export (CIDR or address)
    #[arg(long = "allow-client", value_delimiter = ',', global = true)]
    pub allow_client: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check whether LITTLE lies entirely inside BIG
    Contains {
        big: NetworkAddress,
        little: NetworkAddress,
    },

    /// Check whether two blocks are exactly the same network
    Equals {
        one: NetworkAddress,
        two: NetworkAddress,
    },

    /// Check addresses against the configured export clients
    Authorize {
        #[arg(required = true)]
        addrs: Vec<IpAddr>,
    },

    /// Print the hostname of each address, going through the address cache
    Resolve {
        #[arg(required = true)]
        addrs: Vec<IpAddr>,
    },
}
