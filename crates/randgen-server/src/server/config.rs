use anyhow::bail;
use clap::Parser;
use randgen_core::types::MAX_COUNT_THREADS;
use std::path::PathBuf;

/// Runtime configuration for the `randgen-server` binary.
///
/// These settings bound the size of a single generation, control how
/// streamed results are framed, and tune buffering between the generator
/// tasks and the client socket. All values are parsed from CLI arguments or
/// environment variables.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "randgen-server",
    version,
    about = "An HTTP/WebSocket service for generating unique random numbers"
)]
pub struct CliArgs {
    /// Maximum `countNumbers` accepted per request.
    ///
    /// Every generated number is tracked until the request completes, so this
    /// bounds the per-request memory.
    ///
    /// Environment variable: `MAX_COUNT_NUMBERS`
    #[arg(long, env = "MAX_COUNT_NUMBERS", default_value_t = 1_000_000)]
    pub max_count_numbers: u32,

    /// Maximum `countThreads` accepted per request. Cannot exceed 32.
    ///
    /// Environment variable: `MAX_COUNT_THREADS`
    #[arg(long, env = "MAX_COUNT_THREADS", default_value_t = MAX_COUNT_THREADS)]
    pub max_count_threads: u32,

    /// Number of values packed into each text frame of a streamed result.
    ///
    /// Environment variable: `NUMBERS_PER_MESSAGE`
    #[arg(long, env = "NUMBERS_PER_MESSAGE", default_value_t = 1024)]
    pub numbers_per_message: usize,

    /// Capacity of the channel between the unique filter and the socket.
    ///
    /// Lower values increase backpressure responsiveness; higher values let
    /// generation run further ahead of a slow client.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 64)]
    pub stream_buffer_size: usize,

    /// Seconds to wait for in-flight generations to finish on shutdown
    /// before they are cancelled.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Directory holding `index.html` and the files served under `/static`.
    ///
    /// Environment variable: `PUBLIC_DIR`
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_count_numbers: u32,
    pub max_count_threads: u32,
    pub numbers_per_message: usize,
    pub stream_buffer_size: usize,
    pub shutdown_timeout: u64,
    pub server_addr: String,
    pub public_dir: PathBuf,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_count_numbers == 0 {
            bail!("MAX_COUNT_NUMBERS must be greater than 0");
        }

        if args.max_count_numbers > i32::MAX as u32 {
            bail!(
                "MAX_COUNT_NUMBERS ({}) exceeds the largest supported value ({})",
                args.max_count_numbers,
                i32::MAX
            );
        }

        if args.max_count_threads == 0 {
            bail!("MAX_COUNT_THREADS must be greater than 0");
        }

        if args.max_count_threads > MAX_COUNT_THREADS {
            bail!(
                "MAX_COUNT_THREADS ({}) exceeds the supported maximum ({})",
                args.max_count_threads,
                MAX_COUNT_THREADS
            );
        }

        if args.numbers_per_message == 0 {
            bail!("NUMBERS_PER_MESSAGE must be greater than 0");
        }

        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            max_count_numbers: args.max_count_numbers,
            max_count_threads: args.max_count_threads,
            numbers_per_message: args.numbers_per_message,
            stream_buffer_size: args.stream_buffer_size,
            shutdown_timeout: args.shutdown_timeout,
            server_addr: args.server_addr,
            public_dir: args.public_dir,
        })
    }
}

#[cfg(test)]
impl ServerConfig {
    /// Small limits suitable for unit tests.
    pub fn for_tests() -> Self {
        Self {
            max_count_numbers: 10_000,
            max_count_threads: MAX_COUNT_THREADS,
            numbers_per_message: 4,
            stream_buffer_size: 8,
            shutdown_timeout: 1,
            server_addr: String::from("127.0.0.1:0"),
            public_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/public")),
        }
    }
}
