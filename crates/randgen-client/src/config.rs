use anyhow::bail;
use clap::Parser;
use randgen_client::transport::{Endpoints, TransportKind};
use randgen_core::validate::FormData;

/// Command-line front-end for the randgen service.
///
/// Submissions are read from stdin, one `<countNumbers> <countThreads>` pair
/// per line, unless both counts are given as flags.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "randgen-client",
    version,
    about = "Requests unique random numbers from a randgen service"
)]
pub struct CliArgs {
    /// How to talk to the service.
    ///
    /// Environment variable: `RANDGEN_TRANSPORT`
    #[arg(long, env = "RANDGEN_TRANSPORT", value_enum, default_value_t = TransportKind::JsonSocket)]
    pub transport: TransportKind,

    /// Base URL of the service.
    ///
    /// Environment variable: `RANDGEN_BASE_URL`
    #[arg(long, env = "RANDGEN_BASE_URL", default_value = "http://127.0.0.1:8080")]
    pub base_url: String,

    /// Count of numbers for a single submission. Requires `--count-threads`.
    ///
    /// Kept as text: it goes through the same validation as typed input.
    #[arg(long)]
    pub count_numbers: Option<String>,

    /// Count of threads for a single submission. Requires `--count-numbers`.
    #[arg(long)]
    pub count_threads: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub transport: TransportKind,
    pub endpoints: Endpoints,
    /// The one submission given on the command line, if any.
    pub submission: Option<FormData>,
}

impl TryFrom<CliArgs> for ClientConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let submission = match (args.count_numbers, args.count_threads) {
            (Some(numbers), Some(threads)) => Some(FormData::generator(numbers, threads)),
            (None, None) => None,
            _ => bail!("--count-numbers and --count-threads must be given together"),
        };

        Ok(Self {
            transport: args.transport,
            endpoints: Endpoints::new(&args.base_url)?,
            submission,
        })
    }
}

/// Turns one stdin line into a submission. Blank lines are skipped.
///
/// A missing second field is submitted as empty so validation reports it.
pub fn form_from_line(line: &str) -> Option<FormData> {
    let mut fields = line.split_whitespace();
    let count_numbers = fields.next()?;
    let count_threads = fields.next().unwrap_or_default();
    Some(FormData::generator(count_numbers, count_threads))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ClientConfig> {
        let mut argv = vec!["randgen-client"];
        argv.extend_from_slice(args);
        ClientConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults_use_the_json_socket_on_localhost() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.transport, TransportKind::JsonSocket);
        assert_eq!(config.endpoints.generator_url(), "ws://127.0.0.1:8080/generator");
        assert!(config.submission.is_none());
    }

    #[test]
    fn transport_names_are_kebab_case() {
        let config = parse(&["--transport", "stream-socket"]).unwrap();
        assert_eq!(config.transport, TransportKind::StreamSocket);
        assert!(parse(&["--transport", "carrier-pigeon"]).is_err());
    }

    #[test]
    fn counts_must_come_in_pairs() {
        let config = parse(&["--count-numbers", "5", "--count-threads", "2"]).unwrap();
        assert_eq!(config.submission, Some(FormData::generator("5", "2")));

        let err = parse(&["--count-numbers", "5"]).unwrap_err();
        assert!(err.to_string().contains("together"));
    }

    #[test]
    fn rejects_tls_base_url() {
        assert!(parse(&["--base-url", "https://example.com"]).is_err());
    }

    #[test]
    fn lines_become_forms() {
        assert_eq!(form_from_line("  10 3 \n"), Some(FormData::generator("10", "3")));
        assert_eq!(form_from_line("10"), Some(FormData::generator("10", "")));
        assert_eq!(form_from_line("   "), None);
    }
}
