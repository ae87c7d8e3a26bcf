//! Command line flags. Short flags follow the original demultiplexer tool,
//! so `-h` is the listen host and help is only available as `--help`.

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{
    FailurePolicy, HostPort, RelayConfig, DEFAULT_DTLS_HOST, DEFAULT_DTLS_PORT,
    DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT, DEFAULT_REMOTE_HOST, DEFAULT_REMOTE_PORT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Exit with a non-zero status.
    Terminate,
    /// Drop the current client and wait for the next one.
    AwaitClient,
}

impl From<OnError> for FailurePolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Terminate => FailurePolicy::Terminate,
            OnError::AwaitClient => FailurePolicy::AwaitNewClient,
        }
    }
}

/// UDP demultiplexer: relays a client to a media server and diverts the
/// server's DTLS handshake packets to a separate DTLS server.
#[derive(Debug, Parser)]
#[command(name = "udpdemux", version, disable_help_flag = true)]
pub struct Cli {
    /// Remote server address
    #[arg(short = 'H', long, env = "UDPDEMUX_REMOTE_HOST", default_value = DEFAULT_REMOTE_HOST)]
    pub remote_host: String,

    /// Remote server port
    #[arg(short = 'P', long, env = "UDPDEMUX_REMOTE_PORT", default_value_t = DEFAULT_REMOTE_PORT)]
    pub remote_port: u16,

    /// Address to bind to
    #[arg(short = 'h', long, env = "UDPDEMUX_LISTEN_HOST", default_value = DEFAULT_LISTEN_HOST)]
    pub listen_host: String,

    /// Local proxy port
    #[arg(short = 'p', long, env = "UDPDEMUX_LISTEN_PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,

    /// DTLS server address
    #[arg(short = 'D', long, env = "UDPDEMUX_DTLS_HOST", default_value = DEFAULT_DTLS_HOST)]
    pub dtls_host: String,

    /// DTLS server port
    #[arg(short = 'd', long, env = "UDPDEMUX_DTLS_PORT", default_value_t = DEFAULT_DTLS_PORT)]
    pub dtls_port: u16,

    /// What to do when relaying fails at runtime
    #[arg(long, env = "UDPDEMUX_ON_ERROR", value_enum, default_value_t = OnError::Terminate)]
    pub on_error: OnError,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl Cli {
    #[must_use]
    pub fn into_config(self) -> RelayConfig {
        RelayConfig {
            remote: HostPort::new(self.remote_host, self.remote_port),
            listen: HostPort::new(self.listen_host, self.listen_port),
            dtls: HostPort::new(self.dtls_host, self.dtls_port),
            failure_policy: self.on_error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_flags_match_original_tool() {
        let cli = Cli::try_parse_from([
            "udpdemux", "-H", "media.local", "-P", "5000", "-h", "0.0.0.0", "-p", "7000", "-D",
            "dtls.local", "-d", "9443",
        ])
        .expect("flags should parse");

        let config = cli.into_config();
        assert_eq!(config.remote, HostPort::new("media.local", 5000));
        assert_eq!(config.listen, HostPort::new("0.0.0.0", 7000));
        assert_eq!(config.dtls, HostPort::new("dtls.local", 9443));
        assert_eq!(config.failure_policy, FailurePolicy::Terminate);
    }

    #[test]
    fn on_error_selects_policy() {
        let cli = Cli::try_parse_from(["udpdemux", "--on-error", "await-client"]).unwrap();
        assert_eq!(cli.into_config().failure_policy, FailurePolicy::AwaitNewClient);
    }

    #[test]
    fn rejects_out_of_range_port() {
        assert!(Cli::try_parse_from(["udpdemux", "-p", "70000"]).is_err());
    }
}
