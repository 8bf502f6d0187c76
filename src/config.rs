use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::ensure;
use clap::Args;

use crate::core::{DEFAULT_MONTE_CARLO_TRIALS, MAX_MONTE_CARLO_TRIALS, MAX_SERIES_MONTHS};

const DEFAULT_MAX_MONTHS: i32 = 1_200;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), help = "Address to bind")]
    pub host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTE_CARLO_TRIALS,
        help = "Monte Carlo trials used when a request does not specify any"
    )]
    pub default_trials: i32,
    #[arg(
        long,
        default_value_t = 100_000,
        help = "Largest Monte Carlo trial count a request may ask for"
    )]
    pub max_trials: i32,
    #[arg(
        long,
        default_value_t = 50,
        help = "Largest number of variant values accepted by a what-if sweep"
    )]
    pub max_sweep_variants: usize,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_MONTHS,
        help = "Longest horizon, in months, accepted for projections, loans and simulations"
    )]
    pub max_months: i32,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            default_trials: DEFAULT_MONTE_CARLO_TRIALS,
            max_trials: 100_000,
            max_sweep_variants: 50,
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub default_trials: i32,
    pub max_trials: i32,
    pub max_sweep_variants: usize,
    pub max_months: i32,
}

impl ServerConfig {
    pub fn from_args(args: ServeArgs) -> anyhow::Result<Self> {
        ensure!(args.default_trials > 0, "--default-trials must be > 0");
        ensure!(
            args.max_trials > 0 && args.max_trials <= MAX_MONTE_CARLO_TRIALS,
            "--max-trials must be between 1 and {MAX_MONTE_CARLO_TRIALS}"
        );
        ensure!(
            args.default_trials <= args.max_trials,
            "--default-trials cannot exceed --max-trials"
        );
        ensure!(args.max_sweep_variants > 0, "--max-sweep-variants must be > 0");
        ensure!(
            args.max_months > 0 && args.max_months <= MAX_SERIES_MONTHS,
            "--max-months must be between 1 and {MAX_SERIES_MONTHS}"
        );

        Ok(Self {
            addr: SocketAddr::new(args.host, args.port),
            default_trials: args.default_trials,
            max_trials: args.max_trials,
            max_sweep_variants: args.max_sweep_variants,
            max_months: args.max_months,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            default_trials: DEFAULT_MONTE_CARLO_TRIALS,
            max_trials: 100_000,
            max_sweep_variants: 50,
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_args_builds_socket_address() {
        let args = ServeArgs {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 9090,
            ..ServeArgs::default()
        };
        let config = ServerConfig::from_args(args).expect("valid config");
        assert_eq!(config.addr.to_string(), "127.0.0.1:9090");
        assert_eq!(config.default_trials, 1000);
    }

    #[test]
    fn from_args_rejects_default_trials_above_max() {
        let args = ServeArgs {
            default_trials: 500,
            max_trials: 100,
            ..ServeArgs::default()
        };
        let err = ServerConfig::from_args(args).expect_err("must reject");
        assert!(err.to_string().contains("--default-trials"));
    }

    #[test]
    fn from_args_rejects_zero_sweep_limit() {
        let args = ServeArgs {
            max_sweep_variants: 0,
            ..ServeArgs::default()
        };
        let err = ServerConfig::from_args(args).expect_err("must reject");
        assert!(err.to_string().contains("--max-sweep-variants"));
    }

    #[test]
    fn from_args_bounds_max_months() {
        let config = ServerConfig::from_args(ServeArgs::default()).expect("valid config");
        assert_eq!(config.max_months, 1_200);

        for max_months in [0, i32::MAX] {
            let args = ServeArgs {
                max_months,
                ..ServeArgs::default()
            };
            let err = ServerConfig::from_args(args).expect_err("must reject");
            assert!(err.to_string().contains("--max-months"));
        }
    }

    #[test]
    fn from_args_rejects_max_trials_above_engine_limit() {
        let args = ServeArgs {
            max_trials: i32::MAX,
            ..ServeArgs::default()
        };
        let err = ServerConfig::from_args(args).expect_err("must reject");
        assert!(err.to_string().contains("--max-trials"));
    }
}
