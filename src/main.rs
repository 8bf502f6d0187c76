use clap::Parser;
use wealthcalc::cli::{Cli, Command, run_calculator};
use wealthcalc::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => {
            let config = ServerConfig::from_args(args)?;
            wealthcalc::api::run_http_server(config).await?;
        }
        command => println!("{}", run_calculator(command)?),
    }
    Ok(())
}
