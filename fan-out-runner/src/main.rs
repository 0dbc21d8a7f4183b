use fan_out_core::FanOut;
use runner_config::RunnerConfig;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod report;
mod runner_config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  let subscriber = FmtSubscriber::builder()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .finish();

  tracing::subscriber::set_global_default(subscriber)?;

  let config = RunnerConfig::from_env()?;

  info!("Starting fan-out with config: {:?}", config);

  let durations = config.durations()?;
  let fan_out = FanOut::new(config.run, durations)?;

  let interrupt = async {
    match signal::ctrl_c().await {
      Ok(()) => info!("Received Ctrl-C, expiring the deadline"),
      Err(error) => {
        error!("Failed to listen for Ctrl-C: {}", error);
        std::future::pending::<()>().await;
      }
    }
  };

  let result = fan_out.run_until(interrupt).await;

  println!("{}", report::render(&result));

  Ok(())
}
