use anyhow::Result;
use gossipbench_harness::config::Config;
use gossipbench_harness::modes;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables, CLI arguments and the config file
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("gossipbench={}", config.log_level).parse()?),
        )
        .init();

    let Some(mode) = config.mode else {
        return Ok(());
    };

    // Ctrl-C stops dispatch runs; they still print their summary
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping");
            interrupt.cancel();
        }
    });

    tracing::info!("Running {} mode", mode.name());

    if let Err(e) = modes::run(&config, mode, cancel).await {
        let stage = e.stage();
        tracing::error!("{} stage failed: {}", stage, e);
        return Err(anyhow::Error::new(e)
            .context(format!("gossipbench --{} failed in the {} stage", mode.name(), stage)));
    }

    Ok(())
}
