mod cli;

use log::{debug, warn};
use pantry_client::{CancellationToken, PantryClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("pantry {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = cli::config_from(&matches)?;
    debug!(
        "api_url={} throttled={} decode={:?}",
        cfg.api_url,
        cfg.rate_limit.is_some(),
        cfg.decode_mode
    );
    let client = PantryClient::new(cfg)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling request");
            on_ctrl_c.cancel();
        }
    });

    let out = cli::run(&client, &matches, &cancel).await?;
    println!("{}", out);
    Ok(())
}
