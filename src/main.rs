// billmail - manual dispatch tool
//
// Reads one JSON dispatch request from a file argument (or stdin when no
// argument is given), sends it through the notification pipeline and
// prints the outcome. Host applications embed the library directly; this
// binary exists for operational test sends.

use billmail::app::{App, AppConfig};
use billmail::services::dispatcher::DispatchRequest;
use std::io::Read;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billmail=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting billmail manual dispatch");

    let config = AppConfig::from_env();
    let app = App::build(&config).await?;

    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let request: DispatchRequest = serde_json::from_str(&input)?;
    let outcome = app.dispatcher.dispatch(request).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
