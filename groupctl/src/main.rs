use anyhow::Context;
use args::Args;
use clap::Parser;
use config::Config;
use groups::GroupsClient;
use serde_json::Value;
use tokio::sync::oneshot;
use transport::HttpDispatcher;

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args.log);

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    let dispatcher = HttpDispatcher::new(&config.transport)?;
    let client = GroupsClient::new(config.client.token.clone(), dispatcher);

    let request = args.command.into_request(&client);

    if args.dry_run {
        let mut request = request.build()?;
        request.data.insert("$token".to_string(), Value::String("[REDACTED]".to_string()));

        println!("{}", serde_json::to_string_pretty(&request)?);

        return Ok(());
    }

    let (sender, receiver) = oneshot::channel();

    let request = request
        .callback(move |result| {
            let _ = sender.send(result);
        })
        .send()?;

    receiver
        .await
        .context("Dispatcher dropped the request without reporting an outcome")?
        .context("Group update was not accepted")?;

    log::info!(
        "Group update {} accepted",
        request.operation_key().unwrap_or_default()
    );

    Ok(())
}
