use anyhow::Result;
use clap::Parser;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod args;
mod block;
mod error;
mod event;
mod message;
mod notion;
mod poller;
mod record;
mod router;
mod server;
mod signature;
mod slack;
#[cfg(test)]
mod testing;

use args::Args;
use notion::NotionClient;
use poller::Poller;
use router::Router;
use slack::SlackClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let notion = Arc::new(NotionClient::new(
        &SecretString::from(args.notion_api_key),
        args.notion_database_id,
        args.notion_api_base,
    )?);
    let slack = Arc::new(SlackClient::new(
        &SecretString::from(args.slack_token),
        args.slack_api_base,
    )?);

    let poller = Poller::new(
        notion.clone(),
        slack.clone(),
        args.slack_channel_id.clone(),
        poller::database_url(&args.notion_workspace, notion.database_id()),
    );

    if args.poll_once {
        poller.run_once().await;
        return Ok(());
    }

    let schedule = poller::parse_schedule(&args.poll_schedule)?;
    info!(schedule = %args.poll_schedule, "scheduling new-opinions digest");
    tokio::spawn(poller.run(schedule));

    let state = Arc::new(server::State {
        router: Router::new(notion, slack, args.slack_channel_id),
        signing_secret: SecretString::from(args.slack_signing_secret),
    });

    info!(addr = %args.addr, port = args.port, "listening");
    warp::serve(server::routes(state))
        .run((args.addr, args.port))
        .await;

    Ok(())
}
