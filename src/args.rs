use clap::Parser;
use std::net::Ipv4Addr;

#[derive(Parser)]
#[clap(author, version, about)]
pub struct Args {
    #[clap(long, env("ADDR"), default_value = "0.0.0.0")]
    pub addr: Ipv4Addr,

    #[clap(long, env("PORT"), default_value_t = 8080)]
    pub port: u16,

    #[clap(long, env("NOTION_API_KEY"), hide_env_values = true)]
    pub notion_api_key: String,

    #[clap(long, env("NOTION_DATABASE_ID"))]
    pub notion_database_id: String,

    /// Workspace slug used when linking back to the database view.
    #[clap(long, env("NOTION_WORKSPACE"), default_value = "alex-jordan")]
    pub notion_workspace: String,

    #[clap(long, env("NOTION_API_BASE"), default_value = "https://api.notion.com/v1")]
    pub notion_api_base: String,

    #[clap(long, env("SLACK_BOT_OAUTH_TOKEN"), hide_env_values = true)]
    pub slack_token: String,

    #[clap(long, env("SLACK_SIGNING_SECRET"), hide_env_values = true)]
    pub slack_signing_secret: String,

    #[clap(long, env("SLACK_CHANNEL_ID"))]
    pub slack_channel_id: String,

    #[clap(long, env("SLACK_API_BASE"), default_value = "https://slack.com/api")]
    pub slack_api_base: String,

    /// Five-field cron expression (UTC) for the new-opinions digest.
    #[clap(long, env("POLL_SCHEDULE"), default_value = "*/5 * * * *")]
    pub poll_schedule: String,

    /// Post the digest once and exit instead of serving.
    #[clap(long)]
    pub poll_once: bool,
}
