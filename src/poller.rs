//! Periodic digest of opinions still waiting for judgement.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::block;
use crate::message::PostMessage;
use crate::notion::RecordStore;
use crate::record::Record;
use crate::slack::ChatApi;

#[derive(Clone)]
pub struct Poller {
    store: Arc<dyn RecordStore>,
    chat: Arc<dyn ChatApi>,
    channel_id: String,
    database_url: String,
}

impl Poller {
    pub fn new(
        store: Arc<dyn RecordStore>,
        chat: Arc<dyn ChatApi>,
        channel_id: impl Into<String>,
        database_url: impl Into<String>,
    ) -> Self {
        Poller {
            store,
            chat,
            channel_id: channel_id.into(),
            database_url: database_url.into(),
        }
    }

    /// One tick: fetch new records and post them as a single message.
    ///
    /// A failed query degrades to an empty list, and the digest is posted
    /// even when there is nothing in it. Nothing is retried.
    #[instrument(skip(self))]
    pub async fn run_once(&self) {
        let records = match self.store.query_new().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "posting digest without records");
                Vec::new()
            }
        };
        info!(count = records.len(), "posting new-opinions digest");

        let message = PostMessage::blocks(
            &self.channel_id,
            vec![block::section(digest(&records, &self.database_url))],
        );
        if let Err(e) = self.chat.post_message(&message).await {
            warn!(error = %e, "digest not posted");
        }
    }

    /// Runs [`Poller::run_once`] at each fire time of `schedule`, forever.
    ///
    /// The next fire time is taken from the clock after every tick, so fire
    /// times that passed while a tick was running are skipped, not replayed.
    pub async fn run(self, schedule: Schedule) {
        while let Some(next) = next_fire(&schedule, Utc::now()) {
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            self.run_once().await;
        }
        error!("poll schedule has no further occurrences");
    }
}

/// Parses a standard five-field cron expression (minute granularity).
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    let fields = expr.split_whitespace().count();
    if fields != 5 {
        return Err(anyhow!(
            "Invalid cron expression '{}': expected 5 fields (minute hour day month weekday), got {}",
            expr,
            fields
        ));
    }
    Schedule::from_str(&format!("0 {}", expr))
        .map_err(|e| anyhow!("Invalid cron expression '{}': {}", expr, e))
}

/// First fire time of `schedule` strictly after `now`.
fn next_fire(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&now).next()
}

/// Link to the database view in the Notion web app.
pub fn database_url(workspace: &str, database_id: &str) -> String {
    format!("https://www.notion.so/{}/{}", workspace, database_id)
}

fn digest(records: &[Record], database_url: &str) -> String {
    let mut lines = vec![
        "Here are the opinions awaiting your judgement:".to_string(),
        String::new(),
    ];
    lines.extend(
        records
            .iter()
            .map(|r| format!("- {} (spice level: {})", r.opinion, r.spice_level)),
    );
    lines.push(String::new());
    lines.push(format!("See all items: <{}|in Notion>.", database_url));
    lines.join("\n")
}
