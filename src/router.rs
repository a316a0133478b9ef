use std::sync::Arc;
use tracing::{info, warn};
use warp::http::StatusCode;

use crate::block::{self, Choice, InputArgs, ModalArgs, OpenView, SelectArgs};
use crate::event::{BlockAction, Inbound, Interaction, ModalSubmission, SlashCommand};
use crate::message::PostMessage;
use crate::notion::RecordStore;
use crate::record::{Record, SpiceLevel};
use crate::slack::ChatApi;

pub const FOOD_FIGHT_COMMAND: &str = "/foodfight";
pub const FOOD_FIGHT_MODAL: &str = "food-fight-modal";
pub const START_FOOD_FIGHT_NUDGE: &str = "start-food-fight-nudge";

const OPINION_FIELD: &str = "opinion";
const SPICE_LEVEL_FIELD: &str = "spice_level";

/// Status and plain-text body handed back to Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Reply {
            status: StatusCode::BAD_REQUEST,
            body: body.into(),
        }
    }
}

/// Dispatches verified webhook bodies to the one command and two callbacks
/// this app knows about.
#[derive(Clone)]
pub struct Router {
    store: Arc<dyn RecordStore>,
    chat: Arc<dyn ChatApi>,
    channel_id: String,
}

impl Router {
    pub fn new(
        store: Arc<dyn RecordStore>,
        chat: Arc<dyn ChatApi>,
        channel_id: impl Into<String>,
    ) -> Self {
        Router {
            store,
            chat,
            channel_id: channel_id.into(),
        }
    }

    /// Parses and routes a raw body. The caller must have verified its signature.
    pub async fn handle(&self, raw_body: &str) -> Reply {
        match Inbound::parse(raw_body) {
            Ok(inbound) => self.route(inbound).await,
            Err(e) => {
                warn!(error = %e, "rejecting malformed body");
                Reply::bad_request(format!("Invalid request: {}", e))
            }
        }
    }

    pub async fn route(&self, inbound: Inbound) -> Reply {
        match inbound {
            Inbound::SlashCommand(command) => self.slash_command(command).await,
            Inbound::Interaction(interaction) => self.interaction(interaction).await,
            Inbound::Unrecognized => {
                info!("body carried neither a command nor a payload");
                Reply::ok("No command or interaction payload to handle.")
            }
        }
    }

    async fn slash_command(&self, command: SlashCommand) -> Reply {
        match command.command.as_str() {
            FOOD_FIGHT_COMMAND => {
                let view = food_fight_modal(&command.trigger_id, &command.text);
                if let Err(e) = self.chat.open_view(&view).await {
                    warn!(error = %e, "food fight modal not opened");
                }
                Reply::ok("")
            }
            other => {
                info!(
                    command = %other,
                    user = ?command.user_name,
                    "unrecognized slash command"
                );
                Reply::ok(format!("Command {} is not recognized.", other))
            }
        }
    }

    async fn interaction(&self, interaction: Interaction) -> Reply {
        match interaction {
            Interaction::ModalSubmission(submission)
                if submission.callback_id == FOOD_FIGHT_MODAL =>
            {
                self.start_food_fight(submission).await
            }
            Interaction::BlockAction(action) if action.callback_id == START_FOOD_FIGHT_NUDGE => {
                self.nudge(action).await
            }
            other => {
                let callback_id = other.callback_id().unwrap_or("(none)");
                warn!(%callback_id, kind = other.kind(), "unknown callback_id");
                Reply::bad_request(format!("Unknown callback_id {}", callback_id))
            }
        }
    }

    /// Stores the submitted opinion, then announces it. The announcement is
    /// attempted even if storing failed, and neither step is retried.
    async fn start_food_fight(&self, submission: ModalSubmission) -> Reply {
        let ModalSubmission {
            mut form_values,
            user,
            ..
        } = submission;

        let opinion = match form_values.remove(OPINION_FIELD) {
            Some(opinion) if !opinion.trim().is_empty() => opinion,
            _ => return Reply::bad_request(format!("Missing field {}", OPINION_FIELD)),
        };
        let spice_level: SpiceLevel = match form_values.get(SPICE_LEVEL_FIELD) {
            Some(level) => match level.parse() {
                Ok(level) => level,
                Err(e) => {
                    return Reply::bad_request(format!(
                        "Invalid field {}: {}",
                        SPICE_LEVEL_FIELD, e
                    ))
                }
            },
            None => return Reply::bad_request(format!("Missing field {}", SPICE_LEVEL_FIELD)),
        };

        let record = Record::submitted(opinion, spice_level, user.display_name);
        if self.store.create(&record).await.is_err() {
            warn!(user = %user.id, "announcing a food fight that was not stored");
        }

        let text = format!(
            "Oh dang, y'all! :eyes: <@{}> just started a food fight with a {} take:\n\n*{}*\n\n...discuss",
            user.id, record.spice_level, record.opinion
        );
        if let Err(e) = self
            .chat
            .post_message(&PostMessage::text(&self.channel_id, text))
            .await
        {
            warn!(error = %e, "food fight not announced");
        }
        Reply::ok("")
    }

    async fn nudge(&self, action: BlockAction) -> Reply {
        let text = format!(
            "Hey <@{}>, an opinion like this one deserves a heated public debate. \
             Run the `/foodfight` command in a main channel to start one!",
            action.user_id
        );
        let reply = PostMessage::text(action.channel_id, text).in_thread(action.message_ts);
        if let Err(e) = self.chat.post_message(&reply).await {
            warn!(error = %e, user = %action.user_id, "nudge not posted");
        }
        Reply::ok("")
    }
}

/// The "Start a Food Fight" modal, pre-filled with whatever followed the command.
pub fn food_fight_modal(trigger_id: &str, initial_opinion: &str) -> OpenView {
    let choices: Vec<Choice> = SpiceLevel::ALL
        .iter()
        .map(|level| Choice {
            label: level.label(),
            value: level.as_str(),
        })
        .collect();

    block::modal(ModalArgs {
        callback_id: FOOD_FIGHT_MODAL,
        title: "Start a Food Fight",
        submit_text: None,
        trigger_id,
        blocks: vec![
            block::section(
                "The discourse demands food drama! \
                 *Send in your spiciest food takes so we can all argue about them.*",
            ),
            block::input(InputArgs {
                id: OPINION_FIELD,
                label: "Deposit your controversial food opinion here",
                placeholder: "e.g. peanut butter is the best condiment",
                initial_value: Some(initial_opinion),
                hint: Some("What do you believe about food that others might disagree with?"),
            }),
            block::select(SelectArgs {
                id: SPICE_LEVEL_FIELD,
                label: "How spicy is this opinion?",
                placeholder: "Select a spice level",
                options: &choices,
            }),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, Element, Text};
    use crate::event::User;
    use crate::testing::{Call, Recorder};
    use std::collections::HashMap;

    fn router(recorder: &Arc<Recorder>) -> Router {
        Router::new(recorder.clone(), recorder.clone(), "C-FOOD")
    }

    fn command(command: &str, text: &str) -> Inbound {
        Inbound::SlashCommand(SlashCommand {
            command: command.into(),
            text: text.into(),
            trigger_id: "trigger-1".into(),
            user_name: Some("alex".into()),
        })
    }

    fn submission(callback_id: &str, opinion: Option<&str>, spice: Option<&str>) -> Inbound {
        let mut form_values = HashMap::new();
        if let Some(opinion) = opinion {
            form_values.insert("opinion".to_string(), opinion.to_string());
        }
        if let Some(spice) = spice {
            form_values.insert("spice_level".to_string(), spice.to_string());
        }
        Inbound::Interaction(Interaction::ModalSubmission(ModalSubmission {
            callback_id: callback_id.into(),
            form_values,
            user: User {
                id: "U123".into(),
                display_name: "alex".into(),
            },
        }))
    }

    #[tokio::test]
    async fn foodfight_opens_prefilled_modal() {
        let recorder = Arc::new(Recorder::default());
        let reply = router(&recorder)
            .route(command("/foodfight", "pineapple belongs on pizza"))
            .await;
        assert_eq!(reply, Reply::ok(""));

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        let view = match &calls[0] {
            Call::OpenView(view) => view,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(view.trigger_id, "trigger-1");
        assert_eq!(view.view.callback_id, FOOD_FIGHT_MODAL);

        let initial = view.view.blocks.iter().find_map(|b| match b {
            Block::Input {
                element: Element::PlainTextInput { initial_value, .. },
                ..
            } => initial_value.clone(),
            _ => None,
        });
        assert_eq!(initial.as_deref(), Some("pineapple belongs on pizza"));

        let options: Vec<(&str, &str)> = view
            .view
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Input {
                    element: Element::StaticSelect { options, .. },
                    ..
                } => Some(options),
                _ => None,
            })
            .expect("modal has a select")
            .iter()
            .map(|o| match &o.text {
                Text::PlainText { text, .. } => (text.as_str(), o.value.as_str()),
                other => panic!("unexpected option text {:?}", other),
            })
            .collect();
        assert_eq!(
            options,
            vec![
                ("Mild", "mild"),
                ("Medium", "medium"),
                ("Spicy", "spicy"),
                ("Nuclear", "nuclear")
            ]
        );
    }

    #[tokio::test]
    async fn unknown_command_is_reported_without_calls() {
        let recorder = Arc::new(Recorder::default());
        let reply = router(&recorder).route(command("/unknown", "")).await;
        assert_eq!(reply, Reply::ok("Command /unknown is not recognized."));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_modal_open_still_answers_ok() {
        let recorder = Arc::new(Recorder {
            fail_open: true,
            ..Default::default()
        });
        let reply = router(&recorder).route(command("/foodfight", "toast")).await;
        assert_eq!(reply, Reply::ok(""));
        assert!(matches!(recorder.calls().as_slice(), [Call::OpenView(_)]));
    }

    #[tokio::test]
    async fn food_fight_submission_stores_then_announces() {
        let recorder = Arc::new(Recorder::default());
        let reply = router(&recorder)
            .route(submission(FOOD_FIGHT_MODAL, Some("cereal is soup"), Some("spicy")))
            .await;
        assert_eq!(reply, Reply::ok(""));

        let calls = recorder.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Create(record) => {
                assert_eq!(record.opinion, "cereal is soup");
                assert_eq!(record.spice_level, SpiceLevel::Spicy);
                assert!(record.attribution().unwrap().contains("@alex"));
            }
            other => panic!("expected create first, got {:?}", other),
        }
        match &calls[1] {
            Call::PostMessage(message) => {
                assert_eq!(message.channel, "C-FOOD");
                let text = message.text.as_deref().unwrap();
                assert!(text.contains("cereal is soup"));
                assert!(text.contains("spicy"));
                assert!(text.contains("<@U123>"));
                assert_eq!(message.thread_ts, None);
            }
            other => panic!("expected post second, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn announcement_still_posted_when_store_fails() {
        let recorder = Arc::new(Recorder {
            fail_create: true,
            ..Default::default()
        });
        let reply = router(&recorder)
            .route(submission(FOOD_FIGHT_MODAL, Some("cereal is soup"), Some("mild")))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        let calls = recorder.calls();
        assert!(matches!(calls.as_slice(), [Call::Create(_), Call::PostMessage(_)]));
    }

    #[tokio::test]
    async fn failed_announcement_is_not_retried() {
        let recorder = Arc::new(Recorder {
            fail_post: true,
            ..Default::default()
        });
        let reply = router(&recorder)
            .route(submission(FOOD_FIGHT_MODAL, Some("cereal is soup"), Some("mild")))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(recorder.calls().len(), 2);
    }

    #[tokio::test]
    async fn incomplete_submission_is_rejected_without_calls() {
        let recorder = Arc::new(Recorder::default());
        let router = router(&recorder);

        let reply = router.route(submission(FOOD_FIGHT_MODAL, None, Some("mild"))).await;
        assert_eq!(reply, Reply::bad_request("Missing field opinion"));

        let reply = router
            .route(submission(FOOD_FIGHT_MODAL, Some("toast"), None))
            .await;
        assert_eq!(reply, Reply::bad_request("Missing field spice_level"));

        let reply = router
            .route(submission(FOOD_FIGHT_MODAL, Some("toast"), Some("lava")))
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn nudge_replies_in_thread() {
        let recorder = Arc::new(Recorder::default());
        let reply = router(&recorder)
            .route(Inbound::Interaction(Interaction::BlockAction(BlockAction {
                callback_id: START_FOOD_FIGHT_NUDGE.into(),
                channel_id: "C-ELSEWHERE".into(),
                user_id: "U9".into(),
                message_ts: "1700000000.000100".into(),
            })))
            .await;
        assert_eq!(reply, Reply::ok(""));

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::PostMessage(message) => {
                assert_eq!(message.channel, "C-ELSEWHERE");
                assert_eq!(message.thread_ts.as_deref(), Some("1700000000.000100"));
                let text = message.text.as_deref().unwrap();
                assert!(text.contains("<@U9>"));
                assert!(text.contains("`/foodfight`"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_nudge_still_answers_ok() {
        let recorder = Arc::new(Recorder {
            fail_post: true,
            ..Default::default()
        });
        let reply = router(&recorder)
            .route(Inbound::Interaction(Interaction::BlockAction(BlockAction {
                callback_id: START_FOOD_FIGHT_NUDGE.into(),
                channel_id: "C-ELSEWHERE".into(),
                user_id: "U9".into(),
                message_ts: "1700000000.000100".into(),
            })))
            .await;
        assert_eq!(reply, Reply::ok(""));
        assert_eq!(recorder.calls().len(), 1);
    }

    #[tokio::test]
    async fn unknown_callback_is_a_bad_request() {
        let recorder = Arc::new(Recorder::default());
        let router = router(&recorder);

        let reply = router
            .route(submission("some-other-modal", Some("x"), Some("mild")))
            .await;
        assert_eq!(reply, Reply::bad_request("Unknown callback_id some-other-modal"));

        // Right id, wrong interaction shape.
        let reply = router
            .route(Inbound::Interaction(Interaction::BlockAction(BlockAction {
                callback_id: FOOD_FIGHT_MODAL.into(),
                channel_id: "C1".into(),
                user_id: "U1".into(),
                message_ts: "1.0".into(),
            })))
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = router
            .route(Inbound::Interaction(Interaction::Other {
                kind: "view_closed".into(),
                callback_id: None,
            }))
            .await;
        assert_eq!(reply, Reply::bad_request("Unknown callback_id (none)"));

        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_body_gets_placeholder() {
        let recorder = Arc::new(Recorder::default());
        let reply = router(&recorder).route(Inbound::Unrecognized).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(!reply.body.is_empty());
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let recorder = Arc::new(Recorder::default());
        let reply = router(&recorder).handle("payload=%7Bnope").await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(recorder.calls().is_empty());
    }
}
