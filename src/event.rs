//! Classification of inbound webhook bodies.
//!
//! Slack posts `application/x-www-form-urlencoded` bodies. Slash commands put
//! their fields at the top level; interactive components wrap a JSON document
//! in a single `payload` field.

use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    SlashCommand(SlashCommand),
    Interaction(Interaction),
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlashCommand {
    pub command: String,
    pub text: String,
    pub trigger_id: String,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    ModalSubmission(ModalSubmission),
    BlockAction(BlockAction),
    /// An interaction type nothing here handles.
    Other {
        kind: String,
        callback_id: Option<String>,
    },
}

impl Interaction {
    pub fn kind(&self) -> &str {
        match self {
            Interaction::ModalSubmission(_) => "view_submission",
            Interaction::BlockAction(_) => "message_action",
            Interaction::Other { kind, .. } => kind,
        }
    }

    pub fn callback_id(&self) -> Option<&str> {
        match self {
            Interaction::ModalSubmission(s) => Some(&s.callback_id),
            Interaction::BlockAction(a) => Some(&a.callback_id),
            Interaction::Other { callback_id, .. } => callback_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalSubmission {
    pub callback_id: String,
    /// Submitted values keyed by field (action) id.
    pub form_values: HashMap<String, String>,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub display_name: String,
}

/// A message shortcut invoked on an existing message.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockAction {
    pub callback_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub message_ts: String,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid form encoding: {0}")]
    Form(#[from] std::string::FromUtf8Error),

    #[error("invalid interaction payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl Inbound {
    pub fn parse(raw_body: &str) -> Result<Inbound, ParseError> {
        let mut form = parse_form(raw_body)?;

        if let Some(command) = form.remove("command").filter(|c| !c.is_empty()) {
            return Ok(Inbound::SlashCommand(SlashCommand {
                command,
                text: form.remove("text").unwrap_or_default(),
                trigger_id: form.remove("trigger_id").unwrap_or_default(),
                user_name: form.remove("user_name"),
            }));
        }

        match form.remove("payload").filter(|p| !p.is_empty()) {
            Some(payload) => Ok(Inbound::Interaction(Interaction::parse(&payload)?)),
            None => Ok(Inbound::Unrecognized),
        }
    }
}

fn parse_form(body: &str) -> Result<HashMap<String, String>, ParseError> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((form_decode(key)?, form_decode(value)?))
        })
        .collect()
}

// `urlencoding` only handles `%XX`; forms also encode spaces as `+`.
fn form_decode(s: &str) -> Result<String, ParseError> {
    Ok(urlencoding::decode(&s.replace('+', "%20"))?.into_owned())
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        let display_name = raw
            .name
            .or(raw.username)
            .unwrap_or_else(|| raw.id.clone());
        User {
            id: raw.id,
            display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawViewSubmission {
    user: RawUser,
    view: RawView,
}

#[derive(Debug, Deserialize)]
struct RawView {
    callback_id: String,
    #[serde(default)]
    state: RawState,
}

#[derive(Debug, Default, Deserialize)]
struct RawState {
    #[serde(default)]
    values: HashMap<String, HashMap<String, RawValue>>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    selected_option: Option<RawOption>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawMessageAction {
    callback_id: String,
    user: RawUser,
    channel: RawChannel,
    message: RawMessage,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    ts: String,
}

impl Interaction {
    pub fn parse(json: &str) -> Result<Interaction, ParseError> {
        let value: Value = serde_json::from_str(json)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            "view_submission" => {
                let raw: RawViewSubmission = serde_json::from_value(value)?;
                let form_values = raw
                    .view
                    .state
                    .values
                    .into_values()
                    .flatten()
                    .filter_map(|(field, v)| {
                        v.value
                            .or_else(|| v.selected_option.map(|o| o.value))
                            .map(|value| (field, value))
                    })
                    .collect();
                Ok(Interaction::ModalSubmission(ModalSubmission {
                    callback_id: raw.view.callback_id,
                    form_values,
                    user: raw.user.into(),
                }))
            }
            "message_action" => {
                let raw: RawMessageAction = serde_json::from_value(value)?;
                Ok(Interaction::BlockAction(BlockAction {
                    callback_id: raw.callback_id,
                    channel_id: raw.channel.id,
                    user_id: raw.user.id,
                    message_ts: raw.message.ts,
                }))
            }
            _ => {
                let callback_id = value
                    .get("callback_id")
                    .or_else(|| value.get("view").and_then(|v| v.get("callback_id")))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(Interaction::Other { kind, callback_id })
            }
        }
    }
}
