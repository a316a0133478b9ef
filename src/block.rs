//! Block Kit layout fragments.
//!
//! Every builder here is pure: the same arguments always produce the same
//! structure, and nothing touches the network.

use serde_derive::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
    Mrkdwn {
        text: String,
    },
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: None,
        }
    }

    pub fn plain_emoji(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: Some(true),
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        text: Text,
    },
    Input {
        block_id: String,
        label: Text,
        element: Element,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<Text>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    PlainTextInput {
        action_id: String,
        placeholder: Text,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_value: Option<String>,
    },
    StaticSelect {
        action_id: String,
        placeholder: Text,
        options: Vec<SelectOption>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub text: Text,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    #[serde(rename = "type")]
    pub ty: String,
    pub callback_id: String,
    pub title: Text,
    pub submit: Text,
    pub blocks: Vec<Block>,
}

/// Body of `views.open`: a modal bound to the trigger that asked for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenView {
    pub trigger_id: String,
    pub view: View,
}

/// A `{label, value}` pair offered by a select menu.
#[derive(Debug, Clone, Copy)]
pub struct Choice<'a> {
    pub label: &'a str,
    pub value: &'a str,
}

pub struct InputArgs<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub placeholder: &'a str,
    pub initial_value: Option<&'a str>,
    pub hint: Option<&'a str>,
}

pub struct SelectArgs<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub placeholder: &'a str,
    pub options: &'a [Choice<'a>],
}

pub struct ModalArgs<'a> {
    pub callback_id: &'a str,
    pub title: &'a str,
    pub submit_text: Option<&'a str>,
    pub trigger_id: &'a str,
    pub blocks: Vec<Block>,
}

/// Block id Slack reports form values under for a field `id`.
pub fn block_id(id: &str) -> String {
    format!("{}_block", id)
}

pub fn section(text: impl Into<String>) -> Block {
    Block::Section {
        text: Text::mrkdwn(text),
    }
}

pub fn input(args: InputArgs<'_>) -> Block {
    Block::Input {
        block_id: block_id(args.id),
        label: Text::plain(args.label),
        element: Element::PlainTextInput {
            action_id: args.id.to_string(),
            placeholder: Text::plain(args.placeholder),
            initial_value: args
                .initial_value
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        },
        hint: args.hint.filter(|h| !h.is_empty()).map(Text::plain),
    }
}

pub fn select(args: SelectArgs<'_>) -> Block {
    Block::Input {
        block_id: block_id(args.id),
        label: Text::plain(args.label),
        element: Element::StaticSelect {
            action_id: args.id.to_string(),
            placeholder: Text::plain_emoji(args.placeholder),
            options: args
                .options
                .iter()
                .map(|choice| SelectOption {
                    text: Text::plain_emoji(choice.label),
                    value: choice.value.to_string(),
                })
                .collect(),
        },
        hint: None,
    }
}

pub fn modal(args: ModalArgs) -> OpenView {
    OpenView {
        trigger_id: args.trigger_id.to_string(),
        view: View {
            ty: "modal".into(),
            callback_id: args.callback_id.to_string(),
            title: Text::plain(args.title),
            submit: Text::plain(args.submit_text.unwrap_or("Submit")),
            blocks: args.blocks,
        },
    }
}
