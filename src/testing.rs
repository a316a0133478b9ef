//! In-memory stand-ins for the two remote APIs.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::block::OpenView;
use crate::error::ApiError;
use crate::message::PostMessage;
use crate::notion::RecordStore;
use crate::record::Record;
use crate::slack::ChatApi;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    QueryNew,
    Create(Record),
    PostMessage(PostMessage),
    OpenView(OpenView),
}

/// Records every call, in order, across both APIs.
#[derive(Default)]
pub struct Recorder {
    pub log: Mutex<Vec<Call>>,
    pub records: Vec<Record>,
    pub fail_query: bool,
    pub fail_create: bool,
    pub fail_post: bool,
    pub fail_open: bool,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

fn refused() -> ApiError {
    ApiError::Api("refused".into())
}

#[async_trait]
impl RecordStore for Recorder {
    async fn query_new(&self) -> Result<Vec<Record>, ApiError> {
        self.push(Call::QueryNew);
        if self.fail_query {
            return Err(refused());
        }
        Ok(self.records.clone())
    }

    async fn create(&self, record: &Record) -> Result<(), ApiError> {
        self.push(Call::Create(record.clone()));
        if self.fail_create {
            return Err(refused());
        }
        Ok(())
    }
}

#[async_trait]
impl ChatApi for Recorder {
    async fn post_message(&self, message: &PostMessage) -> Result<(), ApiError> {
        self.push(Call::PostMessage(message.clone()));
        if self.fail_post {
            return Err(refused());
        }
        Ok(())
    }

    async fn open_view(&self, view: &OpenView) -> Result<(), ApiError> {
        self.push(Call::OpenView(view.clone()));
        if self.fail_open {
            return Err(refused());
        }
        Ok(())
    }
}
