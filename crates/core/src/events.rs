//! Client-visible job event vocabulary.
//!
//! One analysis job emits a stream of these, serialized one JSON object per
//! line: any number of `progress` events followed by exactly one terminal
//! `done` or `error`.

use serde::Serialize;

use crate::progress::ProgressUpdate;
use crate::results::ResultDocument;

/// One event on a job's outbound stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobEvent {
    Progress {
        percent: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Done {
        data: DonePayload,
    },
    Error {
        error: String,
    },
}

impl JobEvent {
    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        Self::Progress {
            percent,
            message: Some(message.into()),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

impl From<ProgressUpdate> for JobEvent {
    fn from(update: ProgressUpdate) -> Self {
        Self::Progress {
            percent: update.percent,
            message: update.message,
        }
    }
}

/// Terminal payload of a successful job: the result document plus one
/// representation per artifact. Exactly one of `excel_url`/`excel_base64`
/// is non-null (likewise for the parsed-data pair); the locator is only
/// offered when inlining was not possible.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonePayload {
    pub results: ResultDocument,
    pub excel_url: Option<String>,
    pub parsed_data_url: Option<String>,
    pub excel_base64: Option<String>,
    pub parsed_data_base64: Option<String>,
}
