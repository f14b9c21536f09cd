use serde::{Deserialize, Serialize};

/// Identifier of an event; cards and details share this id space.
pub type EventId = u64;
/// Identifier of a team or individual entry in an event.
pub type ParticipationId = u64;
/// Identifier of an activity inside an event.
pub type ActivityId = u64;
/// Identifier of a media attachment.
pub type MediaId = u64;
/// Users are keyed by opaque string ids (UUIDs on the backend).
pub type UserId = String;

/// A file to upload as a multipart `file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Body of legacy write endpoints: `{"ok": true, "<id_field>": 17}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(crate) struct OkEnvelope {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub activity_id: Option<ActivityId>,
}
