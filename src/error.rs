use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{field} cannot be blank")]
    BlankField { field: String },

    #[error("{field} must be positive")]
    NonPositive { field: String },

    #[error("{field} cannot be empty")]
    EmptySet { field: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Router request failed (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    #[error("Could not reach router: {0}")]
    Transport(String),

    #[error("Router rejected phonebook upload for phonebook {phonebook_id}")]
    UploadRejected { phonebook_id: String },

    #[error("No phonebook entries could be built from {records} contacts; check the conversion rules")]
    Unmappable { records: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for SyncError {
    fn from(e: quick_xml::Error) -> Self {
        SyncError::Xml(e.to_string())
    }
}

impl From<ureq::Error> for SyncError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, resp) => {
                let body = resp.into_string().unwrap_or_default();
                SyncError::Http {
                    status,
                    body: body.chars().take(200).collect(),
                }
            }
            ureq::Error::Transport(t) => SyncError::Transport(t.to_string()),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
