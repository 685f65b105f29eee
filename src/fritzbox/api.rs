use std::time::Duration;

use tracing::debug;

use crate::error::{SyncError, SyncResult};

const FIRMWARECFG_PATH: &str = "/cgi-bin/firmwarecfg";
const BOUNDARY: &str = "----carddav2fb-form-boundary";

/// The router's phonebook endpoints, as far as the sync needs them.
pub trait PhonebookRouter {
    /// Current export of a phonebook. `None` when the router answered but
    /// did not hand out a phonebook.
    fn export_phonebook(&self, phonebook_id: u32, phonebook_name: &str) -> SyncResult<Option<String>>;

    /// Replaces a phonebook with the given document. Returns the router's response page.
    fn import_phonebook(&self, phonebook_id: u32, xml: &str) -> SyncResult<String>;
}

/// Talks to a Fritz!Box through its `firmwarecfg` form endpoint.
///
/// Requires an already established session id; logging in is not handled here.
pub struct FritzBoxClient {
    base_url: String,
    session_id: String,
    timeout: Duration,
}

impl FritzBoxClient {
    pub fn new(base_url: &str, session_id: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: session_id.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn post_form(&self, form: &MultipartForm) -> SyncResult<String> {
        let url = format!("{}{}", self.base_url, FIRMWARECFG_PATH);
        debug!(%url, bytes = form.body.len(), "posting form to router");
        let response = ureq::post(&url)
            .set("Content-Type", &format!("multipart/form-data; boundary={}", BOUNDARY))
            .timeout(self.timeout)
            .send_bytes(&form.finish())?;
        response
            .into_string()
            .map_err(|e| SyncError::Transport(format!("Failed to read router response: {}", e)))
    }
}

impl PhonebookRouter for FritzBoxClient {
    fn export_phonebook(&self, phonebook_id: u32, phonebook_name: &str) -> SyncResult<Option<String>> {
        let mut form = MultipartForm::new();
        form.field("sid", &self.session_id);
        form.field("PhonebookId", &phonebook_id.to_string());
        form.field("PhonebookExportName", phonebook_name);
        form.field("PhonebookExport", "");

        let body = self.post_form(&form)?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(body))
    }

    fn import_phonebook(&self, phonebook_id: u32, xml: &str) -> SyncResult<String> {
        let mut form = MultipartForm::new();
        form.field("sid", &self.session_id);
        form.field("PhonebookId", &phonebook_id.to_string());
        form.file("PhonebookImportFile", "updatepb.xml", "text/xml", xml.as_bytes());
        self.post_form(&form)
    }
}

/// Minimal `multipart/form-data` body builder; ureq 2 has none.
struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    fn new() -> Self {
        Self { body: Vec::new() }
    }

    fn field(&mut self, name: &str, value: &str) {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    fn file(&mut self, name: &str, filename: &str, content_type: &str, content: &[u8]) {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
    }

    fn finish(&self) -> Vec<u8> {
        let mut body = self.body.clone();
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }
}
