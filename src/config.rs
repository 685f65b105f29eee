use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::fritzbox::DEFAULT_UPLOAD_CONFIRMATION;
use crate::model::{FilterRuleSet, FilterRules, NumberType, PhonebookMeta};
use crate::validation;

const DEFAULT_MAX_NUMBERS: usize = 9;

/// Everything a sync run needs, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub phonebook: PhonebookMeta,
    pub fritzbox: RouterSettings,
    #[serde(default)]
    pub filters: FilterRuleSet,
    #[serde(default)]
    pub conversions: ConversionRules,
    #[serde(default)]
    pub images: ImageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    pub url: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub confirmation: Option<String>,
}

impl RouterSettings {
    pub fn confirmation(&self) -> &str {
        self.confirmation
            .as_deref()
            .unwrap_or(DEFAULT_UPLOAD_CONFIRMATION)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSettings {
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Field mapping from address-book records to phonebook entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionRules {
    /// Name templates, tried in order. `{attribute}` placeholders are filled
    /// from the record; a template with any unset placeholder is skipped.
    pub real_name: Vec<String>,
    /// vCard phone `TYPE` token (upper case) to router number type.
    pub phone_types: BTreeMap<String, NumberType>,
    /// vCard email `TYPE` token (upper case) to router classifier.
    pub email_types: BTreeMap<String, String>,
    /// Ordered `[from, to]` replacements applied to every number.
    pub phone_replace_characters: Vec<(String, String)>,
    /// Records matching these rules are marked as important on the router.
    pub vip: Option<FilterRules>,
    /// Base URL the router resolves contact pictures against.
    pub image_url: Option<String>,
    pub max_numbers_per_entry: usize,
}

impl Default for ConversionRules {
    fn default() -> Self {
        let phone_types = [
            ("HOME", NumberType::Home),
            ("WORK", NumberType::Work),
            ("MAIN", NumberType::Work),
            ("CELL", NumberType::Mobile),
            ("FAX", NumberType::FaxWork),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let email_types = [("HOME", "private"), ("WORK", "work")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            real_name: vec![
                "{lastname}, {firstname}".to_string(),
                "{organization}".to_string(),
                "{fullname}".to_string(),
            ],
            phone_types,
            email_types,
            phone_replace_characters: Vec::new(),
            vip: None,
            image_url: None,
            max_numbers_per_entry: DEFAULT_MAX_NUMBERS,
        }
    }
}

impl ConversionRules {
    /// Upper-cases the type-token keys so lookups are case-insensitive.
    pub fn normalized(mut self) -> Self {
        self.phone_types = self
            .phone_types
            .into_iter()
            .map(|(k, v)| (k.to_ascii_uppercase(), v))
            .collect();
        self.email_types = self
            .email_types
            .into_iter()
            .map(|(k, v)| (k.to_ascii_uppercase(), v))
            .collect();
        self
    }
}

impl SyncConfig {
    /// Reads, overrides from the environment, and validates a configuration file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        debug!(path = %path.display(), phonebook = %config.phonebook.name, "loaded configuration");
        Ok(config)
    }

    pub fn from_json(text: &str) -> SyncResult<Self> {
        let mut config: SyncConfig = serde_json::from_str(text)?;
        config.conversions = config.conversions.normalized();
        Ok(config)
    }

    /// `FRITZBOX_URL`, `FRITZBOX_SID` and `CARDDAV2FB_PHONEBOOK_ID` win over the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("FRITZBOX_URL") {
            self.fritzbox.url = url;
        }
        if let Some(sid) = lookup("FRITZBOX_SID") {
            self.fritzbox.session_id = Some(sid);
        }
        if let Some(id) = lookup("CARDDAV2FB_PHONEBOOK_ID").and_then(|v| v.trim().parse().ok()) {
            self.phonebook.id = id;
        }
    }

    pub fn validate(&mut self) -> SyncResult<()> {
        self.phonebook.name = validation::non_blank(&self.phonebook.name, "phonebook.name")?;
        self.fritzbox.url = validation::non_blank(&self.fritzbox.url, "fritzbox.url")?;
        self.fritzbox.session_id = validation::trim_optional(self.fritzbox.session_id.as_deref());
        validation::positive(
            self.conversions.max_numbers_per_entry,
            "conversions.max_numbers_per_entry",
        )?;
        validation::non_empty_set(&self.conversions.real_name, "conversions.real_name")?;
        Ok(())
    }

    /// Session id, required for anything that talks to the router.
    pub fn session_id(&self) -> SyncResult<&str> {
        self.fritzbox
            .session_id
            .as_deref()
            .ok_or_else(|| SyncError::Config("fritzbox.session_id (or FRITZBOX_SID) is not set".into()))
    }
}
