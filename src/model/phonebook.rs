use std::fmt;

use serde::{Deserialize, Serialize};

use super::uid::Uid;

/// Number classes the router's phonebook understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberType {
    Home,
    Work,
    Mobile,
    FaxWork,
    Other,
}

impl NumberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberType::Home => "home",
            NumberType::Work => "work",
            NumberType::Mobile => "mobile",
            NumberType::FaxWork => "fax_work",
            NumberType::Other => "other",
        }
    }

    pub fn from_router_str(s: &str) -> Option<Self> {
        match s {
            "home" => Some(NumberType::Home),
            "work" => Some(NumberType::Work),
            "mobile" => Some(NumberType::Mobile),
            "fax_work" => Some(NumberType::FaxWork),
            "other" => Some(NumberType::Other),
            _ => None,
        }
    }
}

/// One number on a phonebook entry. Quick dials live here, per number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookNumber {
    pub number: String,
    pub kind: NumberType,
    pub quick_dial: Option<String>,
}

impl PhonebookNumber {
    pub fn new(number: impl Into<String>, kind: NumberType) -> Self {
        Self {
            number: number.into(),
            kind,
            quick_dial: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookEmail {
    pub address: String,
    pub classifier: String,
}

/// One router-facing contact. A single address-book record may produce several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookEntry {
    pub uid: Uid,
    pub name: String,
    pub vip: bool,
    pub numbers: Vec<PhonebookNumber>,
    pub emails: Vec<PhonebookEmail>,
    pub image_url: Option<String>,
}

impl PhonebookEntry {
    pub fn create(uid: Uid, name: String) -> Self {
        Self {
            uid,
            name,
            vip: false,
            numbers: Vec::new(),
            emails: Vec::new(),
            image_url: None,
        }
    }
}

/// Target phonebook on the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhonebookMeta {
    #[serde(default)]
    pub id: u32,
    pub name: String,
}

/// A phone number reduced to digits and an optional leading `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedNumber(String);

impl NormalizedNumber {
    /// Drops everything except digits; a `+` survives only before the first digit.
    pub fn parse(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_ascii_digit() {
                out.push(c);
            } else if c == '+' && out.is_empty() {
                out.push(c);
            }
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key used to carry quick dials across re-conversion.
///
/// Both the remote snapshot and freshly converted entries build keys through
/// [`QuickDialKey::new`], so the normalization is shared by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuickDialKey {
    pub number: NormalizedNumber,
    pub uid: Uid,
}

impl QuickDialKey {
    pub fn new(raw_number: &str, uid: &Uid) -> Self {
        Self {
            number: NormalizedNumber::parse(raw_number),
            uid: uid.clone(),
        }
    }
}

impl fmt::Display for QuickDialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.number, self.uid)
    }
}
