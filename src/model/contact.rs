use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::uid::Uid;

/// A free-form attribute carried over from the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttributeValue {
    pub fn view(&self) -> AttributeRef<'_> {
        match self {
            AttributeValue::Single(s) => AttributeRef::One(s),
            AttributeValue::Multi(v) => AttributeRef::Many(v),
        }
    }
}

/// Borrowed view of a record attribute, as seen by filters and name templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRef<'a> {
    One(&'a str),
    Many(&'a [String]),
}

impl<'a> AttributeRef<'a> {
    /// Exact equality against the value, or against any element of a multi-valued attribute.
    pub fn contains(&self, candidate: &str) -> bool {
        match self {
            AttributeRef::One(s) => *s == candidate,
            AttributeRef::Many(values) => values.iter().any(|v| v == candidate),
        }
    }

    /// First scalar value, skipping blanks.
    pub fn first(&self) -> Option<&'a str> {
        match self {
            AttributeRef::One(s) => Some(*s).filter(|s| !s.trim().is_empty()),
            AttributeRef::Many(values) => values
                .iter()
                .map(String::as_str)
                .find(|s| !s.trim().is_empty()),
        }
    }
}

/// A phone number with its vCard `TYPE` tokens (e.g. `CELL`, `WORK`, `VOICE`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub number: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl PhoneNumber {
    pub fn new(number: impl Into<String>, types: &[&str]) -> Self {
        Self {
            number: number.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl EmailAddress {
    pub fn new(address: impl Into<String>, types: &[&str]) -> Self {
        Self {
            address: address.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Raw photo bytes plus the declared media type, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub data: Vec<u8>,
    pub media_type: Option<String>,
}

impl Photo {
    /// The router only displays JPEG images.
    pub fn is_jpeg(&self) -> bool {
        let declared = self
            .media_type
            .as_deref()
            .map(|t| {
                let upper = t.to_ascii_uppercase();
                upper.contains("JPEG") || upper.contains("JPG")
            })
            .unwrap_or(false);
        declared || self.data.starts_with(&[0xFF, 0xD8, 0xFF])
    }
}

/// One address-book entry after protocol parsing.
///
/// A record with `members` set is an address-book group marker rather than a
/// person; group resolution removes those and fills in `group` on the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecord {
    pub uid: Uid,
    pub fullname: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub nickname: Option<String>,
    pub organization: Option<String>,
    pub phones: Vec<PhoneNumber>,
    pub emails: Vec<EmailAddress>,
    pub categories: Vec<String>,
    pub photo: Option<Photo>,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub members: Option<Vec<Uid>>,
    pub group: Option<String>,
}

impl ContactRecord {
    pub fn create(uid: impl Into<Uid>, fullname: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            fullname: fullname.into(),
            firstname: None,
            lastname: None,
            nickname: None,
            organization: None,
            phones: Vec::new(),
            emails: Vec::new(),
            categories: Vec::new(),
            photo: None,
            attributes: BTreeMap::new(),
            members: None,
            group: None,
        }
    }

    /// A group marker record listing the uids of its members.
    pub fn create_group(uid: impl Into<Uid>, name: impl Into<String>, members: Vec<Uid>) -> Self {
        let mut record = Self::create(uid, name);
        record.members = Some(members);
        record
    }

    pub fn is_group(&self) -> bool {
        self.members.is_some()
    }

    pub fn with_phone(mut self, number: &str, types: &[&str]) -> Self {
        self.phones.push(PhoneNumber::new(number, types));
        self
    }

    pub fn with_email(mut self, address: &str, types: &[&str]) -> Self {
        self.emails.push(EmailAddress::new(address, types));
        self
    }

    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    /// Looks up an attribute by name, so filters and name templates stay data-driven.
    ///
    /// Well-known vCard fields are resolved first; everything else falls back to
    /// the generic `attributes` map. Unset optional fields read as absent.
    pub fn attribute(&self, name: &str) -> Option<AttributeRef<'_>> {
        let known = match name {
            "uid" => Some(AttributeRef::One(self.uid.as_str())),
            "fullname" => Some(AttributeRef::One(self.fullname.as_str())),
            "firstname" => self.firstname.as_deref().map(AttributeRef::One),
            "lastname" => self.lastname.as_deref().map(AttributeRef::One),
            "nickname" => self.nickname.as_deref().map(AttributeRef::One),
            "organization" => self.organization.as_deref().map(AttributeRef::One),
            "group" => self.group.as_deref().map(AttributeRef::One),
            "categories" | "category" if !self.categories.is_empty() => {
                Some(AttributeRef::Many(&self.categories))
            }
            _ => None,
        };
        known.or_else(|| self.attributes.get(name).map(AttributeValue::view))
    }
}
