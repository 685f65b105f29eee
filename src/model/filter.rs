use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Acceptable values for one attribute. A bare string in the configuration is
/// treated as a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValues {
    One(String),
    Many(Vec<String>),
}

impl FilterValues {
    pub fn as_slice(&self) -> &[String] {
        match self {
            FilterValues::One(s) => std::slice::from_ref(s),
            FilterValues::Many(v) => v,
        }
    }
}

impl From<&[&str]> for FilterValues {
    fn from(values: &[&str]) -> Self {
        FilterValues::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Attribute name to acceptable values.
pub type FilterRules = BTreeMap<String, FilterValues>;

/// Include/exclude rule groups controlling which contacts reach the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<FilterRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<FilterRules>,
}

impl FilterRuleSet {
    pub fn include(mut self, attribute: &str, values: &[&str]) -> Self {
        self.include
            .get_or_insert_with(BTreeMap::new)
            .insert(attribute.to_string(), values.into());
        self
    }

    pub fn exclude(mut self, attribute: &str, values: &[&str]) -> Self {
        self.exclude
            .get_or_insert_with(BTreeMap::new)
            .insert(attribute.to_string(), values.into());
        self
    }
}

/// Number of configured values across all attributes of a rule group.
pub fn populated_count(rules: &FilterRules) -> usize {
    rules.values().map(|v| v.as_slice().len()).sum()
}
