use tracing::{debug, warn};

use crate::model::filter::populated_count;
use crate::model::{ContactRecord, FilterRuleSet, FilterRules};

/// Shortlists records: the include stage runs first, then the exclude stage
/// may veto anything the include stage let through.
pub fn apply(records: Vec<ContactRecord>, rules: &FilterRuleSet) -> Vec<ContactRecord> {
    let included = include_stage(records, rules.include.as_ref());
    exclude_stage(included, rules.exclude.as_ref())
}

/// How the include stage treats its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeMode<'a> {
    /// No include attributes configured: everything passes.
    PassAll,
    /// Attributes named, but every value list is empty: everything passes, with a warning.
    Unpopulated,
    Filter(&'a FilterRules),
}

pub fn include_mode(include: Option<&FilterRules>) -> IncludeMode<'_> {
    match include {
        None => IncludeMode::PassAll,
        Some(rules) if rules.is_empty() => IncludeMode::PassAll,
        Some(rules) if populated_count(rules) == 0 => IncludeMode::Unpopulated,
        Some(rules) => IncludeMode::Filter(rules),
    }
}

/// Keeps records matching any include rule. An absent or unpopulated include
/// group lets everything through.
pub fn include_stage(records: Vec<ContactRecord>, include: Option<&FilterRules>) -> Vec<ContactRecord> {
    let include = match include_mode(include) {
        IncludeMode::Filter(rules) => rules,
        IncludeMode::Unpopulated => {
            warn!("include filter is empty, including all contacts");
            return records;
        }
        IncludeMode::PassAll => return records,
    };

    records.into_iter().filter(|r| matches_any(r, include)).collect()
}

/// Drops records matching any exclude rule.
pub fn exclude_stage(records: Vec<ContactRecord>, exclude: Option<&FilterRules>) -> Vec<ContactRecord> {
    let exclude = match exclude {
        Some(rules) if populated_count(rules) > 0 => rules,
        _ => return records,
    };

    let before = records.len();
    let kept: Vec<ContactRecord> = records
        .into_iter()
        .filter(|r| !matches_any(r, exclude))
        .collect();
    debug!(before, after = kept.len(), "applied exclude filter");
    kept
}

/// True when any rule attribute present on the record equals (or, for
/// multi-valued attributes, contains) any of that rule's values.
pub fn matches_any(record: &ContactRecord, rules: &FilterRules) -> bool {
    rules.iter().any(|(attribute, values)| {
        record
            .attribute(attribute)
            .map(|value| values.as_slice().iter().any(|v| value.contains(v)))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilterValues;

    #[test]
    fn absent_or_attributeless_include_passes_silently() {
        assert_eq!(include_mode(None), IncludeMode::PassAll);
        assert_eq!(include_mode(Some(&FilterRules::new())), IncludeMode::PassAll);
    }

    #[test]
    fn include_with_only_empty_lists_is_unpopulated() {
        let mut rules = FilterRules::new();
        rules.insert("group".into(), FilterValues::Many(Vec::new()));
        assert_eq!(include_mode(Some(&rules)), IncludeMode::Unpopulated);

        rules.insert("categories".into(), FilterValues::One("work".into()));
        assert_eq!(include_mode(Some(&rules)), IncludeMode::Filter(&rules));
    }
}
