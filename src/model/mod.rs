pub mod uid;
pub mod contact;
pub mod group;
pub mod filter;
pub mod phonebook;
pub mod report;

// Re-exports for convenience
pub use uid::Uid;
pub use contact::{AttributeRef, AttributeValue, ContactRecord, EmailAddress, PhoneNumber, Photo};
pub use group::GroupDefinition;
pub use filter::{FilterRuleSet, FilterRules, FilterValues};
pub use phonebook::{
    NormalizedNumber, NumberType, PhonebookEmail, PhonebookEntry, PhonebookMeta, PhonebookNumber,
    QuickDialKey,
};
pub use report::{ImageUploadStats, PipelineWarning};
