pub mod api;
pub mod phonebook_xml;

pub use api::{FritzBoxClient, PhonebookRouter};
pub use phonebook_xml::{assemble, parse_snapshot, PhonebookDocument};

/// Text the router's response page carries after a successful phonebook restore.
pub const DEFAULT_UPLOAD_CONFIRMATION: &str = "Das Telefonbuch der FRITZ!Box wurde wiederhergestellt";
