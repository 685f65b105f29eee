//! Router phonebook XML: writing the upload document and reading quick dials
//! back out of an exported one.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{SyncError, SyncResult};
use crate::model::{PhonebookEntry, PhonebookMeta, Uid};
use crate::ops::quickdial_ops::RemotePhonebookSnapshot;

/// A complete phonebook ready for upload. Entries keep their input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookDocument {
    pub name: String,
    pub entries: Vec<PhonebookEntry>,
}

/// Wraps the entries into a single named phonebook without reordering them.
pub fn assemble(entries: Vec<PhonebookEntry>, meta: &PhonebookMeta) -> PhonebookDocument {
    PhonebookDocument {
        name: meta.name.clone(),
        entries,
    }
}

fn xml_err<E: std::fmt::Display>(e: E) -> SyncError {
    SyncError::Xml(e.to_string())
}

impl PhonebookDocument {
    pub fn to_xml(&self) -> SyncResult<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Start(BytesStart::new("phonebooks")))
            .map_err(xml_err)?;

        let mut phonebook = BytesStart::new("phonebook");
        phonebook.push_attribute(("name", self.name.as_str()));
        writer.write_event(Event::Start(phonebook)).map_err(xml_err)?;

        for entry in &self.entries {
            write_contact(&mut writer, entry)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("phonebook")))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("phonebooks")))
            .map_err(xml_err)?;

        String::from_utf8(writer.into_inner().into_inner()).map_err(xml_err)
    }
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, elem: BytesStart<'_>, text: &str) -> SyncResult<()> {
    let end = elem.to_end().into_owned();
    writer.write_event(Event::Start(elem)).map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    writer.write_event(Event::End(end)).map_err(xml_err)?;
    Ok(())
}

fn write_contact(writer: &mut Writer<Cursor<Vec<u8>>>, entry: &PhonebookEntry) -> SyncResult<()> {
    writer
        .write_event(Event::Start(BytesStart::new("contact")))
        .map_err(xml_err)?;

    write_text_element(writer, BytesStart::new("category"), if entry.vip { "1" } else { "0" })?;

    writer
        .write_event(Event::Start(BytesStart::new("person")))
        .map_err(xml_err)?;
    write_text_element(writer, BytesStart::new("realName"), &entry.name)?;
    if let Some(url) = &entry.image_url {
        write_text_element(writer, BytesStart::new("imageURL"), url)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("person")))
        .map_err(xml_err)?;

    let mut telephony = BytesStart::new("telephony");
    telephony.push_attribute(("nid", entry.numbers.len().to_string().as_str()));
    writer.write_event(Event::Start(telephony)).map_err(xml_err)?;
    for (idx, number) in entry.numbers.iter().enumerate() {
        let mut elem = BytesStart::new("number");
        elem.push_attribute(("type", number.kind.as_str()));
        elem.push_attribute(("prio", if idx == 0 { "1" } else { "0" }));
        elem.push_attribute(("id", idx.to_string().as_str()));
        if let Some(qd) = &number.quick_dial {
            elem.push_attribute(("quickdial", qd.as_str()));
        }
        write_text_element(writer, elem, &number.number)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("telephony")))
        .map_err(xml_err)?;

    if !entry.emails.is_empty() {
        let mut services = BytesStart::new("services");
        services.push_attribute(("nid", entry.emails.len().to_string().as_str()));
        writer.write_event(Event::Start(services)).map_err(xml_err)?;
        for (idx, email) in entry.emails.iter().enumerate() {
            let mut elem = BytesStart::new("email");
            elem.push_attribute(("classifier", email.classifier.as_str()));
            elem.push_attribute(("id", idx.to_string().as_str()));
            write_text_element(writer, elem, &email.address)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("services")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::Empty(BytesStart::new("setup")))
        .map_err(xml_err)?;
    write_text_element(writer, BytesStart::new("carddav_uid"), entry.uid.as_str())?;

    writer
        .write_event(Event::End(BytesEnd::new("contact")))
        .map_err(xml_err)?;
    Ok(())
}

#[derive(Default)]
struct ContactScan {
    uid: String,
    numbers: Vec<(String, Option<String>)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Uid,
    Number,
}

/// Reads every `quickdial` annotation out of an exported phonebook.
///
/// Contacts without a `carddav_uid` were not created by this tool and are
/// skipped. Fails on malformed XML or when no `phonebook` element exists.
pub fn parse_snapshot(xml: &str) -> SyncResult<RemotePhonebookSnapshot> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut snapshot = RemotePhonebookSnapshot::new();
    let mut seen_phonebook = false;
    let mut contact: Option<ContactScan> = None;
    let mut target = TextTarget::None;
    let mut pending_quick_dial: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"phonebook" => seen_phonebook = true,
                b"contact" => contact = Some(ContactScan::default()),
                b"carddav_uid" => {
                    target = TextTarget::Uid;
                    text.clear();
                }
                b"number" => {
                    target = TextTarget::Number;
                    text.clear();
                    pending_quick_dial = None;
                    for attr in e.attributes() {
                        let attr = attr.map_err(xml_err)?;
                        if attr.key.as_ref() == b"quickdial" {
                            let value = attr.unescape_value().map_err(xml_err)?;
                            let value = value.trim();
                            if !value.is_empty() {
                                pending_quick_dial = Some(value.to_string());
                            }
                        }
                    }
                }
                _ => {}
            },
            Event::Empty(ref e) => {
                if e.name().as_ref() == b"phonebook" {
                    seen_phonebook = true;
                }
            }
            Event::Text(ref e) => {
                if target != TextTarget::None {
                    text.push_str(&e.unescape().map_err(xml_err)?);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"carddav_uid" => {
                    if let Some(c) = contact.as_mut() {
                        c.uid = text.trim().to_string();
                    }
                    target = TextTarget::None;
                }
                b"number" => {
                    if let Some(c) = contact.as_mut() {
                        c.numbers.push((text.clone(), pending_quick_dial.take()));
                    }
                    target = TextTarget::None;
                }
                b"contact" => {
                    if let Some(c) = contact.take() {
                        if !c.uid.is_empty() {
                            let uid = Uid::new(c.uid);
                            for (number, quick_dial) in c.numbers {
                                if let Some(qd) = quick_dial {
                                    snapshot.insert(&number, &uid, qd);
                                }
                            }
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_phonebook {
        return Err(SyncError::Xml("document has no phonebook element".into()));
    }
    Ok(snapshot)
}
