use std::collections::HashMap;

use carddav2fb::config::ConversionRules;
use carddav2fb::error::{SyncError, SyncResult};
use carddav2fb::model::*;
use carddav2fb::ops::image_ops::{self, DirectoryImageStore, ImageStore};
use carddav2fb::ops::quickdial_ops::{self, RemotePhonebookSnapshot, SnapshotState};
use carddav2fb::ops::*;
use pretty_assertions::assert_eq;

fn jpeg() -> Photo {
    Photo {
        data: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        media_type: Some("image/jpeg".into()),
    }
}

fn uids(records: &[ContactRecord]) -> Vec<&str> {
    records.iter().map(|r| r.uid.as_str()).collect()
}

// ==========================================================================
// GROUP OPS TESTS
// ==========================================================================

#[test]
fn dissolve_without_groups_returns_input_unchanged() {
    let records = vec![
        ContactRecord::create("a", "Alice").with_phone("030 1", &["HOME"]),
        ContactRecord::create("b", "Bob"),
        ContactRecord::create("c", "Carol"),
    ];
    let out = group_ops::dissolve_groups(records.clone());
    assert_eq!(out, records);
}

#[test]
fn dissolve_removes_markers_and_tags_members() {
    let records = vec![
        ContactRecord::create("a", "Alice"),
        ContactRecord::create_group("g1", "Family", vec!["b".into()]),
        ContactRecord::create("b", "Bob"),
    ];
    let out = group_ops::dissolve_groups(records);
    assert_eq!(uids(&out), vec!["a", "b"]);
    assert_eq!(out[0].group, None);
    assert_eq!(out[1].group.as_deref(), Some("Family"));
}

#[test]
fn multi_group_member_gets_first_discovered_group() {
    let records = vec![
        ContactRecord::create_group("g1", "Family", vec!["a".into()]),
        ContactRecord::create_group("g2", "Work", vec!["a".into()]),
        ContactRecord::create("a", "Alice"),
    ];
    let out = group_ops::dissolve_groups(records);
    assert_eq!(out[0].group.as_deref(), Some("Family"));
}

#[test]
fn tie_break_follows_discovery_not_name_order() {
    let records = vec![
        ContactRecord::create_group("g1", "Zoo", vec!["a".into()]),
        ContactRecord::create_group("g2", "Aquarium", vec!["a".into()]),
        ContactRecord::create("a", "Alice"),
    ];
    let out = group_ops::dissolve_groups(records);
    assert_eq!(out[0].group.as_deref(), Some("Zoo"));
}

#[test]
fn membership_is_raw_uid_equality() {
    let records = vec![
        ContactRecord::create_group("g1", "Family", vec!["ALICE".into()]),
        ContactRecord::create("alice", "Alice"),
    ];
    let out = group_ops::dissolve_groups(records);
    assert_eq!(out[0].group, None);
}

// ==========================================================================
// FILTER OPS TESTS
// ==========================================================================

fn filter_fixture() -> Vec<ContactRecord> {
    let mut alice = ContactRecord::create("a", "Alice");
    alice.group = Some("Family".into());
    let mut bob = ContactRecord::create("b", "Bob");
    bob.categories = vec!["work".into(), "spam".into()];
    let mut carol = ContactRecord::create("c", "Carol");
    carol.group = Some("Family".into());
    carol.categories = vec!["spam".into()];
    let dave = ContactRecord::create("d", "Dave");
    vec![alice, bob, carol, dave]
}

#[test]
fn no_rules_keep_everything() {
    let out = filter_ops::apply(filter_fixture(), &FilterRuleSet::default());
    assert_eq!(uids(&out), vec!["a", "b", "c", "d"]);
}

#[test]
fn include_keeps_only_matching_records() {
    let rules = FilterRuleSet::default().include("group", &["Family"]);
    let out = filter_ops::apply(filter_fixture(), &rules);
    assert_eq!(uids(&out), vec!["a", "c"]);
}

#[test]
fn include_rules_are_ored_across_attributes() {
    let rules = FilterRuleSet::default()
        .include("group", &["Family"])
        .include("categories", &["work"]);
    let out = filter_ops::apply(filter_fixture(), &rules);
    assert_eq!(uids(&out), vec!["a", "b", "c"]);
}

#[test]
fn exclude_vetoes_included_records() {
    let rules = FilterRuleSet::default()
        .include("group", &["Family"])
        .exclude("category", &["spam"]);
    let out = filter_ops::apply(filter_fixture(), &rules);
    assert_eq!(uids(&out), vec!["a"]);
}

#[test]
fn empty_include_map_passes_everything() {
    let rules = FilterRuleSet {
        include: Some(FilterRules::new()),
        exclude: None,
    };
    let out = filter_ops::include_stage(filter_fixture(), rules.include.as_ref());
    assert_eq!(out.len(), 4);
}

#[test]
fn include_with_only_empty_value_lists_passes_everything() {
    let rules = FilterRuleSet::default()
        .include("group", &[])
        .exclude("categories", &["spam"]);
    let included = filter_ops::include_stage(filter_fixture(), rules.include.as_ref());
    assert_eq!(included.len(), 4);

    let out = filter_ops::apply(filter_fixture(), &rules);
    assert_eq!(uids(&out), vec!["a", "d"]);
}

#[test]
fn match_is_exact_not_substring() {
    let rules = FilterRuleSet::default().include("fullname", &["Ali"]);
    assert!(filter_ops::apply(filter_fixture(), &rules).is_empty());
}

#[test]
fn attribute_missing_on_record_never_matches() {
    let rules = FilterRuleSet::default().exclude("nickname", &["Bobby"]);
    let out = filter_ops::apply(filter_fixture(), &rules);
    assert_eq!(out.len(), 4);
}

#[test]
fn filter_stages_never_grow_the_set() {
    let rule_sets = vec![
        FilterRuleSet::default(),
        FilterRuleSet::default().include("group", &["Family"]),
        FilterRuleSet::default().exclude("categories", &["spam"]),
        FilterRuleSet::default()
            .include("categories", &["spam", "work"])
            .exclude("group", &["Family"]),
        FilterRuleSet::default().include("group", &[]).exclude("uid", &["d"]),
    ];

    for rules in rule_sets {
        let input = filter_fixture();
        let included = filter_ops::include_stage(input.clone(), rules.include.as_ref());
        let excluded = filter_ops::exclude_stage(included.clone(), rules.exclude.as_ref());
        assert!(included.len() <= input.len());
        assert!(excluded.len() <= included.len());
        assert_eq!(filter_ops::apply(input, &rules), excluded);
    }
}

// ==========================================================================
// CONVERT OPS TESTS
// ==========================================================================

#[test]
fn convert_uses_first_resolvable_name_template() {
    let rules = ConversionRules::default();
    let mut record = ContactRecord::create("a", "Alice Smith").with_phone("030 1", &["HOME"]);
    assert_eq!(convert_ops::convert(&record, &rules)[0].name, "Alice Smith");

    record.organization = Some("ACME".into());
    assert_eq!(convert_ops::convert(&record, &rules)[0].name, "ACME");

    record.firstname = Some("Alice".into());
    record.lastname = Some("Smith".into());
    assert_eq!(convert_ops::convert(&record, &rules)[0].name, "Smith, Alice");
}

#[test]
fn convert_classifies_numbers() {
    let rules = ConversionRules::default();
    let record = ContactRecord::create("a", "Alice")
        .with_phone("030 1", &["VOICE", "HOME"])
        .with_phone("0170 2", &["cell"])
        .with_phone("030 3", &["FAX"])
        .with_phone("030 4", &[]);

    let entries = convert_ops::convert(&record, &rules);
    let kinds: Vec<NumberType> = entries[0].numbers.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![NumberType::Home, NumberType::Mobile, NumberType::FaxWork, NumberType::Other]
    );
}

#[test]
fn first_mapped_type_token_decides_number_type() {
    let rules = ConversionRules::default();
    let record = ContactRecord::create("a", "Alice")
        .with_phone("030 3", &["WORK", "FAX"])
        .with_phone("030 5", &["FAX", "WORK"]);

    let entries = convert_ops::convert(&record, &rules);
    let kinds: Vec<NumberType> = entries[0].numbers.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NumberType::Work, NumberType::FaxWork]);
}

#[test]
fn convert_applies_number_replacements() {
    let rules = ConversionRules {
        phone_replace_characters: vec![
            ("+49".into(), "0".into()),
            (" ".into(), "".into()),
            ("/".into(), "".into()),
        ],
        ..ConversionRules::default()
    };
    let record = ContactRecord::create("a", "Alice").with_phone("+49 30 / 123456", &["HOME"]);
    let entries = convert_ops::convert(&record, &rules);
    assert_eq!(entries[0].numbers[0].number, "030123456");
}

#[test]
fn convert_maps_email_classifiers() {
    let rules = ConversionRules::default();
    let record = ContactRecord::create("a", "Alice")
        .with_email("alice@home.example", &["HOME"])
        .with_email("alice@acme.example", &["work"])
        .with_email("alice@other.example", &[]);
    let entries = convert_ops::convert(&record, &rules);
    let classifiers: Vec<&str> = entries[0].emails.iter().map(|e| e.classifier.as_str()).collect();
    assert_eq!(classifiers, vec!["private", "work", "private"]);
    assert!(entries[0].numbers.is_empty());
}

#[test]
fn convert_without_numbers_or_emails_yields_nothing() {
    let record = ContactRecord::create("a", "Alice").with_phone("  ", &["HOME"]);
    assert!(convert_ops::convert(&record, &ConversionRules::default()).is_empty());
}

#[test]
fn convert_splits_numbers_over_router_limit() {
    let rules = ConversionRules::default();
    let mut record = ContactRecord::create("a", "Alice").with_email("a@example.com", &[]);
    for i in 0..11 {
        record = record.with_phone(&format!("030 {}", i), &["HOME"]);
    }

    let entries = convert_ops::convert(&record, &rules);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].numbers.len(), 9);
    assert_eq!(entries[1].numbers.len(), 2);
    assert_eq!(entries[1].numbers[0].number, "030 9");
    assert_eq!(entries[0].emails.len(), 1);
    assert!(entries[1].emails.is_empty());
    assert!(entries.iter().all(|e| e.uid == Uid::from("a") && e.name == "Alice"));
}

#[test]
fn convert_marks_vip_records() {
    let mut vip = FilterRules::new();
    vip.insert("categories".into(), FilterValues::One("vip".into()));
    let rules = ConversionRules {
        vip: Some(vip),
        ..ConversionRules::default()
    };

    let mut record = ContactRecord::create("a", "Alice").with_phone("030 1", &[]);
    assert!(!convert_ops::convert(&record, &rules)[0].vip);
    record.categories = vec!["vip".into()];
    assert!(convert_ops::convert(&record, &rules)[0].vip);
}

#[test]
fn convert_links_jpeg_photos_only() {
    let rules = ConversionRules {
        image_url: Some("file:///var/media/ftp/FRITZ/fonpix/".into()),
        ..ConversionRules::default()
    };
    let mut record = ContactRecord::create("a", "Alice").with_phone("030 1", &[]);
    assert_eq!(convert_ops::convert(&record, &rules)[0].image_url, None);

    record.photo = Some(jpeg());
    assert_eq!(
        convert_ops::convert(&record, &rules)[0].image_url.as_deref(),
        Some("file:///var/media/ftp/FRITZ/fonpix/a.jpg")
    );

    record.photo = Some(Photo {
        data: vec![0x89, b'P', b'N', b'G'],
        media_type: Some("image/png".into()),
    });
    assert_eq!(convert_ops::convert(&record, &rules)[0].image_url, None);
}

#[test]
fn convert_leaves_record_untouched() {
    let record = ContactRecord::create("a", "Alice").with_phone("+49 30 1", &["HOME"]);
    let before = record.clone();
    convert_ops::convert(&record, &ConversionRules::default());
    assert_eq!(record, before);
}

#[test]
fn convert_all_fails_once_when_no_template_matches() {
    let rules = ConversionRules {
        real_name: vec!["{does_not_exist}".into()],
        ..ConversionRules::default()
    };
    let records = vec![
        ContactRecord::create("a", "Alice").with_phone("030 1", &[]),
        ContactRecord::create("b", "Bob").with_phone("030 2", &[]),
    ];
    match convert_ops::convert_all(&records, &rules) {
        Err(SyncError::Unmappable { records }) => assert_eq!(records, 2),
        other => panic!("expected Unmappable, got {:?}", other),
    }
}

#[test]
fn convert_all_skips_contacts_without_numbers() {
    let records = vec![
        ContactRecord::create("a", "Alice"),
        ContactRecord::create("b", "Bob").with_phone("030 2", &[]),
    ];
    let entries = convert_ops::convert_all(&records, &ConversionRules::default()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uid, Uid::from("b"));
}

#[test]
fn convert_all_of_nothing_is_fine() {
    let entries = convert_ops::convert_all(&[], &ConversionRules::default()).unwrap();
    assert!(entries.is_empty());
}

// ==========================================================================
// QUICK DIAL OPS TESTS
// ==========================================================================

fn entry_with_numbers(uid: &str, numbers: &[&str]) -> PhonebookEntry {
    let mut entry = PhonebookEntry::create(Uid::from(uid), uid.to_uppercase());
    entry.numbers = numbers
        .iter()
        .map(|n| PhonebookNumber::new(*n, NumberType::Home))
        .collect();
    entry
}

#[test]
fn merge_restores_quick_dial_through_normalization() {
    let mut snapshot = RemotePhonebookSnapshot::new();
    snapshot.insert("+4930123456", &Uid::from("abc-uid-1"), "3");
    let state = SnapshotState::Available(snapshot);

    let entries = vec![entry_with_numbers("abc-uid-1", &["+49 (30) 123-456", "0049301234 56"])];
    let first = quickdial_ops::merge(entries.clone(), &state);
    let second = quickdial_ops::merge(entries, &state);

    assert_eq!(first.warning, None);
    assert_eq!(first.entries[0].numbers[0].quick_dial.as_deref(), Some("3"));
    assert_eq!(first.entries[0].numbers[1].quick_dial, None);
    assert_eq!(first, second);
}

#[test]
fn merge_is_per_number() {
    let mut snapshot = RemotePhonebookSnapshot::new();
    snapshot.insert("030 2", &Uid::from("a"), "7");
    let state = SnapshotState::Available(snapshot);

    let out = quickdial_ops::merge(vec![entry_with_numbers("a", &["030 1", "0302", "030 3"])], &state);
    let dials: Vec<Option<&str>> = out.entries[0]
        .numbers
        .iter()
        .map(|n| n.quick_dial.as_deref())
        .collect();
    assert_eq!(dials, vec![None, Some("7"), None]);
}

#[test]
fn merge_requires_same_uid() {
    let mut snapshot = RemotePhonebookSnapshot::new();
    snapshot.insert("0301", &Uid::from("someone-else"), "1");
    let state = SnapshotState::Available(snapshot);

    let out = quickdial_ops::merge(vec![entry_with_numbers("a", &["030 1"])], &state);
    assert_eq!(out.entries[0].numbers[0].quick_dial, None);
}

#[test]
fn merge_drops_quick_dial_of_removed_number() {
    let mut snapshot = RemotePhonebookSnapshot::new();
    snapshot.insert("0301", &Uid::from("a"), "1");
    let state = SnapshotState::Available(snapshot);

    let out = quickdial_ops::merge(vec![entry_with_numbers("a", &["030 9"])], &state);
    assert!(out.entries[0].numbers.iter().all(|n| n.quick_dial.is_none()));
}

#[test]
fn merge_without_snapshot_unsets_quick_dials_and_warns_once() {
    let mut with_dial = entry_with_numbers("a", &["030 1", "030 2"]);
    with_dial.numbers[0].quick_dial = Some("5".into());
    let entries = vec![with_dial, entry_with_numbers("b", &["030 3"])];

    let state = SnapshotState::from_export(None);
    let out = quickdial_ops::merge(entries.clone(), &state);

    assert!(matches!(out.warning, Some(PipelineWarning::SnapshotUnavailable { .. })));
    assert_eq!(out.entries.len(), entries.len());
    for (merged, original) in out.entries.iter().zip(&entries) {
        assert!(merged.numbers.iter().all(|n| n.quick_dial.is_none()));
        assert_eq!(merged.uid, original.uid);
        assert_eq!(merged.name, original.name);
        let numbers: Vec<&str> = merged.numbers.iter().map(|n| n.number.as_str()).collect();
        let expected: Vec<&str> = original.numbers.iter().map(|n| n.number.as_str()).collect();
        assert_eq!(numbers, expected);
    }
}

#[test]
fn non_xml_export_is_unavailable() {
    let state = SnapshotState::from_export(Some("<html><body>Login</body></html>"));
    assert!(matches!(state, SnapshotState::Unavailable(_)));
}

#[test]
fn export_with_byte_order_mark_is_read() {
    let export = "\u{feff}<?xml version=\"1.0\"?><phonebooks><phonebook name=\"x\"/></phonebooks>";
    assert!(matches!(
        SnapshotState::from_export(Some(export)),
        SnapshotState::Available(_)
    ));
}

#[test]
fn malformed_export_is_unavailable() {
    let state = SnapshotState::from_export(Some(
        "<?xml version=\"1.0\"?><phonebooks><phonebook></contact></phonebooks>",
    ));
    assert!(matches!(state, SnapshotState::Unavailable(_)));
}

// ==========================================================================
// IMAGE OPS TESTS
// ==========================================================================

#[derive(Default)]
struct MemoryStore {
    files: HashMap<String, Vec<u8>>,
    fail_writes: bool,
    writes: usize,
}

impl ImageStore for MemoryStore {
    fn remote_size(&mut self, file_name: &str) -> Option<u64> {
        self.files.get(file_name).map(|f| f.len() as u64)
    }

    fn put(&mut self, file_name: &str, data: &[u8]) -> SyncResult<()> {
        if self.fail_writes {
            return Err(SyncError::Other("disk full".into()));
        }
        self.writes += 1;
        self.files.insert(file_name.to_string(), data.to_vec());
        Ok(())
    }
}

fn with_photo(uid: &str, photo: Photo) -> ContactRecord {
    let mut record = ContactRecord::create(uid, uid);
    record.photo = Some(photo);
    record
}

#[test]
fn uploads_only_jpeg_photos() {
    let png = Photo {
        data: vec![0x89, b'P', b'N', b'G'],
        media_type: Some("image/png".into()),
    };
    let records = vec![
        with_photo("a", jpeg()),
        with_photo("b", png),
        ContactRecord::create("c", "c"),
    ];
    let mut store = MemoryStore::default();
    let out = image_ops::upload_images(records, &mut store);

    assert_eq!(out.stats, ImageUploadStats { uploaded: 1, total: 1 });
    assert!(store.files.contains_key("a.jpg"));
    assert_eq!(uids(&out.records), vec!["a", "b", "c"]);
    assert!(out.warnings.is_empty());
}

#[test]
fn unchanged_image_is_not_uploaded_again() {
    let mut store = MemoryStore::default();
    store.files.insert("a.jpg".into(), jpeg().data);

    let out = image_ops::upload_images(vec![with_photo("a", jpeg())], &mut store);
    assert_eq!(out.stats, ImageUploadStats { uploaded: 0, total: 1 });
    assert_eq!(store.writes, 0);
}

#[test]
fn changed_image_is_uploaded() {
    let mut store = MemoryStore::default();
    store.files.insert("a.jpg".into(), vec![0xFF, 0xD8, 0xFF]);

    let out = image_ops::upload_images(vec![with_photo("a", jpeg())], &mut store);
    assert_eq!(out.stats.uploaded, 1);
    assert_eq!(store.files["a.jpg"], jpeg().data);
}

#[test]
fn failed_upload_drops_photo_and_warns() {
    let mut store = MemoryStore {
        fail_writes: true,
        ..MemoryStore::default()
    };
    let out = image_ops::upload_images(vec![with_photo("a", jpeg())], &mut store);

    assert_eq!(out.stats, ImageUploadStats { uploaded: 0, total: 1 });
    assert_eq!(out.records[0].photo, None);
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn directory_store_writes_and_reports_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirectoryImageStore::new(&dir.path().join("fonpix")).unwrap();

    assert_eq!(store.remote_size("a.jpg"), None);
    let out = image_ops::upload_images(vec![with_photo("a", jpeg())], &mut store);
    assert_eq!(out.stats.uploaded, 1);
    assert_eq!(store.remote_size("a.jpg"), Some(jpeg().data.len() as u64));
    assert_eq!(
        std::fs::read(dir.path().join("fonpix").join("a.jpg")).unwrap(),
        jpeg().data
    );
}

#[test]
fn uid_that_walks_out_of_the_store_is_refused() {
    let mut store = MemoryStore::default();
    let records = vec![
        with_photo("../escaped", jpeg()),
        with_photo("a/b", jpeg()),
        with_photo("a\\b", jpeg()),
        with_photo("ok", jpeg()),
    ];
    let out = image_ops::upload_images(records, &mut store);

    assert_eq!(out.stats, ImageUploadStats { uploaded: 1, total: 4 });
    assert_eq!(store.files.len(), 1);
    assert!(store.files.contains_key("ok.jpg"));
    assert_eq!(out.warnings.len(), 3);
    assert!(out.records[..3].iter().all(|r| r.photo.is_none()));
    assert!(out.records[3].photo.is_some());
}

#[test]
fn directory_store_never_writes_outside_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirectoryImageStore::new(&dir.path().join("fonpix")).unwrap();

    let out = image_ops::upload_images(vec![with_photo("../escaped", jpeg())], &mut store);

    assert_eq!(out.stats.uploaded, 0);
    assert!(!dir.path().join("escaped.jpg").exists());
}

#[test]
fn refused_uid_gets_no_image_link() {
    let rules = ConversionRules {
        image_url: Some("file:///fonpix".into()),
        ..ConversionRules::default()
    };
    let record = with_photo("../escaped", jpeg()).with_phone("030 1", &["HOME"]);
    let out = image_ops::upload_images(vec![record], &mut MemoryStore::default());

    let entries = convert_ops::convert(&out.records[0], &rules);
    assert_eq!(entries[0].image_url, None);
}

#[test]
fn without_a_store_photos_are_dropped_and_no_link_is_written() {
    let rules = ConversionRules {
        image_url: Some("file:///fonpix".into()),
        ..ConversionRules::default()
    };
    let record = with_photo("a", jpeg()).with_phone("030 1", &["HOME"]);

    let out = image_ops::publish_images(vec![record], None);
    assert_eq!(out.stats, ImageUploadStats::default());
    assert!(out.warnings.is_empty());
    assert_eq!(out.records[0].photo, None);

    let entries = convert_ops::convert(&out.records[0], &rules);
    assert_eq!(entries[0].image_url, None);
}

#[test]
fn with_a_store_photos_are_uploaded_and_linked() {
    let rules = ConversionRules {
        image_url: Some("file:///fonpix".into()),
        ..ConversionRules::default()
    };
    let record = with_photo("a", jpeg()).with_phone("030 1", &["HOME"]);
    let mut store = MemoryStore::default();

    let out = image_ops::publish_images(vec![record], Some(&mut store));
    assert_eq!(out.stats.uploaded, 1);

    let entries = convert_ops::convert(&out.records[0], &rules);
    assert_eq!(entries[0].image_url.as_deref(), Some("file:///fonpix/a.jpg"));
}
