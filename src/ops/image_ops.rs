use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::SyncResult;
use crate::model::{ContactRecord, ImageUploadStats, PipelineWarning};

/// File store holding contact pictures for the router (its `fonpix` directory).
pub trait ImageStore {
    /// Size of an existing file, `None` if it does not exist.
    fn remote_size(&mut self, file_name: &str) -> Option<u64>;

    fn put(&mut self, file_name: &str, data: &[u8]) -> SyncResult<()>;
}

/// Image store backed by a local or mounted directory.
pub struct DirectoryImageStore {
    dir: PathBuf,
}

impl DirectoryImageStore {
    pub fn new(dir: &Path) -> SyncResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

impl ImageStore for DirectoryImageStore {
    fn remote_size(&mut self, file_name: &str) -> Option<u64> {
        fs::metadata(self.dir.join(file_name)).ok().map(|m| m.len())
    }

    fn put(&mut self, file_name: &str, data: &[u8]) -> SyncResult<()> {
        fs::write(self.dir.join(file_name), data)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct ImageUploadOutcome {
    pub records: Vec<ContactRecord>,
    pub stats: ImageUploadStats,
    pub warnings: Vec<PipelineWarning>,
}

/// Name under which a contact's picture is stored. `None` when the uid could
/// address a path outside the store.
pub fn image_file_name(record: &ContactRecord) -> Option<String> {
    let uid = record.uid.as_str();
    if uid.is_empty() || uid.contains('/') || uid.contains('\\') || uid.contains("..") {
        return None;
    }
    Some(format!("{}.jpg", uid))
}

/// Pushes JPEG contact photos to the store.
///
/// Files whose stored size already matches are left alone. When a write
/// fails, or the uid is not usable as a file name, the record's photo is
/// dropped so the phonebook does not link to a picture that is not there.
pub fn upload_images(records: Vec<ContactRecord>, store: &mut dyn ImageStore) -> ImageUploadOutcome {
    let mut stats = ImageUploadStats::default();
    let mut warnings = Vec::new();

    let mut kept = Vec::with_capacity(records.len());

    for mut record in records {
        let eligible = record
            .photo
            .as_ref()
            .filter(|p| p.is_jpeg())
            .map(|p| p.data.len() as u64);
        let size = match eligible {
            Some(size) => size,
            None => {
                kept.push(record);
                continue;
            }
        };
        stats.total += 1;

        let file_name = match image_file_name(&record) {
            Some(name) => name,
            None => {
                warn!(uid = %record.uid, "uid is not a valid image file name");
                warnings.push(PipelineWarning::ImageUploadFailed {
                    file_name: format!("{}.jpg", record.uid),
                    reason: "uid is not a valid file name".into(),
                });
                record.photo = None;
                kept.push(record);
                continue;
            }
        };
        if store.remote_size(&file_name) == Some(size) {
            debug!(%file_name, "image unchanged, skipping");
            kept.push(record);
            continue;
        }

        let result = match &record.photo {
            Some(photo) => store.put(&file_name, &photo.data),
            None => Ok(()),
        };
        match result {
            Ok(()) => stats.uploaded += 1,
            Err(e) => {
                warn!(%file_name, error = %e, "image upload failed");
                warnings.push(PipelineWarning::ImageUploadFailed {
                    file_name,
                    reason: e.to_string(),
                });
                record.photo = None;
            }
        }
        kept.push(record);
    }

    ImageUploadOutcome {
        records: kept,
        stats,
        warnings,
    }
}

/// Uploads to `store` when there is one. Without a store no picture reaches
/// the router, so every photo is dropped to keep image links out of the phonebook.
pub fn publish_images(records: Vec<ContactRecord>, store: Option<&mut dyn ImageStore>) -> ImageUploadOutcome {
    if let Some(store) = store {
        return upload_images(records, store);
    }

    let mut dropped = 0;
    let records: Vec<ContactRecord> = records
        .into_iter()
        .map(|mut record| {
            if record.photo.take().is_some() {
                dropped += 1;
            }
            record
        })
        .collect();
    if dropped > 0 {
        debug!(dropped, "no image store configured, contact pictures left out");
    }

    ImageUploadOutcome {
        records,
        stats: ImageUploadStats::default(),
        warnings: Vec::new(),
    }
}
