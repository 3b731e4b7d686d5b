use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::models::{MediaType, VideoEntry};
use crate::services::grants::ObjectStore;
use crate::services::ServiceError;

const UNPARSEABLE_NAME: &str = "Name not parseable";

/// Builds the viewer-facing catalog from the raw bucket listing: objects
/// grouped by top-level folder, with HLS packages collapsed to a single
/// entry pointing at their playlist.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
        }
    }

    /// Walk the full (paginated) object listing and group playable entries
    /// by their top-level folder.
    pub async fn sections(&self) -> Result<BTreeMap<String, Vec<VideoEntry>>, ServiceError> {
        let mut sections: BTreeMap<String, Vec<VideoEntry>> = BTreeMap::new();
        // HLS package stems already represented by a playlist entry; their
        // segment files are skipped.
        let mut excluded: HashSet<String> = HashSet::new();

        let mut start: Option<String> = None;
        loop {
            let page = self.store.list_objects(&self.bucket, start.as_deref()).await?;
            for object in &page.objects {
                add_object(&mut sections, &mut excluded, &object.name);
            }
            match page.next_start {
                Some(next) => start = Some(next),
                None => break,
            }
        }

        Ok(sections)
    }
}

fn add_object(
    sections: &mut BTreeMap<String, Vec<VideoEntry>>,
    excluded: &mut HashSet<String>,
    object_name: &str,
) {
    let Some((folder, file)) = object_name.split_once('/') else {
        // Top-level object with no folder; the catalog is folder-driven
        return;
    };
    if file.is_empty() {
        // Bare directory marker
        return;
    }

    if file.contains(".hls") {
        let stem = file.split('.').next().unwrap_or(file);
        if excluded.contains(stem) {
            return;
        }
        excluded.insert(stem.to_string());
        sections
            .entry(folder.to_string())
            .or_default()
            .push(VideoEntry {
                name: format!("{}/{}.hls/output.m3u8", folder, stem),
                display_name: stem.to_string(),
            });
    } else {
        let display_name = match file.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => file,
        };
        sections
            .entry(folder.to_string())
            .or_default()
            .push(VideoEntry {
                name: object_name.to_string(),
                display_name: display_name.to_string(),
            });
    }
}

/// Derive the display name and media type for one object path, the way the
/// playback views present it.
pub fn describe(object_name: &str) -> (String, MediaType) {
    let Some((_, file)) = object_name.split_once('/') else {
        return (UNPARSEABLE_NAME.to_string(), MediaType::Mp4);
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file,
    };
    if stem.contains(".hls") {
        let display = stem.split('.').next().unwrap_or(stem);
        (display.to_string(), MediaType::Hls)
    } else {
        (stem.to_string(), MediaType::Mp4)
    }
}
