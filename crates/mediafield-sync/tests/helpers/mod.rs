#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mediafield_core::{MediaOwner, MediaRecord, NewMediaOptions};
use mediafield_storage::test_helpers::RecordingMediaStore;
use mediafield_storage::{MediaStore, MemoryMediaStore, MemoryUploadStaging};
use mediafield_sync::ReconciliationEngine;

pub struct Harness {
    pub store: RecordingMediaStore,
    pub staging: MemoryUploadStaging,
    pub engine: ReconciliationEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryMediaStore::default())
    }

    pub fn with_store(inner: MemoryMediaStore) -> Self {
        let store = RecordingMediaStore::new(inner);
        let staging = MemoryUploadStaging::new();
        let engine = ReconciliationEngine::new(Arc::new(store.clone()), Arc::new(staging.clone()));
        Self {
            store,
            staging,
            engine,
        }
    }

    pub async fn seed(&self, owner: &MediaOwner, collection: &str, name: &str) -> MediaRecord {
        self.store
            .inner()
            .create_media(owner, collection, name.as_bytes().to_vec(), options(name))
            .await
            .unwrap()
    }

    pub async fn uuids(&self, owner: &MediaOwner, collection: &str) -> Vec<uuid::Uuid> {
        self.store
            .inner()
            .list_media(owner, collection)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.uuid)
            .collect()
    }
}

pub fn owner() -> MediaOwner {
    MediaOwner::new("post", "42")
}

pub fn options(name: &str) -> NewMediaOptions {
    NewMediaOptions {
        file_name: name.to_string(),
        display_name: name.to_string(),
        mime_type: "text/plain".to_string(),
        target_disk: "public".to_string(),
        ..NewMediaOptions::default()
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    }));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}
