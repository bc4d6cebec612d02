mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{options, owner};
use mediafield_core::{FieldConfig, MediaOwner, Visibility};
use mediafield_storage::{MediaStore, MemoryMediaStore};
use mediafield_sync::DisplayResolver;
use uuid::Uuid;

async fn seeded(store: &MemoryMediaStore, owner: &MediaOwner) -> mediafield_core::MediaRecord {
    let mut opts = options("photo.png");
    opts.display_name = "Holiday".to_string();
    opts.mime_type = "image/png".to_string();
    store
        .create_media(owner, "gallery", vec![0; 12], opts)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_public_field_uses_default_url() {
    let store = MemoryMediaStore::new("http://cdn/media");
    let owner = owner();
    let record = seeded(&store, &owner).await;
    let resolver = DisplayResolver::new(Arc::new(store));

    let info = resolver
        .resolve(&FieldConfig::new(), Some(&owner), record.uuid)
        .await
        .unwrap();

    assert_eq!(info.name, "Holiday");
    assert_eq!(info.size, 12);
    assert_eq!(info.mime_type, "image/png");
    assert_eq!(info.url, format!("http://cdn/media/{}/photo.png", record.id));
}

#[tokio::test]
async fn test_private_field_prefers_temporary_url() {
    let store = MemoryMediaStore::new("http://cdn/media").with_temporary_urls(true);
    let owner = owner();
    let record = seeded(&store, &owner).await;
    store.mark_conversion_generated(record.uuid, "thumb").unwrap();
    let resolver =
        DisplayResolver::new(Arc::new(store)).with_temporary_url_ttl(Duration::from_secs(60));

    let field = FieldConfig::new()
        .visibility(Visibility::Private)
        .conversion("thumb");
    let info = resolver.resolve(&field, Some(&owner), record.uuid).await.unwrap();

    assert!(info.url.contains("?expires="));
}

#[tokio::test]
async fn test_unsupported_temporary_url_falls_back() {
    let store = MemoryMediaStore::new("http://cdn/media");
    let owner = owner();
    let record = seeded(&store, &owner).await;
    store.mark_conversion_generated(record.uuid, "thumb").unwrap();
    let resolver = DisplayResolver::new(Arc::new(store));

    let field = FieldConfig::new()
        .visibility(Visibility::Private)
        .conversion("thumb");
    let info = resolver.resolve(&field, Some(&owner), record.uuid).await.unwrap();

    assert_eq!(
        info.url,
        format!("http://cdn/media/{}/conversions/photo-thumb.png", record.id)
    );
}

#[tokio::test]
async fn test_conversion_url_only_when_generated() {
    let store = MemoryMediaStore::new("http://cdn/media");
    let owner = owner();
    let record = seeded(&store, &owner).await;
    let resolver = DisplayResolver::new(Arc::new(store));

    let field = FieldConfig::new().conversion("thumb");
    let info = resolver.resolve(&field, Some(&owner), record.uuid).await.unwrap();

    assert_eq!(info.url, format!("http://cdn/media/{}/photo.png", record.id));
}

#[tokio::test]
async fn test_unknown_record_or_owner_resolves_to_none() {
    let store = MemoryMediaStore::default();
    let owner = owner();
    let record = seeded(&store, &owner).await;
    let resolver = DisplayResolver::new(Arc::new(store));
    let field = FieldConfig::new();

    assert!(resolver.resolve(&field, None, record.uuid).await.is_none());
    assert!(resolver
        .resolve(&field, Some(&owner), Uuid::new_v4())
        .await
        .is_none());
    assert!(resolver
        .resolve(&field, Some(&MediaOwner::new("post", "other")), record.uuid)
        .await
        .is_none());
}
