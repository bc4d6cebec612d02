//! Record bookkeeping shared by the memory and local backends.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use mediafield_core::models::{MediaOwner, MediaRecord, NewMediaOptions};
use uuid::Uuid;

/// Next `order_column` at the end of a collection.
pub fn next_order_column(records: &[MediaRecord], owner: &MediaOwner, collection: &str) -> i64 {
    records
        .iter()
        .filter(|r| &r.owner == owner && r.collection_name == collection)
        .map(|r| r.order_column)
        .max()
        .unwrap_or(0)
        + 1
}

pub fn build_record(
    id: i64,
    owner: &MediaOwner,
    collection: &str,
    size_bytes: u64,
    order_column: i64,
    options: NewMediaOptions,
) -> MediaRecord {
    MediaRecord {
        id,
        uuid: Uuid::new_v4(),
        owner: owner.clone(),
        collection_name: collection.to_string(),
        name: Some(options.display_name),
        file_name: options.file_name,
        mime_type: options.mime_type,
        size_bytes,
        disk: options.target_disk,
        conversions_disk: Some(options.conversions_disk).filter(|d| !d.is_empty()),
        order_column,
        custom_headers: options.custom_headers,
        custom_properties: options.custom_properties,
        manipulations: options.manipulations,
        properties: options.properties,
        generated_conversions: BTreeMap::new(),
        responsive_images: options.responsive_images,
        created_at: Utc::now(),
    }
}

/// Records of one owner and collection, sorted by `order_column` then id.
pub fn collection_records(
    records: &[MediaRecord],
    owner: &MediaOwner,
    collection: &str,
) -> Vec<MediaRecord> {
    let mut matching: Vec<MediaRecord> = records
        .iter()
        .filter(|r| &r.owner == owner && r.collection_name == collection)
        .cloned()
        .collect();
    matching.sort_by_key(|r| (r.order_column, r.id));
    matching
}

/// Assign `order_column = 1..=n` to the ids in `order`. Returns how many records changed.
pub fn apply_order(records: &mut [MediaRecord], order: &[(Uuid, i64)]) -> usize {
    let positions: HashMap<i64, i64> = order
        .iter()
        .enumerate()
        .map(|(index, (_, id))| (*id, index as i64 + 1))
        .collect();

    let mut changed = 0;
    for record in records.iter_mut() {
        if let Some(&position) = positions.get(&record.id) {
            if record.order_column != position {
                record.order_column = position;
                changed += 1;
            }
        }
    }
    changed
}

pub fn resolve_ids(records: &[MediaRecord], uuids: &[Uuid]) -> HashMap<Uuid, i64> {
    records
        .iter()
        .filter(|r| uuids.contains(&r.uuid))
        .map(|r| (r.uuid, r.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(name: &str) -> NewMediaOptions {
        NewMediaOptions {
            file_name: name.to_string(),
            display_name: name.to_string(),
            mime_type: "image/png".to_string(),
            target_disk: "public".to_string(),
            ..NewMediaOptions::default()
        }
    }

    #[test]
    fn test_order_columns_are_per_collection() {
        let owner = MediaOwner::new("post", "1");
        let mut records = vec![build_record(1, &owner, "a", 1, 1, options("x.png"))];
        assert_eq!(next_order_column(&records, &owner, "a"), 2);
        assert_eq!(next_order_column(&records, &owner, "b"), 1);

        records.push(build_record(2, &owner, "a", 1, 2, options("y.png")));
        let other = MediaOwner::new("post", "2");
        assert_eq!(next_order_column(&records, &other, "a"), 1);
    }

    #[test]
    fn test_apply_order() {
        let owner = MediaOwner::new("post", "1");
        let mut records = vec![
            build_record(1, &owner, "a", 1, 1, options("x.png")),
            build_record(2, &owner, "a", 1, 2, options("y.png")),
            build_record(3, &owner, "a", 1, 3, options("z.png")),
        ];
        let order = vec![
            (records[2].uuid, 3),
            (records[0].uuid, 1),
            (records[1].uuid, 2),
        ];

        assert_eq!(apply_order(&mut records, &order), 3);
        let sorted = collection_records(&records, &owner, "a");
        let ids: Vec<i64> = sorted.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        assert_eq!(apply_order(&mut records, &order), 0);
    }

    #[test]
    fn test_empty_conversions_disk_is_none() {
        let owner = MediaOwner::new("post", "1");
        let record = build_record(1, &owner, "a", 1, 1, options("x.png"));
        assert_eq!(record.conversions_disk, None);
    }
}
