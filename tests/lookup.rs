//! End-to-end lookup behavior through the public handle

use chronik::{
    kinds, BlockFilter, BlockPos, BlockSignature, BlockState, Causer, Chronik, Error, Location,
    Lookup, PlayerId, QueryEngine, Region, WorldId,
};
use chronik_storage::testing::FlakyStore;
use chronik_storage::MemoryStore;
use chrono::{Duration, Utc};
use std::sync::Arc;

#[test]
fn lookup_round_trip_with_all_predicates() {
    let chronik = Chronik::new().unwrap();
    let world = WorldId::new();
    let player = PlayerId::new();
    let base = Utc::now();

    chronik
        .record(kinds::block::break_by(
            player,
            Location::at(world, 10, 64, 10),
            BlockState::of("diamond_ore"),
            base,
        ))
        .unwrap();

    let spec = Lookup::in_world(world)
        .within(Region::radius(BlockPos::new(10, 64, 10), 3))
        .between(base - Duration::seconds(1), base + Duration::seconds(1))
        .kinds([kinds::keys::BLOCK_BREAK])
        .by(Causer::player(player))
        .blocks(BlockFilter::new().include(BlockSignature::material("diamond_ore")));
    let found: Vec<_> = chronik.lookup(&spec).unwrap().collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, kinds::keys::BLOCK_BREAK);
}

#[test]
fn excluded_kind_never_comes_back() {
    let chronik = Chronik::new().unwrap();
    let world = WorldId::new();
    let base = Utc::now();

    chronik
        .record(kinds::flow::water_break_at(
            Location::at(world, 0, 64, 0),
            BlockState::of("sand"),
            base,
        ))
        .unwrap();
    chronik
        .record(kinds::flow::lava_break_at(
            Location::at(world, 1, 64, 0),
            BlockState::of("planks"),
            base,
        ))
        .unwrap();

    let spec = Lookup::in_world(world).exclude_kind(kinds::keys::WATER_BREAK);
    let found: Vec<_> = chronik.lookup(&spec).unwrap().collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, kinds::keys::LAVA_BREAK);
}

#[test]
fn malformed_specs_fail_before_storage() {
    let chronik = Chronik::new().unwrap();
    let world = WorldId::new();
    let now = Utc::now();

    let inverted = Lookup::in_world(world).between(now, now - Duration::seconds(1));
    assert!(matches!(
        chronik.lookup(&inverted),
        Err(Error::InvalidQuery(_))
    ));

    let cancelled = Lookup::in_world(world)
        .kinds([kinds::keys::WATER_BREAK])
        .exclude_kind(kinds::keys::WATER_BREAK);
    assert!(matches!(
        chronik.lookup(&cancelled),
        Err(Error::InvalidQuery(_))
    ));
}

#[test]
fn display_limit_stops_fetching() {
    let chronik = Chronik::new().unwrap();
    let world = WorldId::new();
    let base = Utc::now();

    for i in 0..25 {
        chronik
            .record(kinds::flow::water_break_at(
                Location::at(world, i, 64, 0),
                BlockState::of("sand"),
                base + Duration::seconds(i as i64),
            ))
            .unwrap();
    }

    let first_page: Vec<_> = chronik
        .lookup(&Lookup::in_world(world).limit(10))
        .unwrap()
        .collect();
    assert_eq!(first_page.len(), 10);
    // Newest first
    assert!(first_page[0].timestamp > first_page[9].timestamp);
}

#[test]
fn merged_record_found_at_its_latest_timestamp() {
    let chronik = Chronik::new().unwrap();
    let world = WorldId::new();
    let at = Location::at(world, 4, 64, 4);
    let base = Utc::now();

    chronik
        .record(kinds::flow::water_break_at(at, BlockState::of("sand"), base))
        .unwrap();
    chronik
        .record(kinds::flow::water_break_at(
            at,
            BlockState::of("sand"),
            base + Duration::seconds(60),
        ))
        .unwrap();

    // A window starting after the first occurrence still finds the record
    let late_window = Lookup::in_world(world).since(base + Duration::seconds(30));
    let found: Vec<_> = chronik.lookup(&late_window).unwrap().collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].attached_count, 2);

    // A window covering only the first occurrence no longer does
    let early_window = Lookup::in_world(world)
        .between(base - Duration::seconds(1), base + Duration::seconds(30));
    assert_eq!(chronik.lookup(&early_window).unwrap().count(), 0);
}

#[test]
fn rollback_consumer_walks_newest_first() {
    let chronik = Chronik::new().unwrap();
    let world = WorldId::new();
    let player = PlayerId::new();
    let base = Utc::now();

    for i in 0..3 {
        chronik
            .record(kinds::block::place_by(
                player,
                Location::at(world, i, 64, 0),
                BlockState::of("air"),
                BlockState::of("cobblestone"),
                base + Duration::seconds(i as i64),
            ))
            .unwrap();
    }

    let results = chronik
        .lookup(&Lookup::in_world(world).kinds([kinds::keys::BLOCK_PLACE]))
        .unwrap();
    let ordered = chronik::rollback_order(results);
    assert_eq!(ordered.len(), 3);
    assert!(ordered[0].timestamp >= ordered[1].timestamp);
    assert!(ordered[1].timestamp >= ordered[2].timestamp);
    // Restoring replays subject_before over subject_after
    assert_eq!(
        BlockState::from_value(&ordered[0].subject_before)
            .unwrap()
            .material,
        "air"
    );
}

#[test]
fn storage_fault_surfaces_instead_of_empty_result() {
    let store = Arc::new(FlakyStore::new(MemoryStore::new()));
    let engine = QueryEngine::new(Arc::clone(&store));
    let world = WorldId::new();

    store.fail_scans(1);
    let result = engine.lookup(&Lookup::in_world(world));
    assert!(matches!(result, Err(Error::StorageUnavailable(_))));

    // Once storage recovers, the same spec yields a (valid) empty sequence
    assert_eq!(engine.lookup(&Lookup::in_world(world)).unwrap().count(), 0);
}
