//! End-to-end lab workflow over in-memory storage.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use wellplated_core::new_actor_id;
use wellplated_test_utils::assertions::*;
use wellplated_test_utils::fixtures::*;
use wellplated_test_utils::*;

#[test]
fn seventh_plate_and_its_wells() {
    let (lab, plate, _) = lab_with_formats();

    let minted = lab.inventory.mint(plate.boundary_key(), 7).unwrap();
    let seventh = &minted[6];
    assert_eq!(seventh.code().as_str(), "H12PLATE0000007");

    let decoded = ContainerCode::decode("H12PLATE0000007").unwrap();
    assert_eq!(decoded.bottom_row, 'H');
    assert_eq!(decoded.right_column, 12);
    assert_eq!(decoded.prefix, "PLATE");
    assert_eq!(decoded.sequence, 7);

    assert_ok(&lab.inventory.add_position(seventh.code(), 'H', 12));
    assert_bounds_error(&lab.inventory.add_position(seventh.code(), 'I', 1));
    assert_bounds_error(&lab.inventory.add_position(seventh.code(), 'A', 13));
}

#[test]
fn tube_to_plate_transfer_through_untracked() {
    let (lab, plate, tube) = lab_with_formats();
    let untracked = lab.untracked().unwrap().clone();

    let tube = lab.inventory.mint_one(tube.boundary_key()).unwrap();
    let plate = lab.inventory.mint_one(plate.boundary_key()).unwrap();
    let tube_well = lab.inventory.add_position_label(tube.code(), "A1").unwrap();
    let plate_wells = lab.inventory.fill_positions(plate.code()).unwrap();

    let plan = lab.ledger.create_plan(new_actor_id()).unwrap();
    lab.ledger.record_between(&plan, &untracked.start, &tube_well).unwrap();
    for well in plate_wells.iter().take(3) {
        lab.ledger.record_between(&plan, &tube_well, well).unwrap();
    }
    lab.ledger.record_between(&plan, &plate_wells[0], &untracked.end).unwrap();

    let transfers = lab.ledger.transfers(plan.id).unwrap();
    assert_eq!(transfers.len(), 5);
    assert_eq!(
        lab.ledger.describe(&transfers[0]).unwrap(),
        "start0000000.A01 -> t0000000001.A01"
    );
    assert_eq!(
        lab.ledger.describe(&transfers[4]).unwrap(),
        "PLATE0000001.A01 -> end000000999.A01"
    );

    let sinks = lab.ledger.sinks_of(tube_well.id()).unwrap();
    let labels: Vec<String> = sinks.iter().map(|p| p.address().to_string()).collect();
    assert_eq!(labels, vec!["A01", "A02", "A03"]);
    assert_eq!(lab.ledger.sources_of(tube_well.id()).unwrap(), vec![untracked.start]);
}

#[test]
fn sentinel_transfer_description() {
    let lab = seeded_lab();
    let untracked = lab.untracked().unwrap();
    let plan = lab.ledger.create_plan(new_actor_id()).unwrap();
    let transfer = lab
        .ledger
        .record_between(&plan, &untracked.start, &untracked.end)
        .unwrap();
    assert_eq!(
        lab.ledger.describe(&transfer).unwrap(),
        "start0000000.A01 -> end000000999.A01"
    );
}

#[test]
fn overflowing_format_stops_minting() {
    let lab = seeded_lab();
    let wide = lab
        .registry
        .define('P', 24, "abcdefghijk", "widest prefix")
        .unwrap();

    let minted = lab.inventory.mint(wide.boundary_key(), 9).unwrap();
    assert_eq!(minted.last().unwrap().code().as_str(), "P24abcdefghijk9");
    assert_overflow(&lab.inventory.mint(wide.boundary_key(), 1));
}

#[test]
fn unknown_references_are_not_found() {
    let lab = seeded_lab();
    assert_not_found(&lab.registry.lookup_str("H12PLATE"), EntityType::Format);
    assert_not_found(&lab.inventory.container_str("H12PLATE0000001"), EntityType::Container);
    assert_not_found(&lab.ledger.plan(PlanId::now_v7()), EntityType::Plan);
}

#[test]
fn containers_serialize_with_their_code() {
    let (lab, plate, _) = lab_with_formats();
    let container = lab.inventory.mint_one(plate.boundary_key()).unwrap();

    let json = serde_json::to_value(&container).unwrap();
    assert_eq!(json["code"], "H12PLATE0000001");

    let back: Container = serde_json::from_value(json).unwrap();
    assert_eq!(back, container);
}

#[test]
fn concurrent_minting_yields_disjoint_codes() {
    let (lab, plate, _) = lab_with_formats();
    let lab = Arc::new(lab);
    let key = plate.boundary_key().clone();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lab = Arc::clone(&lab);
            let key = key.clone();
            thread::spawn(move || {
                let mut codes = Vec::new();
                for _ in 0..25 {
                    let minted = lab.inventory.mint(&key, 4).unwrap();
                    codes.extend(minted.into_iter().map(|c| c.code().to_string()));
                }
                codes
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for code in handle.join().unwrap() {
            assert!(all.insert(code.clone()), "{code} minted twice");
        }
    }
    assert_eq!(all.len(), 8 * 25 * 4);
    assert_eq!(lab.inventory.containers(&key).unwrap().len(), 800);
    assert!(all.contains("H12PLATE0000800"));
}
