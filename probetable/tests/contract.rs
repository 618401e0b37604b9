//! Every container is interchangeable behind the [`Map`] contract: one
//! generic scenario drives all eight, with no variant-specific knowledge.

use probetable::chained::ChainedMap;
use probetable::cuckoo::CuckooMap;
use probetable::elastic::ElasticMap;
use probetable::funnel::FunnelMap;
use probetable::hashing::hashers::XXH3Hasher;
use probetable::iceberg::IcebergMap;
use probetable::linear::LinearMap;
use probetable::partitioned::PartitionedMap;
use probetable::perfect::PerfectMap;
use probetable::Map;

type H = XXH3Hasher<u64>;

/// A mixed workload touching every verb, with invariant checks between the
/// phases: distinct inserts, overwrites, removals of a stride, reinsertion,
/// and a clear-then-reuse pass. Capacity must never shrink along the way.
fn watch_capacity<M: Map<u64, u64>>(map: &M, floor: &mut usize) {
    let capacity = map.capacity();
    assert!(
        capacity >= *floor,
        "capacity shrank from {floor} to {capacity}"
    );
    *floor = capacity;
}

fn exercise<M: Map<u64, u64>>(mut map: M) {
    assert!(map.is_empty());
    let mut capacity_floor = 0;

    for i in 0..600 {
        map.insert(i, i + 1).unwrap();
        watch_capacity(&map, &mut capacity_floor);
    }
    assert_eq!(map.len(), 600);
    for i in 0..600 {
        assert_eq!(map.get(&i), Some(&(i + 1)));
    }

    // Overwrites change values, never the length.
    for i in (0..600).step_by(5) {
        map.insert(i, i + 2).unwrap();
    }
    assert_eq!(map.len(), 600);
    for i in 0..600 {
        let expected = if i % 5 == 0 { i + 2 } else { i + 1 };
        assert_eq!(map.get(&i), Some(&expected));
    }

    // Remove a stride; the rest must stay reachable.
    for i in (0..600).step_by(3) {
        assert!(map.remove(&i));
    }
    assert_eq!(map.len(), 400);
    for i in 0..600 {
        if i % 3 == 0 {
            assert_eq!(map.get(&i), None);
            assert!(!map.update(&i, 0));
        } else {
            assert!(map.get(&i).is_some());
        }
    }

    // Removed keys are insertable again.
    for i in (0..600).step_by(3) {
        map.insert(i, i * 7).unwrap();
        watch_capacity(&map, &mut capacity_floor);
    }
    assert_eq!(map.len(), 600);
    for i in (0..600).step_by(3) {
        assert_eq!(map.get(&i), Some(&(i * 7)));
    }

    // Updates hit live keys only.
    for i in 0..600 {
        assert!(map.update(&i, i));
    }
    let load = map.load_factor();
    assert!(load > 0.0);

    map.clear();
    assert_eq!(map.len(), 0);
    assert!((0..600).all(|i| map.get(&i).is_none()));
    watch_capacity(&map, &mut capacity_floor);

    // The cleared table is fully usable.
    for i in 0..100 {
        map.insert(i, i).unwrap();
    }
    assert_eq!(map.len(), 100);
    for i in 0..100 {
        assert_eq!(map.get(&i), Some(&i));
    }
}

#[test]
fn linear_conforms() {
    exercise(LinearMap::<u64, u64, H>::new(8));
}

#[test]
fn chained_conforms() {
    exercise(ChainedMap::<u64, u64, H>::new(17));
}

#[test]
fn cuckoo_conforms() {
    exercise(CuckooMap::<u64, u64, H>::new(16));
}

#[test]
fn perfect_conforms() {
    exercise(PerfectMap::<u64, u64, H>::new(16));
}

#[test]
fn iceberg_conforms() {
    exercise(IcebergMap::<u64, u64, H>::new(4));
}

#[test]
fn funnel_conforms() {
    exercise(FunnelMap::<u64, u64, H>::new(64, 0.1).unwrap());
}

#[test]
fn elastic_conforms() {
    exercise(ElasticMap::<u64, u64, H>::new(16, 0.1).unwrap());
}

#[test]
fn partitioned_conforms() {
    exercise(PartitionedMap::<u64, u64, H>::new(16, 2.0));
}
