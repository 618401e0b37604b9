//! Macros generating the universal mapping-contract test suite.

/// Generates the conformance suite for a map type with integer keys.
///
/// # Parameters
///
/// - `$Map`: The map type under test (e.g. `LinearMap`).
/// - `$Hasher`: The hasher family to instantiate for the key type.
/// - `$factory`: A zero-argument factory producing a small-capacity map, so
///   growth paths get exercised.
/// - `$type`: The integer key type.
#[macro_export]
macro_rules! generate_map_int_tests {
    ($Map:tt, $Hasher:tt, $factory:expr, $type:ty) => {
        compose_idents::compose_idents!(
            test_fn = concat(test_insert_then_get_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;
                    use probetable_testing::Generate;
                    use rand::SeedableRng;
                    use rand_chacha::ChaCha20Rng;

                    let mut rng = ChaCha20Rng::seed_from_u64(42);
                    let keys = <$type as Generate<ChaCha20Rng>>::generate_many(
                        &mut rng,
                        &Default::default(),
                        1000,
                    );
                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    for (i, key) in keys.iter().enumerate() {
                        map.insert(key.clone(), i as u64).unwrap();
                    }
                    assert_eq!(map.len(), keys.len());
                    for (i, key) in keys.iter().enumerate() {
                        assert_eq!(map.get(key), Some(&(i as u64)), "key: {:?}", key);
                    }

                    let existing: std::collections::HashSet<&$type> = keys.iter().collect();
                    let mut missing = 0;
                    while missing < 200 {
                        let probe =
                            <$type as Generate<ChaCha20Rng>>::generate(&mut rng, &Default::default());
                        if !existing.contains(&probe) {
                            assert_eq!(map.get(&probe), None, "key: {:?}", probe);
                            missing += 1;
                        }
                    }
                }
            }
        );

        compose_idents::compose_idents!(
            test_fn = concat(test_overwrite_keeps_len_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;

                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    map.insert(42 as $type, 100).unwrap();
                    map.insert(84 as $type, 200).unwrap();
                    map.insert(42 as $type, 300).unwrap();

                    assert_eq!(map.get(&(42 as $type)), Some(&300));
                    assert_eq!(map.get(&(84 as $type)), Some(&200));
                    assert_eq!(map.len(), 2);
                }
            }
        );

        compose_idents::compose_idents!(
            test_fn = concat(test_remove_semantics_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;

                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    map.insert(1 as $type, 10).unwrap();
                    map.insert(2 as $type, 20).unwrap();
                    map.insert(3 as $type, 30).unwrap();

                    assert!(map.remove(&(2 as $type)));
                    assert_eq!(map.get(&(2 as $type)), None);
                    assert_eq!(map.len(), 2);
                    assert!(!map.remove(&(2 as $type)));
                    assert_eq!(map.len(), 2);

                    assert_eq!(map.get(&(1 as $type)), Some(&10));
                    assert_eq!(map.get(&(3 as $type)), Some(&30));

                    // Removing an absent key is a no-op.
                    assert!(!map.remove(&(77 as $type)));
                    assert_eq!(map.len(), 2);

                    // The key is insertable again after removal.
                    map.insert(2 as $type, 21).unwrap();
                    assert_eq!(map.get(&(2 as $type)), Some(&21));
                    assert_eq!(map.len(), 3);
                }
            }
        );

        compose_idents::compose_idents!(
            test_fn = concat(test_update_semantics_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;

                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    assert!(!map.update(&(5 as $type), 1));
                    assert_eq!(map.len(), 0);

                    map.insert(5 as $type, 50).unwrap();
                    assert!(map.update(&(5 as $type), 99));
                    assert_eq!(map.get(&(5 as $type)), Some(&99));
                    assert_eq!(map.len(), 1);

                    // An update never inserts on a miss.
                    assert!(!map.update(&(6 as $type), 1));
                    assert_eq!(map.get(&(6 as $type)), None);
                }
            }
        );

        compose_idents::compose_idents!(
            test_fn = concat(test_clear_is_idempotent_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;

                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    for i in 0..100_u64 {
                        map.insert(i as $type, i).unwrap();
                    }
                    let capacity = map.capacity();

                    map.clear();
                    assert_eq!(map.len(), 0);
                    assert!(map.is_empty());
                    assert_eq!(map.capacity(), capacity);
                    for i in 0..100_u64 {
                        assert_eq!(map.get(&(i as $type)), None);
                    }

                    map.clear();
                    assert_eq!(map.len(), 0);

                    map.insert(7 as $type, 70).unwrap();
                    assert_eq!(map.get(&(7 as $type)), Some(&70));
                }
            }
        );

        compose_idents::compose_idents!(
            test_fn = concat(test_growth_preserves_entries_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;

                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    for i in 0..2000_u64 {
                        map.insert(i as $type, 10 * i).unwrap();
                    }
                    assert_eq!(map.len(), 2000);
                    for i in 0..2000_u64 {
                        assert_eq!(map.get(&(i as $type)), Some(&(10 * i)));
                    }
                }
            }
        );

        compose_idents::compose_idents!(
            test_fn = concat(test_size_counts_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;
                    use probetable_testing::Generate;
                    use rand::SeedableRng;
                    use rand_chacha::ChaCha20Rng;

                    let mut rng = ChaCha20Rng::seed_from_u64(7);
                    let keys = <$type as Generate<ChaCha20Rng>>::generate_many(
                        &mut rng,
                        &Default::default(),
                        300,
                    );
                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    for key in keys.iter() {
                        map.insert(key.clone(), 1).unwrap();
                    }
                    for key in keys.iter().take(100) {
                        assert!(map.remove(key));
                    }
                    assert_eq!(map.len(), 200);
                }
            }
        );

        compose_idents::compose_idents!(
            test_fn = concat(test_randomized_mixed_ops_, normalize($type)),
            {
                #[test]
                fn test_fn() {
                    use probetable_core::Map;
                    use probetable_testing::Generate;
                    use rand::seq::SliceRandom;
                    use rand::SeedableRng;
                    use rand_chacha::ChaCha20Rng;

                    let mut rng = ChaCha20Rng::seed_from_u64(42);
                    let mut keys = <$type as Generate<ChaCha20Rng>>::generate_many(
                        &mut rng,
                        &Default::default(),
                        10_000,
                    )
                    .into_vec();

                    let mut map: $Map<$type, u64, $Hasher<$type>> = $factory();
                    for (i, key) in keys.iter().enumerate() {
                        map.insert(key.clone(), i as u64).unwrap();
                    }
                    assert_eq!(map.len(), keys.len());
                    for (i, key) in keys.iter().enumerate() {
                        assert_eq!(map.get(key), Some(&(i as u64)));
                    }

                    keys.shuffle(&mut rng);
                    let (removed, retained) = keys.split_at(keys.len() / 2);
                    for key in removed {
                        assert!(map.remove(key));
                    }
                    assert_eq!(map.len(), retained.len());
                    for key in removed {
                        assert_eq!(map.get(key), None);
                    }
                    for key in retained {
                        assert!(map.get(key).is_some());
                    }

                    for (i, key) in removed.iter().enumerate() {
                        map.insert(key.clone(), (i as u64) + 100_000).unwrap();
                    }
                    assert_eq!(map.len(), keys.len());
                    for (i, key) in removed.iter().enumerate() {
                        assert_eq!(map.get(key), Some(&((i as u64) + 100_000)));
                    }
                }
            }
        );
    };
}

/// Generates the conformance suite for a map type with string keys.
#[macro_export]
macro_rules! generate_map_str_tests {
    ($Map:tt, $Hasher:tt, $factory:expr) => {
        #[test]
        fn test_insert_then_get_str() {
            use probetable_core::Map;
            use probetable_testing::Generate;
            use rand::SeedableRng;
            use rand_chacha::ChaCha20Rng;

            let mut rng = ChaCha20Rng::seed_from_u64(42);
            let keys = <String as Generate<ChaCha20Rng>>::generate_many(
                &mut rng,
                &Default::default(),
                1000,
            );
            let mut map: $Map<String, u64, $Hasher<String>> = $factory();
            for (i, key) in keys.iter().enumerate() {
                map.insert(key.clone(), i as u64).unwrap();
            }
            assert_eq!(map.len(), keys.len());
            for (i, key) in keys.iter().enumerate() {
                assert_eq!(map.get(key), Some(&(i as u64)), "key: {:?}", key);
            }
            assert_eq!(map.get(&"\u{0}absent\u{0}".to_string()), None);
        }

        #[test]
        fn test_remove_semantics_str() {
            use probetable_core::Map;

            let mut map: $Map<String, u64, $Hasher<String>> = $factory();
            map.insert("one".to_string(), 1).unwrap();
            map.insert("two".to_string(), 2).unwrap();
            map.insert("three".to_string(), 3).unwrap();

            assert!(map.remove(&"two".to_string()));
            assert_eq!(map.get(&"two".to_string()), None);
            assert!(!map.remove(&"two".to_string()));
            assert_eq!(map.get(&"one".to_string()), Some(&1));
            assert_eq!(map.get(&"three".to_string()), Some(&3));
            assert_eq!(map.len(), 2);
        }

        #[test]
        fn test_randomized_mixed_ops_str() {
            use probetable_core::Map;
            use probetable_testing::Generate;
            use rand::seq::SliceRandom;
            use rand::SeedableRng;
            use rand_chacha::ChaCha20Rng;

            let mut rng = ChaCha20Rng::seed_from_u64(42);
            let mut keys = <String as Generate<ChaCha20Rng>>::generate_many(
                &mut rng,
                &Default::default(),
                2000,
            )
            .into_vec();

            let mut map: $Map<String, u64, $Hasher<String>> = $factory();
            for (i, key) in keys.iter().enumerate() {
                map.insert(key.clone(), i as u64).unwrap();
            }
            keys.shuffle(&mut rng);
            let (removed, retained) = keys.split_at(keys.len() / 2);
            for key in removed {
                assert!(map.remove(key));
            }
            for key in removed {
                assert_eq!(map.get(key), None);
            }
            for key in retained {
                assert!(map.get(key).is_some());
            }
            for (i, key) in removed.iter().enumerate() {
                map.insert(key.clone(), (i as u64) + 100_000).unwrap();
            }
            assert_eq!(map.len(), keys.len());
            for (i, key) in removed.iter().enumerate() {
                assert_eq!(map.get(key), Some(&((i as u64) + 100_000)));
            }
        }
    };
}

/// Generates the full conformance suite for a map type: integer keys at two
/// widths plus string keys.
#[macro_export]
macro_rules! generate_map_tests {
    ($Map:tt, $Hasher:tt, $factory:expr) => {
        $crate::generate_map_int_tests!($Map, $Hasher, $factory, u64);
        $crate::generate_map_int_tests!($Map, $Hasher, $factory, u32);
        $crate::generate_map_str_tests!($Map, $Hasher, $factory);
    };
}
