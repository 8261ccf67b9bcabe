use crate::cache::{AccessOutcome, CacheStats};
use crate::error::CacheError;
use crate::replacement_policies::{LeastFrequentlyUsed, LeastRecentlyUsed};
use super::build_cache;

#[test]
fn single_line_direct_mapped() {
    let mut l1 = build_cache("L1", 0, 0, 1, LeastRecentlyUsed);
    let outcomes = [0x0, 0x1, 0x0].map(|address| l1.access(address).unwrap());
    assert_eq!(
        outcomes,
        [
            AccessOutcome::MissNoEvict { inserted: 0x0 },
            AccessOutcome::MissWithEvict { evicted: 0x0, inserted: 0x1 },
            AccessOutcome::MissWithEvict { evicted: 0x1, inserted: 0x0 },
        ]
    );
    assert_eq!(l1.stats(), CacheStats { hits: 0, misses: 3, evictions: 2 });
}

#[test]
fn lru_evicts_the_block_not_reused() {
    let mut c = build_cache("L1", 0, 0, 2, LeastRecentlyUsed);
    for address in [0xA, 0xB, 0xA] {
        c.access(address).unwrap();
    }
    assert_eq!(c.access(0xC).unwrap(), AccessOutcome::MissWithEvict { evicted: 0xB, inserted: 0xC });
    assert!(c.probe(0xA));
    assert!(!c.probe(0xB));
}

#[test]
fn lfu_evicts_the_least_frequent_block() {
    let mut c = build_cache("L1", 0, 0, 2, LeastFrequentlyUsed);
    for address in [0xA, 0xB, 0xA, 0xA] {
        c.access(address).unwrap();
    }
    assert_eq!(c.access(0xC).unwrap(), AccessOutcome::MissWithEvict { evicted: 0xB, inserted: 0xC });
    assert_eq!(c.stats(), CacheStats { hits: 2, misses: 3, evictions: 1 });
}

#[test]
fn lfu_and_lru_disagree_on_a_frequent_but_stale_block() {
    let mut lru = build_cache("L1", 0, 0, 2, LeastRecentlyUsed);
    let mut lfu = build_cache("L1", 0, 0, 2, LeastFrequentlyUsed);
    for address in [0xA, 0xA, 0xB] {
        lru.access(address).unwrap();
        lfu.access(address).unwrap();
    }
    assert_eq!(lru.access(0xC).unwrap().evicted(), Some(0xA));
    assert_eq!(lfu.access(0xC).unwrap().evicted(), Some(0xB));
}

#[test]
fn lfu_installed_lines_start_at_one() {
    // Both blocks were seen once, the tie goes to way 0
    let mut c = build_cache("L1", 0, 0, 2, LeastFrequentlyUsed);
    c.access(0xA).unwrap();
    c.access(0xB).unwrap();
    assert_eq!(c.set(0)[0].access_frequency, 1);
    assert_eq!(c.access(0xC).unwrap().evicted(), Some(0xA));
    // The new block starts over rather than inheriting the victim's count
    assert_eq!(c.set(0)[0].access_frequency, 1);
}

#[test]
fn evicted_block_is_rebuilt_from_tag_and_set() {
    let mut c = build_cache("L1", 1, 2, 1, LeastRecentlyUsed);
    assert_eq!(c.access(0x17).unwrap(), AccessOutcome::MissNoEvict { inserted: 0x14 });
    assert_eq!(c.access(0x15).unwrap(), AccessOutcome::Hit);
    assert_eq!(c.access(0x1c).unwrap(), AccessOutcome::MissWithEvict { evicted: 0x14, inserted: 0x1c });
    // Set 0 is untouched
    assert!(c.has_vacancy(0x0));
    assert!(!c.has_vacancy(0x4));
}

#[test]
fn probe_touches_no_counters() {
    let mut c = build_cache("L1", 1, 2, 2, LeastRecentlyUsed);
    c.access(0x40).unwrap();
    let stats = c.stats();
    let tick = c.tick();
    assert!(c.probe(0x41));
    assert!(c.probe(0x41));
    assert!(!c.probe(0x80));
    assert_eq!(c.stats(), stats);
    assert_eq!(c.tick(), tick);
}

#[test]
fn find_way_locates_blocks() {
    let mut c = build_cache("L1", 0, 2, 4, LeastRecentlyUsed);
    for address in [0x0, 0x4, 0x8] {
        c.access(address).unwrap();
    }
    assert_eq!(c.find_way(0x9), Some(2));
    assert_eq!(c.find_way(0x0), Some(0));
    assert_eq!(c.find_way(0xc), None);
    assert!(c.has_vacancy(0xc));
    assert_eq!(c.occupancy(0xc), 3);
}

#[test]
fn victim_requires_a_full_set() {
    let mut c = build_cache("L1", 1, 2, 2, LeastRecentlyUsed);
    c.access(0x0).unwrap();
    assert_eq!(c.select_victim_way(0x8), Err(CacheError::NoVictimAvailable { address: 0x8, set: 0 }));
    c.access(0x8).unwrap();
    assert_eq!(c.select_victim_way(0x10), Ok(0));
}

#[test]
fn evict_and_install_ways_directly() {
    let mut c = build_cache("L1", 1, 2, 2, LeastRecentlyUsed);
    c.access(0x4).unwrap();
    assert_eq!(c.evict_way(0x4, 0), Ok(Some(0x4)));
    assert_eq!(c.evict_way(0x4, 0), Ok(None));
    assert_eq!(c.stats().evictions, 1);
    c.install_way(0xc, 1).unwrap();
    assert_eq!(c.find_way(0xc), Some(1));
    assert_eq!(c.stats().misses, 1);
}

#[test]
fn ways_past_the_set_are_rejected() {
    // Set 0's way 2 would be set 1's way 0 in the flat line storage
    let mut c = build_cache("L1", 1, 2, 2, LeastRecentlyUsed);
    c.access(0x4).unwrap();
    assert_eq!(c.install_way(0x0, 2), Err(CacheError::WayOutOfRange { address: 0x0, way: 2, ways: 2 }));
    assert_eq!(c.evict_way(0x0, 2), Err(CacheError::WayOutOfRange { address: 0x0, way: 2, ways: 2 }));
    assert_eq!(c.evict_way(0x4, 7), Err(CacheError::WayOutOfRange { address: 0x4, way: 7, ways: 2 }));
    assert_eq!(c.set_blocks(0x4), vec![0x4]);
    assert!(c.has_vacancy(0x0));
    assert_eq!(c.stats().evictions, 0);
}

#[test]
fn flush_removes_exact_blocks_only() {
    let mut c = build_cache("L1", 1, 2, 2, LeastRecentlyUsed);
    c.access(0x10).unwrap();
    assert!(!c.flush(0x11));
    assert!(!c.flush(0x20));
    assert!(c.flush(0x10));
    assert!(!c.probe(0x10));
    assert!(!c.flush(0x10));
    assert_eq!(c.stats(), CacheStats { hits: 0, misses: 1, evictions: 0 });
}

#[test]
fn fill_installs_without_counting_references() {
    let mut c = build_cache("L2", 0, 2, 2, LeastRecentlyUsed);
    assert_eq!(c.fill(0x0), Ok(None));
    assert_eq!(c.fill(0x4), Ok(None));
    assert_eq!(c.fill(0x4), Ok(None));
    assert_eq!(c.fill(0x8), Ok(Some(0x0)));
    assert_eq!(c.stats(), CacheStats { hits: 0, misses: 0, evictions: 1 });
    assert_eq!(c.set_blocks(0x0), vec![0x8, 0x4]);
}

#[test]
fn lookup_counts_without_installing() {
    let mut c = build_cache("L2", 0, 2, 2, LeastRecentlyUsed);
    assert!(!c.lookup(0x0));
    assert!(!c.probe(0x0));
    c.fill(0x0).unwrap();
    assert!(c.lookup(0x3));
    assert_eq!(c.stats(), CacheStats { hits: 1, misses: 1, evictions: 0 });
}

#[test]
fn valid_blocks_and_vacancies() {
    let mut c = build_cache("L1", 2, 2, 2, LeastRecentlyUsed);
    assert_eq!(c.vacant_line_count(), 8);
    for address in [0x0, 0x4, 0x10, 0x3c] {
        c.access(address).unwrap();
    }
    let mut blocks: Vec<_> = c.valid_blocks().collect();
    blocks.sort();
    assert_eq!(blocks, vec![0x0, 0x4, 0x10, 0x3c]);
    assert_eq!(c.vacant_line_count(), 4);
}
