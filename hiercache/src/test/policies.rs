use crate::cache::Line;
use crate::replacement_policies::{GenericPolicy, LeastFrequentlyUsed, LeastRecentlyUsed, ReplacementPolicy};

fn line(valid: bool, last_used_tick: u64, access_frequency: u64) -> Line {
    Line { valid, tag: 0, last_used_tick, access_frequency }
}

#[test]
fn lru_picks_the_oldest_valid_line() {
    let lines = [line(true, 5, 0), line(false, 1, 0), line(true, 3, 0), line(true, 4, 0)];
    assert_eq!(LeastRecentlyUsed.select_victim(&lines), Some(2));
}

#[test]
fn lfu_picks_the_least_used_valid_line() {
    let lines = [line(true, 0, 4), line(true, 0, 2), line(false, 0, 0), line(true, 0, 3)];
    assert_eq!(LeastFrequentlyUsed.select_victim(&lines), Some(1));
}

#[test]
fn ties_go_to_the_lowest_way() {
    let lines = [line(false, 0, 0), line(true, 7, 2), line(true, 7, 2)];
    assert_eq!(LeastRecentlyUsed.select_victim(&lines), Some(1));
    assert_eq!(LeastFrequentlyUsed.select_victim(&lines), Some(1));
}

#[test]
fn no_victim_in_an_empty_set() {
    let lines = [line(false, 0, 0); 4];
    assert_eq!(LeastRecentlyUsed.select_victim(&lines), None);
    assert_eq!(GenericPolicy::from(LeastFrequentlyUsed).select_victim(&lines), None);
}

#[test]
fn install_and_hit_update_metadata() {
    let mut l = line(true, 0, 9);
    LeastFrequentlyUsed.on_install(&mut l, 3);
    assert_eq!(l.access_frequency, 1);
    LeastFrequentlyUsed.on_hit(&mut l, 4);
    LeastFrequentlyUsed.on_hit(&mut l, 5);
    assert_eq!(l.access_frequency, 3);
    assert_eq!(l.last_used_tick, 0);

    LeastRecentlyUsed.on_install(&mut l, 6);
    assert_eq!(l.last_used_tick, 6);
    GenericPolicy::from(LeastRecentlyUsed).on_hit(&mut l, 8);
    assert_eq!(l.last_used_tick, 8);
    assert_eq!(l.access_frequency, 3);
}
