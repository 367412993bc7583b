//! Property-based tests for gitup-updater.
//!
//! These tests use proptest to verify correctness properties across
//! randomly generated inputs.
//!
//! # Properties Tested
//!
//! - Property 1: Version ordering is a total order
//! - Property 2: Numeric components compare numerically
//! - Property 3: Update selection returns the maximum newer tag
//! - Property 4: Error log stays bounded and newest-first

#![cfg(test)]

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::engine::select_update;
use crate::error::FetchFailure;
use crate::error_log::{ErrorLog, ErrorLogEntry};
use crate::store::MemoryOptionStore;
use crate::tags::TagRecord;
use crate::version::{compare, is_newer};

// =============================================================================
// Generators
// =============================================================================

/// Generate a plausible tag name: dotted numbers with optional prefix and
/// pre-release suffix.
fn arb_version_string() -> impl Strategy<Value = String> {
    (
        prop::bool::ANY,
        prop::collection::vec(0u32..30, 1..5),
        prop::option::of(prop_oneof![
            Just("dev".to_string()),
            Just("alpha".to_string()),
            Just("beta.2".to_string()),
            Just("rc1".to_string()),
            "[a-z]{1,6}",
            "[0-9]{1,3}",
        ]),
    )
        .prop_map(|(prefix, parts, suffix)| {
            let mut s = if prefix { "v".to_string() } else { String::new() };
            s.push_str(
                &parts
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join("."),
            );
            if let Some(suffix) = suffix {
                s.push('-');
                s.push_str(&suffix);
            }
            s
        })
}

/// Generate arbitrary text, including strings that are not versions at all.
fn arb_any_string() -> impl Strategy<Value = String> {
    prop_oneof![arb_version_string(), ".{0,16}"]
}

fn log_entry(i: usize) -> ErrorLogEntry {
    ErrorLogEntry {
        item: format!("item-{i}"),
        time: Utc.timestamp_opt(i as i64, 0).unwrap(),
        target: String::new(),
        response: FetchFailure::Transport {
            message: "unreachable".to_string(),
        },
    }
}

// =============================================================================
// Property 1: Version ordering is a total order
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every string compares equal to itself.
    #[test]
    fn prop_compare_reflexive(a in arb_any_string()) {
        prop_assert_eq!(compare(&a, &a), Ordering::Equal);
    }

    /// Swapping arguments reverses the result.
    #[test]
    fn prop_compare_antisymmetric(a in arb_any_string(), b in arb_any_string()) {
        prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
    }

    /// a <= b and b <= c implies a <= c.
    #[test]
    fn prop_compare_transitive(
        a in arb_version_string(),
        b in arb_version_string(),
        c in arb_version_string(),
    ) {
        let mut sorted = vec![a, b, c];
        sorted.sort_by(|x, y| compare(x, y));
        prop_assert_ne!(compare(&sorted[0], &sorted[1]), Ordering::Greater);
        prop_assert_ne!(compare(&sorted[1], &sorted[2]), Ordering::Greater);
        prop_assert_ne!(compare(&sorted[0], &sorted[2]), Ordering::Greater);
    }
}

// =============================================================================
// Property 2: Numeric components compare numerically
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Release versions order like their component tuples.
    #[test]
    fn prop_release_matches_tuple_order(
        a in (0u64..1000, 0u64..1000, 0u64..1000),
        b in (0u64..1000, 0u64..1000, 0u64..1000),
    ) {
        let sa = format!("{}.{}.{}", a.0, a.1, a.2);
        let sb = format!("{}.{}.{}", b.0, b.1, b.2);
        prop_assert_eq!(compare(&sa, &sb), a.cmp(&b));
    }

    /// Trailing zero components never change the ordering.
    #[test]
    fn prop_trailing_zeros_equal(v in arb_version_string(), zeros in 1usize..4) {
        prop_assume!(!v.contains('-'));
        let padded = format!("{}{}", v, ".0".repeat(zeros));
        prop_assert_eq!(compare(&v, &padded), Ordering::Equal);
    }
}

// =============================================================================
// Property 3: Update selection returns the maximum newer tag
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The selected tag is newer than installed and no other tag beats it;
    /// nothing is selected only when no tag is newer.
    #[test]
    fn prop_select_update_is_maximum(
        installed in arb_version_string(),
        names in prop::collection::vec(arb_any_string(), 0..12),
    ) {
        let tags: Vec<TagRecord> = names
            .iter()
            .map(|n| TagRecord::new(n.clone(), format!("https://example.com/{n}.zip")))
            .collect();

        match select_update(&installed, &tags) {
            Some(selected) => {
                prop_assert!(is_newer(&selected.name, &installed));
                for tag in &tags {
                    prop_assert_ne!(compare(&tag.name, &selected.name), Ordering::Greater);
                }
            }
            None => {
                for tag in &tags {
                    prop_assert!(!is_newer(&tag.name, &installed));
                }
            }
        }
    }
}

// =============================================================================
// Property 4: Error log stays bounded and newest-first
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_error_log_bounded(capacity in 1usize..30, appends in 0usize..60) {
        let log = ErrorLog::with_capacity(Arc::new(MemoryOptionStore::new()), capacity);
        for i in 0..appends {
            log.append(log_entry(i)).unwrap();
        }

        let entries = log.load().unwrap();
        prop_assert_eq!(entries.len(), appends.min(capacity));
        for (pos, entry) in entries.iter().enumerate() {
            prop_assert_eq!(&entry.item, &format!("item-{}", appends - 1 - pos));
        }
    }
}
