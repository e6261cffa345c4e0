use std::collections::HashSet;

use super::diff::*;
use crate::discovery::KeyValuePair;

fn snapshot(pairs: &[(&str, &str)]) -> Snapshot {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn listing(pairs: &[(&str, &str)]) -> Vec<KeyValuePair> {
    pairs.iter().map(|(k, v)| KeyValuePair::new(*k, *v)).collect()
}

#[test]
fn test_diff_mixed() {
    let old = snapshot(&[("a", "1"), ("b", "2")]);
    let (changes, current) = diff("root", &old, listing(&[("b", "2"), ("c", "3")]));

    assert_eq!(changes.root, "root");
    assert_eq!(changes.additions, vec![ChangeUnit::new("c", "3")]);
    assert!(changes.modifications.is_empty());
    assert_eq!(changes.deletions, vec![ChangeUnit::new("a", "")]);
    assert_eq!(current, snapshot(&[("b", "2"), ("c", "3")]));
}

#[test]
fn test_diff_modification_only() {
    let old = snapshot(&[("a", "1")]);
    let (changes, current) = diff("root", &old, listing(&[("a", "2")]));

    assert!(changes.additions.is_empty());
    assert_eq!(changes.modifications, vec![ChangeUnit::new("a", "2")]);
    assert!(changes.deletions.is_empty());
    assert_eq!(current, snapshot(&[("a", "2")]));
}

#[test]
fn test_diff_identical_content_is_empty() {
    let content = [("a", "1"), ("b", "2"), ("c", "")];
    let (first, current) = diff("root", &Snapshot::new(), listing(&content));
    assert_eq!(first.additions.len(), 3);

    let (second, again) = diff("root", &current, listing(&content));
    assert!(second.is_empty());
    assert_eq!(again, current);
}

#[test]
fn test_diff_surviving_keys_are_not_reported_deleted() {
    let old = snapshot(&[("kept", "x"), ("changed", "1"), ("gone", "y")]);
    let (changes, _) = diff(
        "root",
        &old,
        listing(&[("kept", "x"), ("changed", "2"), ("new", "z")]),
    );

    assert_eq!(changes.deletions, vec![ChangeUnit::new("gone", "")]);
}

#[test]
fn test_diff_everything_deleted() {
    let old = snapshot(&[("b", "2"), ("a", "1")]);
    let (changes, current) = diff("root", &old, Vec::new());

    assert_eq!(
        changes.deletions,
        vec![ChangeUnit::new("a", ""), ChangeUnit::new("b", "")]
    );
    assert!(current.is_empty());
}

#[test]
fn test_diff_keeps_fetch_order_for_additions() {
    let (changes, _) = diff("root", &Snapshot::new(), listing(&[("z", "1"), ("a", "2"), ("m", "3")]));
    let keys: Vec<&str> = changes.additions.iter().map(|u| u.path.as_str()).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

/// Each key of the union lands in exactly one category, over every
/// combination of four keys being absent / "v1" / "v2" before and after.
#[test]
fn test_diff_partitions_every_key() {
    const KEYS: [&str; 4] = ["a", "b", "c", "d"];
    const STATES: [Option<&str>; 3] = [None, Some("v1"), Some("v2")];

    let combos = 3usize.pow(KEYS.len() as u32);
    for old_code in 0..combos {
        for new_code in 0..combos {
            let pick = |mut code: usize| -> Vec<(&'static str, &'static str)> {
                let mut pairs = Vec::new();
                for key in KEYS {
                    if let Some(v) = STATES[code % 3] {
                        pairs.push((key, v));
                    }
                    code /= 3;
                }
                pairs
            };
            let old_pairs = pick(old_code);
            let new_pairs = pick(new_code);
            let old = snapshot(&old_pairs);
            let new = snapshot(&new_pairs);

            let (changes, current) = diff("root", &old, listing(&new_pairs));
            assert_eq!(current, new);

            let added: HashSet<&str> = changes.additions.iter().map(|u| u.path.as_str()).collect();
            let modified: HashSet<&str> = changes.modifications.iter().map(|u| u.path.as_str()).collect();
            let deleted: HashSet<&str> = changes.deletions.iter().map(|u| u.path.as_str()).collect();

            for key in KEYS {
                let expected = match (old.get(key), new.get(key)) {
                    (None, None) => None,
                    (None, Some(_)) => Some("added"),
                    (Some(_), None) => Some("deleted"),
                    (Some(before), Some(after)) if before != after => Some("modified"),
                    (Some(_), Some(_)) => None,
                };
                let hits = [
                    ("added", added.contains(key)),
                    ("modified", modified.contains(key)),
                    ("deleted", deleted.contains(key)),
                ];
                let found: Vec<&str> = hits.iter().filter(|(_, hit)| *hit).map(|(name, _)| *name).collect();
                assert_eq!(found, expected.into_iter().collect::<Vec<_>>(), "key {key}: {old:?} -> {new:?}");
            }
        }
    }
}

#[test]
fn test_change_set_serializes_notification_body() {
    let changes = ChangeSet {
        root: "app/config".to_string(),
        additions: vec![ChangeUnit::new("app/config/c", "3")],
        modifications: vec![],
        deletions: vec![ChangeUnit::new("app/config/a", "")],
    };

    let body = serde_json::to_value(&changes).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "root": "app/config",
            "addition": [{ "path_on_change": "app/config/c", "value": "3" }],
            "modification": [],
            "deletion": [{ "path_on_change": "app/config/a", "value": "" }]
        })
    );
}
