//! Integration tests for StrataKV
//!
//! Higher-level tests spanning multiple components:
//! - Recovery round-trip: reopening reproduces the committed state
//! - Concurrent readers over a quiescent database
//! - Compaction: space reclaim, history collapse, atomic swap
//! - The text file format end to end
//! - Open-time configuration validation

use std::thread;

use stratakv::{Codec, Config, Database, StrataError};
use tempfile::TempDir;

const USERS: u8 = b'u';
const ORDERS: u8 = b'o';

// =============================================================================
// Helper Functions
// =============================================================================

fn users_orders_config(path: &std::path::Path) -> Config {
    Config::new(path).group(USERS, 16).group(ORDERS, 4)
}

/// Snapshot of one group: chronological (key, latest value, history length)
fn snapshot(db: &Database, group: u8) -> Vec<(Vec<u8>, Vec<u8>, usize)> {
    db.read(|r| {
        let group = r.group(group).unwrap();
        let mut entries = Vec::new();
        let mut cursor = group.oldest();
        while let Some(current) = cursor {
            let history = current.history();
            entries.push((
                current.key().to_vec(),
                history.latest_value()?,
                history.len(),
            ));
            cursor = current.next();
        }
        Ok(entries)
    })
    .unwrap()
}

// =============================================================================
// Recovery Round-Trip Tests
// =============================================================================

#[test]
fn test_reopen_reproduces_committed_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(users_orders_config(&path)).unwrap();
    db.read_write(|_, w| {
        let mut users = w.group(USERS);
        users.put(b"ada", b"lovelace")?;
        users.put(b"grace", b"hopper")?;
        users.put(b"alan", b"turing")?;
        Ok(())
    })
    .unwrap();
    db.read_write(|_, w| {
        w.group(USERS).put(b"ada", b"countess")?;
        w.group(USERS).delete(b"alan")?;
        w.group(ORDERS).put(b"o1", b"engine")?;
        Ok(())
    })
    .unwrap();

    let users_before = snapshot(&db, USERS);
    let orders_before = snapshot(&db, ORDERS);
    let size_before = db.size();
    db.close().unwrap();

    let db = Database::open(users_orders_config(&path)).unwrap();
    assert_eq!(db.size(), size_before);
    assert_eq!(snapshot(&db, USERS), users_before);
    assert_eq!(snapshot(&db, ORDERS), orders_before);

    // And the reopened database accepts further writes
    db.read_write(|_, w| w.group(USERS).put(b"grace", b"rear admiral"))
        .unwrap();
    db.read(|r| {
        let history = r.group(USERS).unwrap().seek(b"grace").unwrap().history();
        assert_eq!(history.len(), 2);
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_many_transactions_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(users_orders_config(&path)).unwrap();
    for i in 0..50u32 {
        let key = format!("key{}", i % 10).into_bytes();
        if i % 7 == 3 {
            db.read_write(|_, w| w.group(USERS).delete(&key)).unwrap();
        } else {
            let value = format!("value{i}").into_bytes();
            db.read_write(|_, w| w.group(USERS).put(&key, &value))
                .unwrap();
        }
    }

    let before = snapshot(&db, USERS);
    db.close().unwrap();

    let db = Database::open(users_orders_config(&path)).unwrap();
    assert_eq!(snapshot(&db, USERS), before);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_see_identical_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(users_orders_config(&path)).unwrap();
    db.read_write(|_, w| {
        let mut users = w.group(USERS);
        for i in 0..100u32 {
            users.put(format!("key{i}").as_bytes(), format!("value{i}").as_bytes())?;
        }
        Ok(())
    })
    .unwrap();

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..20 {
                    db.read(|r| {
                        let users = r.group(USERS).unwrap();
                        assert_eq!(users.count(), 100);
                        assert_eq!(users.get(b"key42").unwrap().unwrap(), b"value42");
                        assert_eq!(users.get(b"key99").unwrap().unwrap(), b"value99");
                        Ok(())
                    })
                    .unwrap();
                }
            });
        }
    });
}

#[test]
fn test_readers_interleaved_with_writers() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(users_orders_config(&path)).unwrap();
    db.read_write(|_, w| w.group(USERS).put(b"counter", b"0"))
        .unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 1..=25u32 {
                db.read_write(|_, w| w.group(USERS).put(b"counter", i.to_string().as_bytes()))
                    .unwrap();
            }
        });

        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    // Every read observes some fully committed value
                    let value = db
                        .read(|r| r.group(USERS).unwrap().get(b"counter"))
                        .unwrap()
                        .unwrap();
                    let parsed: u32 = String::from_utf8(value).unwrap().parse().unwrap();
                    assert!(parsed <= 25);
                }
            });
        }
    });

    db.read(|r| {
        let history = r.group(USERS).unwrap().seek(b"counter").unwrap().history();
        assert_eq!(history.len(), 26);
        assert_eq!(history.latest_value().unwrap(), b"25");
        Ok(())
    })
    .unwrap();
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compaction_reclaims_space_and_collapses_history() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(users_orders_config(&path)).unwrap();
    for i in 0..20u32 {
        db.read_write(|_, w| w.group(USERS).put(b"hot", format!("revision{i}").as_bytes()))
            .unwrap();
    }
    db.read_write(|_, w| w.group(USERS).put(b"cold", b"unchanged"))
        .unwrap();
    db.read_write(|_, w| w.group(USERS).put(b"doomed", b"bytes"))
        .unwrap();
    db.read_write(|_, w| w.group(USERS).delete(b"doomed")).unwrap();

    let before = snapshot(&db, USERS);
    let stats = db.compact().unwrap();

    assert!(stats.bytes_after < stats.bytes_before);
    assert_eq!(stats.live_keys, 2);
    assert_eq!(db.size(), stats.bytes_after);

    // Same live state, but histories collapse to the latest version
    let after = snapshot(&db, USERS);
    assert_eq!(
        after,
        before
            .iter()
            .map(|(key, value, _)| (key.clone(), value.clone(), 1))
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_compacted_log_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(users_orders_config(&path)).unwrap();
    db.read_write(|_, w| {
        let mut users = w.group(USERS);
        users.put(b"a", b"1")?;
        users.put(b"b", b"2")?;
        Ok(())
    })
    .unwrap();
    db.read_write(|_, w| w.group(USERS).put(b"a", b"1.1")).unwrap();
    db.compact().unwrap();

    // Writes after compaction land in the rewritten log
    db.read_write(|_, w| w.group(USERS).put(b"c", b"3")).unwrap();

    let before = snapshot(&db, USERS);
    let size_before = db.size();
    db.close().unwrap();

    let db = Database::open(users_orders_config(&path)).unwrap();
    assert_eq!(db.size(), size_before);
    assert_eq!(snapshot(&db, USERS), before);

    let keys: Vec<Vec<u8>> = snapshot(&db, USERS).into_iter().map(|(k, _, _)| k).collect();
    assert_eq!(keys, [b"b".to_vec(), b"a".to_vec(), b"c".to_vec()]);
}

// =============================================================================
// Text Format End-to-End Tests
// =============================================================================

#[test]
fn test_text_format_full_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.stratatxt");
    let config = || Config::new(&path).with_codec(Codec::text()).group(USERS, 8);

    let db = Database::open(config()).unwrap();
    db.read_write(|_, w| {
        let mut users = w.group(USERS);
        users.put(b"007", b"James")?;
        users.put(b"006", b"Alec")?;
        Ok(())
    })
    .unwrap();
    db.read_write(|_, w| w.group(USERS).put(b"007", b"Bond"))
        .unwrap();
    db.read_write(|_, w| w.group(USERS).delete(b"006")).unwrap();

    let before = snapshot(&db, USERS);
    db.close().unwrap();

    let db = Database::open(config()).unwrap();
    assert_eq!(snapshot(&db, USERS), before);
    db.read(|r| {
        let history = r.group(USERS).unwrap().seek(b"007").unwrap().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history.value(0).unwrap(), b"James");
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_text_format_rejects_separator_in_payload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(Config::new(&path).with_codec(Codec::text()).group(USERS, 8)).unwrap();

    let result = db.read_write(|_, w| w.group(USERS).put(b"bad key", b"v"));
    assert!(matches!(
        result.unwrap_err(),
        StrataError::SeparatorCollision { field: "key", .. }
    ));
    assert_eq!(db.size(), 0);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_reserved_commit_group_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let result = Database::open(Config::new(&path).group(0xFF, 8));
    assert!(matches!(result.unwrap_err(), StrataError::Config(_)));
}

#[test]
fn test_empty_path_rejected() {
    let result = Database::open(Config::new("").group(USERS, 8));
    assert!(matches!(result.unwrap_err(), StrataError::Config(_)));
}

#[test]
fn test_zero_bucket_group_works() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.strata");

    let db = Database::open(Config::new(&path).group(USERS, 0)).unwrap();
    db.read_write(|_, w| {
        let mut users = w.group(USERS);
        users.put(b"a", b"1")?;
        users.put(b"b", b"2")?;
        Ok(())
    })
    .unwrap();
    db.read(|r| {
        let users = r.group(USERS).unwrap();
        assert_eq!(users.count(), 2);
        assert_eq!(users.get(b"b").unwrap().unwrap(), b"2");
        Ok(())
    })
    .unwrap();
}
