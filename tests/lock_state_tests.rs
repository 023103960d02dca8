use chrono::Duration;
use zkcheckin::config::Config;
use zkcheckin::core::lock::{SyncLock, lock_key};
use zkcheckin::core::sync::SyncLogic;
use zkcheckin::db::cache;
use zkcheckin::db::pool::DbPool;
use zkcheckin::db::state::{GLOBAL_SCOPE, SyncState, load_state, save_state};
use zkcheckin::errors::AppError;

mod common;
use common::{fixed_now, ts};

#[test]
fn lock_keys() {
    assert_eq!(lock_key(None), "zkteco_sync_lock");
    assert_eq!(lock_key(Some("Main Gate")), "zkteco_sync_lock:Main Gate");
}

#[test]
fn held_lock_refuses_second_holder() {
    let pool = DbPool::in_memory().unwrap();
    let key = lock_key(Some("front"));
    let guard = SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), fixed_now()).unwrap();
    assert_eq!(guard.key(), key);

    let err = SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), fixed_now()).unwrap_err();
    assert!(matches!(err, AppError::AlreadyRunning(k) if k == key));

    // other devices are independent
    let other = SyncLock::acquire(&pool.conn, lock_key(Some("back")), Duration::minutes(5), fixed_now());
    assert!(other.is_ok());
}

#[test]
fn dropping_the_guard_releases() {
    let pool = DbPool::in_memory().unwrap();
    let key = lock_key(None);
    {
        let _guard = SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), fixed_now()).unwrap();
        assert!(cache::get(&pool.conn, &key, fixed_now()).unwrap().is_some());
    }
    assert!(cache::get(&pool.conn, &key, fixed_now()).unwrap().is_none());
    assert!(SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), fixed_now()).is_ok());
}

#[test]
fn abandoned_lock_expires_after_ttl() {
    let pool = DbPool::in_memory().unwrap();
    let key = lock_key(None);
    let guard = SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), fixed_now()).unwrap();
    // simulate a crashed holder
    std::mem::forget(guard);

    let early = SyncLock::acquire(
        &pool.conn,
        &key,
        Duration::minutes(5),
        fixed_now() + Duration::minutes(4),
    );
    assert!(matches!(early, Err(AppError::AlreadyRunning(_))));

    let late = SyncLock::acquire(
        &pool.conn,
        &key,
        Duration::minutes(5),
        fixed_now() + Duration::minutes(6),
    );
    assert!(late.is_ok());
}

#[test]
fn expired_guard_does_not_release_the_new_holder() {
    let pool = DbPool::in_memory().unwrap();
    let key = lock_key(Some("front"));
    let later = fixed_now() + Duration::minutes(6);

    let stale = SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), fixed_now()).unwrap();
    let current = SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), later).unwrap();

    drop(stale);
    assert!(cache::get(&pool.conn, &key, later).unwrap().is_some());
    assert!(matches!(
        SyncLock::acquire(&pool.conn, &key, Duration::minutes(5), later),
        Err(AppError::AlreadyRunning(_))
    ));

    drop(current);
    assert!(cache::get(&pool.conn, &key, later).unwrap().is_none());
}

#[test]
fn cache_get_set_delete() {
    let pool = DbPool::in_memory().unwrap();
    let now = fixed_now();

    cache::set(&pool.conn, "k", "v1", Some(Duration::seconds(60)), now).unwrap();
    assert_eq!(cache::get(&pool.conn, "k", now).unwrap().as_deref(), Some("v1"));
    assert_eq!(
        cache::get(&pool.conn, "k", now + Duration::seconds(60)).unwrap(),
        None
    );

    cache::set(&pool.conn, "k", "v2", None, now).unwrap();
    assert_eq!(
        cache::get(&pool.conn, "k", now + Duration::days(365)).unwrap().as_deref(),
        Some("v2")
    );

    // add never overwrites a live entry
    assert!(!cache::add(&pool.conn, "k", "v3", None, now).unwrap());
    assert!(cache::add(&pool.conn, "fresh", "x", None, now).unwrap());

    assert!(!cache::delete_if(&pool.conn, "k", "v1").unwrap());
    assert!(cache::delete_if(&pool.conn, "fresh", "x").unwrap());
    assert!(cache::delete(&pool.conn, "k").unwrap());
    assert!(!cache::delete(&pool.conn, "k").unwrap());
    assert_eq!(cache::get(&pool.conn, "k", now).unwrap(), None);
}

#[test]
fn sync_state_round_trip() {
    let pool = DbPool::in_memory().unwrap();

    assert_eq!(load_state(&pool.conn, "front").unwrap(), SyncState::default());

    let state = SyncState {
        last_sync: Some(ts("2025-06-02 11:55:00")),
        total_synced: 12,
    };
    save_state(&pool.conn, "front", &state).unwrap();
    assert_eq!(load_state(&pool.conn, "front").unwrap(), state);

    let updated = SyncState {
        last_sync: Some(fixed_now()),
        total_synced: 15,
    };
    save_state(&pool.conn, "front", &updated).unwrap();
    assert_eq!(load_state(&pool.conn, "front").unwrap(), updated);
    assert_eq!(load_state(&pool.conn, GLOBAL_SCOPE).unwrap(), SyncState::default());
}

#[test]
fn scheduled_sync_due_after_interval() {
    let cfg = Config::default();
    assert_eq!(cfg.sync_interval_seconds, 300);

    let never = SyncState::default();
    assert!(SyncLogic::is_due(&cfg, &never, fixed_now()));

    let recent = SyncState {
        last_sync: Some(fixed_now() - Duration::seconds(299)),
        total_synced: 0,
    };
    assert!(!SyncLogic::is_due(&cfg, &recent, fixed_now()));

    let stale = SyncState {
        last_sync: Some(fixed_now() - Duration::seconds(300)),
        total_synced: 0,
    };
    assert!(SyncLogic::is_due(&cfg, &stale, fixed_now()));
}

#[test]
fn fetch_window_starts_at_checkpoint() {
    let first = SyncLogic::window_for(&SyncState::default(), fixed_now());
    assert_eq!(first.start, fixed_now() - Duration::hours(1));
    assert_eq!(first.end, fixed_now());

    let last = ts("2025-06-02 08:00:00");
    let next = SyncLogic::window_for(
        &SyncState {
            last_sync: Some(last),
            total_synced: 3,
        },
        fixed_now(),
    );
    assert_eq!(next.start, last);
}
