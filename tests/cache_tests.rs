//! Integration tests for sharing runs between threads.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use runstore::prelude::*;
use runstore::RunCache;

fn temp_dir() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    std::env::temp_dir().join(format!(
        "runstore_cache_test_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

fn saved_run() -> PathBuf {
    let dir = temp_dir();
    let space = ConfigSpace::builder().add(IntHp::new("x", 0, 1000)).build().unwrap();
    let mut run = Run::builder()
        .space(space)
        .objective(Objective::new("cost", 0.0, 1.0))
        .path(&dir)
        .build()
        .unwrap();
    run.add(Observation::new(vec![Some(0.5)], Configuration::new().with("x", 0)))
        .unwrap();
    run.save().unwrap();
    dir
}

#[test]
fn concurrent_loads_share_one_run() {
    let dir = saved_run();
    let cache = Arc::new(RunCache::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let dir = dir.clone();
            thread::spawn(move || cache.get_or_load("run", &dir).unwrap())
        })
        .collect();
    let runs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for run in &runs[1..] {
        assert!(Arc::ptr_eq(&runs[0], run));
    }
    assert_eq!(cache.len(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn writers_are_serialized() {
    let dir = saved_run();
    let cache = Arc::new(RunCache::new());
    let shared = cache.get_or_load("run", &dir).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..25 {
                    let x = 1 + t * 25 + i;
                    shared
                        .write()
                        .add(Observation::new(vec![Some(0.1)], Configuration::new().with("x", x)))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let run = shared.read();
    assert_eq!(run.history().len(), 101);
    assert_eq!(run.configs().len(), 101);
    run.save().unwrap();
    drop(run);

    assert_eq!(Run::load(&dir).unwrap().history().len(), 101);
    fs::remove_dir_all(&dir).ok();
}
