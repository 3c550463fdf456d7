//! One slow or unresponsive shell must not hold up the rest of the registry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pretty_assertions::assert_eq;
use ptydeck_core::transport::{self, EventReceiver};
use ptydeck_core::{HostPlatform, MemorySpawner, Outcome, SessionRegistry, ShellProbe};
use tokio::time::timeout;

struct StaticProbe;

impl ShellProbe for StaticProbe {
    fn var(&self, key: &str) -> Option<String> {
        match key {
            "HOME" => Some("/home/deck".to_owned()),
            "SHELL" => Some("/bin/bash".to_owned()),
            _ => None,
        }
    }

    fn which(&self, _program: &str) -> Option<PathBuf> {
        None
    }

    fn exists(&self, _path: &Path) -> bool {
        false
    }

    fn current_dir(&self) -> Option<PathBuf> {
        None
    }
}

fn registry() -> (SessionRegistry, MemorySpawner, EventReceiver) {
    let spawner = MemorySpawner::new();
    let (events_tx, events_rx) = transport::event_channel();
    let registry = SessionRegistry::builder(spawner.clone(), events_tx)
        .platform(HostPlatform::Unix)
        .probe(StaticProbe)
        .build();
    (registry, spawner, events_rx)
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(condition(), "condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocked_write_leaves_other_sessions_and_destroy_working() {
    let (registry, spawner, _events) = registry();
    assert!(registry.create("stuck").is_applied());
    assert!(registry.create("other").is_applied());
    let mut handles = spawner.handles();
    let other = handles.remove(1);
    let stuck = handles.remove(0);

    stuck.pause_writes();
    let blocked = {
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || registry.write_input("stuck", "yes\r"))
    };
    wait_until(|| stuck.blocked_writes() == 1).await;

    assert!(registry.write_input("other", "ls\r").is_applied());
    assert!(registry.resize("other", 100, 40).is_applied());
    assert_eq!(
        registry.session_ids(),
        vec!["other".to_owned(), "stuck".to_owned()]
    );
    assert!(registry.create("third").is_applied());

    // Killing the unresponsive shell is what releases its pending write.
    assert!(registry.destroy("stuck").is_applied());
    let outcome = timeout(Duration::from_secs(5), blocked)
        .await
        .expect("write released by destroy")
        .expect("write task joined");

    assert!(matches!(outcome, Outcome::Absorbed(_)));
    assert!(stuck.writes().is_empty());
    assert_eq!(stuck.kill_count(), 1);
    assert_eq!(other.written_text(), "ls\r");
    assert_eq!(registry.active_session_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_spawn_reserves_its_id_without_blocking_others() {
    let (registry, spawner, _events) = registry();
    assert!(registry.create("ready").is_applied());
    let ready = spawner.last_handle().expect("ready spawned");

    spawner.pause_spawns();
    let starting = {
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || registry.create("slow"))
    };
    wait_until(|| spawner.blocked_spawns() == 1).await;

    assert!(matches!(registry.create("slow"), Outcome::AlreadyLive));
    assert!(!registry.is_live("slow"));
    assert!(registry.write_input("ready", "pwd\r").is_applied());
    assert_eq!(registry.session_ids(), vec!["ready".to_owned()]);
    assert!(registry.destroy("slow").is_applied());

    spawner.resume_spawns();
    let outcome = timeout(Duration::from_secs(5), starting)
        .await
        .expect("spawn finished")
        .expect("create task joined");

    assert!(matches!(outcome, Outcome::Cancelled));
    assert!(!registry.is_live("slow"));
    let slow = spawner.last_handle().expect("slow spawned");
    assert_eq!(slow.kill_count(), 1);
    assert_eq!(spawner.spawn_count(), 2);
    assert_eq!(ready.written_text(), "pwd\r");

    assert!(registry.create("slow").is_applied());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_cancels_sessions_still_starting() {
    let (registry, spawner, _events) = registry();
    spawner.pause_spawns();
    let starting = {
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || registry.create("late"))
    };
    wait_until(|| spawner.blocked_spawns() == 1).await;

    assert_eq!(registry.shutdown(), 0);
    spawner.resume_spawns();
    let outcome = timeout(Duration::from_secs(5), starting)
        .await
        .expect("spawn finished")
        .expect("create task joined");

    assert!(matches!(outcome, Outcome::Cancelled));
    assert_eq!(registry.active_session_count(), 0);
    assert_eq!(spawner.last_handle().expect("late spawned").kill_count(), 1);
}
