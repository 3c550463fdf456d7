use std::time::Duration;

use pretty_assertions::assert_eq;
use ptydeck_core::transport::{self, TerminalCommand, TerminalEvent};
use ptydeck_core::{MemorySpawner, SessionRegistry};

fn create(id: &str) -> TerminalCommand {
    TerminalCommand::Create { id: id.to_owned() }
}

fn input(id: &str, data: &str) -> TerminalCommand {
    TerminalCommand::Input {
        id: id.to_owned(),
        data: data.to_owned(),
    }
}

#[tokio::test(start_paused = true)]
async fn serve_runs_commands_end_to_end() {
    let spawner = MemorySpawner::new();
    let (events_tx, mut events_rx) = transport::event_channel();
    let (commands_tx, commands_rx) = transport::command_channel();
    let registry = SessionRegistry::builder(spawner.clone(), events_tx).build();
    let server = tokio::spawn(transport::serve(registry.clone(), commands_rx));

    commands_tx.send(create("T1")).expect("send create");
    commands_tx.send(input("T1", "echo hi\r")).expect("send input");
    tokio::time::sleep(Duration::from_millis(1)).await;

    let handle = spawner.last_handle().expect("spawned");
    assert_eq!(handle.written_text(), "echo hi\r");

    handle.emit("hi\r\n");
    handle.emit("$ ");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(
        events_rx.try_recv().ok(),
        Some(TerminalEvent::output("T1", "hi\r\n$ "))
    );

    commands_tx
        .send(TerminalCommand::Destroy { id: "T1".to_owned() })
        .expect("send destroy");
    commands_tx.send(input("T1", "x")).expect("send late input");
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(handle.written_text(), "echo hi\r");
    assert_eq!(handle.kill_count(), 1);

    drop(commands_tx);
    assert_eq!(server.await.expect("serve task"), 0);
}

#[tokio::test(start_paused = true)]
async fn closing_the_command_channel_sweeps_sessions() {
    let spawner = MemorySpawner::new();
    let (events_tx, _events_rx) = transport::event_channel();
    let (commands_tx, commands_rx) = transport::command_channel();
    let registry = SessionRegistry::builder(spawner.clone(), events_tx).build();

    for id in ["TERMINAL_1", "TERMINAL_2"] {
        commands_tx.send(create(id)).expect("send create");
    }
    commands_tx.send(create("TERMINAL_1")).expect("duplicate create");
    commands_tx
        .send(TerminalCommand::Resize {
            id: "TERMINAL_2".to_owned(),
            cols: 100,
            rows: 20,
        })
        .expect("send resize");
    drop(commands_tx);

    let swept = transport::serve(registry.clone(), commands_rx).await;
    assert_eq!(swept, 2);
    assert_eq!(spawner.spawn_count(), 2);
    assert_eq!(registry.active_session_count(), 0);
}
