use std::process::{Command, Output};

use opendungeons_core::{Event, RoomKind, SeatId};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_opendungeons"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch the opendungeons binary")
}

fn events(output: &Output) -> Vec<Event> {
    String::from_utf8(output.stdout.clone())
        .expect("stdout is utf-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is an event"))
        .collect()
}

#[test]
fn json_mode_streams_one_event_per_line() {
    let output = run(&["--json", "--turns", "2", "--seed", "1"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let events = events(&output);
    assert!(matches!(
        &events[0],
        Event::RoomBuilt { kind: RoomKind::Dormitory, seat, .. } if *seat == SeatId::new(1)
    ), "opening orders publish ahead of the first turn");
    assert_eq!(events[1], Event::TurnStarted { turn: 1 });
    let turns: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            Event::TurnStarted { turn } => Some(*turn),
            _ => None,
        })
        .collect();
    assert_eq!(turns, vec![1, 2]);
}

#[test]
fn same_seed_prints_the_same_stream() {
    let first = run(&["--json", "--turns", "5", "--seed", "9"]);
    let second = run(&["--json", "--turns", "5", "--seed", "9"]);
    assert!(first.status.success() && second.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn undersized_demo_map_is_refused() {
    let output = run(&["--width", "4", "--turns", "1"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
