use opendungeons_core::{
    AttackRoll, BuildingKind, Command, CommandError, EntityRef, Event, Level, NotificationError,
    NotificationQueue, RoomKind, SeatId, SimulationConfig, TileCoord, TileKind,
};
use opendungeons_system_scheduler::{Config, SchedulerError, TurnScheduler};
use opendungeons_world::{query, World};

const PLAYER: SeatId = SeatId::new(1);
const RIVAL: SeatId = SeatId::new(2);

fn dungeon() -> Level {
    Level::new(12, 12)
        .with_seat(PLAYER, 1, 500)
        .with_seat(RIVAL, 2, 0)
        .with_area(
            TileCoord::new(1, 1),
            TileCoord::new(6, 6),
            TileKind::Claimed,
            0.0,
            Some(PLAYER),
        )
        .with_building(
            BuildingKind::Room(RoomKind::DungeonTemple),
            PLAYER,
            vec![TileCoord::new(2, 2), TileCoord::new(3, 2)],
        )
        .with_building(
            BuildingKind::Room(RoomKind::Portal),
            PLAYER,
            vec![TileCoord::new(5, 5), TileCoord::new(6, 5)],
        )
}

fn eager_spawns() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.spawning.temple_countdown = 0;
    config.spawning.portal_countdown = 0;
    config
}

fn drain(queue: &mut NotificationQueue) -> Vec<Event> {
    queue.drain().collect()
}

#[test]
fn turn_started_leads_every_turn() {
    let mut world = World::from_level(&dungeon(), eager_spawns()).expect("level loads");
    let mut scheduler = TurnScheduler::new(Config::new(3));
    let mut queue = NotificationQueue::new();

    for expected in 1..=5 {
        let summary = scheduler
            .run_turn(&mut world, &mut queue)
            .expect("turn publishes");
        assert_eq!(summary.turn, expected);

        let events = drain(&mut queue);
        assert_eq!(events.len(), summary.events);
        assert_eq!(events.first(), Some(&Event::TurnStarted { turn: expected }));
    }
}

#[test]
fn spawns_are_announced_in_the_turn_they_happen() {
    let mut world = World::from_level(&dungeon(), eager_spawns()).expect("level loads");
    let mut scheduler = TurnScheduler::new(Config::new(8));
    let mut queue = NotificationQueue::new();

    let summary = scheduler
        .run_turn(&mut world, &mut queue)
        .expect("turn publishes");
    let events = drain(&mut queue);

    assert!(summary.spawned >= 1, "temple window was open");
    let added = events
        .iter()
        .filter(|event| matches!(event, Event::CreatureAdded { .. }))
        .count();
    assert_eq!(added, summary.spawned);
    assert_eq!(query::population(&world, PLAYER).total as usize, summary.spawned);
    assert_eq!(summary.creatures_ticked, summary.spawned);
}

#[test]
fn submitted_commands_publish_with_the_next_turn() {
    let mut world = World::from_level(&dungeon(), SimulationConfig::default()).expect("level loads");
    let mut scheduler = TurnScheduler::new(Config::new(1));
    let mut queue = NotificationQueue::new();

    scheduler
        .submit(
            &mut world,
            Command::BuildRoom {
                tiles: vec![TileCoord::new(1, 4), TileCoord::new(2, 4)],
                kind: RoomKind::Treasury,
                seat: PLAYER,
            },
        )
        .expect("room affordable");
    assert_eq!(scheduler.pending_events(), 1);
    assert!(queue.is_empty(), "nothing is published between turns");

    let _ = scheduler
        .run_turn(&mut world, &mut queue)
        .expect("turn publishes");
    let events = drain(&mut queue);

    assert!(matches!(events[0], Event::RoomBuilt { kind: RoomKind::Treasury, .. }));
    assert_eq!(events[1], Event::TurnStarted { turn: 1 });
    assert_eq!(scheduler.pending_events(), 0);
}

#[test]
fn rejected_submissions_leave_nothing_pending() {
    let mut world = World::from_level(&dungeon(), SimulationConfig::default()).expect("level loads");
    let mut scheduler = TurnScheduler::default();

    let tiles: Vec<TileCoord> = (3..=4)
        .flat_map(|y| (1..=6).map(move |x| TileCoord::new(x, y)))
        .collect();
    let result = scheduler.submit(
        &mut world,
        Command::BuildRoom {
            tiles,
            kind: RoomKind::Hatchery,
            seat: PLAYER,
        },
    );

    assert_eq!(
        result,
        Err(CommandError::InsufficientGold {
            required: 600,
            available: 500,
        })
    );
    assert_eq!(scheduler.pending_events(), 0);
    assert_eq!(query::seat(&world, PLAYER).expect("seat").gold, 500);
}

#[test]
fn corpses_are_removed_in_a_later_turn() {
    let mut config = SimulationConfig::default();
    config.rules.death_delay_turns = 1;
    let mut level = Level::new(8, 8)
        .with_seat(PLAYER, 1, 0)
        .with_seat(RIVAL, 2, 0)
        .with_area(
            TileCoord::new(1, 1),
            TileCoord::new(6, 6),
            TileKind::Dirt,
            0.0,
            None,
        )
        .with_creature("Troll", PLAYER, TileCoord::new(3, 3))
        .with_creature("Troll", RIVAL, TileCoord::new(4, 3));
    level.creatures[1].hp = Some(0.01);
    let mut world = World::from_level(&level, config).expect("level loads");
    let ids = query::creature_ids(&world);
    let (attacker, victim) = (ids[0], ids[1]);

    let mut scheduler = TurnScheduler::new(Config::new(5));
    let mut queue = NotificationQueue::new();
    scheduler
        .submit(
            &mut world,
            Command::Attack {
                attacker,
                target: EntityRef::Creature(victim),
                roll: AttackRoll {
                    hit: 0.99,
                    defense: 0.0,
                },
            },
        )
        .expect("adjacent enemy can be struck");
    assert!(!query::creature(&world, victim).expect("corpse").alive);

    let summary = scheduler
        .run_turn(&mut world, &mut queue)
        .expect("turn publishes");
    assert_eq!(summary.corpses, 1);
    assert!(!drain(&mut queue)
        .iter()
        .any(|event| matches!(event, Event::CreatureRemoved { .. })));
    assert!(query::creature(&world, victim).is_some(), "still in the registry");
    assert_eq!(query::pending_deletions(&world), vec![victim]);

    let _ = scheduler
        .run_turn(&mut world, &mut queue)
        .expect("turn publishes");
    let events = drain(&mut queue);
    assert_eq!(events[0], Event::TurnStarted { turn: 2 });
    assert_eq!(events[1], Event::CreatureRemoved { creature: victim });
    assert!(query::creature(&world, victim).is_none());
    assert_eq!(query::creature_ids(&world), vec![attacker]);
    assert!(query::pending_deletions(&world).is_empty());
}

#[test]
fn identical_seeds_replay_identical_event_streams() {
    let record = |seed: u64| {
        let mut world = World::from_level(&dungeon(), eager_spawns()).expect("level loads");
        let mut scheduler = TurnScheduler::new(Config::new(seed));
        let mut queue = NotificationQueue::new();
        let mut stream = Vec::new();
        for _ in 0..25 {
            let _ = scheduler
                .run_turn(&mut world, &mut queue)
                .expect("turn publishes");
            stream.extend(queue.drain());
        }
        stream
    };

    assert_eq!(record(42), record(42));
}

#[test]
fn full_queue_aborts_publication() {
    let mut world = World::from_level(&dungeon(), eager_spawns()).expect("level loads");
    let mut scheduler = TurnScheduler::new(Config::new(2));
    let mut queue = NotificationQueue::bounded(1);

    let error = scheduler
        .run_turn(&mut world, &mut queue)
        .expect_err("one slot cannot hold a spawning turn");
    let SchedulerError::Notification { turn, source } = error;
    assert_eq!(turn, 1);
    assert_eq!(source, NotificationError::QueueFull { capacity: 1 });
    assert_eq!(drain(&mut queue), vec![Event::TurnStarted { turn: 1 }]);
    assert_eq!(query::turn(&world), 1, "the world still advanced");
}
