use opendungeons_core::{
    BuildingKind, Command, CommandError, CreatureSound, Event, GoalKind, GoalStatus, Level,
    RoomKind, SeatId, SimulationConfig, TileCoord, TileKind,
};
use opendungeons_world::{apply, query, World};

const PLAYER: SeatId = SeatId::new(1);
const RIVAL: SeatId = SeatId::new(2);

fn keep(gold: i64) -> Level {
    Level::new(10, 10)
        .with_seat(PLAYER, 1, gold)
        .with_seat(RIVAL, 2, 0)
        .with_area(
            TileCoord::new(1, 1),
            TileCoord::new(3, 3),
            TileKind::Claimed,
            0.0,
            Some(PLAYER),
        )
        .with_area(
            TileCoord::new(4, 1),
            TileCoord::new(4, 3),
            TileKind::Dirt,
            0.0,
            None,
        )
}

fn load(level: &Level) -> World {
    World::from_level(level, SimulationConfig::default()).expect("level loads")
}

#[test]
fn unaffordable_room_leaves_the_world_untouched() {
    let mut world = load(&keep(10));
    let mut events = Vec::new();

    let result = apply(
        &mut world,
        Command::BuildRoom {
            tiles: vec![TileCoord::new(1, 1)],
            kind: RoomKind::Treasury,
            seat: PLAYER,
        },
        &mut events,
    );

    assert_eq!(
        result,
        Err(CommandError::InsufficientGold {
            required: 25,
            available: 10,
        })
    );
    assert!(events.is_empty());
    assert!(query::buildings(&world).is_empty());
    assert_eq!(query::seat(&world, PLAYER).expect("seat").gold, 10);
    assert_eq!(query::tile(&world, TileCoord::new(1, 1)).expect("tile").building, None);
}

#[test]
fn rooms_need_claimed_uncovered_floor() {
    let mut world = load(&keep(1_000));
    let mut events = Vec::new();

    let foreign = apply(
        &mut world,
        Command::BuildRoom {
            tiles: vec![TileCoord::new(4, 1)],
            kind: RoomKind::Dormitory,
            seat: PLAYER,
        },
        &mut events,
    );
    assert_eq!(foreign, Err(CommandError::TileNotBuildable(TileCoord::new(4, 1))));

    let temple = apply(
        &mut world,
        Command::BuildRoom {
            tiles: vec![TileCoord::new(1, 1)],
            kind: RoomKind::DungeonTemple,
            seat: PLAYER,
        },
        &mut events,
    );
    assert_eq!(temple, Err(CommandError::RoomNotBuildable(RoomKind::DungeonTemple)));
    assert!(events.is_empty());
}

#[test]
fn building_a_room_charges_per_tile_and_covers_the_site() {
    let mut world = load(&keep(100));
    let mut events = Vec::new();
    let site = vec![TileCoord::new(2, 1), TileCoord::new(1, 1)];

    apply(
        &mut world,
        Command::BuildRoom {
            tiles: site,
            kind: RoomKind::Treasury,
            seat: PLAYER,
        },
        &mut events,
    )
    .expect("room affordable");

    assert_eq!(query::seat(&world, PLAYER).expect("seat").gold, 50);
    let id = query::building_at(&world, TileCoord::new(1, 1)).expect("covered");
    assert_eq!(query::building_at(&world, TileCoord::new(2, 1)), Some(id));
    let room = query::building(&world, id).expect("room");
    assert_eq!(room.kind, BuildingKind::Room(RoomKind::Treasury));
    assert_eq!(room.tiles, vec![TileCoord::new(1, 1), TileCoord::new(2, 1)]);
    assert_eq!(
        events,
        vec![Event::RoomBuilt {
            building: id,
            kind: RoomKind::Treasury,
            seat: PLAYER,
            tiles: vec![TileCoord::new(1, 1), TileCoord::new(2, 1)],
        }]
    );
}

#[test]
fn only_diggable_walls_receive_marks() {
    let level = keep(0)
        .with_tile(TileCoord::new(5, 1), TileKind::Dirt, 100.0, None)
        .with_tile(TileCoord::new(5, 2), TileKind::Rock, 100.0, None);
    let mut world = load(&level);
    let mut events = Vec::new();

    apply(
        &mut world,
        Command::MarkTilesForDigging {
            tiles: vec![
                TileCoord::new(5, 1),
                TileCoord::new(5, 2),
                TileCoord::new(4, 2),
            ],
            marked: true,
            seat: PLAYER,
        },
        &mut events,
    )
    .expect("marking accepted");

    assert_eq!(query::marked_tiles(&world, PLAYER), vec![TileCoord::new(5, 1)]);
    assert!(!query::is_marked(&world, TileCoord::new(5, 1), RIVAL));

    apply(
        &mut world,
        Command::MarkTilesForDigging {
            tiles: vec![TileCoord::new(5, 1)],
            marked: false,
            seat: PLAYER,
        },
        &mut events,
    )
    .expect("unmarking accepted");
    assert!(query::marked_tiles(&world, PLAYER).is_empty());

    let outside = apply(
        &mut world,
        Command::MarkTilesForDigging {
            tiles: vec![TileCoord::new(40, 1)],
            marked: true,
            seat: PLAYER,
        },
        &mut events,
    );
    assert_eq!(outside, Err(CommandError::OutOfBounds(TileCoord::new(40, 1))));
}

#[test]
fn picked_up_creatures_drop_only_onto_allied_claimed_ground() {
    let level = keep(0).with_creature("Troll", PLAYER, TileCoord::new(2, 2));
    let mut world = load(&level);
    let troll = query::creature_ids(&world)[0];
    let mut events = Vec::new();

    let stolen = apply(
        &mut world,
        Command::PickUpCreature {
            creature: troll,
            seat: RIVAL,
        },
        &mut events,
    );
    assert_eq!(stolen, Err(CommandError::NotOwner { seat: RIVAL }));

    apply(
        &mut world,
        Command::PickUpCreature {
            creature: troll,
            seat: PLAYER,
        },
        &mut events,
    )
    .expect("owner may pick up");
    let view = query::creature(&world, troll).expect("troll");
    assert!(view.held);
    assert_eq!(query::seat(&world, PLAYER).expect("seat").hand, vec![troll]);
    assert!(query::creatures_at(&world, TileCoord::new(2, 2)).is_empty());

    let unclaimed = apply(
        &mut world,
        Command::DropCreature {
            creature: troll,
            tile: TileCoord::new(4, 2),
            seat: PLAYER,
        },
        &mut events,
    );
    assert_eq!(unclaimed, Err(CommandError::InvalidTarget(TileCoord::new(4, 2))));

    apply(
        &mut world,
        Command::DropCreature {
            creature: troll,
            tile: TileCoord::new(3, 3),
            seat: PLAYER,
        },
        &mut events,
    )
    .expect("drop onto own floor");
    let view = query::creature(&world, troll).expect("troll");
    assert!(!view.held);
    assert_eq!(view.tile, TileCoord::new(3, 3));
    assert_eq!(query::creatures_at(&world, TileCoord::new(3, 3)), vec![troll]);
    assert!(query::seat(&world, PLAYER).expect("seat").hand.is_empty());

    let sounds: Vec<CreatureSound> = events
        .iter()
        .filter_map(|event| match event {
            Event::CreatureSound { sound, .. } => Some(*sound),
            _ => None,
        })
        .collect();
    assert_eq!(sounds, vec![CreatureSound::Pickup, CreatureSound::Drop]);
}

#[test]
fn goals_resolve_during_upkeep() {
    let mut level = keep(0);
    level.seats[0].goals = vec![GoalKind::ClaimTiles(4), GoalKind::ProtectDungeonTemple];
    let mut world = load(&level);
    let mut events = Vec::new();

    apply(&mut world, Command::BeginTurn, &mut events).expect("turn begins");
    apply(&mut world, Command::Upkeep, &mut events).expect("upkeep runs");

    let seat = query::seat(&world, PLAYER).expect("seat");
    assert_eq!(seat.claimed_tiles, 9);
    assert_eq!(
        seat.goals,
        vec![
            (GoalKind::ClaimTiles(4), GoalStatus::Completed),
            (GoalKind::ProtectDungeonTemple, GoalStatus::Failed),
        ]
    );
    let changes = events
        .iter()
        .filter(|event| matches!(event, Event::GoalStatusChanged { .. }))
        .count();
    assert_eq!(changes, 2);

    events.clear();
    apply(&mut world, Command::Upkeep, &mut events).expect("upkeep runs");
    assert!(events.is_empty(), "settled goals are reported once");
}

#[test]
fn claimed_walls_count_towards_territory() {
    let level = keep(0)
        .with_tile(TileCoord::new(2, 0), TileKind::Claimed, 100.0, Some(PLAYER))
        .with_tile(TileCoord::new(4, 2), TileKind::Claimed, 0.0, Some(RIVAL))
        .with_tile(TileCoord::new(0, 2), TileKind::Dirt, 100.0, Some(PLAYER));
    let mut world = load(&level);
    let mut events = Vec::new();

    apply(&mut world, Command::Upkeep, &mut events).expect("upkeep runs");

    let wall = query::tile(&world, TileCoord::new(2, 0)).expect("wall");
    assert!(!wall.is_ground());
    assert_eq!(query::seat(&world, PLAYER).expect("seat").claimed_tiles, 10);
    assert_eq!(query::seat(&world, RIVAL).expect("seat").claimed_tiles, 1);
}

#[test]
fn exported_levels_reload_into_the_same_world() {
    let level = keep(300)
        .with_building(
            BuildingKind::Room(RoomKind::Treasury),
            PLAYER,
            vec![TileCoord::new(1, 1), TileCoord::new(2, 1)],
        )
        .with_creature("Kobold", PLAYER, TileCoord::new(2, 2))
        .with_creature("Wizard", RIVAL, TileCoord::new(4, 3));
    let world = load(&level);

    let exported = query::export_level(&world);
    let reloaded = load(&exported);

    assert_eq!(query::export_level(&reloaded), exported);
    assert_eq!(exported.creatures[0].name, "Kobold1");
    assert_eq!(exported.creatures[1].name, "Wizard2");
    assert_eq!(
        query::seat(&reloaded, PLAYER).expect("seat").gold,
        query::seat(&world, PLAYER).expect("seat").gold
    );
}

#[test]
fn invalid_levels_are_rejected() {
    let empty = World::from_level(&Level::new(0, 4), SimulationConfig::default());
    assert!(empty.is_err());

    let stray = keep(0).with_creature("Kobold", SeatId::new(9), TileCoord::new(1, 1));
    assert!(World::from_level(&stray, SimulationConfig::default()).is_err());

    let unknown = keep(0).with_creature("Dragon", PLAYER, TileCoord::new(1, 1));
    assert!(World::from_level(&unknown, SimulationConfig::default()).is_err());
}
