//! Two-keeper skirmish map used when no level file is supplied.

use opendungeons_core::{
    BuildingKind, Command, GoalKind, Level, RoomKind, SeatId, TileCoord, TileKind,
};

/// Seat controlled by the local keeper.
pub(crate) const KEEPER: SeatId = SeatId::new(1);
/// Opposing keeper.
pub(crate) const RIVAL: SeatId = SeatId::new(2);

const STARTING_GOLD: i64 = 1_000;
const KEEP_SIZE: u32 = 5;

/// Smallest map that fits both keeps and the ground between them.
pub(crate) const MIN_SIZE: u32 = 2 * KEEP_SIZE + 6;

/// Builds a map with one keep in each corner and gold veins in between.
pub(crate) fn level(width: u32, height: u32) -> Level {
    let far = TileCoord::new(width - KEEP_SIZE - 1, height - KEEP_SIZE - 1);
    let mut level = Level::new(width, height)
        .with_seat(KEEPER, 1, STARTING_GOLD)
        .with_seat(RIVAL, 2, STARTING_GOLD);
    level.default_kind = TileKind::Dirt;
    level.seats[0].goals = vec![GoalKind::ProtectDungeonTemple, GoalKind::KillAllEnemies];
    level.seats[1].goals = vec![GoalKind::ProtectDungeonTemple];

    level = keep(level, KEEPER, TileCoord::new(1, 1));
    level = keep(level, RIVAL, far);

    for (x, y) in [(KEEP_SIZE + 2, 2), (2, KEEP_SIZE + 2), (width / 2, height / 2)] {
        level = level.with_tile(TileCoord::new(x, y), TileKind::Gold, 100.0, None);
    }
    level.with_tile(
        TileCoord::new(width / 2 + 1, height / 2),
        TileKind::Water,
        0.0,
        None,
    )
}

fn keep(level: Level, seat: SeatId, origin: TileCoord) -> Level {
    let at = |dx: u32, dy: u32| TileCoord::new(origin.x() + dx, origin.y() + dy);
    level
        .with_area(
            origin,
            at(KEEP_SIZE - 1, KEEP_SIZE - 1),
            TileKind::Claimed,
            0.0,
            Some(seat),
        )
        .with_building(
            BuildingKind::Room(RoomKind::DungeonTemple),
            seat,
            vec![at(1, 1), at(2, 1)],
        )
        .with_building(
            BuildingKind::Room(RoomKind::Portal),
            seat,
            vec![at(1, 3), at(2, 3)],
        )
        .with_building(
            BuildingKind::Room(RoomKind::Treasury),
            seat,
            vec![at(4, 0), at(4, 1)],
        )
}

/// Opening player orders: the keeper marks a tunnel towards the rival keep
/// and builds a dormitory.
pub(crate) fn opening_orders(width: u32, height: u32) -> Vec<Command> {
    let row = 3;
    let tunnel = (KEEP_SIZE + 1..width - KEEP_SIZE - 1)
        .map(|x| TileCoord::new(x, row))
        .chain((row + 1..height - KEEP_SIZE - 1).map(|y| TileCoord::new(width - KEEP_SIZE - 2, y)))
        .collect();
    vec![
        Command::MarkTilesForDigging {
            tiles: tunnel,
            marked: true,
            seat: KEEPER,
        },
        Command::BuildRoom {
            tiles: vec![TileCoord::new(4, 3), TileCoord::new(4, 4)],
            kind: RoomKind::Dormitory,
            seat: KEEPER,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendungeons_core::SimulationConfig;
    use opendungeons_world::{apply, query, World};

    #[test]
    fn demo_level_loads_at_the_smallest_size() {
        let level = level(MIN_SIZE, MIN_SIZE);
        let world = World::from_level(&level, SimulationConfig::default()).expect("demo loads");

        assert_eq!(query::buildings(&world).len(), 6);
        assert_eq!(query::seat_ids(&world), vec![KEEPER, RIVAL]);
        let opportunities = query::spawn_opportunities(&world);
        assert!(opportunities.is_empty(), "no window opens before the first upkeep");
    }

    #[test]
    fn opening_orders_are_accepted() {
        let mut world = World::from_level(&level(24, 20), SimulationConfig::default())
            .expect("demo loads");
        let mut events = Vec::new();
        for order in opening_orders(24, 20) {
            apply(&mut world, order, &mut events).expect("order accepted");
        }

        assert!(!query::marked_tiles(&world, KEEPER).is_empty());
        assert_eq!(query::buildings(&world).len(), 7);
    }
}
