//! Target searches shared by the action handlers.

use opendungeons_core::{CreatureId, Rules, TileCoord};
use opendungeons_world::{
    query::{self, CreatureView},
    World,
};

/// Hostile creature the observer can see and reach.
#[derive(Clone, Debug)]
pub(crate) struct Hostile {
    pub(crate) id: CreatureId,
    pub(crate) tile: TileCoord,
    pub(crate) is_worker: bool,
    pub(crate) distance: u64,
    pub(crate) path: Vec<TileCoord>,
}

/// Visible hostiles the observer has a path to, in registry order.
pub(crate) fn reachable_hostiles(world: &World, observer: &CreatureView) -> Vec<Hostile> {
    query::visible_hostiles(world, observer.id)
        .into_iter()
        .filter_map(|id| {
            let other = query::creature(world, id)?;
            let path = query::creature_path(world, observer.id, other.tile);
            if path.is_empty() {
                return None;
            }
            Some(Hostile {
                id,
                tile: other.tile,
                is_worker: other.is_worker(),
                distance: observer.tile.distance_squared(other.tile),
                path,
            })
        })
        .collect()
}

/// Shortest paths from the creature toward the provided goals.
///
/// Only the `search_limit` goals closest by Manhattan distance are run
/// through the pathfinder, and at most `candidate_paths` of the shortest
/// results are returned, shortest first. Paths that would not move the
/// creature are discarded.
pub(crate) fn candidate_paths<I>(
    world: &World,
    creature: &CreatureView,
    goals: I,
    rules: &Rules,
) -> Vec<Vec<TileCoord>>
where
    I: IntoIterator<Item = TileCoord>,
{
    let origin = creature.tile;
    let mut goals: Vec<TileCoord> = goals.into_iter().collect();
    goals.sort_by_key(|goal| (origin.manhattan_distance(*goal), *goal));
    goals.dedup();
    goals.truncate(rules.search_limit);

    let mut paths: Vec<Vec<TileCoord>> = goals
        .into_iter()
        .map(|goal| query::creature_path(world, creature.id, goal))
        .filter(|path| path.len() >= 2)
        .collect();
    paths.sort_by_key(Vec::len);
    paths.truncate(rules.candidate_paths);
    paths
}

/// Walkable tiles the creature could stand on next to any of the targets.
pub(crate) fn standing_spots<'a, I>(
    world: &'a World,
    creature: CreatureId,
    targets: I,
) -> impl Iterator<Item = TileCoord> + 'a
where
    I: IntoIterator<Item = TileCoord>,
    I::IntoIter: 'a,
{
    targets
        .into_iter()
        .flat_map(move |target| query::neighbors(world, target))
        .filter(move |spot| query::can_enter(world, creature, *spot))
}
