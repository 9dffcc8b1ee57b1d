#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Creature decision logic driving every creature through its action stack.
//!
//! Each tick the agent first evaluates the priority interrupt (flee when
//! badly hurt, fight when enemies are reachable), then executes the handler
//! of the action on top of the creature's stack. Handlers hold their state,
//! push a new action or pop back to the one beneath. Several transitions may
//! happen within one tick, bounded by `Rules::max_actions_per_turn`.
//!
//! The agent never touches the world directly: every decision is a
//! [`Command`] applied through [`opendungeons_world::apply`], so agent
//! mutations follow the same validation path as player commands.

mod search;

use opendungeons_core::{
    AttackRoll, BuildingId, BuildingKind, Command, CreatureAction, CreatureId, EntityRef, Event,
    RoomKind, Rules, TileCoord,
};
use opendungeons_world::{
    apply,
    query::{self, BuildingView, CreatureView},
    World,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::search::{candidate_paths, reachable_hostiles, standing_spots};

/// Upper bound of hit point ratio, hunger and awakeness.
const FULL_NEED: f64 = 100.0;
/// Fraction of max HP below which a fighter goes to bed.
const HURT_HP_FRACTION: f64 = 0.5;
/// Upper bound of the defense roll thrown for each strike.
const MAX_DEFENSE_ROLL: f64 = 0.4;

/// Configuration parameters required to construct the agent.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided random seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Outcome of a single creature tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The creature acted or chose to hold its state.
    Settled,
    /// The creature is unknown, dead or held in a hand and did not act.
    Skipped,
    /// The transition cap was reached before the creature settled.
    Exhausted,
}

/// Whether the dispatch loop should run another handler this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Yield,
}

/// Per-tick memory of the idle handler.
#[derive(Debug, Default)]
struct TickState {
    attempted: Vec<CreatureAction>,
}

/// Agent system owning the random stream used by every creature decision.
#[derive(Debug)]
pub struct CreatureAi {
    rng: ChaCha8Rng,
}

impl CreatureAi {
    /// Creates a new agent seeded from the configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Runs one tick of the creature's decision logic.
    pub fn handle(
        &mut self,
        world: &mut World,
        creature: CreatureId,
        out_events: &mut Vec<Event>,
    ) -> Tick {
        let acting = query::creature(world, creature).map_or(false, |view| view.alive && !view.held);
        if !acting {
            return Tick::Skipped;
        }

        let rules = query::config(world).rules.clone();
        self.prioritize(world, creature, &rules, out_events);

        let mut tick = TickState::default();
        for _ in 0..rules.max_actions_per_turn {
            let Some(view) = query::creature(world, creature) else {
                return Tick::Skipped;
            };
            if !view.alive || view.held {
                return Tick::Settled;
            }
            if self.dispatch(world, &view, &rules, &mut tick, out_events) == Flow::Yield {
                return Tick::Settled;
            }
        }

        tracing::error!(
            creature = creature.get(),
            cap = rules.max_actions_per_turn,
            "action transitions exceeded the per-turn cap"
        );
        Tick::Exhausted
    }

    /// Flee when badly hurt, fight when enemies are reachable.
    ///
    /// This is the only place where the action stack is cleared
    /// unconditionally.
    fn prioritize(
        &mut self,
        world: &mut World,
        id: CreatureId,
        rules: &Rules,
        out_events: &mut Vec<Event>,
    ) {
        let Some(view) = query::creature(world, id) else {
            return;
        };
        let hostiles = reachable_hostiles(world, &view);
        if hostiles.is_empty() {
            return;
        }

        if view.hp < view.max_hp * rules.flee_hp_fraction {
            if view.current_action() != CreatureAction::Flee {
                let _ = execute(world, flee_now(id), out_events);
            }
            return;
        }

        let engaged = view.actions.iter().any(|action| {
            matches!(
                action,
                CreatureAction::Fight | CreatureAction::Flee | CreatureAction::AttackObject { .. }
            )
        });
        let enemies = hostiles
            .iter()
            .any(|hostile| !view.is_worker() || hostile.is_worker);
        if engaged || !enemies {
            return;
        }

        let bad_mood =
            view.hunger > rules.bad_mood_hunger && view.awakeness < rules.bad_mood_awakeness;
        if bad_mood && self.rng.gen_bool(rules.bad_mood_flee_chance.clamp(0.0, 1.0)) {
            tracing::debug!(creature = id.get(), "creature in bad mood flees instead of fighting");
            let _ = execute(world, flee_now(id), out_events);
        } else {
            let _ = push(world, id, CreatureAction::Fight, out_events);
        }
    }

    fn dispatch(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        rules: &Rules,
        tick: &mut TickState,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        match view.current_action() {
            CreatureAction::Idle => self.idle(world, view, rules, tick, out_events),
            CreatureAction::WalkToTile => walk(world, view, out_events),
            CreatureAction::ClaimTile => self.claim(world, view, false, rules, out_events),
            CreatureAction::ClaimWallTile => self.claim(world, view, true, rules, out_events),
            CreatureAction::DigTile => self.dig(world, view, rules, out_events),
            CreatureAction::DepositGold => self.deposit(world, view, rules, out_events),
            CreatureAction::FindHome => find_home(world, view, out_events),
            CreatureAction::Sleep => sleep(world, view, out_events),
            CreatureAction::Job => {
                self.visit_room(world, view, RoomKind::TrainingHall, rules, out_events)
            }
            CreatureAction::Eat => self.visit_room(world, view, RoomKind::Hatchery, rules, out_events),
            CreatureAction::AttackObject { target } => self.strike(world, view, target, out_events),
            CreatureAction::Fight => self.fight(world, view, rules, out_events),
            CreatureAction::Flee => flee(world, view, rules, out_events),
        }
    }

    /// Picks the next activity, trying each one at most once per tick.
    fn idle(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        rules: &Rules,
        tick: &mut TickState,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        let wishes = if view.is_worker() {
            worker_wishes(world, view)
        } else {
            fighter_wishes(world, view, rules)
        };

        let next = wishes
            .into_iter()
            .find(|wish| !tick.attempted.contains(wish));
        if let Some(action) = next {
            tick.attempted.push(action);
            return push(world, view.id, action, out_events);
        }
        self.wander(world, view, rules, out_events)
    }

    fn wander(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        rules: &Rules,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        let (width, height) = query::dimensions(world);
        let radius = rules.wander_radius;
        let (x, y) = (view.tile.x(), view.tile.y());
        let mut spots = Vec::new();
        for row in y.saturating_sub(radius)..=(y.saturating_add(radius)).min(height.saturating_sub(1)) {
            for column in x.saturating_sub(radius)..=(x.saturating_add(radius)).min(width.saturating_sub(1)) {
                let spot = TileCoord::new(column, row);
                if spot != view.tile && query::can_enter(world, view.id, spot) {
                    spots.push(spot);
                }
            }
        }
        if spots.is_empty() {
            return Flow::Yield;
        }

        let goal = spots[self.rng.gen_range(0..spots.len())];
        let path = query::creature_path(world, view.id, goal);
        if travel(world, view.id, &path, out_events) {
            Flow::Continue
        } else {
            Flow::Yield
        }
    }

    fn dig(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        rules: &Rules,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        let seat = view.seat;
        let adjacent = query::neighbors(world, view.tile).into_iter().find(|coord| {
            query::is_marked(world, *coord, seat) && query::is_diggable_for(world, *coord, seat)
        });

        if let Some(target) = adjacent {
            if !execute(
                world,
                Command::DigTile {
                    creature: view.id,
                    tile: target,
                },
                out_events,
            ) {
                return pop(world, view.id, out_events);
            }

            let opened = query::tile(world, target).map_or(false, |tile| tile.is_ground());
            let loaded = query::creature(world, view.id).map_or(false, |creature| {
                creature.definition.max_gold_carried > 0
                    && creature.gold >= creature.definition.max_gold_carried
            });
            if opened {
                let _ = travel(world, view.id, &[view.tile, target], out_events);
            } else if loaded {
                let _ = pop(world, view.id, out_events);
            }
            return Flow::Yield;
        }

        let marked = query::marked_tiles(world, seat);
        let spots: Vec<TileCoord> = standing_spots(world, view.id, marked).collect();
        let paths = candidate_paths(world, view, spots, rules);
        self.follow_one(world, view.id, paths, out_events)
    }

    fn claim(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        walls: bool,
        rules: &Rules,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        let targets = query::claimable_tiles(world, view.seat, walls);
        let here = if walls {
            query::neighbors(world, view.tile)
                .into_iter()
                .find(|coord| targets.contains(coord))
        } else {
            targets.contains(&view.tile).then_some(view.tile)
        };

        if let Some(target) = here {
            let claimed = execute(
                world,
                Command::ClaimTile {
                    creature: view.id,
                    tile: target,
                },
                out_events,
            );
            return if claimed {
                Flow::Yield
            } else {
                pop(world, view.id, out_events)
            };
        }

        let spots: Vec<TileCoord> = if walls {
            standing_spots(world, view.id, targets).collect()
        } else {
            targets
                .into_iter()
                .filter(|coord| query::can_enter(world, view.id, *coord))
                .collect()
        };
        let paths = candidate_paths(world, view, spots, rules);
        self.follow_one(world, view.id, paths, out_events)
    }

    fn deposit(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        rules: &Rules,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        if view.gold == 0 {
            return pop(world, view.id, out_events);
        }

        let treasuries: Vec<BuildingView> = own_rooms(world, view, RoomKind::Treasury)
            .into_iter()
            .filter(|treasury| treasury.free_gold_space > 0)
            .collect();
        if let Some(treasury) = treasuries
            .iter()
            .find(|treasury| treasury.tiles.contains(&view.tile))
        {
            let _ = execute(
                world,
                Command::DepositGold {
                    creature: view.id,
                    building: treasury.id,
                },
                out_events,
            );
            let _ = pop(world, view.id, out_events);
            return Flow::Yield;
        }

        let spots: Vec<TileCoord> = treasuries
            .iter()
            .flat_map(|treasury| treasury.tiles.iter().copied())
            .filter(|coord| query::can_enter(world, view.id, *coord))
            .collect();
        let paths = candidate_paths(world, view, spots, rules);
        match paths.first() {
            Some(path) if travel(world, view.id, path, out_events) => Flow::Continue,
            _ => pop(world, view.id, out_events),
        }
    }

    /// Trains in a training hall or eats in a hatchery.
    fn visit_room(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        kind: RoomKind,
        rules: &Rules,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        let training = kind == RoomKind::TrainingHall;
        let (slot, done) = if training {
            (
                view.job_room,
                view.hunger > rules.hungry_threshold || view.awakeness < rules.tired_awakeness,
            )
        } else {
            (view.eat_room, view.hunger <= 0.0)
        };
        if done {
            return leave_and_pop(world, view.id, slot, out_events);
        }

        let room = match slot {
            Some(room) => room,
            None => {
                let mut rooms: Vec<BuildingView> = own_rooms(world, view, kind)
                    .into_iter()
                    .filter(BuildingView::has_free_spot)
                    .collect();
                rooms.sort_by_key(|room| {
                    room.tiles
                        .iter()
                        .map(|tile| view.tile.manhattan_distance(*tile))
                        .min()
                        .unwrap_or(u32::MAX)
                });
                let joined = rooms.into_iter().find(|room| {
                    execute(
                        world,
                        Command::JoinRoom {
                            creature: view.id,
                            building: room.id,
                        },
                        out_events,
                    )
                });
                match joined {
                    Some(room) => room.id,
                    None => return pop(world, view.id, out_events),
                }
            }
        };
        let Some(building) = query::building(world, room) else {
            return pop(world, view.id, out_events);
        };

        if building.tiles.contains(&view.tile) {
            let command = if training {
                Command::Work { creature: view.id }
            } else {
                Command::Eat { creature: view.id }
            };
            if !execute(world, command, out_events) {
                return leave_and_pop(world, view.id, Some(room), out_events);
            }
            let sated = !training
                && query::creature(world, view.id).map_or(true, |creature| creature.hunger <= 0.0);
            if sated {
                let _ = leave_and_pop(world, view.id, Some(room), out_events);
            }
            return Flow::Yield;
        }

        let spots = if building.active_spots.is_empty() {
            building.tiles
        } else {
            building.active_spots
        };
        let spots: Vec<TileCoord> = spots
            .into_iter()
            .filter(|coord| query::can_enter(world, view.id, *coord))
            .collect();
        let paths = candidate_paths(world, view, spots, rules);
        if self.pick(paths).map_or(false, |path| travel(world, view.id, &path, out_events)) {
            Flow::Continue
        } else {
            leave_and_pop(world, view.id, Some(room), out_events)
        }
    }

    /// Engages the nearest reachable enemy creature, then hostile structures.
    fn fight(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        rules: &Rules,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        let target = reachable_hostiles(world, view)
            .into_iter()
            .filter(|hostile| !view.is_worker() || hostile.is_worker)
            .min_by_key(|hostile| (hostile.distance, hostile.path.len(), hostile.id));
        if let Some(target) = target {
            if view.tile.manhattan_distance(target.tile) <= view.weapon_range {
                return push(
                    world,
                    view.id,
                    CreatureAction::AttackObject {
                        target: EntityRef::Creature(target.id),
                    },
                    out_events,
                );
            }
            return approach(world, view.id, &target.path, out_events);
        }

        if !view.is_worker() {
            for building in query::visible_hostile_buildings(world, view.id) {
                let Some(structure) = query::building(world, building) else {
                    continue;
                };
                let entity = match structure.kind {
                    BuildingKind::Room(_) => EntityRef::Room(building),
                    BuildingKind::Trap(_) => EntityRef::Trap(building),
                };
                let in_range = structure
                    .tiles
                    .iter()
                    .any(|tile| view.tile.manhattan_distance(*tile) <= view.weapon_range);
                if in_range {
                    return push(
                        world,
                        view.id,
                        CreatureAction::AttackObject { target: entity },
                        out_events,
                    );
                }
                let spots: Vec<TileCoord> = structure
                    .tiles
                    .into_iter()
                    .filter(|coord| query::can_enter(world, view.id, *coord))
                    .collect();
                if let Some(path) = candidate_paths(world, view, spots, rules).first() {
                    return approach(world, view.id, path, out_events);
                }
            }
        }
        pop(world, view.id, out_events)
    }

    /// Strikes the target once, then returns to the action beneath.
    fn strike(
        &mut self,
        world: &mut World,
        view: &CreatureView,
        target: EntityRef,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        let roll = AttackRoll {
            hit: self.rng.gen::<f64>(),
            defense: self.rng.gen_range(0.0..MAX_DEFENSE_ROLL),
        };
        let struck = execute(
            world,
            Command::Attack {
                attacker: view.id,
                target,
                roll,
            },
            out_events,
        );
        let flow = pop(world, view.id, out_events);
        if struck {
            Flow::Yield
        } else {
            flow
        }
    }

    /// Walks along one of the candidate paths, chosen at random to avoid
    /// flocking, or gives up when none exists.
    fn follow_one(
        &mut self,
        world: &mut World,
        id: CreatureId,
        paths: Vec<Vec<TileCoord>>,
        out_events: &mut Vec<Event>,
    ) -> Flow {
        match self.pick(paths) {
            Some(path) if travel(world, id, &path, out_events) => Flow::Continue,
            _ => pop(world, id, out_events),
        }
    }

    fn pick(&mut self, mut paths: Vec<Vec<TileCoord>>) -> Option<Vec<TileCoord>> {
        if paths.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..paths.len());
        Some(paths.swap_remove(index))
    }
}

impl Default for CreatureAi {
    fn default() -> Self {
        Self::new(Config::new(0))
    }
}

fn worker_wishes(world: &World, view: &CreatureView) -> Vec<CreatureAction> {
    let capacity = view.definition.max_gold_carried;
    let mut wishes = Vec::new();
    if capacity > 0 && view.gold >= capacity {
        wishes.push(CreatureAction::DepositGold);
    }
    if !query::marked_tiles(world, view.seat).is_empty() {
        wishes.push(CreatureAction::DigTile);
    }
    if !query::claimable_tiles(world, view.seat, false).is_empty() {
        wishes.push(CreatureAction::ClaimTile);
    }
    if !query::claimable_tiles(world, view.seat, true).is_empty() {
        wishes.push(CreatureAction::ClaimWallTile);
    }
    if view.gold > 0 {
        wishes.push(CreatureAction::DepositGold);
    }
    wishes
}

fn fighter_wishes(world: &World, view: &CreatureView, rules: &Rules) -> Vec<CreatureAction> {
    let mut wishes = Vec::new();
    if view.home.is_none() && !own_rooms(world, view, RoomKind::Dormitory).is_empty() {
        wishes.push(CreatureAction::FindHome);
    }
    let tired = view.awakeness < rules.tired_awakeness;
    let hurt = view.hp < view.max_hp * HURT_HP_FRACTION;
    if (tired || hurt) && view.home.is_some() {
        wishes.push(CreatureAction::Sleep);
    }
    if view.hunger > rules.hungry_threshold
        && !own_rooms(world, view, RoomKind::Hatchery).is_empty()
    {
        wishes.push(CreatureAction::Eat);
    }
    if !query::visible_hostile_buildings(world, view.id).is_empty() {
        wishes.push(CreatureAction::Fight);
    }
    if !own_rooms(world, view, RoomKind::TrainingHall).is_empty() {
        wishes.push(CreatureAction::Job);
    }
    wishes
}

fn own_rooms(world: &World, view: &CreatureView, kind: RoomKind) -> Vec<BuildingView> {
    query::buildings(world)
        .into_iter()
        .filter(|building| building.seat == view.seat && building.kind == BuildingKind::Room(kind))
        .collect()
}

/// Follows the destination queue one waypoint per turn.
fn walk(world: &mut World, view: &CreatureView, out_events: &mut Vec<Event>) -> Flow {
    if view.destinations.is_empty() {
        return pop(world, view.id, out_events);
    }
    if execute(world, Command::StepCreature { creature: view.id }, out_events) {
        Flow::Yield
    } else {
        pop(world, view.id, out_events)
    }
}

fn find_home(world: &mut World, view: &CreatureView, out_events: &mut Vec<Event>) -> Flow {
    if view.home.is_some() {
        return pop(world, view.id, out_events);
    }
    for dormitory in own_rooms(world, view, RoomKind::Dormitory) {
        let claimed = execute(
            world,
            Command::ClaimBed {
                creature: view.id,
                building: dormitory.id,
            },
            out_events,
        );
        if claimed {
            break;
        }
    }

    let flow = pop(world, view.id, out_events);
    let anchor = query::creature(world, view.id).and_then(|creature| creature.home);
    if let Some((_, anchor)) = anchor {
        let path = query::creature_path(world, view.id, anchor);
        let _ = travel(world, view.id, &path, out_events);
    }
    flow
}

/// Walks to the bed, then rests until HP and awakeness are full.
fn sleep(world: &mut World, view: &CreatureView, out_events: &mut Vec<Event>) -> Flow {
    let Some((_, anchor)) = view.home else {
        return pop(world, view.id, out_events);
    };
    if view.tile != anchor {
        let path = query::creature_path(world, view.id, anchor);
        return if travel(world, view.id, &path, out_events) {
            Flow::Continue
        } else {
            pop(world, view.id, out_events)
        };
    }

    if !execute(world, Command::Rest { creature: view.id }, out_events) {
        return pop(world, view.id, out_events);
    }
    let rested = query::creature(world, view.id).map_or(true, |creature| {
        creature.hp >= creature.max_hp && creature.awakeness >= FULL_NEED
    });
    if rested {
        let _ = pop(world, view.id, out_events);
    }
    Flow::Yield
}

/// Steps toward the visible tile farthest from every visible hostile.
fn flee(world: &mut World, view: &CreatureView, rules: &Rules, out_events: &mut Vec<Event>) -> Flow {
    let hostiles: Vec<TileCoord> = query::visible_hostiles(world, view.id)
        .into_iter()
        .filter_map(|id| query::creature(world, id).map(|creature| creature.tile))
        .collect();
    if hostiles.is_empty() {
        return pop(world, view.id, out_events);
    }

    let safety = |tile: TileCoord| {
        hostiles
            .iter()
            .map(|hostile| tile.distance_squared(*hostile))
            .min()
            .unwrap_or(0)
    };
    let current = safety(view.tile);
    let mut refuges: Vec<(u64, TileCoord)> =
        query::visible_tiles(world, view.tile, view.definition.sight_radius)
            .into_iter()
            .filter(|tile| query::can_enter(world, view.id, *tile))
            .map(|tile| (safety(tile), tile))
            .filter(|(score, _)| *score > current)
            .collect();
    refuges.sort_by(|first, second| second.0.cmp(&first.0).then(first.1.cmp(&second.1)));

    for (_, refuge) in refuges.into_iter().take(rules.search_limit) {
        let path = query::creature_path(world, view.id, refuge);
        if let Some(&next) = path.get(1) {
            let _ = execute(
                world,
                Command::SetDestinations {
                    creature: view.id,
                    path: vec![next],
                },
                out_events,
            );
            let _ = execute(world, Command::StepCreature { creature: view.id }, out_events);
            break;
        }
    }
    Flow::Yield
}

/// Applies a command on behalf of a creature. Rejections are logged by the
/// world and reported as `false`.
fn execute(world: &mut World, command: Command, out_events: &mut Vec<Event>) -> bool {
    apply(world, command, out_events).is_ok()
}

fn flee_now(creature: CreatureId) -> Command {
    Command::Interrupt {
        creature,
        action: CreatureAction::Flee,
    }
}

fn push(
    world: &mut World,
    creature: CreatureId,
    action: CreatureAction,
    out_events: &mut Vec<Event>,
) -> Flow {
    if execute(world, Command::PushAction { creature, action }, out_events) {
        Flow::Continue
    } else {
        Flow::Yield
    }
}

fn pop(world: &mut World, creature: CreatureId, out_events: &mut Vec<Event>) -> Flow {
    if execute(world, Command::PopAction { creature }, out_events) {
        Flow::Continue
    } else {
        Flow::Yield
    }
}

fn leave_and_pop(
    world: &mut World,
    creature: CreatureId,
    room: Option<BuildingId>,
    out_events: &mut Vec<Event>,
) -> Flow {
    if let Some(building) = room {
        let _ = execute(world, Command::LeaveRoom { creature, building }, out_events);
    }
    pop(world, creature, out_events)
}

/// Queues the path (starting at the creature's tile) and starts walking.
fn travel(
    world: &mut World,
    creature: CreatureId,
    path: &[TileCoord],
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(steps) = path.get(1..).filter(|steps| !steps.is_empty()) else {
        return false;
    };
    execute(
        world,
        Command::SetDestinations {
            creature,
            path: steps.to_vec(),
        },
        out_events,
    ) && execute(
        world,
        Command::PushAction {
            creature,
            action: CreatureAction::WalkToTile,
        },
        out_events,
    )
}

/// Takes a single step along the path so that moving targets are re-planned
/// every turn.
fn approach(
    world: &mut World,
    creature: CreatureId,
    path: &[TileCoord],
    out_events: &mut Vec<Event>,
) -> Flow {
    let first_step = path.get(..2).unwrap_or(path);
    if travel(world, creature, first_step, out_events) {
        Flow::Continue
    } else {
        pop(world, creature, out_events)
    }
}
