//! Tuning knobs and creature templates consumed by the world and systems.

use serde::{Deserialize, Serialize};

use crate::{RoomKind, TileKind, TrapKind, Weapon};

/// Aggregated configuration controlling every adjustable aspect of the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Behaviour constants of the creature agents.
    pub rules: Rules,
    /// Costs, capacities and income of the seats.
    pub economy: Economy,
    /// Cadence and caps of the temple and portal spawns.
    pub spawning: SpawnTuning,
    /// Cannon parameters.
    pub traps: TrapTuning,
    /// Creature templates available to the level and the spawners.
    pub creatures: Vec<CreatureDefinition>,
}

impl SimulationConfig {
    /// Looks up a creature definition by class name.
    #[must_use]
    pub fn definition(&self, class: &str) -> Option<&CreatureDefinition> {
        self.creatures
            .iter()
            .find(|definition| definition.class_name == class)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            economy: Economy::default(),
            spawning: SpawnTuning::default(),
            traps: TrapTuning::default(),
            creatures: CreatureDefinition::defaults(),
        }
    }
}

/// Behaviour constants shared by every creature agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Maximum number of action transitions processed for a creature in one turn.
    pub max_actions_per_turn: u32,
    /// Turns a dead creature stays in the world before being deleted.
    pub death_delay_turns: u32,
    /// Fraction of max HP below which a creature flees from reachable hostiles.
    pub flee_hp_fraction: f64,
    /// Hunger above which a creature may be in a bad mood.
    pub bad_mood_hunger: f64,
    /// Awakeness below which a creature may be in a bad mood.
    pub bad_mood_awakeness: f64,
    /// Probability per turn that a creature in a bad mood flees instead of fighting.
    pub bad_mood_flee_chance: f64,
    /// Factor applied to the dig rate when digging a claimed wall.
    pub claimed_wall_dig_factor: f64,
    /// Coefficient `k` of the worker rate gain `k * level / (level + 5)`.
    pub level_rate_gain: f64,
    /// Highest level a creature may reach.
    pub max_level: u32,
    /// Experience awarded per unit of fullness dug.
    pub dig_experience: f64,
    /// Experience awarded per unit of claim progress.
    pub claim_experience: f64,
    /// Experience awarded per point of damage dealt.
    pub attack_experience: f64,
    /// Experience awarded per point of damage taken.
    pub defend_experience: f64,
    /// Experience awarded per turn of training.
    pub train_experience: f64,
    /// Awakeness consumed per turn of training on top of the normal decay.
    pub train_awakeness_cost: f64,
    /// Hunger removed per turn of eating.
    pub eat_per_turn: f64,
    /// Awakeness below which a fighter wants to sleep.
    pub tired_awakeness: f64,
    /// Hunger above which a fighter wants to eat.
    pub hungry_threshold: f64,
    /// Number of shortest candidate paths a worker picks from when searching for work.
    pub candidate_paths: usize,
    /// Number of closest targets evaluated with the pathfinder when searching for work.
    pub search_limit: usize,
    /// Maximum distance in tiles of a random wander.
    pub wander_radius: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_actions_per_turn: 20,
            death_delay_turns: 10,
            flee_hp_fraction: 1.0 / 3.0,
            bad_mood_hunger: 90.0,
            bad_mood_awakeness: 10.0,
            bad_mood_flee_chance: 0.2,
            claimed_wall_dig_factor: 0.2,
            level_rate_gain: 0.5,
            max_level: 100,
            dig_experience: 0.05,
            claim_experience: 1.0,
            attack_experience: 0.15,
            defend_experience: 0.05,
            train_experience: 0.5,
            train_awakeness_cost: 0.3,
            eat_per_turn: 15.0,
            tired_awakeness: 30.0,
            hungry_threshold: 70.0,
            candidate_paths: 5,
            search_limit: 20,
            wander_radius: 4,
        }
    }
}

/// Costs, capacities and income of the seats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Economy {
    /// Gold stored per treasury tile.
    pub treasury_gold_per_tile: u32,
    /// Gold mined per unit of fullness removed from a gold tile.
    pub gold_per_fullness: f64,
    /// Gold cost per treasury tile.
    pub treasury_cost: i64,
    /// Gold cost per dormitory tile.
    pub dormitory_cost: i64,
    /// Gold cost per hatchery tile.
    pub hatchery_cost: i64,
    /// Gold cost per training hall tile.
    pub training_hall_cost: i64,
    /// Gold cost per cannon tile.
    pub cannon_cost: i64,
    /// Hit points of each room tile.
    pub room_tile_hp: f64,
    /// Hit points of each trap tile.
    pub trap_tile_hp: f64,
    /// Mana gained per turn for every claimed tile.
    pub mana_per_claimed_tile: f64,
    /// Upper bound of a seat's mana pool.
    pub max_mana: f64,
}

impl Economy {
    /// Gold cost of a single tile of the provided room.
    #[must_use]
    pub fn room_cost(&self, kind: RoomKind) -> i64 {
        match kind {
            RoomKind::Treasury => self.treasury_cost,
            RoomKind::Dormitory => self.dormitory_cost,
            RoomKind::Hatchery => self.hatchery_cost,
            RoomKind::TrainingHall => self.training_hall_cost,
            RoomKind::DungeonTemple | RoomKind::Portal => 0,
        }
    }

    /// Gold cost of a single tile of the provided trap.
    #[must_use]
    pub fn trap_cost(&self, kind: TrapKind) -> i64 {
        match kind {
            TrapKind::Cannon => self.cannon_cost,
        }
    }
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            treasury_gold_per_tile: 1_000,
            gold_per_fullness: 5.0,
            treasury_cost: 25,
            dormitory_cost: 40,
            hatchery_cost: 50,
            training_hall_cost: 60,
            cannon_cost: 120,
            room_tile_hp: 100.0,
            trap_tile_hp: 50.0,
            mana_per_claimed_tile: 0.45,
            max_mana: 250_000.0,
        }
    }
}

/// Cadence and caps of the temple and portal spawns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Class name of the worker produced by dungeon temples.
    pub worker_class: String,
    /// Turns between two dungeon temple spawn opportunities.
    pub temple_countdown: u32,
    /// Number of workers above which temples stop spawning.
    pub temple_worker_cap: u32,
    /// Turns between two portal spawn rolls.
    pub portal_countdown: u32,
    /// Population at which portals stop attracting fighters.
    pub max_population: u32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            worker_class: "Kobold".to_owned(),
            temple_countdown: 30,
            temple_worker_cap: 8,
            portal_countdown: 15,
            max_population: 15,
        }
    }
}

/// Cannon parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapTuning {
    /// Reach of a cannon in tiles.
    pub cannon_range: u32,
    /// Damage dealt by one cannon shot.
    pub cannon_damage: f64,
    /// Turns between two shots.
    pub cannon_reload: u32,
}

impl Default for TrapTuning {
    fn default() -> Self {
        Self {
            cannon_range: 6,
            cannon_damage: 8.0,
            cannon_reload: 4,
        }
    }
}

/// Immutable template shared by all creatures of a class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatureDefinition {
    /// Unique class name.
    pub class_name: String,
    /// Workers dig, claim and carry gold; fighters train and fight.
    pub is_worker: bool,
    /// Hit points at level 1.
    pub max_hp: f64,
    /// Hit points gained per level.
    pub hp_per_level: f64,
    /// Hit points regenerated every turn.
    pub heal_rate: f64,
    /// Awakeness lost every turn.
    pub awakeness_decay: f64,
    /// Hunger gained every turn.
    pub hunger_growth: f64,
    /// Hit points regenerated per turn while sleeping.
    pub sleep_heal_rate: f64,
    /// Awakeness regenerated per turn while sleeping.
    pub sleep_awakeness_rate: f64,
    /// Fullness removed per dig at level 1.
    pub dig_rate: f64,
    /// Claim progress added per claim at level 1.
    pub claim_rate: f64,
    /// Speed on dry ground; zero means the creature cannot walk.
    pub move_speed_ground: f64,
    /// Speed on water; zero means water is impassable.
    pub move_speed_water: f64,
    /// Speed on lava; zero means lava is impassable.
    pub move_speed_lava: f64,
    /// Radius in tiles of the creature's sight.
    pub sight_radius: u32,
    /// Gold a worker carries before heading to a treasury.
    pub max_gold_carried: u32,
    /// Damage reduction applied to incoming strikes.
    pub defense: f64,
    /// Width in tiles of the creature's bed.
    pub bed_width: u32,
    /// Height in tiles of the creature's bed.
    pub bed_height: u32,
    /// Weapon held when nothing else is equipped.
    pub weapon: Option<Weapon>,
}

impl CreatureDefinition {
    /// Speed of the creature on the provided tile material.
    #[must_use]
    pub fn speed_on(&self, kind: TileKind) -> f64 {
        match kind {
            TileKind::Water => self.move_speed_water,
            TileKind::Lava => self.move_speed_lava,
            _ => self.move_speed_ground,
        }
    }

    /// Built-in creature roster.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                class_name: "Kobold".to_owned(),
                is_worker: true,
                max_hp: 30.0,
                hp_per_level: 3.0,
                heal_rate: 0.1,
                awakeness_decay: 0.0,
                hunger_growth: 0.0,
                sleep_heal_rate: 1.0,
                sleep_awakeness_rate: 2.0,
                dig_rate: 10.0,
                claim_rate: 0.35,
                move_speed_ground: 1.0,
                move_speed_water: 0.0,
                move_speed_lava: 0.0,
                sight_radius: 8,
                max_gold_carried: 1_500,
                defense: 1.0,
                bed_width: 1,
                bed_height: 1,
                weapon: Some(Weapon {
                    name: "Claws".to_owned(),
                    damage: 2.0,
                    range: 1,
                    defense: 0.0,
                }),
            },
            Self {
                class_name: "Troll".to_owned(),
                is_worker: false,
                max_hp: 120.0,
                hp_per_level: 12.0,
                heal_rate: 0.2,
                awakeness_decay: 0.4,
                hunger_growth: 0.3,
                sleep_heal_rate: 2.0,
                sleep_awakeness_rate: 3.0,
                dig_rate: 0.0,
                claim_rate: 0.0,
                move_speed_ground: 1.0,
                move_speed_water: 0.5,
                move_speed_lava: 0.0,
                sight_radius: 10,
                max_gold_carried: 0,
                defense: 4.0,
                bed_width: 2,
                bed_height: 1,
                weapon: Some(Weapon {
                    name: "Club".to_owned(),
                    damage: 9.0,
                    range: 1,
                    defense: 1.0,
                }),
            },
            Self {
                class_name: "Wizard".to_owned(),
                is_worker: false,
                max_hp: 60.0,
                hp_per_level: 6.0,
                heal_rate: 0.15,
                awakeness_decay: 0.5,
                hunger_growth: 0.2,
                sleep_heal_rate: 1.5,
                sleep_awakeness_rate: 4.0,
                dig_rate: 0.0,
                claim_rate: 0.0,
                move_speed_ground: 1.0,
                move_speed_water: 0.0,
                move_speed_lava: 0.0,
                sight_radius: 12,
                max_gold_carried: 0,
                defense: 1.5,
                bed_width: 1,
                bed_height: 2,
                weapon: Some(Weapon {
                    name: "Staff".to_owned(),
                    damage: 6.0,
                    range: 3,
                    defense: 0.0,
                }),
            },
            Self {
                class_name: "Bat".to_owned(),
                is_worker: false,
                max_hp: 25.0,
                hp_per_level: 2.0,
                heal_rate: 0.1,
                awakeness_decay: 0.6,
                hunger_growth: 0.4,
                sleep_heal_rate: 1.0,
                sleep_awakeness_rate: 5.0,
                dig_rate: 0.0,
                claim_rate: 0.0,
                move_speed_ground: 1.5,
                move_speed_water: 1.5,
                move_speed_lava: 1.5,
                sight_radius: 9,
                max_gold_carried: 0,
                defense: 0.5,
                bed_width: 1,
                bed_height: 1,
                weapon: Some(Weapon {
                    name: "Fangs".to_owned(),
                    damage: 3.0,
                    range: 1,
                    defense: 0.0,
                }),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_contains_worker_class() {
        let config = SimulationConfig::default();
        let worker = config
            .definition(&config.spawning.worker_class)
            .expect("worker class defined");
        assert!(worker.is_worker);
    }

    #[test]
    fn speed_on_liquids_uses_terrain_specific_values() {
        let config = SimulationConfig::default();
        let bat = config.definition("Bat").expect("bat defined");
        let troll = config.definition("Troll").expect("troll defined");
        assert!(bat.speed_on(TileKind::Lava) > 0.0);
        assert!(troll.speed_on(TileKind::Lava) == 0.0);
        assert!(troll.speed_on(TileKind::Water) > 0.0);
    }
}
