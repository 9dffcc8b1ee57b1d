//! Creature state, action stacks and leveling.

use std::collections::VecDeque;

use opendungeons_core::{
    Animation, BuildingId, CreatureAction, CreatureDefinition, CreatureId, CreatureSnapshot,
    Rules, SeatId, SimulationConfig, TileCoord, Weapon,
};

use crate::buildings::{Damageable, Upkeepable};

/// Hunger and awakeness are expressed on a 0 to 100 scale.
pub(crate) const NEED_SCALE: f64 = 100.0;

/// LIFO stack of behaviour states that always keeps `Idle` at the bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ActionStack {
    actions: Vec<CreatureAction>,
}

impl ActionStack {
    pub(crate) fn new() -> Self {
        Self {
            actions: vec![CreatureAction::Idle],
        }
    }

    pub(crate) fn push(&mut self, action: CreatureAction) {
        self.actions.push(action);
    }

    /// Removes the top action. The bottom `Idle` is never removed.
    pub(crate) fn pop(&mut self) -> Option<CreatureAction> {
        if self.actions.len() > 1 {
            self.actions.pop()
        } else {
            None
        }
    }

    pub(crate) fn clear(&mut self) {
        self.actions.truncate(1);
        if let Some(bottom) = self.actions.first_mut() {
            *bottom = CreatureAction::Idle;
        } else {
            self.actions.push(CreatureAction::Idle);
        }
    }

    pub(crate) fn as_slice(&self) -> &[CreatureAction] {
        &self.actions
    }
}

/// Bed assigned to a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Home {
    pub(crate) building: BuildingId,
    pub(crate) anchor: TileCoord,
}

/// Authoritative state of a creature.
#[derive(Clone, Debug)]
pub(crate) struct Creature {
    pub(crate) id: CreatureId,
    pub(crate) name: String,
    pub(crate) definition: CreatureDefinition,
    pub(crate) seat: SeatId,
    pub(crate) tile: TileCoord,
    pub(crate) hp: f64,
    pub(crate) max_hp: f64,
    pub(crate) level: u32,
    pub(crate) experience: f64,
    pub(crate) hunger: f64,
    pub(crate) awakeness: f64,
    pub(crate) gold: u32,
    pub(crate) dig_rate: f64,
    pub(crate) claim_rate: f64,
    pub(crate) actions: ActionStack,
    pub(crate) destinations: VecDeque<TileCoord>,
    pub(crate) home: Option<Home>,
    pub(crate) job_room: Option<BuildingId>,
    pub(crate) eat_room: Option<BuildingId>,
    pub(crate) weapon_left: Option<Weapon>,
    pub(crate) weapon_right: Option<Weapon>,
    pub(crate) animation: Animation,
    pub(crate) death_counter: Option<u32>,
    pub(crate) held: bool,
}

/// Parameters of a creature entering the world.
#[derive(Clone, Debug)]
pub(crate) struct CreatureSeed {
    pub(crate) name: String,
    pub(crate) seat: SeatId,
    pub(crate) tile: TileCoord,
    pub(crate) level: u32,
    pub(crate) hp: Option<f64>,
    pub(crate) weapon_left: Option<Weapon>,
    pub(crate) weapon_right: Option<Weapon>,
}

impl Creature {
    pub(crate) fn new(
        id: CreatureId,
        definition: CreatureDefinition,
        seed: CreatureSeed,
        rules: &Rules,
    ) -> Self {
        let mut creature = Self {
            id,
            name: seed.name,
            seat: seed.seat,
            tile: seed.tile,
            hp: definition.max_hp,
            max_hp: definition.max_hp,
            level: 1,
            experience: 0.0,
            hunger: 0.0,
            awakeness: NEED_SCALE,
            gold: 0,
            dig_rate: definition.dig_rate,
            claim_rate: definition.claim_rate,
            actions: ActionStack::new(),
            destinations: VecDeque::new(),
            home: None,
            job_room: None,
            eat_room: None,
            weapon_left: seed.weapon_left.or_else(|| definition.weapon.clone()),
            weapon_right: seed.weapon_right,
            animation: Animation::Idle,
            death_counter: None,
            held: false,
            definition,
        };

        let target = seed.level.clamp(1, rules.max_level.max(1));
        while creature.level < target {
            creature.level_up(rules);
        }
        creature.hp = seed.hp.unwrap_or(creature.max_hp).min(creature.max_hp);
        creature
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.death_counter.is_none()
    }

    pub(crate) fn is_worker(&self) -> bool {
        self.definition.is_worker
    }

    /// Combined damage of the weapons held.
    pub(crate) fn weapon_damage(&self) -> f64 {
        let damage: f64 = self.weapons().map(|weapon| weapon.damage).sum();
        if damage > 0.0 {
            damage
        } else {
            1.0
        }
    }

    /// Longest reach among the weapons held, at least one tile.
    pub(crate) fn weapon_range(&self) -> u32 {
        self.weapons()
            .map(|weapon| weapon.range)
            .max()
            .unwrap_or(1)
            .max(1)
    }

    fn weapons(&self) -> impl Iterator<Item = &Weapon> {
        self.weapon_left.iter().chain(self.weapon_right.iter())
    }

    /// Adds experience and levels the creature up when the threshold is met.
    ///
    /// Returns `true` when a level was gained.
    pub(crate) fn award_experience(&mut self, amount: f64, rules: &Rules) -> bool {
        if amount <= 0.0 || !amount.is_finite() || self.level >= rules.max_level {
            return false;
        }
        self.experience += amount;
        if self.experience >= level_threshold(self.level) {
            self.level_up(rules);
            true
        } else {
            false
        }
    }

    fn level_up(&mut self, rules: &Rules) {
        self.level += 1;
        self.experience = 0.0;
        self.max_hp += self.definition.hp_per_level;
        self.hp = (self.hp + self.definition.hp_per_level).min(self.max_hp);
        if self.is_worker() {
            let level = f64::from(self.level);
            let gain = rules.level_rate_gain * level / (level + 5.0);
            self.dig_rate += gain;
            self.claim_rate += gain;
        }
    }

    pub(crate) fn snapshot(&self) -> CreatureSnapshot {
        CreatureSnapshot {
            id: self.id,
            class: self.definition.class_name.clone(),
            name: self.name.clone(),
            seat: self.seat,
            tile: self.tile,
            hp: self.hp,
            max_hp: self.max_hp,
            level: self.level,
        }
    }

    /// Regenerates hit points and awakeness while lying in bed.
    pub(crate) fn rest(&mut self) {
        self.hp = (self.hp + self.definition.sleep_heal_rate).min(self.max_hp);
        self.awakeness = (self.awakeness + self.definition.sleep_awakeness_rate).min(NEED_SCALE);
    }
}

/// Experience required to leave `level`.
pub(crate) fn level_threshold(level: u32) -> f64 {
    let level = f64::from(level);
    5.0 * (level + (level / 3.0).powi(2))
}

impl Damageable for Creature {
    fn defense(&self) -> f64 {
        self.definition.defense + self.weapons().map(|weapon| weapon.defense).sum::<f64>()
    }

    fn take_damage(&mut self, amount: f64, _at: TileCoord) -> f64 {
        if amount <= 0.0 || !self.is_alive() {
            return 0.0;
        }
        self.hp -= amount;
        amount
    }
}

impl Upkeepable for Creature {
    type Report = ();

    fn upkeep(&mut self, _config: &SimulationConfig) {
        if !self.is_alive() || self.held {
            return;
        }
        self.hp = (self.hp + self.definition.heal_rate).min(self.max_hp);
        self.awakeness = (self.awakeness - self.definition.awakeness_decay).max(0.0);
        self.hunger = (self.hunger + self.definition.hunger_growth).min(NEED_SCALE);
    }
}

/// Creatures stored in insertion order.
#[derive(Clone, Debug)]
pub(crate) struct CreatureRegistry {
    creatures: Vec<Creature>,
    next_id: CreatureId,
}

impl CreatureRegistry {
    pub(crate) fn new() -> Self {
        Self {
            creatures: Vec::new(),
            next_id: CreatureId::new(1),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> CreatureId {
        let id = self.next_id;
        self.next_id = CreatureId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn push(&mut self, creature: Creature) {
        self.creatures.push(creature);
    }

    pub(crate) fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.iter().find(|creature| creature.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|creature| creature.id == id)
    }

    pub(crate) fn remove(&mut self, id: CreatureId) -> Option<Creature> {
        let index = self.creatures.iter().position(|creature| creature.id == id)?;
        Some(self.creatures.remove(index))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.iter()
    }

    pub(crate) fn ids(&self) -> Vec<CreatureId> {
        self.creatures.iter().map(|creature| creature.id).collect()
    }
}
