//! Participating factions and their resources.

use opendungeons_core::{CreatureId, GoalKind, GoalStatus, LevelSeat, SeatId};

/// Authoritative state of a seat.
#[derive(Clone, Debug)]
pub(crate) struct Seat {
    pub(crate) id: SeatId,
    pub(crate) team: u32,
    pub(crate) color: u32,
    pub(crate) gold: i64,
    pub(crate) mana: f64,
    pub(crate) gold_delta: i64,
    pub(crate) mana_delta: f64,
    pub(crate) claimed_tiles: u32,
    pub(crate) goals: Vec<(GoalKind, GoalStatus)>,
    pub(crate) hand: Vec<CreatureId>,
    gold_at_last_upkeep: i64,
}

impl Seat {
    pub(crate) fn from_level(seat: &LevelSeat) -> Self {
        Self {
            id: seat.id,
            team: seat.team,
            color: seat.color,
            gold: seat.gold,
            mana: seat.mana,
            gold_delta: 0,
            mana_delta: 0.0,
            claimed_tiles: 0,
            goals: seat
                .goals
                .iter()
                .map(|goal| (*goal, GoalStatus::Active))
                .collect(),
            hand: Vec::new(),
            gold_at_last_upkeep: seat.gold,
        }
    }

    /// Records the gold variation since the previous upkeep.
    pub(crate) fn settle_gold(&mut self) {
        self.gold_delta = self.gold - self.gold_at_last_upkeep;
        self.gold_at_last_upkeep = self.gold;
    }

    /// Adds the mana income of the turn, bounded by `max_mana`.
    pub(crate) fn accrue_mana(&mut self, income: f64, max_mana: f64) {
        let before = self.mana;
        self.mana = (self.mana + income).min(max_mana).max(0.0);
        self.mana_delta = self.mana - before;
    }
}

/// Seats ordered by identifier.
#[derive(Clone, Debug, Default)]
pub(crate) struct SeatRegistry {
    seats: Vec<Seat>,
}

impl SeatRegistry {
    pub(crate) fn insert(&mut self, seat: Seat) -> bool {
        match self.seats.binary_search_by_key(&seat.id, |existing| existing.id) {
            Ok(_) => false,
            Err(position) => {
                self.seats.insert(position, seat);
                true
            }
        }
    }

    pub(crate) fn get(&self, id: SeatId) -> Option<&Seat> {
        self.seats
            .binary_search_by_key(&id, |seat| seat.id)
            .ok()
            .map(|index| &self.seats[index])
    }

    pub(crate) fn get_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats
            .binary_search_by_key(&id, |seat| seat.id)
            .ok()
            .map(move |index| &mut self.seats[index])
    }

    pub(crate) fn contains(&self, id: SeatId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Seat> {
        self.seats.iter_mut()
    }

    /// Seats are allied with themselves and with every seat of their team.
    pub(crate) fn allied(&self, first: SeatId, second: SeatId) -> bool {
        if first == second {
            return true;
        }
        match (self.get(first), self.get(second)) {
            (Some(a), Some(b)) => a.team == b.team,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_seat(id: u32, team: u32) -> LevelSeat {
        LevelSeat {
            id: SeatId::new(id),
            team,
            color: id,
            gold: 100,
            mana: 0.0,
            goals: vec![GoalKind::ClaimTiles(4)],
        }
    }

    #[test]
    fn alliance_follows_team() {
        let mut seats = SeatRegistry::default();
        assert!(seats.insert(Seat::from_level(&level_seat(2, 1))));
        assert!(seats.insert(Seat::from_level(&level_seat(1, 1))));
        assert!(seats.insert(Seat::from_level(&level_seat(3, 2))));
        assert!(!seats.insert(Seat::from_level(&level_seat(3, 2))));

        assert!(seats.allied(SeatId::new(1), SeatId::new(2)));
        assert!(!seats.allied(SeatId::new(1), SeatId::new(3)));
        assert!(seats.allied(SeatId::new(9), SeatId::new(9)));
        let order: Vec<_> = seats.iter().map(|seat| seat.id.get()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn gold_delta_tracks_changes_between_upkeeps() {
        let mut seat = Seat::from_level(&level_seat(1, 1));
        seat.gold += 40;
        seat.settle_gold();
        assert_eq!(seat.gold_delta, 40);
        seat.settle_gold();
        assert_eq!(seat.gold_delta, 0);
    }

    #[test]
    fn mana_is_capped() {
        let mut seat = Seat::from_level(&level_seat(1, 1));
        seat.accrue_mana(10.0, 6.0);
        assert_eq!(seat.mana, 6.0);
        assert_eq!(seat.mana_delta, 6.0);
        assert_eq!(seat.goals, vec![(GoalKind::ClaimTiles(4), GoalStatus::Active)]);
    }
}
