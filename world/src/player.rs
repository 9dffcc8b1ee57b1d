//! Commands issued by players between turns.

use opendungeons_core::{
    BuildingKind, CommandError, CreatureId, CreatureSound, Event, RoomKind, SeatId, TileCoord,
    TileKind, TrapKind,
};

use crate::{admits, World};

impl World {
    pub(crate) fn mark_tiles_for_digging(
        &mut self,
        tiles: &[TileCoord],
        marked: bool,
        seat: SeatId,
    ) -> Result<(), CommandError> {
        if !self.seats.contains(seat) {
            return Err(CommandError::UnknownSeat(seat));
        }
        if tiles.is_empty() {
            return Err(CommandError::NoTiles);
        }
        if let Some(outside) = tiles.iter().find(|coord| !self.grid.contains(**coord)) {
            return Err(CommandError::OutOfBounds(*outside));
        }

        for &coord in tiles {
            let diggable = self
                .grid
                .tile(coord)
                .map_or(false, |tile| self.is_diggable_for(tile, seat));
            let Some(tile) = self.grid.tile_mut(coord) else {
                continue;
            };
            if marked {
                if diggable {
                    let _ = tile.dig_marks.insert(seat);
                }
            } else {
                let _ = tile.dig_marks.remove(&seat);
            }
        }
        Ok(())
    }

    pub(crate) fn build_room(
        &mut self,
        tiles: &[TileCoord],
        kind: RoomKind,
        seat: SeatId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        if !kind.is_buildable() {
            return Err(CommandError::RoomNotBuildable(kind));
        }
        let site = self.validate_site(tiles, seat)?;
        let cost = self.charge(seat, self.config.economy.room_cost(kind), site.len())?;

        let id = self
            .buildings
            .insert(BuildingKind::Room(kind), seat, &site, &self.config);
        self.cover_tiles(id, &site);
        self.refresh_active_spots(id);
        tracing::debug!(building = id.get(), ?kind, seat = seat.get(), cost, "room built");

        out_events.push(Event::RoomBuilt {
            building: id,
            kind,
            seat,
            tiles: site,
        });
        Ok(())
    }

    pub(crate) fn build_trap(
        &mut self,
        tiles: &[TileCoord],
        kind: TrapKind,
        seat: SeatId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let site = self.validate_site(tiles, seat)?;
        let cost = self.charge(seat, self.config.economy.trap_cost(kind), site.len())?;

        let id = self
            .buildings
            .insert(BuildingKind::Trap(kind), seat, &site, &self.config);
        self.cover_tiles(id, &site);
        tracing::debug!(building = id.get(), ?kind, seat = seat.get(), cost, "trap built");

        out_events.push(Event::TrapBuilt {
            building: id,
            kind,
            seat,
            tiles: site,
        });
        Ok(())
    }

    /// Checks that every tile is uncovered floor claimed by the seat.
    fn validate_site(&self, tiles: &[TileCoord], seat: SeatId) -> Result<Vec<TileCoord>, CommandError> {
        if !self.seats.contains(seat) {
            return Err(CommandError::UnknownSeat(seat));
        }
        if tiles.is_empty() {
            return Err(CommandError::NoTiles);
        }

        let mut site = tiles.to_vec();
        site.sort_unstable();
        site.dedup();
        for &coord in &site {
            let tile = self
                .grid
                .tile(coord)
                .ok_or(CommandError::OutOfBounds(coord))?;
            if !tile.is_walkable() || !tile.is_claimed_by(seat) || tile.building.is_some() {
                return Err(CommandError::TileNotBuildable(coord));
            }
        }
        Ok(site)
    }

    /// Verifies affordability, then takes the gold. Returns the amount paid.
    fn charge(&mut self, seat: SeatId, cost_per_tile: i64, tiles: usize) -> Result<i64, CommandError> {
        let count = i64::try_from(tiles).unwrap_or(i64::MAX);
        let required = cost_per_tile.saturating_mul(count);
        let available = self
            .seats
            .get(seat)
            .map(|entry| entry.gold)
            .ok_or(CommandError::UnknownSeat(seat))?;
        if available < required {
            return Err(CommandError::InsufficientGold {
                required,
                available,
            });
        }
        self.spend_gold(seat, required);
        Ok(required)
    }

    pub(crate) fn pick_up_creature(
        &mut self,
        id: CreatureId,
        seat: SeatId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        if !self.seats.contains(seat) {
            return Err(CommandError::UnknownSeat(seat));
        }
        let creature = self
            .creatures
            .get(id)
            .ok_or(CommandError::UnknownCreature(id))?;
        if creature.seat != seat {
            return Err(CommandError::NotOwner { seat });
        }
        if !creature.is_alive() {
            return Err(CommandError::Dead(id));
        }
        if creature.held {
            return Err(CommandError::Held(id));
        }
        let tile = creature.tile;

        self.leave_rooms(id);
        if let Some(creature) = self.creatures.get_mut(id) {
            creature.held = true;
            creature.actions.clear();
            creature.destinations.clear();
        }
        if let Some(tile) = self.grid.tile_mut(tile) {
            tile.occupants.retain(|occupant| *occupant != id);
        }
        if let Some(entry) = self.seats.get_mut(seat) {
            entry.hand.push(id);
        }

        out_events.push(Event::CreatureSound {
            creature: id,
            sound: CreatureSound::Pickup,
        });
        Ok(())
    }

    pub(crate) fn drop_creature(
        &mut self,
        id: CreatureId,
        coord: TileCoord,
        seat: SeatId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let holds = self
            .seats
            .get(seat)
            .ok_or(CommandError::UnknownSeat(seat))?
            .hand
            .contains(&id);
        let creature = self
            .creatures
            .get(id)
            .ok_or(CommandError::UnknownCreature(id))?;
        if !holds {
            return Err(CommandError::NotHeld(id));
        }
        let tile = self
            .grid
            .tile(coord)
            .ok_or(CommandError::OutOfBounds(coord))?;
        let friendly = tile.kind == TileKind::Claimed
            && tile.owner.map_or(false, |owner| self.allied(owner, seat));
        if !friendly || !admits(&creature.definition, tile) {
            return Err(CommandError::InvalidTarget(coord));
        }

        let snapshot = {
            let Some(creature) = self.creatures.get_mut(id) else {
                return Err(CommandError::UnknownCreature(id));
            };
            creature.held = false;
            creature.tile = coord;
            creature.snapshot()
        };
        if let Some(tile) = self.grid.tile_mut(coord) {
            tile.occupants.push(id);
        }
        if let Some(entry) = self.seats.get_mut(seat) {
            entry.hand.retain(|held| *held != id);
        }

        out_events.push(Event::CreatureSound {
            creature: id,
            sound: CreatureSound::Drop,
        });
        out_events.push(Event::CreatureRefreshed { creature: snapshot });
        Ok(())
    }
}
