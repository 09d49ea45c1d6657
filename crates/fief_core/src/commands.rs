//! Command intents: the single mutation pathway into the simulation.
//!
//! Every intent - human or scripted - validates issuer ownership,
//! affordability and type compatibility, and is a silent no-op when a
//! precondition fails. A move command is "smart": directed at an entity
//! it becomes attack, gather, build or repair depending on what was
//! clicked and who owns it; directed at open ground it is a plain walk.

use tracing::debug;

use crate::data::{BuildingType, UnitType};
use crate::entity::{Entity, EntityId, EntityKind, Owner, QueuedUnit, UnitState};
use crate::math::Vec2Fixed;
use crate::simulation::Simulation;
use crate::{economy, entity::Health};

impl Simulation {
    /// Replace the human selection wholesale. The first id is the primary
    /// selection for display purposes; order is otherwise meaningless.
    pub fn select(&mut self, ids: Vec<EntityId>) {
        if self.game_over {
            return;
        }
        self.selection = ids;
    }

    /// Arm or clear the pending building placement marker (UI state for
    /// "click where to build").
    pub fn set_pending_placement(&mut self, building_type: Option<BuildingType>) {
        if self.game_over {
            return;
        }
        self.pending_placement = building_type;
    }

    /// Stop: drop every order and stand down. Idempotent on idle units.
    pub fn stop(&mut self, issuer: Owner, unit_ids: &[EntityId]) {
        if self.game_over || issuer == Owner::Neutral {
            return;
        }
        for &id in unit_ids {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if entity.owner != issuer {
                continue;
            }
            if let Some(unit) = entity.as_unit_mut() {
                unit.clear_orders();
            }
        }
    }

    /// Move the given units to `point`, or act on `target_id` when one is
    /// under the cursor (attack a hostile, gather a deposit or farm,
    /// build/repair an own building - peasant-only where applicable).
    pub fn command_move(
        &mut self,
        issuer: Owner,
        unit_ids: &[EntityId],
        point: Vec2Fixed,
        target_id: Option<EntityId>,
    ) {
        if self.game_over || issuer == Owner::Neutral {
            return;
        }
        for &id in unit_ids {
            self.move_one(issuer, id, point, target_id);
        }
    }

    fn move_one(&mut self, issuer: Owner, id: EntityId, point: Vec2Fixed, target_id: Option<EntityId>) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        if entity.owner != issuer {
            return;
        }
        let Some(unit) = entity.as_unit() else {
            return;
        };
        let unit_type = unit.unit_type;

        let Some(target_id) = target_id.filter(|&target| target != id) else {
            self.plain_move(id, point);
            return;
        };
        let Some(target) = self.entities.get(target_id) else {
            self.plain_move(id, point);
            return;
        };

        // Hostile under the cursor: any unit fights.
        if target.is_attackable_by(issuer) {
            if let Some(unit) = self.entities.get_mut(id).and_then(Entity::as_unit_mut) {
                unit.state = UnitState::Attacking;
                unit.target = Some(target_id);
                unit.move_target = None;
            }
            return;
        }

        // The rest of the smart-move table is peasant work.
        if unit_type != UnitType::Peasant {
            self.plain_move(id, point);
            return;
        }

        enum Job {
            Gather(Option<crate::data::ResourceKind>),
            Build,
            ReseedThenGather,
            Walk,
        }

        let job = match &target.kind {
            EntityKind::Resource(resource)
                if target.owner == Owner::Neutral && resource.amount > 0 =>
            {
                Job::Gather(Some(resource.kind))
            }
            EntityKind::Building(building) if target.owner == issuer => {
                if !building.is_built || !target.health.is_full() {
                    Job::Build
                } else if building.building_type == BuildingType::Farm {
                    match building.farm {
                        Some(farm) if !farm.is_depleted() => {
                            Job::Gather(Some(crate::data::ResourceKind::Food))
                        }
                        Some(_) => Job::ReseedThenGather,
                        None => Job::Walk,
                    }
                } else {
                    Job::Walk
                }
            }
            _ => Job::Walk,
        };

        match job {
            Job::Gather(kind) => {
                if let Some(unit) = self.entities.get_mut(id).and_then(Entity::as_unit_mut) {
                    unit.state = UnitState::Gathering;
                    unit.target = Some(target_id);
                    unit.gather_kind = kind;
                }
            }
            Job::Build => {
                if let Some(unit) = self.entities.get_mut(id).and_then(Entity::as_unit_mut) {
                    unit.state = UnitState::Building;
                    unit.target = Some(target_id);
                }
            }
            Job::ReseedThenGather => {
                // Paid action; falls back to a plain walk when broke.
                if economy::try_reseed_farm(&mut self.entities, &mut self.players, target_id) {
                    if let Some(unit) = self.entities.get_mut(id).and_then(Entity::as_unit_mut) {
                        unit.state = UnitState::Gathering;
                        unit.target = Some(target_id);
                        unit.gather_kind = Some(crate::data::ResourceKind::Food);
                    }
                } else {
                    self.plain_move(id, point);
                }
            }
            Job::Walk => self.plain_move(id, point),
        }
    }

    fn plain_move(&mut self, id: EntityId, point: Vec2Fixed) {
        if let Some(unit) = self.entities.get_mut(id).and_then(Entity::as_unit_mut) {
            unit.state = UnitState::Moving;
            unit.move_target = Some(point);
            unit.target = None;
        }
    }

    /// Attack-move: walk to `point`, engaging anything found on the way.
    /// An explicit hostile target turns this into a direct attack order.
    pub fn attack_move(
        &mut self,
        issuer: Owner,
        unit_ids: &[EntityId],
        point: Vec2Fixed,
        target_id: Option<EntityId>,
    ) {
        if self.game_over || issuer == Owner::Neutral {
            return;
        }

        let explicit_target = target_id.filter(|&target| {
            self.entities
                .get(target)
                .is_some_and(|entity| entity.is_attackable_by(issuer))
        });

        for &id in unit_ids {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if entity.owner != issuer {
                continue;
            }
            let Some(unit) = entity.as_unit_mut() else {
                continue;
            };
            match explicit_target {
                Some(target) if target != id => {
                    unit.state = UnitState::Attacking;
                    unit.target = Some(target);
                    unit.move_target = None;
                }
                _ => {
                    unit.state = UnitState::AttackMoving;
                    unit.move_target = Some(point);
                    unit.target = None;
                }
            }
        }
    }

    /// Queue a unit at a production building. Debits the full price at
    /// enqueue time; refused (silently) when the building cannot train
    /// the type, the price is unaffordable, or population is capped.
    pub fn train(&mut self, issuer: Owner, building_id: EntityId, unit_type: UnitType) {
        if self.game_over || issuer == Owner::Neutral {
            return;
        }
        let Some(entity) = self.entities.get(building_id) else {
            return;
        };
        if entity.owner != issuer {
            return;
        }
        let Some(building) = entity.as_building() else {
            return;
        };
        if !building.is_built || !building.building_type.stats().can_train(unit_type) {
            return;
        }
        if !self.players.get(issuer).has_population_room() {
            return;
        }
        let stats = unit_type.stats();
        if !self.players.get_mut(issuer).stockpile.spend(stats.cost) {
            return;
        }
        if let Some(building) = self
            .entities
            .get_mut(building_id)
            .and_then(Entity::as_building_mut)
        {
            building.queue.push_back(QueuedUnit {
                unit_type,
                time_left_ms: stats.train_time_ms,
            });
            debug!(building = building_id, ?unit_type, ?issuer, "queued training");
        }
    }

    /// Place a construction site and put the given peasants to work on
    /// it. Debits the price at placement; clears the human's pending
    /// placement marker.
    pub fn place_building(
        &mut self,
        issuer: Owner,
        building_type: BuildingType,
        point: Vec2Fixed,
        builder_ids: &[EntityId],
    ) {
        if self.game_over || issuer == Owner::Neutral {
            return;
        }
        let stats = building_type.stats();
        if !self.players.get_mut(issuer).stockpile.spend(stats.cost) {
            return;
        }

        let site = self.entities.insert(Entity {
            id: 0,
            owner: issuer,
            position: point,
            radius: stats.radius(),
            health: Health::starting_at(1, stats.hp),
            kind: EntityKind::Building(crate::entity::BuildingData::site(building_type)),
        });
        debug!(site, ?building_type, ?issuer, "building placed");

        for &id in builder_ids {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if entity.owner != issuer {
                continue;
            }
            let Some(unit) = entity.as_unit_mut() else {
                continue;
            };
            if unit.unit_type != UnitType::Peasant {
                continue;
            }
            unit.state = UnitState::Building;
            unit.target = Some(site);
            unit.move_target = None;
        }

        if issuer == Owner::Human {
            self.pending_placement = None;
        }
    }
}
