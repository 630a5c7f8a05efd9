// Particle factories.
//
// Named constructors for the misc entities the engine itself spawns. Each
// factory asks the pool for one slot, fills in the variant's fixed sprite
// extent and initial animation state, tags it, and places it. A full pool
// is routine during crashes and long breakdowns, so every factory returns
// `Option<EntityId>`; `None` means the effect was dropped and nothing else
// happened.
//
// - `Smoke::create` / `create_black_smoke`: smoke above a broken-down car.
// - `Exhaust::create`: steam/diesel puff, refused off the map.
// - `MoneyEffect::create`: floating income figure, window-coloured when a
//   company is given, red/green otherwise.
//
// See also: `pool.rs` for allocation, `breakdown.rs` for the smoke cadence.

use crate::entity::{Exhaust, MiscEntityType, MiscPayload, MoneyEffect, Smoke, SpriteExtent};
use crate::pool::EntityPool;
use crate::types::{CompanyId, EntityId, ObjectId, WorldPos};

const SMOKE_EXTENT: SpriteExtent = SpriteExtent::new(44, 32, 34);
const EXHAUST_EXTENT: SpriteExtent = SpriteExtent::new(20, 32, 36);
const MONEY_EXTENT: SpriteExtent = SpriteExtent::new(64, 20, 30);

impl Smoke {
    /// Spawn a black smoke puff at `position`.
    pub fn create(pool: &mut EntityPool, position: WorldPos) -> Option<EntityId> {
        let id = pool.allocate(
            position,
            MiscEntityType::Smoke,
            MiscPayload::Smoke(Smoke { frame: 0 }),
            SMOKE_EXTENT,
        );
        if id.is_none() {
            log::trace!("entity pool full, dropping smoke at {position}");
        }
        id
    }
}

/// Black smoke above a broken-down car. Same as [`Smoke::create`].
pub fn create_black_smoke(pool: &mut EntityPool, position: WorldPos) -> Option<EntityId> {
    Smoke::create(pool, position)
}

impl Exhaust {
    /// Spawn an exhaust puff of steam-effect `object_id` at `position`.
    ///
    /// Positions outside `[0, map_extent)` on either planar axis are refused.
    pub fn create(
        pool: &mut EntityPool,
        position: WorldPos,
        object_id: ObjectId,
        map_extent: i16,
    ) -> Option<EntityId> {
        let on_map = (0..map_extent).contains(&position.x) && (0..map_extent).contains(&position.y);
        if !on_map {
            return None;
        }
        let id = pool.allocate(
            position,
            MiscEntityType::Exhaust,
            MiscPayload::Exhaust(Exhaust {
                object_id,
                frame: 0,
                stationary_progress: 0,
                wind_progress: 0,
            }),
            EXHAUST_EXTENT,
        );
        if id.is_none() {
            log::trace!("entity pool full, dropping exhaust at {position}");
        }
        id
    }
}

impl MoneyEffect {
    /// Spawn a floating currency figure for `amount`.
    pub fn create(
        pool: &mut EntityPool,
        position: WorldPos,
        company: Option<CompanyId>,
        amount: i32,
    ) -> Option<EntityId> {
        let tag = match company {
            Some(_) => MiscEntityType::WindowCurrency,
            None => MiscEntityType::RedGreenCurrency,
        };
        let id = pool.allocate(
            position,
            tag,
            MiscPayload::Money(MoneyEffect {
                amount,
                company,
                frame: 0,
                num_movements: 0,
                offset_x: 0,
                wiggle: 0,
            }),
            MONEY_EXTENT,
        );
        if id.is_none() {
            log::trace!("entity pool full, dropping money effect at {position}");
        }
        id
    }
}
