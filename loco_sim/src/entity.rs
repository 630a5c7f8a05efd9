// Entity header and the tagged misc-entity variants.
//
// Every pooled entity starts with an `EntityBase`: its pool slot id, map
// position, the links that thread it into the pool's live list, and the
// sprite extent the renderer uses to compute which screen region to redraw.
//
// Misc entities (particles and other short-lived effects) carry a subtype
// tag, `MiscEntityType`, next to a `MiscPayload`. The tag is written once
// when the pool builds the entity and there is no way to change it
// afterwards. Code that needs a specific variant goes through a checked
// accessor (`as_smoke()`, `as_variant(tag)`, ...): the accessor compares the
// stored tag first and returns `None` on mismatch, so a smoke puff can never
// be read as a money effect. Both currency tags share the `MoneyEffect`
// payload; `as_red_green_currency()` and `as_window_currency()` still tell
// them apart by tag.
//
// Only `Smoke`, `Exhaust` and `MoneyEffect` have factories in this crate
// (see `particle.rs`). The other variants are pure data records produced by
// the crash and explosion code, which lives outside the engine; their tagging
// is what matters here.
//
// See also: `pool.rs` for allocation and the live list, `particle.rs` for the
// factories.

use crate::types::{CompanyId, EntityId, ObjectId, WorldPos};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared header
// ---------------------------------------------------------------------------

/// Screen footprint of an entity's sprite, around its projected position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteExtent {
    pub width: u8,
    pub height_negative: u8,
    pub height_positive: u8,
}

impl SpriteExtent {
    pub const fn new(width: u8, height_negative: u8, height_positive: u8) -> Self {
        Self {
            width,
            height_negative,
            height_positive,
        }
    }
}

/// Common header of every pooled entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBase {
    pub id: EntityId,
    pub position: WorldPos,
    pub extent: SpriteExtent,
    /// Previous live entity in allocation order.
    pub(crate) prev: Option<EntityId>,
    /// Next live entity in allocation order.
    pub(crate) next: Option<EntityId>,
}

impl EntityBase {
    pub(crate) fn new(id: EntityId, position: WorldPos, extent: SpriteExtent) -> Self {
        Self {
            id,
            position,
            extent,
            prev: None,
            next: None,
        }
    }

    pub fn prev(&self) -> Option<EntityId> {
        self.prev
    }

    pub fn next(&self) -> Option<EntityId> {
        self.next
    }

    pub fn move_to(&mut self, position: WorldPos) {
        self.position = position;
    }
}

// ---------------------------------------------------------------------------
// Subtype tags
// ---------------------------------------------------------------------------

/// Subtype tag of a misc entity. The discriminants are the persisted values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum MiscEntityType {
    /// Steam or diesel exhaust puff.
    Exhaust = 0,
    /// Floating income/expense figure, red or green.
    RedGreenCurrency = 1,
    /// Income figure in the company colour, shown when a train delivers.
    WindowCurrency = 2,
    /// Debris thrown out by a crash.
    VehicleCrashParticle = 3,
    ExplosionCloud = 4,
    /// Debris landing in water.
    Splash = 5,
    Fireball = 6,
    ExplosionSmoke = 7,
    /// Black smoke above a broken-down car.
    Smoke = 8,
}

impl MiscEntityType {
    pub const ALL: [Self; 9] = [
        Self::Exhaust,
        Self::RedGreenCurrency,
        Self::WindowCurrency,
        Self::VehicleCrashParticle,
        Self::ExplosionCloud,
        Self::Splash,
        Self::Fireball,
        Self::ExplosionSmoke,
        Self::Smoke,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Exhaust puff emitted by a steam or diesel engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exhaust {
    /// Steam/exhaust effect definition in the object catalog.
    pub object_id: ObjectId,
    pub frame: u16,
    pub stationary_progress: i16,
    pub wind_progress: i16,
}

/// Floating currency figure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyEffect {
    pub amount: i32,
    /// Company whose colour the figure is drawn in; `None` for red/green.
    pub company: Option<CompanyId>,
    pub frame: u16,
    pub num_movements: u16,
    pub offset_x: i16,
    pub wiggle: u16,
}

/// Primary and secondary colour of a vehicle livery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColourScheme {
    pub primary: u8,
    pub secondary: u8,
}

/// A piece of a crashed vehicle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCrashParticle {
    pub frame: u16,
    pub colour_scheme: ColourScheme,
    pub crashed_sprite_base: u16,
}

macro_rules! frame_effect {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Current frame of the effect's animation sequence.
            pub frame: u16,
        }
    };
}

frame_effect!(ExplosionCloud);
frame_effect!(Splash);
frame_effect!(Fireball);
frame_effect!(ExplosionSmoke);
frame_effect!(/// Black smoke above a broken-down car.
Smoke);

/// Variant data of a misc entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiscPayload {
    Exhaust(Exhaust),
    Money(MoneyEffect),
    VehicleCrashParticle(VehicleCrashParticle),
    ExplosionCloud(ExplosionCloud),
    Splash(Splash),
    Fireball(Fireball),
    ExplosionSmoke(ExplosionSmoke),
    Smoke(Smoke),
}

impl MiscPayload {
    /// Whether this payload has the shape that `tag` requires.
    pub fn fits(&self, tag: MiscEntityType) -> bool {
        use MiscEntityType as T;
        matches!(
            (tag, self),
            (T::Exhaust, Self::Exhaust(_))
                | (T::RedGreenCurrency | T::WindowCurrency, Self::Money(_))
                | (T::VehicleCrashParticle, Self::VehicleCrashParticle(_))
                | (T::ExplosionCloud, Self::ExplosionCloud(_))
                | (T::Splash, Self::Splash(_))
                | (T::Fireball, Self::Fireball(_))
                | (T::ExplosionSmoke, Self::ExplosionSmoke(_))
                | (T::Smoke, Self::Smoke(_))
        )
    }
}

// ---------------------------------------------------------------------------
// Tagged entity
// ---------------------------------------------------------------------------

/// A pooled misc entity: header, fixed subtype tag, variant payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscEntity {
    pub base: EntityBase,
    sub_type: MiscEntityType,
    payload: MiscPayload,
}

macro_rules! checked_view {
    ($get:ident, $get_mut:ident, $tag:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&self) -> Option<&$ty> {
            match (self.sub_type, &self.payload) {
                (MiscEntityType::$tag, MiscPayload::$variant(v)) => Some(v),
                _ => None,
            }
        }

        pub fn $get_mut(&mut self) -> Option<&mut $ty> {
            match (self.sub_type, &mut self.payload) {
                (MiscEntityType::$tag, MiscPayload::$variant(v)) => Some(v),
                _ => None,
            }
        }
    };
}

impl MiscEntity {
    /// Pair a header with a tag and payload. Returns `None` if the payload
    /// does not have the shape the tag requires.
    pub(crate) fn new(base: EntityBase, sub_type: MiscEntityType, payload: MiscPayload) -> Option<Self> {
        payload.fits(sub_type).then_some(Self {
            base,
            sub_type,
            payload,
        })
    }

    pub fn id(&self) -> EntityId {
        self.base.id
    }

    pub fn position(&self) -> WorldPos {
        self.base.position
    }

    pub fn sub_type(&self) -> MiscEntityType {
        self.sub_type
    }

    /// The payload, if and only if the stored tag equals `tag`.
    pub fn as_variant(&self, tag: MiscEntityType) -> Option<&MiscPayload> {
        (self.sub_type == tag && self.payload.fits(tag)).then_some(&self.payload)
    }

    checked_view!(as_exhaust, as_exhaust_mut, Exhaust, Exhaust, Exhaust);
    checked_view!(as_red_green_currency, as_red_green_currency_mut, RedGreenCurrency, Money, MoneyEffect);
    checked_view!(as_window_currency, as_window_currency_mut, WindowCurrency, Money, MoneyEffect);
    checked_view!(
        as_vehicle_crash_particle,
        as_vehicle_crash_particle_mut,
        VehicleCrashParticle,
        VehicleCrashParticle,
        VehicleCrashParticle
    );
    checked_view!(as_explosion_cloud, as_explosion_cloud_mut, ExplosionCloud, ExplosionCloud, ExplosionCloud);
    checked_view!(as_splash, as_splash_mut, Splash, Splash, Splash);
    checked_view!(as_fireball, as_fireball_mut, Fireball, Fireball, Fireball);
    checked_view!(as_explosion_smoke, as_explosion_smoke_mut, ExplosionSmoke, ExplosionSmoke, ExplosionSmoke);
    checked_view!(as_smoke, as_smoke_mut, Smoke, Smoke, Smoke);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_for(tag: MiscEntityType) -> MiscPayload {
        match tag {
            MiscEntityType::Exhaust => MiscPayload::Exhaust(Exhaust::default()),
            MiscEntityType::RedGreenCurrency | MiscEntityType::WindowCurrency => {
                MiscPayload::Money(MoneyEffect::default())
            }
            MiscEntityType::VehicleCrashParticle => {
                MiscPayload::VehicleCrashParticle(VehicleCrashParticle::default())
            }
            MiscEntityType::ExplosionCloud => MiscPayload::ExplosionCloud(ExplosionCloud::default()),
            MiscEntityType::Splash => MiscPayload::Splash(Splash::default()),
            MiscEntityType::Fireball => MiscPayload::Fireball(Fireball::default()),
            MiscEntityType::ExplosionSmoke => MiscPayload::ExplosionSmoke(ExplosionSmoke::default()),
            MiscEntityType::Smoke => MiscPayload::Smoke(Smoke::default()),
        }
    }

    fn entity(tag: MiscEntityType) -> MiscEntity {
        let base = EntityBase::new(EntityId(0), WorldPos::default(), SpriteExtent::default());
        MiscEntity::new(base, tag, payload_for(tag)).unwrap()
    }

    /// Number of typed accessors that return a value for this entity.
    fn typed_hits(e: &MiscEntity) -> usize {
        [
            e.as_exhaust().is_some(),
            e.as_red_green_currency().is_some(),
            e.as_window_currency().is_some(),
            e.as_vehicle_crash_particle().is_some(),
            e.as_explosion_cloud().is_some(),
            e.as_splash().is_some(),
            e.as_fireball().is_some(),
            e.as_explosion_smoke().is_some(),
            e.as_smoke().is_some(),
        ]
        .iter()
        .filter(|hit| **hit)
        .count()
    }

    #[test]
    fn as_variant_matches_only_own_tag() {
        for stored in MiscEntityType::ALL {
            let e = entity(stored);
            for probe in MiscEntityType::ALL {
                assert_eq!(
                    e.as_variant(probe).is_some(),
                    probe == stored,
                    "stored {stored:?}, probed {probe:?}"
                );
            }
        }
    }

    #[test]
    fn exactly_one_typed_accessor_matches() {
        for tag in MiscEntityType::ALL {
            assert_eq!(typed_hits(&entity(tag)), 1, "{tag:?}");
        }
    }

    #[test]
    fn currency_tags_share_payload_but_not_views() {
        let red_green = entity(MiscEntityType::RedGreenCurrency);
        assert!(red_green.as_red_green_currency().is_some());
        assert!(red_green.as_window_currency().is_none());

        let window = entity(MiscEntityType::WindowCurrency);
        assert!(window.as_window_currency().is_some());
        assert!(window.as_red_green_currency().is_none());
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let base = EntityBase::new(EntityId(3), WorldPos::default(), SpriteExtent::default());
        let made = MiscEntity::new(base, MiscEntityType::Smoke, MiscPayload::Splash(Splash::default()));
        assert!(made.is_none());
    }

    #[test]
    fn mutable_view_writes_through() {
        let mut e = entity(MiscEntityType::Smoke);
        e.as_smoke_mut().unwrap().frame = 7;
        assert_eq!(e.as_smoke().unwrap().frame, 7);
        assert!(e.as_fireball_mut().is_none());
    }

    #[test]
    fn tag_discriminants_are_stable() {
        for (i, tag) in MiscEntityType::ALL.iter().enumerate() {
            assert_eq!(*tag as u8 as usize, i);
            assert_eq!(MiscEntityType::from_u8(i as u8), Some(*tag));
        }
        assert_eq!(MiscEntityType::from_u8(9), None);
    }
}
