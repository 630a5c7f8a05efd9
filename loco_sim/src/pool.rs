// Fixed-capacity pool of misc entities.
//
// The pool is the one shared mutable resource of the engine. It owns a fixed
// number of slots; `allocate()` takes the lowest free slot, builds the entity
// (header, tag, payload) in a single step and appends it to the live list.
// Nothing ever observes a half-initialised entity, and a full pool is not an
// error: `allocate()` returns `None` and the caller drops its effect.
//
// Live entities are threaded into a doubly linked list through the
// `prev`/`next` links of their `EntityBase`, in allocation order. Walking the
// list (`iter()`, `for_each_of_tag()`) therefore visits entities in a
// deterministic order that survives save/load, independent of slot reuse.
//
// The engine only ever creates entities. Ageing and destruction belong to the
// effect animator outside the crate: once per tick it calls `retain()`, which
// walks the live list in order with mutable access, lets it advance frames,
// and frees every entity it rejects. Without that, a long breakdown fills the
// pool and later effects are dropped.
//
// A loaded pool is checked by `validate()` before use, since the links are
// followed as slot indices.
//
// See also: `entity.rs` for the header and tags, `particle.rs` for the named
// factories that wrap `allocate()`.

use crate::entity::{EntityBase, MiscEntity, MiscEntityType, MiscPayload, SpriteExtent};
use crate::error::SimError;
use crate::types::{EntityId, WorldPos};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPool {
    slots: Vec<Option<MiscEntity>>,
    /// Oldest live entity.
    first: Option<EntityId>,
    /// Newest live entity.
    last: Option<EntityId>,
    len: usize,
}

impl EntityPool {
    /// An empty pool with `capacity` slots. Capacity is clamped to the id
    /// range.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(u16::MAX as usize + 1);
        Self {
            slots: vec![None; capacity],
            first: None,
            last: None,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Create a fully initialised entity in the lowest free slot.
    ///
    /// Returns `None` when the pool is exhausted, or when `payload` does not
    /// have the shape `tag` requires (a caller bug, asserted in debug builds).
    pub fn allocate(
        &mut self,
        position: WorldPos,
        tag: MiscEntityType,
        payload: MiscPayload,
        extent: SpriteExtent,
    ) -> Option<EntityId> {
        debug_assert!(payload.fits(tag), "payload does not fit tag {tag:?}");
        let index = self.slots.iter().position(Option::is_none)?;
        let id = EntityId(index as u16);

        let mut base = EntityBase::new(id, position, extent);
        base.prev = self.last;
        let entity = MiscEntity::new(base, tag, payload)?;

        if let Some(last) = self.last.and_then(|l| self.slot_mut(l)) {
            last.base.next = Some(id);
        }
        if self.first.is_none() {
            self.first = Some(id);
        }
        self.last = Some(id);
        self.slots[index] = Some(entity);
        self.len += 1;
        Some(id)
    }

    /// Remove an entity, unlinking it from the live list. Returns the removed
    /// entity, or `None` if the slot was already empty.
    pub fn free(&mut self, id: EntityId) -> Option<MiscEntity> {
        let entity = self.slots.get_mut(id.0 as usize)?.take()?;
        let (prev, next) = (entity.base.prev, entity.base.next);

        match prev.and_then(|p| self.slot_mut(p)) {
            Some(p) => p.base.next = next,
            None => self.first = next,
        }
        match next.and_then(|n| self.slot_mut(n)) {
            Some(n) => n.base.prev = prev,
            None => self.last = prev,
        }
        self.len -= 1;
        Some(entity)
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut MiscEntity> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn get(&self, id: EntityId) -> Option<&MiscEntity> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut MiscEntity> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    /// Live entities in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &MiscEntity> + '_ {
        let mut cursor = self.first;
        std::iter::from_fn(move || {
            let entity = self.get(cursor?)?;
            cursor = entity.base.next;
            Some(entity)
        })
    }

    /// Call `f` on every live entity carrying `tag`, in allocation order.
    pub fn for_each_of_tag(&self, tag: MiscEntityType, mut f: impl FnMut(&MiscEntity)) {
        for entity in self.iter().filter(|e| e.sub_type() == tag) {
            f(entity);
        }
    }

    /// Number of live entities carrying `tag`.
    pub fn count_of_tag(&self, tag: MiscEntityType) -> usize {
        self.iter().filter(|e| e.sub_type() == tag).count()
    }

    /// Visit every live entity in allocation order with mutable access and
    /// free those for which `keep` returns `false`. Returns how many were
    /// freed.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut MiscEntity) -> bool) -> usize {
        let mut freed = 0;
        let mut cursor = self.first;
        while let Some(id) = cursor {
            let Some(entity) = self.slot_mut(id) else {
                break;
            };
            cursor = entity.base.next;
            if !keep(entity) {
                self.free(id);
                freed += 1;
            }
        }
        freed
    }

    /// Check the live list of a pool that did not come from `allocate()`
    /// (a loaded save): every link in range and pointing at a live slot,
    /// back links mirroring forward links, slot ids matching their index,
    /// and `len` equal to both the list length and the occupied slots.
    pub fn validate(&self) -> Result<(), SimError> {
        let corrupt = |reason| Err(SimError::CorruptEntityPool { reason });

        for (index, slot) in self.slots.iter().enumerate() {
            if slot.as_ref().is_some_and(|e| e.id().0 as usize != index) {
                return corrupt("entity id does not match its slot");
            }
        }
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        if occupied != self.len {
            return corrupt("live count does not match occupied slots");
        }

        let mut walked = 0;
        let mut prev: Option<EntityId> = None;
        let mut cursor = self.first;
        while let Some(id) = cursor {
            let Some(entity) = self.get(id) else {
                return corrupt("link to an empty or out-of-range slot");
            };
            if entity.base.prev != prev {
                return corrupt("back link does not match forward link");
            }
            walked += 1;
            if walked > occupied {
                return corrupt("live list has a cycle");
            }
            prev = Some(id);
            cursor = entity.base.next;
        }
        if prev != self.last {
            return corrupt("last does not end the live list");
        }
        if walked != self.len {
            return corrupt("live list does not reach every entity");
        }
        Ok(())
    }
}
