//! The ECS world: entity allocator, component registry and queries.

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::component::{Component, ComponentId, ComponentMask, MAX_COMPONENTS};
use crate::entity::{Entity, EntityAllocator};
use crate::error::EcsError;
use crate::query::{QueryHandle, QueryState};
use crate::store::{AnyStore, ComponentStore};

#[derive(Default)]
pub struct World {
    entities: EntityAllocator,
    ids: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
    stores: Vec<Box<dyn AnyStore>>,
    queries: Vec<QueryState>,
    tick: u64,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component kind. Registering twice returns the same id.
    ///
    /// # Errors
    /// [`EcsError::TooManyComponents`] past [`MAX_COMPONENTS`] kinds.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId, EcsError> {
        if let Some(id) = self.ids.get(&TypeId::of::<T>()) {
            return Ok(*id);
        }
        if self.stores.len() >= MAX_COMPONENTS {
            return Err(EcsError::TooManyComponents(T::NAME));
        }
        let id = ComponentId(self.stores.len() as u8);
        self.ids.insert(TypeId::of::<T>(), id);
        self.names.push(T::NAME);
        self.stores.push(Box::new(ComponentStore::<T>::default()));
        debug!(component = T::NAME, id = id.index(), "registered component");
        Ok(id)
    }

    #[must_use]
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    #[must_use]
    pub fn component_name(&self, id: ComponentId) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    pub fn spawn(&mut self) -> Entity {
        let entity = self.entities.allocate();
        trace!(%entity, "spawned entity");
        entity
    }

    /// Remove the entity and all of its components. Returns `false` if it was
    /// already gone.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let Some(mask) = self.entities.free(entity) else {
            return false;
        };
        for id in mask.ids() {
            if let Some(store) = self.stores.get_mut(id.index()) {
                store.remove_entity(entity);
            }
        }
        trace!(%entity, "despawned entity");
        true
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.meta(entity).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entities in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().map(|(e, _)| e)
    }

    /// Attach (or overwrite) a component, returning the previous value.
    ///
    /// # Errors
    /// [`EcsError::UnregisteredComponent`] or [`EcsError::DeadEntity`].
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, EcsError> {
        let id = self
            .component_id::<T>()
            .ok_or(EcsError::UnregisteredComponent(T::NAME))?;
        let meta = self
            .entities
            .meta_mut(entity)
            .ok_or(EcsError::DeadEntity(entity))?;
        meta.mask = meta.mask.with(id);
        let store = self
            .store_mut::<T>()
            .ok_or(EcsError::UnregisteredComponent(T::NAME))?;
        Ok(store.insert(entity, value))
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let id = self.component_id::<T>()?;
        let meta = self.entities.meta_mut(entity)?;
        meta.mask = meta.mask.without(id);
        self.store_mut::<T>()?.remove(entity)
    }

    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.store::<T>()?.get(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.store_mut::<T>()?.get_mut(entity)
    }

    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.component_id::<T>()
            .is_some_and(|id| self.has_component(entity, id))
    }

    #[must_use]
    pub fn has_component(&self, entity: Entity, id: ComponentId) -> bool {
        self.entities.meta(entity).is_some_and(|m| m.mask.has(id))
    }

    #[must_use]
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        let id = self.component_id::<T>()?;
        self.stores.get(id.index())?.as_any().downcast_ref()
    }

    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        let id = self.component_id::<T>()?;
        self.stores.get_mut(id.index())?.as_any_mut().downcast_mut()
    }

    /// Register (or reuse) a query over all entities holding every listed
    /// component.
    pub fn query(&mut self, components: &[ComponentId]) -> QueryHandle {
        let mask = ComponentMask::from_ids(components);
        if let Some(i) = self.queries.iter().position(|q| q.mask == mask) {
            return QueryHandle(i);
        }
        self.queries.push(QueryState::new(mask));
        QueryHandle(self.queries.len() - 1)
    }

    /// Current members, ascending.
    #[must_use]
    pub fn matches(&self, query: QueryHandle) -> Vec<Entity> {
        self.queries
            .get(query.0)
            .map(|q| self.members(q.mask).collect())
            .unwrap_or_default()
    }

    /// Entities that joined the query since the previous tick's snapshot.
    pub fn entered(&mut self, query: QueryHandle) -> Vec<Entity> {
        self.refresh(query);
        self.queries
            .get(query.0)
            .map(|q| q.entered().to_vec())
            .unwrap_or_default()
    }

    /// Entities that left the query since the previous tick's snapshot.
    pub fn exited(&mut self, query: QueryHandle) -> Vec<Entity> {
        self.refresh(query);
        self.queries
            .get(query.0)
            .map(|q| q.exited().to_vec())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Start a new tick so queries compute fresh deltas on next access.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    fn members(&self, mask: ComponentMask) -> impl Iterator<Item = Entity> + '_ {
        self.entities
            .iter()
            .filter(move |(_, m)| m.mask.contains(mask))
            .map(|(e, _)| e)
    }

    fn refresh(&mut self, query: QueryHandle) {
        let tick = self.tick;
        let Some(state) = self.queries.get(query.0) else {
            return;
        };
        if state.is_fresh(tick) {
            return;
        }
        let current: BTreeSet<Entity> = self.members(state.mask).collect();
        if let Some(state) = self.queries.get_mut(query.0) {
            state.advance(current, tick);
        }
    }
}
