//! Ordered animatable registry

use slotmap::{new_key_type, SlotMap};

use super::{Animatable, FrameError, TickContext};

new_key_type! {
    /// Handle of a registered animatable
    pub struct AnimatableId;
}

/// Animatables in execution order
///
/// Insertion order is execution order. Removing an entry keeps the relative
/// order of the rest.
#[derive(Default)]
pub struct AnimatableRegistry {
    items: SlotMap<AnimatableId, Box<dyn Animatable>>,
    order: Vec<AnimatableId>,
}

impl AnimatableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an animatable; it ticks after everything registered before it
    pub fn register(&mut self, animatable: Box<dyn Animatable>) -> AnimatableId {
        let name = animatable.name().to_string();
        let id = self.items.insert(animatable);
        self.order.push(id);
        log::debug!("Registered animatable '{}' at position {}", name, self.order.len() - 1);
        id
    }

    /// Remove an animatable, e.g. when its object is unloaded
    pub fn remove(&mut self, id: AnimatableId) -> Option<Box<dyn Animatable>> {
        let removed = self.items.remove(id)?;
        self.order.retain(|entry| *entry != id);
        log::debug!("Removed animatable '{}'", removed.name());
        Some(removed)
    }

    /// Whether `id` is still registered
    pub fn contains(&self, id: AnimatableId) -> bool {
        self.items.contains_key(id)
    }

    /// Number of registered animatables
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(*id))
            .map(|animatable| animatable.name())
            .collect()
    }

    /// Tick every animatable in order, stopping at the first failure
    pub fn tick_all(&mut self, delta: f32, ctx: &mut TickContext<'_>) -> Result<(), FrameError> {
        for id in &self.order {
            let Some(animatable) = self.items.get_mut(*id) else { continue };
            animatable.tick(delta, ctx).map_err(|source| FrameError::Tick {
                name: animatable.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AnimatableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatableRegistry").field("order", &self.names()).finish()
    }
}
