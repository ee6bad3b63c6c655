//! Rating component trait and registry
//!
//! Components are looked up by name at calculation time. The registry is
//! populated once at start-up and then only read.

use crate::error::{RatingError, Result};
use crate::rating::components::{
    AdraComponent, AprComponent, DeathContribComponent, KillContribComponent, ADRA, APR,
    DEATH_CONTRIB, KILL_CONTRIB,
};
use crate::rating::context::MatchContext;
use crate::types::Player;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A single scalar metric computed for one player in one match
#[cfg_attr(test, mockall::automock)]
pub trait RatingComponent: Send + Sync {
    /// Compute the raw (unnormalized) value
    fn compute<'a>(&self, player: &Player, ctx: &MatchContext<'a>) -> Result<f64>;
}

/// Name-indexed set of rating components
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: Vec<(String, Arc<dyn RatingComponent>)>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

impl ComponentRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding KillContrib, DeathContrib, APR and ADRa
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(KILL_CONTRIB, KillContribComponent);
        registry.register(DEATH_CONTRIB, DeathContribComponent);
        registry.register(APR, AprComponent);
        registry.register(ADRA, AdraComponent);
        registry
    }

    /// Add a component, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, component: impl RatingComponent + 'static) {
        let name = name.into();
        let component: Arc<dyn RatingComponent> = Arc::new(component);
        match self.components.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                debug!("Replacing rating component {}", name);
                slot.1 = component;
            }
            None => {
                debug!("Registered rating component {}", name);
                self.components.push((name, component));
            }
        }
    }

    /// Remove a component, returning whether it was present
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.components.len();
        self.components.retain(|(n, _)| n != name);
        before != self.components.len()
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn RatingComponent>> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| RatingError::ComponentNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.iter().any(|(n, _)| n == name)
    }

    /// Component names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Check that every name in `selected` is registered
    pub fn ensure_registered(&self, selected: &[String]) -> Result<()> {
        for name in selected {
            self.get(name)?;
        }
        Ok(())
    }

    /// Compute every selected component for `player`, stopping at the first failure
    pub fn compute_all(
        &self,
        selected: &[String],
        player: &Player,
        ctx: &MatchContext<'_>,
    ) -> Result<BTreeMap<String, f64>> {
        let mut values = BTreeMap::new();
        for name in selected {
            let value = self.get(name)?.compute(player, ctx)?;
            if !value.is_finite() {
                return Err(RatingError::ComponentFailed {
                    name: name.clone(),
                    reason: format!("non-finite value {}", value),
                });
            }
            values.insert(name.clone(), value);
        }
        Ok(values)
    }
}
