//! Renderer dispatch registry
//!
//! Maps a phase's `component_key` to a [`RenderStrategy`]. Lookups never
//! fail: unregistered or absent keys resolve to the default strategy. The
//! registry is a plain value handed to the presentation layer, so tests and
//! embedders can hold as many independent registries as they like.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ratatui::text::Text;

use crate::error::{Result, TimelineError};
use crate::models::PhaseExecution;
use crate::ui::{DefaultPhaseRenderer, PlanRenderer, SummaryRenderer};

/// Key of the built-in numbered-plan renderer
pub const PLAN_KEY: &str = "system:plan";
/// Key of the built-in summary-card renderer
pub const SUMMARY_KEY: &str = "system:summary";

/// Renders one phase into a displayable unit
pub trait RenderStrategy: Send + Sync {
    fn render(&self, phase: &PhaseExecution, is_active: bool) -> Text<'static>;
}

impl<F> RenderStrategy for F
where
    F: Fn(&PhaseExecution, bool) -> Text<'static> + Send + Sync,
{
    fn render(&self, phase: &PhaseExecution, is_active: bool) -> Text<'static> {
        self(phase, is_active)
    }
}

/// Registry of render strategies keyed by component key
#[derive(Clone)]
pub struct RendererRegistry {
    strategies: BTreeMap<String, Arc<dyn RenderStrategy>>,
    default: Arc<dyn RenderStrategy>,
}

impl RendererRegistry {
    /// Create an empty registry with `default` as the fallback strategy
    pub fn new(default: impl RenderStrategy + 'static) -> Self {
        Self {
            strategies: BTreeMap::new(),
            default: Arc::new(default),
        }
    }

    /// Registry preloaded with the built-in strategies
    pub fn with_builtin_renderers(default: impl RenderStrategy + 'static) -> Self {
        let mut registry = Self::new(default);
        registry
            .strategies
            .insert(PLAN_KEY.to_string(), Arc::new(PlanRenderer));
        registry
            .strategies
            .insert(SUMMARY_KEY.to_string(), Arc::new(SummaryRenderer));
        registry
    }

    /// Insert or overwrite the strategy for `key`; last writer wins.
    ///
    /// Fails only for malformed keys, which is a setup-time mistake.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        strategy: impl RenderStrategy + 'static,
    ) -> Result<()> {
        self.register_shared(key, Arc::new(strategy))
    }

    /// Same as [`Self::register`] for an already shared strategy
    pub fn register_shared(
        &mut self,
        key: impl Into<String>,
        strategy: Arc<dyn RenderStrategy>,
    ) -> Result<()> {
        let key = key.into();
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(TimelineError::InvalidRendererKey(key));
        }
        if self.strategies.insert(key.clone(), strategy).is_some() {
            tracing::debug!(%key, "renderer strategy replaced");
        }
        Ok(())
    }

    /// Strategy for `key`, or the default when absent or unregistered
    pub fn resolve(&self, key: Option<&str>) -> Arc<dyn RenderStrategy> {
        key.and_then(|key| self.strategies.get(key))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    /// Render `phase` with the strategy its component key selects
    pub fn render(&self, phase: &PhaseExecution, is_active: bool) -> Text<'static> {
        self.resolve(phase.component_key.as_deref())
            .render(phase, is_active)
    }

    pub fn has(&self, key: &str) -> bool {
        self.strategies.contains_key(key)
    }

    /// Registered keys in sorted order
    pub fn list_keys(&self) -> Vec<String> {
        self.strategies.keys().cloned().collect()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new(DefaultPhaseRenderer::default())
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("keys", &self.list_keys())
            .finish_non_exhaustive()
    }
}
