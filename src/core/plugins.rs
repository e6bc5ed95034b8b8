use crate::core::contracts::IModuleUnit;
use crate::core::error_bus::PluginResolutionFailure;
use crate::core::registry::{LoadedModule, PluginCatalog};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum PluginState {
    Loaded(LoadedModule),
    Failed,
}

/// A configured plugin name and what resolving it produced.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub state: PluginState,
}

impl PluginDescriptor {
    pub fn module(&self) -> Option<&LoadedModule> {
        match &self.state {
            PluginState::Loaded(module) => Some(module),
            PluginState::Failed => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, PluginState::Loaded(_))
    }
}

#[derive(Debug, Clone)]
pub struct PluginResolution {
    /// One entry per configured name, in configuration order.
    pub descriptors: Vec<PluginDescriptor>,
    pub warnings: Vec<PluginResolutionFailure>,
}

impl PluginResolution {
    /// Default exports of every loaded plugin, in configuration order. Failed
    /// plugins and plugins without a default export are left out.
    pub fn units(&self) -> Vec<Arc<dyn IModuleUnit>> {
        self.descriptors
            .iter()
            .filter_map(PluginDescriptor::module)
            .filter_map(|module| module.default_export().cloned())
            .collect()
    }
}

/// Resolves configured plugin names against a [`PluginCatalog`].
///
/// Every name is resolved independently; one failing plugin never stops
/// the others. Nothing is cached between calls.
pub struct PluginResolver {
    catalog: Arc<PluginCatalog>,
}

impl PluginResolver {
    pub fn new(catalog: Arc<PluginCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn resolve(&self, names: &[String]) -> PluginResolution {
        let outcomes =
            futures::future::join_all(names.iter().map(|name| self.resolve_one(name))).await;

        let mut descriptors = Vec::with_capacity(names.len());
        let mut warnings = Vec::new();

        for (name, outcome) in names.iter().zip(outcomes) {
            let state = match outcome {
                Ok(module) => PluginState::Loaded(module),
                Err(failure) => {
                    #[cfg(feature = "logging")]
                    log::warn!("Failed to load plugin {}: {}", name, failure);

                    warnings.push(failure);
                    PluginState::Failed
                }
            };
            descriptors.push(PluginDescriptor {
                name: name.clone(),
                state,
            });
        }

        PluginResolution {
            descriptors,
            warnings,
        }
    }

    async fn resolve_one(&self, name: &str) -> Result<LoadedModule, PluginResolutionFailure> {
        let factory = self
            .catalog
            .lookup(name)
            .ok_or_else(|| PluginResolutionFailure::Unresolvable(name.to_string()))?;

        match AssertUnwindSafe(async move { factory().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(module)) => Ok(module),
            Ok(Err(err)) => Err(PluginResolutionFailure::LoadFailed(
                name.to_string(),
                err.to_string(),
            )),
            Err(_) => Err(PluginResolutionFailure::LoadFailed(
                name.to_string(),
                "plugin factory panicked".to_string(),
            )),
        }
    }
}
