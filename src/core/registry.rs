use crate::core::contracts::IModuleUnit;
use crate::core::error_bus::{BoxError, BusError};
use crate::core::factory::PluginProvidesFactory;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

type LoadFuture = Pin<Box<dyn Future<Output = Result<LoadedModule, BoxError>> + Send>>;

pub(crate) type AsyncPluginFactory = dyn Fn() -> LoadFuture + Send + Sync;

/// Result of loading a plugin: a handle whose default export may be absent.
#[derive(Clone)]
pub struct LoadedModule {
    default_export: Option<Arc<dyn IModuleUnit>>,
}

impl LoadedModule {
    pub fn new(default_export: Option<Arc<dyn IModuleUnit>>) -> Self {
        Self { default_export }
    }

    pub fn default_export(&self) -> Option<&Arc<dyn IModuleUnit>> {
        self.default_export.as_ref()
    }

    pub fn into_default_export(self) -> Option<Arc<dyn IModuleUnit>> {
        self.default_export
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("default_export", &self.default_export.as_ref().map(|u| u.name()))
            .finish()
    }
}

/// Plugin name → factory. Populated by an explicit registration step at startup.
#[derive(Default)]
pub struct PluginCatalog {
    factories: DashMap<String, Arc<AsyncPluginFactory>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<U, F, Fut, E>(&self, name: impl Into<String>, factory: F) -> Result<(), BusError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<U>, E>> + Send + 'static,
        U: IModuleUnit + 'static,
        E: Into<BoxError>,
    {
        match self.factories.entry(name.into()) {
            Entry::Occupied(entry) => Err(BusError::PluginAlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                let factory = Arc::new(factory);
                // The user factory is only called once the returned future is polled.
                let erased: Arc<AsyncPluginFactory> = Arc::new(move || {
                    let factory = Arc::clone(&factory);
                    Box::pin(async move {
                        let loaded: Result<LoadedModule, BoxError> = match (*factory)().await {
                            Ok(unit) => Ok(LoadedModule::new(
                                unit.map(|u| Arc::new(u) as Arc<dyn IModuleUnit>),
                            )),
                            Err(err) => Err(err.into()),
                        };
                        loaded
                    }) as LoadFuture
                });
                entry.insert(erased);
                Ok(())
            }
        }
    }

    pub fn register_provider<P>(&self) -> Result<(), BusError>
    where
        P: PluginProvidesFactory,
    {
        self.register(P::NAME, || P::factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<AsyncPluginFactory>> {
        self.factories.get(name).map(|entry| Arc::clone(entry.value()))
    }
}
