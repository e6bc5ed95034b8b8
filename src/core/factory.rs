use crate::core::contracts::IModuleUnit;
use crate::core::error_bus::BoxError;
use async_trait::async_trait;

/// A plugin unit that knows its catalog name and how to build itself.
///
/// `Ok(None)` means the plugin loaded but exported nothing; it is dropped
/// from the composition without a warning.
#[async_trait]
pub trait PluginProvidesFactory: IModuleUnit + Sized + 'static {
    const NAME: &'static str;

    async fn factory() -> Result<Option<Self>, BoxError>;
}
