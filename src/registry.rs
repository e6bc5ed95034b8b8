/// Builds a [`PluginCatalog`](crate::core::registry::PluginCatalog) from plugin
/// types implementing [`PluginProvidesFactory`](crate::core::factory::PluginProvidesFactory).
///
/// Usage:
///   let catalog = plugin_catalog![SeoPlugin, AuditPlugin]?;
///
/// Evaluates to `Result<PluginCatalog, BusError>`; two providers sharing a
/// name fail with `PluginAlreadyRegistered`.
#[macro_export]
macro_rules! plugin_catalog {
    ($($plugin_ty:ty),* $(,)?) => {
        (|| -> ::std::result::Result<$crate::core::registry::PluginCatalog, $crate::core::error_bus::BusError> {
            let catalog = $crate::core::registry::PluginCatalog::new();
            $(
                catalog.register_provider::<$plugin_ty>()?;
            )*
            Ok(catalog)
        })()
    };
}
