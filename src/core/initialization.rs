use crate::core::auth_pipeline::AuthenticationPipeline;
use crate::core::config::PluginConfigSource;
use crate::core::contracts::{
    ICredentialChecker, IModuleUnit, IProfileMapper, ITokenIssuer, ITokenVerifier,
};
use crate::core::error_bus::{AuthError, BusError, PluginResolutionFailure};
use crate::core::event_handlers::EventBus;
use crate::core::events::EventSecretPolicy;
use crate::core::guards::{
    AccessGuard, Caller, EndpointAccessTable, LOGIN_ENDPOINT, PROFILE_ENDPOINT, PresentedAuth,
};
use crate::core::models::{ProfileView, RequestContext, SessionToken};
use crate::core::plugins::PluginResolver;
use crate::core::registry::PluginCatalog;
use crate::core::validator::CredentialValidator;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Concrete external services handed to the flows at construction time.
#[derive(Clone)]
pub struct Collaborators {
    pub credentials: Arc<dyn ICredentialChecker>,
    pub tokens: Arc<dyn ITokenIssuer>,
    pub profiles: Arc<dyn IProfileMapper>,
    pub token_verifier: Arc<dyn ITokenVerifier>,
}

/// Ordered module units the application is built from: base units first,
/// then plugin units in configuration order.
#[derive(Clone, Default)]
pub struct CompositionGraph {
    units: Vec<Arc<dyn IModuleUnit>>,
}

impl CompositionGraph {
    pub fn units(&self) -> &[Arc<dyn IModuleUnit>] {
        &self.units
    }

    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|unit| unit.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for CompositionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Appends plugin units after base units. No deduplication, no conflict checks.
pub fn compose(
    base_units: Vec<Arc<dyn IModuleUnit>>,
    plugin_units: Vec<Arc<dyn IModuleUnit>>,
) -> CompositionGraph {
    let mut units = base_units;
    units.extend(plugin_units);
    CompositionGraph { units }
}

#[derive(Debug, Default, PartialEq)]
pub struct BootstrapReport {
    pub plugin_warnings: Vec<PluginResolutionFailure>,
    pub install_failures: Vec<BusError>,
}

pub struct CompositionRoot {
    bus: Arc<EventBus>,
    catalog: Arc<PluginCatalog>,
    config_source: PluginConfigSource,
    base_units: Vec<Arc<dyn IModuleUnit>>,
    collaborators: Collaborators,
    access_table: EndpointAccessTable,
    secret_policy: EventSecretPolicy,
}

impl CompositionRoot {
    pub fn new(catalog: Arc<PluginCatalog>, collaborators: Collaborators) -> Self {
        Self {
            bus: Arc::new(EventBus::new()),
            catalog,
            config_source: PluginConfigSource::default(),
            base_units: Vec::new(),
            collaborators,
            access_table: EndpointAccessTable::auth_defaults(),
            secret_policy: EventSecretPolicy::default(),
        }
    }

    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_config_source(mut self, config_source: PluginConfigSource) -> Self {
        self.config_source = config_source;
        self
    }

    pub fn with_base_unit(mut self, unit: impl IModuleUnit + 'static) -> Self {
        self.base_units.push(Arc::new(unit));
        self
    }

    pub fn with_access_table(mut self, access_table: EndpointAccessTable) -> Self {
        self.access_table = access_table;
        self
    }

    pub fn with_secret_policy(mut self, secret_policy: EventSecretPolicy) -> Self {
        self.secret_policy = secret_policy;
        self
    }

    /// Reads the plugin configuration, resolves and composes every unit,
    /// installs them on the bus and seals it. Consumes the root, so the
    /// graph is assembled at most once.
    pub async fn bootstrap(self) -> Result<Application, BusError> {
        let config = self.config_source.load().await?;

        let resolution = PluginResolver::new(Arc::clone(&self.catalog))
            .resolve(&config.plugins)
            .await;
        let graph = compose(self.base_units, resolution.units());

        let mut report = BootstrapReport {
            plugin_warnings: resolution.warnings,
            install_failures: Vec::new(),
        };

        for unit in graph.units() {
            let reason = match catch_unwind(AssertUnwindSafe(|| unit.install(&self.bus))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(_) => "install panicked".to_string(),
            };

            let failure = BusError::ModuleInstallFailed(unit.name().to_string(), reason);

            #[cfg(feature = "logging")]
            log::error!("{failure}");

            report.install_failures.push(failure);
        }

        self.bus.seal();

        #[cfg(feature = "logging")]
        log::info!(
            "Application composed from {} unit(s) {:?}; {} plugin warning(s), {} install failure(s)",
            graph.len(),
            graph.names(),
            report.plugin_warnings.len(),
            report.install_failures.len()
        );

        let Collaborators {
            credentials,
            tokens,
            profiles,
            token_verifier,
        } = self.collaborators;

        let pipeline = AuthenticationPipeline::new(
            Arc::clone(&self.bus),
            CredentialValidator::new(credentials),
            tokens,
            profiles,
        )
        .with_secret_policy(self.secret_policy);

        Ok(Application {
            bus: self.bus,
            graph,
            pipeline,
            guard: AccessGuard::new(self.access_table, token_verifier),
            report,
        })
    }
}

/// A composed, sealed application ready to serve authentication requests.
pub struct Application {
    bus: Arc<EventBus>,
    graph: CompositionGraph,
    pipeline: AuthenticationPipeline,
    guard: AccessGuard,
    report: BootstrapReport,
}

impl Application {
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn graph(&self) -> &CompositionGraph {
        &self.graph
    }

    pub fn pipeline(&self) -> &AuthenticationPipeline {
        &self.pipeline
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    pub fn report(&self) -> &BootstrapReport {
        &self.report
    }

    /// Guards the login endpoint, then runs the login flow with the one credential check.
    pub async fn login(
        &self,
        context: RequestContext,
        presented: PresentedAuth,
        remember_me: bool,
    ) -> Result<SessionToken, AuthError> {
        match self.guard.authorize(LOGIN_ENDPOINT, presented).await? {
            Caller::CredentialsPending(credential) => {
                self.pipeline.login(context, credential, remember_me).await
            }
            _ => Err(AuthError::Unauthenticated),
        }
    }

    pub async fn profile(&self, presented: PresentedAuth) -> Result<ProfileView, AuthError> {
        match self.guard.authorize(PROFILE_ENDPOINT, presented).await? {
            Caller::Authenticated(principal) => Ok(self.pipeline.profile(&principal).await),
            _ => Err(AuthError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error_bus::BoxError;
    use crate::core::events::{AfterLogin, AfterProfile, EventKind};
    use crate::core::guards::AccessRequirement;
    use crate::core::models::Credential;
    use crate::core::testing::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collaborators() -> (Collaborators, Arc<StaticCredentialChecker>) {
        let checker = Arc::new(StaticCredentialChecker::default().with_user(
            "ada@example.com",
            "hunter2",
            principal("ada"),
        ));
        let collaborators = Collaborators {
            credentials: checker.clone(),
            tokens: Arc::new(MockTokenIssuer::default()),
            profiles: Arc::new(CopyProfileMapper),
            token_verifier: Arc::new(
                StaticTokenVerifier::default().with_token("ada:1h", principal("ada")),
            ),
        };
        (collaborators, checker)
    }

    fn catalog_with(names: &[&'static str]) -> (Arc<PluginCatalog>, Arc<AtomicUsize>) {
        let seen = Arc::new(AtomicUsize::new(0));
        let catalog = PluginCatalog::new();
        for &name in names {
            let seen = seen.clone();
            catalog
                .register(name, move || {
                    let unit = CountingUnit {
                        name: name.to_string(),
                        seen: seen.clone(),
                    };
                    async move { Ok::<_, BoxError>(Some(unit)) }
                })
                .unwrap();
        }
        (Arc::new(catalog), seen)
    }

    struct BrokenUnit;

    impl IModuleUnit for BrokenUnit {
        fn name(&self) -> &str {
            "broken"
        }

        fn install(&self, _bus: &EventBus) -> Result<(), BoxError> {
            Err("missing migration".into())
        }
    }

    struct PanickingUnit;

    impl IModuleUnit for PanickingUnit {
        fn name(&self) -> &str {
            "p"
        }

        fn install(&self, _bus: &EventBus) -> Result<(), BoxError> {
            panic!("install crashed")
        }
    }

    fn unit(name: &str) -> Arc<dyn IModuleUnit> {
        Arc::new(CountingUnit::new(name))
    }

    #[test]
    fn test_compose_appends_plugins_after_base_units() {
        let graph = compose(vec![unit("X")], vec![unit("a"), unit("c")]);
        assert_eq!(graph.names(), vec!["X", "a", "c"]);
    }

    #[test]
    fn test_compose_keeps_duplicates() {
        let graph = compose(vec![unit("X"), unit("a")], vec![unit("a")]);
        assert_eq!(graph.names(), vec!["X", "a", "a"]);
        assert_eq!(format!("{:?}", graph), r#"["X", "a", "a"]"#);
    }

    #[tokio::test]
    async fn test_bootstrap_composes_resolved_plugins_in_order() {
        let (catalog, _) = catalog_with(&["a", "c"]);
        let (collaborators, _) = collaborators();

        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::Inline(vec![
                "a".into(),
                "b".into(),
                "c".into(),
            ]))
            .with_base_unit(CountingUnit::new("X"))
            .bootstrap()
            .await
            .unwrap();

        assert_eq!(app.graph().names(), vec!["X", "a", "c"]);
        assert_eq!(
            app.report().plugin_warnings,
            vec![PluginResolutionFailure::Unresolvable("b".into())]
        );
        assert!(app.report().install_failures.is_empty());
        assert!(app.bus().is_sealed());
        assert_eq!(app.bus().subscriber_count(EventKind::AfterLogin), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_reads_well_known_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "plugins": ["audit"] }}"#).unwrap();
        let (catalog, _) = catalog_with(&["audit"]);
        let (collaborators, _) = collaborators();

        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::File(file.path().to_path_buf()))
            .bootstrap()
            .await
            .unwrap();

        assert_eq!(app.graph().names(), vec!["audit"]);
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_malformed_configuration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "plugins = [\"audit\"]").unwrap();
        let (catalog, _) = catalog_with(&["audit"]);
        let (collaborators, _) = collaborators();

        let result = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::File(file.path().to_path_buf()))
            .bootstrap()
            .await;

        assert!(matches!(result, Err(BusError::ConfigInvalid(_, _))));
    }

    #[tokio::test]
    async fn test_install_failure_is_isolated() {
        let (catalog, _) = catalog_with(&["a"]);
        let (collaborators, _) = collaborators();

        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::Inline(vec!["a".into()]))
            .with_base_unit(BrokenUnit)
            .with_base_unit(CountingUnit::new("X"))
            .bootstrap()
            .await
            .unwrap();

        assert_eq!(app.graph().names(), vec!["broken", "X", "a"]);
        assert_eq!(
            app.report().install_failures,
            vec![BusError::ModuleInstallFailed(
                "broken".into(),
                "missing migration".into()
            )]
        );
        assert_eq!(app.bus().subscriber_count(EventKind::AfterLogin), 2);
    }

    #[tokio::test]
    async fn test_install_panic_is_isolated() {
        let (catalog, _) = catalog_with(&["a"]);
        catalog
            .register("p", || async { Ok::<_, BoxError>(Some(PanickingUnit)) })
            .unwrap();
        let (collaborators, _) = collaborators();

        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::Inline(vec!["p".into(), "a".into()]))
            .with_base_unit(CountingUnit::new("X"))
            .bootstrap()
            .await
            .unwrap();

        assert_eq!(app.graph().names(), vec!["X", "p", "a"]);
        assert_eq!(
            app.report().install_failures,
            vec![BusError::ModuleInstallFailed(
                "p".into(),
                "install panicked".into()
            )]
        );
        assert!(app.bus().is_sealed());
        assert_eq!(app.bus().subscriber_count(EventKind::AfterLogin), 2);
    }

    #[tokio::test]
    async fn test_plugin_subscribers_observe_login() {
        let (catalog, seen) = catalog_with(&["a", "c"]);
        let (collaborators, checker) = collaborators();

        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::Inline(vec!["a".into(), "c".into()]))
            .bootstrap()
            .await
            .unwrap();

        let token = app
            .login(
                RequestContext::new("req-1"),
                PresentedAuth::Credentials(Credential::new("ada@example.com", "hunter2")),
                false,
            )
            .await
            .unwrap();

        assert_eq!(token, SessionToken::new("ada:1h"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_application_login_requires_credentials() {
        let (catalog, _) = catalog_with(&[]);
        let (collaborators, checker) = collaborators();
        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::Inline(Vec::new()))
            .bootstrap()
            .await
            .unwrap();

        let result = app
            .login(RequestContext::new("req-1"), PresentedAuth::Nothing, false)
            .await;

        assert_eq!(result, Err(AuthError::Unauthenticated));
        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_application_profile_uses_bearer_guard() {
        let (catalog, _) = catalog_with(&[]);
        let (collaborators, _) = collaborators();
        let bus = Arc::new(EventBus::new());
        let views = Arc::new(AtomicUsize::new(0));
        {
            let views = views.clone();
            bus.subscribe_fn(move |_: AfterProfile| {
                let views = views.clone();
                async move {
                    views.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();
        }

        let app = CompositionRoot::new(catalog, collaborators)
            .with_bus(bus)
            .with_config_source(PluginConfigSource::Inline(Vec::new()))
            .bootstrap()
            .await
            .unwrap();

        let view = app
            .profile(PresentedAuth::Bearer("ada:1h".into()))
            .await
            .unwrap();
        let denied = app.profile(PresentedAuth::Bearer("forged".into())).await;

        assert_eq!(view.id, "ada");
        assert_eq!(denied, Err(AuthError::Unauthenticated));
        assert_eq!(views.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_access_table_can_close_login() {
        let (catalog, _) = catalog_with(&[]);
        let (collaborators, _) = collaborators();
        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::Inline(Vec::new()))
            .with_access_table(
                EndpointAccessTable::new(AccessRequirement::Public)
                    .with(LOGIN_ENDPOINT, AccessRequirement::BearerToken),
            )
            .bootstrap()
            .await
            .unwrap();

        let result = app
            .login(
                RequestContext::new("req-1"),
                PresentedAuth::Credentials(Credential::new("ada@example.com", "hunter2")),
                false,
            )
            .await;

        assert_eq!(result, Err(AuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_subscribing_after_bootstrap_is_rejected() {
        let (catalog, _) = catalog_with(&[]);
        let (collaborators, _) = collaborators();
        let app = CompositionRoot::new(catalog, collaborators)
            .with_config_source(PluginConfigSource::Inline(Vec::new()))
            .bootstrap()
            .await
            .unwrap();

        let result = app
            .bus()
            .subscribe_fn(|_: AfterLogin| async { Ok::<(), BoxError>(()) });

        assert_eq!(result, Err(BusError::BusSealed(EventKind::AfterLogin)));
    }
}
