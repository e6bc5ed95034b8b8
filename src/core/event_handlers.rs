use crate::core::contracts::{IErasedEventHandler, IEvent, IEventHandler, IEventPipeline};
use crate::core::error_bus::{BoxError, BusError, SubscriberFailure};
use crate::core::event_pipeline::EventPipelines;
use crate::core::events::EventKind;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use std::any::Any;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct EventHandlerWrapper<H, E>
where
    H: IEventHandler<E>,
    E: IEvent,
{
    inner: H,
    _phantom: PhantomData<fn(E)>,
}

impl<H, E> EventHandlerWrapper<H, E>
where
    H: IEventHandler<E>,
    E: IEvent,
{
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<H, E> IErasedEventHandler for EventHandlerWrapper<H, E>
where
    H: IEventHandler<E>,
    E: IEvent,
{
    fn subscriber_name(&self) -> &'static str {
        std::any::type_name::<H>()
    }

    async fn handle(&self, event: Box<dyn Any + Send + Sync>) -> Result<(), BoxError> {
        let evt = event.downcast::<E>().map_err(|_| {
            BusError::EventTypeMismatch(
                std::any::type_name::<E>().to_string(),
                std::any::type_name::<H>().to_string(),
            )
        })?;
        self.inner.handle_async(*evt).await
    }
}

/// Adapts an async closure into an [`IEventHandler`].
pub struct FnEventHandler<F, E> {
    f: F,
    _phantom: PhantomData<fn(E)>,
}

#[async_trait]
impl<F, Fut, E> IEventHandler<E> for FnEventHandler<F, E>
where
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    E: IEvent,
{
    async fn handle_async(&self, event: E) -> Result<(), BoxError> {
        (self.f)(event).await
    }
}

/// Outcome of a single publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub kind: EventKind,
    pub delivered: usize,
    pub failures: Vec<SubscriberFailure>,
}

impl PublishReport {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Publish/subscribe hub for lifecycle events.
///
/// Subscribers are registered during composition; [`EventBus::seal`] closes
/// registration, after which the subscriber table is only read. Publishing
/// awaits each subscriber of the event's kind in subscription order. A
/// subscriber that errors or panics is recorded in the [`PublishReport`] and
/// never affects the publisher or the remaining subscribers.
#[derive(Default)]
pub struct EventBus {
    handlers: DashMap<EventKind, Vec<Arc<dyn IErasedEventHandler>>>,
    pipelines: EventPipelines,
    sealed: AtomicBool,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<E, H>(&self, handler: H) -> Result<(), BusError>
    where
        E: IEvent,
        H: IEventHandler<E>,
    {
        if self.is_sealed() {
            return Err(BusError::BusSealed(E::KIND));
        }

        let erased: Arc<dyn IErasedEventHandler> = Arc::new(EventHandlerWrapper::new(handler));
        self.handlers
            .entry(E::KIND)
            .or_insert_with(Vec::new)
            .push(erased);
        Ok(())
    }

    pub fn subscribe_fn<E, F, Fut>(&self, f: F) -> Result<(), BusError>
    where
        E: IEvent,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.subscribe::<E, _>(FnEventHandler {
            f,
            _phantom: PhantomData,
        })
    }

    /// Registers a middleware wrapped around every subscriber invocation.
    pub fn pipeline(
        &self,
        factory: impl Fn() -> Arc<dyn IEventPipeline> + Send + Sync + 'static,
    ) -> Result<(), BusError> {
        if self.is_sealed() {
            return Err(BusError::PipelineSealed);
        }

        self.pipelines.register(factory);
        Ok(())
    }

    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::SeqCst) {
            #[cfg(feature = "logging")]
            log::debug!(
                "EventBus sealed with {} subscriber(s)",
                self.handlers.iter().map(|e| e.value().len()).sum::<usize>()
            );
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map(|e| e.value().len()).unwrap_or(0)
    }

    pub async fn publish<E>(&self, event: E) -> PublishReport
    where
        E: IEvent,
    {
        let kind = E::KIND;
        let mut report = PublishReport::new(kind);

        let handlers = self
            .handlers
            .get(&kind)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        for handler in handlers {
            let subscriber = handler.subscriber_name();
            let event = event.clone();

            // Pipeline factories run inside the guard too.
            let outcome = AssertUnwindSafe(async {
                let current = self.pipelines.wrap(kind, handler);
                current.handle(Box::new(event)).await
            })
            .catch_unwind()
            .await;

            let failure = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(err)) => subscriber_failure(kind, subscriber, err.to_string(), false),
                Err(panic) => subscriber_failure(kind, subscriber, panic_message(&panic), true),
            };

            #[cfg(feature = "logging")]
            log::error!("{failure}");

            report.failures.push(failure);
        }

        report
    }
}

fn subscriber_failure(
    kind: EventKind,
    subscriber: &'static str,
    reason: String,
    panicked: bool,
) -> SubscriberFailure {
    SubscriberFailure {
        kind,
        subscriber,
        reason,
        panicked,
        occurred_at: Utc::now(),
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "subscriber panicked".to_string()
    }
}
