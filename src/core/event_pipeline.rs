use crate::core::contracts::{IErasedEventHandler, IEventPipeline};
use crate::core::error_bus::BoxError;
use crate::core::events::EventKind;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

pub(crate) type PipelineFactory = dyn Fn() -> Arc<dyn IEventPipeline> + Send + Sync + 'static;

#[derive(Default)]
pub(crate) struct EventPipelines {
    factories: RwLock<Vec<Arc<PipelineFactory>>>,
}

impl EventPipelines {
    pub(crate) fn register(
        &self,
        factory: impl Fn() -> Arc<dyn IEventPipeline> + Send + Sync + 'static,
    ) {
        self.factories.write().push(Arc::new(factory));
    }

    pub(crate) fn len(&self) -> usize {
        self.factories.read().len()
    }

    /// Wraps `handler` in every registered pipeline; the last registered runs first.
    pub(crate) fn wrap(
        &self,
        kind: EventKind,
        handler: Arc<dyn IErasedEventHandler>,
    ) -> Arc<dyn IErasedEventHandler> {
        let mut current = handler;
        for factory in self.factories.read().iter() {
            let pipeline = factory();
            let next = Arc::clone(&current);
            current = Arc::new(EventPipelineWithNext {
                kind,
                pipeline,
                next,
            });
        }
        current
    }
}

pub(crate) struct EventPipelineWithNext {
    pub kind: EventKind,
    pub pipeline: Arc<dyn IEventPipeline>,
    pub next: Arc<dyn IErasedEventHandler>,
}

#[async_trait]
impl IErasedEventHandler for EventPipelineWithNext {
    fn subscriber_name(&self) -> &'static str {
        self.next.subscriber_name()
    }

    async fn handle(&self, event: Box<dyn Any + Send + Sync>) -> Result<(), BoxError> {
        self.pipeline
            .handle(self.kind, event, Arc::clone(&self.next))
            .await
    }
}
