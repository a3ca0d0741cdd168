//! Event dispatcher
//!
//! One handler per `(op, event type)` pair. Registering again for a pair replaces the
//! previous handler; frames for pairs with no handler are dropped. The dispatcher is
//! built once and shared by every connection.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use shardgate_core::Intents;

use super::HandlerResult;
use crate::events::{EventType, Message};
use crate::protocol::{GatewayPayload, OpCode};

/// Receives dispatched frames
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, frame: Arc<GatewayPayload>) -> HandlerResult<()>;
}

/// Adapts a closure taking a typed payload into an [`EventHandler`]
struct TypedHandler<T, F> {
    callback: F,
    _payload: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T, F, Fut> EventHandler for TypedHandler<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(Arc<GatewayPayload>, T) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult<()>> + Send,
{
    async fn handle(&self, frame: Arc<GatewayPayload>) -> HandlerResult<()> {
        let data = frame.data::<T>()?;
        (self.callback)(frame, data).await
    }
}

type HandlerKey = (OpCode, String);

/// Lookup table from `(op, event type)` to the registered handler
#[derive(Default)]
pub struct EventDispatcher {
    handlers: DashMap<HandlerKey, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same pair
    ///
    /// Returns the intents the gateway needs to deliver this event.
    pub fn register(
        &self,
        op: OpCode,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Intents {
        let event_type = event_type.into();
        let intents = EventType::intents_for(&event_type);
        if self
            .handlers
            .insert((op, event_type.clone()), handler)
            .is_some()
        {
            tracing::debug!(op = %op, event_type = %event_type, "Replaced event handler");
        }
        intents
    }

    /// Register a callback receiving the frame and its data decoded as `T`
    pub fn on<T, F, Fut>(&self, op: OpCode, event_type: impl Into<String>, callback: F) -> Intents
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Arc<GatewayPayload>, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.register(
            op,
            event_type,
            Arc::new(TypedHandler {
                callback,
                _payload: PhantomData,
            }),
        )
    }

    /// Register a callback for messages that @-mention the bot
    pub fn on_at_message<F, Fut>(&self, callback: F) -> Intents
    where
        F: Fn(Arc<GatewayPayload>, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.on::<Message, _, _>(
            OpCode::Dispatch,
            EventType::AtMessageCreate.as_str(),
            callback,
        )
    }

    /// Remove the handler for a pair
    pub fn unregister(&self, op: OpCode, event_type: &str) -> bool {
        self.handlers.remove(&(op, event_type.to_string())).is_some()
    }

    /// Hand a frame to its handler
    ///
    /// Returns `Ok(false)` when no handler is registered for the frame.
    pub async fn dispatch(&self, frame: Arc<GatewayPayload>) -> HandlerResult<bool> {
        let key = (frame.op, frame.event_type().to_string());
        // Clone out of the map so no shard lock is held across the await
        let Some(handler) = self.handlers.get(&key).map(|h| Arc::clone(h.value())) else {
            return Ok(false);
        };
        handler.handle(frame).await?;
        Ok(true)
    }

    /// Union of the intents needed by every registered handler
    #[must_use]
    pub fn intents(&self) -> Intents {
        Intents::combine(
            self.handlers
                .iter()
                .map(|entry| EventType::intents_for(&entry.key().1)),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
