use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use wirebridge_codec::Message;

/// Error type a handler may return. Isolated per handler and logged; never
/// aborts dispatch to the remaining handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A callback invoked with every dispatched message whose type matches its
/// registration.
pub trait MessageHandler: Send + Sync {
    fn handle_message(&self, message: &Message) -> Result<(), HandlerError>;
}

/// Maps a message-type identifier to the ordered handlers interested in it.
///
/// Registration order is preserved per type, and registering the same handler
/// twice under one type yields two dispatches per message. Mutation and
/// dispatch may happen from different threads; dispatch iterates a snapshot
/// taken under the lock, so handlers may freely register or unregister from
/// inside `handle_message`.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<String, Vec<Arc<dyn MessageHandler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the sequence for `msg_type`, creating the sequence
    /// if absent. No uniqueness check.
    pub fn register(&self, msg_type: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        let mut handlers = self.lock();
        handlers.entry(msg_type.into()).or_default().push(handler);
    }

    /// Remove every registration of `handler` under `msg_type`, matching by
    /// `Arc` identity. No-op if the type or the handler is not present.
    pub fn unregister(&self, msg_type: &str, handler: &Arc<dyn MessageHandler>) {
        let mut handlers = self.lock();
        if let Some(list) = handlers.get_mut(msg_type) {
            list.retain(|registered| !Arc::ptr_eq(registered, handler));
            if list.is_empty() {
                handlers.remove(msg_type);
            }
        }
    }

    /// Invoke every handler registered for the message's type, synchronously
    /// and in registration order, on the calling thread.
    ///
    /// A failing handler is logged and skipped; later handlers still run.
    /// Fire-and-forget: there is no result to return.
    pub fn dispatch(&self, message: &Message) {
        let snapshot = self.lock().get(message.msg_type()).cloned();

        let Some(snapshot) = snapshot else {
            debug!(msg_type = message.msg_type(), "no handlers registered");
            return;
        };

        for (index, handler) in snapshot.iter().enumerate() {
            if let Err(error) = handler.handle_message(message) {
                warn!(
                    msg_type = message.msg_type(),
                    handler = index,
                    %error,
                    "handler failed; continuing dispatch"
                );
            }
        }
    }

    /// Number of registrations currently held for `msg_type`.
    pub fn handler_count(&self, msg_type: &str) -> usize {
        self.lock().get(msg_type).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Arc<dyn MessageHandler>>>> {
        // A panicking handler must not wedge the registry for the process.
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, entry: String) {
            self.seen.lock().unwrap().push(entry);
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    struct Tagged {
        tag: &'static str,
        recorder: Arc<Recorder>,
    }

    impl Tagged {
        fn new(tag: &'static str, recorder: &Arc<Recorder>) -> Arc<dyn MessageHandler> {
            Arc::new(Self {
                tag,
                recorder: Arc::clone(recorder),
            })
        }
    }

    impl MessageHandler for Tagged {
        fn handle_message(&self, message: &Message) -> Result<(), HandlerError> {
            self.recorder
                .push(format!("{}:{}", self.tag, message.msg_type()));
            Ok(())
        }
    }

    #[test]
    fn dispatches_in_registration_order() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::new();

        registry.register("ping", Tagged::new("a", &recorder));
        registry.register("ping", Tagged::new("b", &recorder));
        registry.register("ping", Tagged::new("c", &recorder));

        registry.dispatch(&Message::new("ping"));

        assert_eq!(recorder.seen(), vec!["a:ping", "b:ping", "c:ping"]);
    }

    #[test]
    fn dispatch_matches_exact_type_only() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::new();

        registry.register("ping", Tagged::new("h", &recorder));

        registry.dispatch(&Message::new("pong"));
        assert!(recorder.seen().is_empty());

        registry.dispatch(&Message::new("ping"));
        assert_eq!(recorder.seen(), vec!["h:ping"]);
    }

    #[test]
    fn duplicate_registration_dispatches_twice() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::new();

        let handler = Tagged::new("dup", &recorder);
        registry.register("ping", Arc::clone(&handler));
        registry.register("ping", handler);

        registry.dispatch(&Message::new("ping"));

        assert_eq!(recorder.seen(), vec!["dup:ping", "dup:ping"]);
    }

    #[test]
    fn unregister_removes_all_identity_matches() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::new();

        let doomed = Tagged::new("doomed", &recorder);
        let kept = Tagged::new("kept", &recorder);
        registry.register("ping", Arc::clone(&doomed));
        registry.register("ping", Arc::clone(&kept));
        registry.register("ping", Arc::clone(&doomed));

        registry.unregister("ping", &doomed);
        registry.dispatch(&Message::new("ping"));

        assert_eq!(recorder.seen(), vec!["kept:ping"]);
        assert_eq!(registry.handler_count("ping"), 1);
    }

    #[test]
    fn unregister_unknown_type_is_noop() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::new();
        let handler = Tagged::new("h", &recorder);

        registry.unregister("absent", &handler);
        assert_eq!(registry.handler_count("absent"), 0);
    }

    #[test]
    fn handler_registered_under_multiple_types() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::new();

        let handler = Tagged::new("h", &recorder);
        registry.register("ping", Arc::clone(&handler));
        registry.register("pong", handler);

        registry.dispatch(&Message::new("ping"));
        registry.dispatch(&Message::new("pong"));

        assert_eq!(recorder.seen(), vec!["h:ping", "h:pong"]);
    }

    struct Failing;

    impl MessageHandler for Failing {
        fn handle_message(&self, _message: &Message) -> Result<(), HandlerError> {
            Err("deliberate failure".into())
        }
    }

    #[test]
    fn failing_handler_does_not_abort_dispatch() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::new();

        registry.register("ping", Arc::new(Failing));
        registry.register("ping", Tagged::new("after", &recorder));

        registry.dispatch(&Message::new("ping"));

        assert_eq!(recorder.seen(), vec!["after:ping"]);
    }

    struct SelfRemoving {
        registry: Arc<HandlerRegistry>,
        me: Mutex<Option<Arc<dyn MessageHandler>>>,
        recorder: Arc<Recorder>,
    }

    impl MessageHandler for SelfRemoving {
        fn handle_message(&self, message: &Message) -> Result<(), HandlerError> {
            self.recorder.push(format!("self:{}", message.msg_type()));
            if let Some(me) = self.me.lock().unwrap().take() {
                self.registry.unregister(message.msg_type(), &me);
            }
            Ok(())
        }
    }

    #[test]
    fn handler_may_unregister_itself_during_dispatch() {
        let recorder = Arc::new(Recorder::default());
        let registry = Arc::new(HandlerRegistry::new());

        let concrete = Arc::new(SelfRemoving {
            registry: Arc::clone(&registry),
            me: Mutex::new(None),
            recorder: Arc::clone(&recorder),
        });
        let handler: Arc<dyn MessageHandler> = concrete.clone();
        *concrete.me.lock().unwrap() = Some(Arc::clone(&handler));

        registry.register("once", handler);
        registry.register("once", Tagged::new("peer", &recorder));

        registry.dispatch(&Message::new("once"));
        registry.dispatch(&Message::new("once"));

        // The first dispatch runs both handlers from its snapshot; the second
        // only sees the survivor.
        assert_eq!(recorder.seen(), vec!["self:once", "peer:once", "peer:once"]);
    }
}
