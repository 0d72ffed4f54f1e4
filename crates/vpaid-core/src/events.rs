//! Event registry - one handler per lifecycle event, replace on subscribe
//!
//! The host is a single consumer expecting one callback per named signal, so
//! this is deliberately not a fan-out bus. Dispatch is a direct synchronous
//! call into the handler on the caller's stack.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;
use tracing::{debug, trace};

/// Lifecycle event names
///
/// The name space is open: unrecognized names are kept as [`EventKind::Other`]
/// so a host may subscribe to anything without failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Loaded,
    Started,
    Stopped,
    VolumeChange,
    SizeChange,
    Paused,
    Resumed,
    Expanded,
    Skipped,
    ClickThru,
    Error,
    Log,
    Interaction,
    Other(String),
}

impl EventKind {
    /// Events emitted by the lifecycle controller
    pub const LIFECYCLE: [EventKind; 13] = [
        EventKind::Loaded,
        EventKind::Started,
        EventKind::Stopped,
        EventKind::VolumeChange,
        EventKind::SizeChange,
        EventKind::Paused,
        EventKind::Resumed,
        EventKind::Expanded,
        EventKind::Skipped,
        EventKind::ClickThru,
        EventKind::Error,
        EventKind::Log,
        EventKind::Interaction,
    ];

    /// Protocol name of the event
    pub fn name(&self) -> &str {
        match self {
            EventKind::Loaded => "AdLoaded",
            EventKind::Started => "AdStarted",
            EventKind::Stopped => "AdStopped",
            EventKind::VolumeChange => "AdVolumeChange",
            EventKind::SizeChange => "AdSizeChange",
            EventKind::Paused => "AdPaused",
            EventKind::Resumed => "AdResumed",
            EventKind::Expanded => "AdExpanded",
            EventKind::Skipped => "AdSkipped",
            EventKind::ClickThru => "AdClickThru",
            EventKind::Error => "AdError",
            EventKind::Log => "AdLog",
            EventKind::Interaction => "AdInteraction",
            EventKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EventKind::LIFECYCLE
            .iter()
            .find(|kind| kind.name() == s)
            .cloned()
            .unwrap_or_else(|| EventKind::Other(s.to_string())))
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

/// An event together with its positional payload
#[derive(Debug, Clone, PartialEq)]
pub enum AdEvent {
    Loaded,
    Started,
    Stopped,
    VolumeChange,
    SizeChange,
    Paused,
    Resumed,
    Expanded,
    Skipped,
    ClickThru {
        url: String,
        id: String,
        player_handles: bool,
    },
    Error {
        message: String,
    },
    Log {
        message: String,
    },
    Interaction {
        id: String,
    },
    Other {
        name: String,
    },
}

impl AdEvent {
    /// The registry key this event is delivered under
    pub fn kind(&self) -> EventKind {
        match self {
            AdEvent::Loaded => EventKind::Loaded,
            AdEvent::Started => EventKind::Started,
            AdEvent::Stopped => EventKind::Stopped,
            AdEvent::VolumeChange => EventKind::VolumeChange,
            AdEvent::SizeChange => EventKind::SizeChange,
            AdEvent::Paused => EventKind::Paused,
            AdEvent::Resumed => EventKind::Resumed,
            AdEvent::Expanded => EventKind::Expanded,
            AdEvent::Skipped => EventKind::Skipped,
            AdEvent::ClickThru { .. } => EventKind::ClickThru,
            AdEvent::Error { .. } => EventKind::Error,
            AdEvent::Log { .. } => EventKind::Log,
            AdEvent::Interaction { .. } => EventKind::Interaction,
            AdEvent::Other { name } => EventKind::Other(name.clone()),
        }
    }

    /// Build an argument-less event for a kind.
    ///
    /// Kinds that carry a payload get empty strings.
    pub fn signal(kind: EventKind) -> Self {
        match kind {
            EventKind::Loaded => AdEvent::Loaded,
            EventKind::Started => AdEvent::Started,
            EventKind::Stopped => AdEvent::Stopped,
            EventKind::VolumeChange => AdEvent::VolumeChange,
            EventKind::SizeChange => AdEvent::SizeChange,
            EventKind::Paused => AdEvent::Paused,
            EventKind::Resumed => AdEvent::Resumed,
            EventKind::Expanded => AdEvent::Expanded,
            EventKind::Skipped => AdEvent::Skipped,
            EventKind::ClickThru => AdEvent::ClickThru {
                url: String::new(),
                id: String::new(),
                player_handles: false,
            },
            EventKind::Error => AdEvent::Error { message: String::new() },
            EventKind::Log => AdEvent::Log { message: String::new() },
            EventKind::Interaction => AdEvent::Interaction { id: String::new() },
            EventKind::Other(name) => AdEvent::Other { name },
        }
    }

    /// Positional callback arguments, in protocol order
    pub fn args(&self) -> Vec<serde_json::Value> {
        match self {
            AdEvent::ClickThru {
                url,
                id,
                player_handles,
            } => vec![url.as_str().into(), id.as_str().into(), (*player_handles).into()],
            AdEvent::Error { message } | AdEvent::Log { message } => vec![message.as_str().into()],
            AdEvent::Interaction { id } => vec![id.as_str().into()],
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for AdEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args = self.args();
        if args.is_empty() {
            return write!(f, "{}", self.kind());
        }
        let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.kind(), rendered.join(", "))
    }
}

/// Serialized as `{"event": "<protocol name>", ...payload}`
impl Serialize for AdEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("event", self.kind().name())?;
        match self {
            AdEvent::ClickThru {
                url,
                id,
                player_handles,
            } => {
                map.serialize_entry("url", url)?;
                map.serialize_entry("id", id)?;
                map.serialize_entry("playerHandles", player_handles)?;
            }
            AdEvent::Error { message } | AdEvent::Log { message } => {
                map.serialize_entry("message", message)?;
            }
            AdEvent::Interaction { id } => map.serialize_entry("id", id)?,
            _ => {}
        }
        map.end()
    }
}

/// Callback invoked on dispatch
pub type EventHandler = Box<dyn FnMut(&AdEvent)>;

/// Registration state of an event name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Never subscribed
    Unregistered,
    /// Subscribed once, since cleared
    Cleared,
    /// A handler is bound
    Bound,
}

/// Mapping from event kind to at most one handler
#[derive(Default)]
pub struct EventRegistry {
    handlers: HashMap<EventKind, Option<EventHandler>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler, replacing any existing binding for the same kind
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&AdEvent) + 'static,
    {
        debug!(event = %kind, "Subscribed");
        self.handlers.insert(kind, Some(Box::new(handler)));
    }

    /// Bind a handler to a caller-supplied context it receives on every call
    pub fn subscribe_with<C, F>(&mut self, kind: EventKind, context: C, mut handler: F)
    where
        C: 'static,
        F: FnMut(&mut C, &AdEvent) + 'static,
    {
        let mut context = context;
        self.subscribe(kind, move |event| handler(&mut context, event));
    }

    /// Clear the binding for a kind; idempotent
    pub fn unsubscribe(&mut self, kind: &EventKind) {
        debug!(event = %kind, "Unsubscribed");
        self.handlers.insert(kind.clone(), None);
    }

    pub fn is_subscribed(&self, kind: &EventKind) -> bool {
        matches!(self.handlers.get(kind), Some(Some(_)))
    }

    pub fn binding(&self, kind: &EventKind) -> Binding {
        match self.handlers.get(kind) {
            None => Binding::Unregistered,
            Some(None) => Binding::Cleared,
            Some(Some(_)) => Binding::Bound,
        }
    }

    /// Invoke the bound handler, if any. Returns whether a handler ran.
    pub fn dispatch(&mut self, event: &AdEvent) -> bool {
        match self.handlers.get_mut(&event.kind()) {
            Some(Some(handler)) => {
                trace!(event = %event, "Dispatching");
                handler(event);
                true
            }
            _ => {
                trace!(event = %event, "No handler bound");
                false
            }
        }
    }

    /// Kinds that currently have a handler bound
    pub fn subscribed(&self) -> Vec<EventKind> {
        self.handlers
            .iter()
            .filter(|(_, handler)| handler.is_some())
            .map(|(kind, _)| kind.clone())
            .collect()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("subscribed", &self.subscribed())
            .finish()
    }
}
