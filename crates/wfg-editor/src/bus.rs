//! Typed event bus owned by one canvas.
//!
//! Event kinds form a closed enum; each keeps the dotted name embedders
//! know it by, so string-keyed integrations can map onto it.

use wfg_core::kurbo::Point;
use wfg_core::{ConnectionId, NodeId};

use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CreateStep,
    CreateInput,
    CreateOutput,
    ConnectionCreate,
    WorkflowArrange,
    WorkflowScale,
    WorkflowFit,
    BeforeChange,
    AfterChange,
    SelectionChange,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::CreateStep,
        EventKind::CreateInput,
        EventKind::CreateOutput,
        EventKind::ConnectionCreate,
        EventKind::WorkflowArrange,
        EventKind::WorkflowScale,
        EventKind::WorkflowFit,
        EventKind::BeforeChange,
        EventKind::AfterChange,
        EventKind::SelectionChange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CreateStep => "app.create.step",
            EventKind::CreateInput => "app.create.input",
            EventKind::CreateOutput => "app.create.output",
            EventKind::ConnectionCreate => "connection.create",
            EventKind::WorkflowArrange => "workflow.arrange",
            EventKind::WorkflowScale => "workflow.scale",
            EventKind::WorkflowFit => "workflow.fit",
            EventKind::BeforeChange => "beforeChange",
            EventKind::AfterChange => "afterChange",
            EventKind::SelectionChange => "selectionChange",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// A user-visible mutation, reported before and after it is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    MoveNode {
        node: NodeId,
        from: Point,
        to: Point,
    },
    Connect {
        source: ConnectionId,
        destination: ConnectionId,
    },
    Disconnect {
        source: ConnectionId,
        destination: ConnectionId,
    },
    CreateInput {
        port: ConnectionId,
    },
    CreateOutput {
        port: ConnectionId,
    },
    RemoveStep(NodeId),
    RemoveInput(NodeId),
    RemoveOutput(NodeId),
    Arrange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    CreateStep(NodeId),
    CreateInput(NodeId),
    CreateOutput(NodeId),
    ConnectionCreate {
        source: ConnectionId,
        destination: ConnectionId,
        valid: bool,
    },
    WorkflowArrange,
    WorkflowScale(f64),
    WorkflowFit,
    BeforeChange(GraphChange),
    AfterChange(GraphChange),
    SelectionChange(Option<Selection>),
}

impl GraphEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GraphEvent::CreateStep(_) => EventKind::CreateStep,
            GraphEvent::CreateInput(_) => EventKind::CreateInput,
            GraphEvent::CreateOutput(_) => EventKind::CreateOutput,
            GraphEvent::ConnectionCreate { .. } => EventKind::ConnectionCreate,
            GraphEvent::WorkflowArrange => EventKind::WorkflowArrange,
            GraphEvent::WorkflowScale(_) => EventKind::WorkflowScale,
            GraphEvent::WorkflowFit => EventKind::WorkflowFit,
            GraphEvent::BeforeChange(_) => EventKind::BeforeChange,
            GraphEvent::AfterChange(_) => EventKind::AfterChange,
            GraphEvent::SelectionChange(_) => EventKind::SelectionChange,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&GraphEvent)>;

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, EventKind, Handler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, kind, Box::new(handler)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _, _)| *sid != id);
        self.handlers.len() != before
    }

    /// Deliver to every handler of the event's kind, in subscription order.
    pub fn emit(&mut self, event: &GraphEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for (_, k, handler) in self.handlers.iter_mut() {
            if *k == kind {
                handler(event);
                delivered += 1;
            }
        }
        log::trace!("emit {}: {delivered} handlers", kind.name());
        delivered
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
