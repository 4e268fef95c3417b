//! Interactive editing of workflow graphs: gestures, selection, plugins,
//! and the typed event bus.

pub mod autopan;
pub mod bus;
pub mod canvas;
pub mod config;
pub mod events;
pub mod gestures;
pub mod input;
pub mod plugins;
pub mod selection;
pub mod shortcuts;
pub mod sync;

pub use bus::{EventBus, EventKind, GraphChange, GraphEvent, SubscriptionId};
pub use canvas::{CanvasError, WorkflowCanvas};
pub use config::CanvasConfig;
pub use input::{InputEvent, Modifiers};
pub use plugins::{CanvasRequest, Plugin, PluginContext};
pub use selection::Selection;
