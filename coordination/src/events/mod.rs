//! Workflow progress events
//!
//! The controller publishes a [`WorkflowEvent`] at every phase change and
//! after every decided round. Attaching a bus is optional; a run without
//! one behaves identically.
//!
//! ```text
//! ┌────────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ WorkflowController │────▶│  Event Bus   │────▶│  Subscribers │
//! │     (publish)      │     │  (broadcast) │     │   (recv)     │
//! └────────────────────┘     └──────────────┘     └──────────────┘
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, SharedEventBus};
pub use types::{preview, RunId, WorkflowEvent};
