// Session gate module
// Provides the authentication state machine, the storage seam, and activity handling

pub mod controller;
pub mod store;
pub mod types;

pub use controller::SessionController;
pub use store::{LAST_ACTIVITY_KEY, MemorySessionStore, SessionStore};
pub use types::{ActivityKind, GateConfig, GateState, SessionRecord};
