//! Chat domain: who is in which room, and what gets said there.
//!
//! The registry is the single source of truth for membership; rosters are
//! derived from it on demand and never cached.

pub mod messages;
pub mod profanity;
pub mod registry;
pub mod router;
mod session;

pub use profanity::{AllowAll, ProfanityFilter, WordListFilter};
pub use registry::{ConnectionId, User, UserRegistry};
pub use router::{RoomData, RosterEntry};
pub use session::{Session, SessionState};
