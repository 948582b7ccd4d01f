//! View models and listings for a public directory of multi-user chat rooms.
//!
//! [`view::RoomViewModelBuilder`] resolves a crawled [`room::RoomRecord`] and
//! its public disco#info into render-ready fields. [`surface`] lays those out
//! as HTML and [`directory`] handles listing order, paging and search over a
//! snapshot of rooms.

pub mod address;
pub mod colour;
pub mod config;
pub mod count;
pub mod directory;
pub mod error;
pub mod highlight;
pub mod language;
pub mod precedence;
pub mod room;
pub mod server;
pub mod surface;
pub mod view;

pub use address::Address;
pub use error::{AddressError, BuildError, ConfigError, DirectoryError};
pub use room::{AnonymityMode, PublicInfo, RenderOptions, RoomRecord};
pub use view::{Action, ActionKind, Avatar, Badges, BuilderConfig, RoomViewModel, RoomViewModelBuilder};
