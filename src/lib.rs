//! Behavior layer for imageboard thread pages.
//!
//! A [`PageController`] owns the parsed page document, a virtual clock and an
//! injected [`PageFetcher`]. Hosts feed it [`PageEvent`]s and advance its clock;
//! the controller polls for new replies, blinks the title while unseen replies
//! exist, expands media, inserts quotes and shows hover previews.

mod config;
mod dom;
mod error;
mod event;
mod fetch;
mod html;
mod location;
mod page;
mod pattern;
mod scheduler;
mod trace;
mod uri;

pub use config::PageConfig;
pub use dom::{Dom, NodeId};
pub use error::{Error, Result};
pub use event::{MouseButton, PageEvent};
pub use fetch::{MockFetcher, PageFetcher};
pub use html::parse_html;
pub use location::PageLocation;
pub use page::PageController;
pub use scheduler::{PendingTimer, Task};
pub use uri::decode_uri_component;
