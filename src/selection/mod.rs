//! Tri-state selection over a lazily loaded tree
//!
//! Selection intent lives in sparse path-keyed overlays ([`state`]), the
//! rendered part of the tree in a [`cache::PageCache`], and checkbox states
//! are derived from both on demand ([`tristate`]).

pub mod blacklist;
pub mod cache;
pub mod model;
pub mod state;
pub mod store;
pub mod tristate;
pub mod walk;

pub use blacklist::{Blacklist, BLACKLIST_NAMES};
pub use cache::{CachedPage, PageCache};
pub use model::{Consent, Decision, Outcome, PendingChange, Proposal, SelectionModel};
pub use state::{AllowOverrides, ExpandState, Mark, SelectionState};
pub use store::{PersistedSelection, SelectionStore};
pub use tristate::{TriState, TriStateView};
pub use walk::{list_all, walk_breadth_first, TreeSource};
