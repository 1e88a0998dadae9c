//! Live editable decoration: identifiers, marker classes, click routing.
//!
//! # Responsibility
//! - Keep issue-to-element bindings stable across markup round-trips.
//! - Render issue state as classes on the live tree.
//!
//! # See also
//! - `crate::model` for the tree and issue types.

pub mod click;
pub mod editable;
pub mod identity;
pub mod marking;

pub use click::{route_click, AfterShow, CheckerController, CheckerMode, ClickOutcome};
pub use editable::{DecoratorError, EditableDecorator};
pub use identity::{IdentityFilter, ResolveSummary, ID_ATTRIBUTE_NAME_FULL, ROOT_ELEMENT_ID};
pub use marking::{DefaultMarker, IssueMarker, UnmarkTarget};
