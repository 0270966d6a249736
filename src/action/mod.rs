//! Row and bulk action dispatch.
//!
//! Actions come out of the descriptor (view, edit popup, delete, status
//! toggle); dispatching one either opens a dialog or issues a remote call
//! against a URL resolved from the acted-upon row.

pub mod dispatch;
pub mod form;
pub mod url;

pub use dispatch::{ActionError, Confirmation, Dialog, Dispatcher};
