//! UI-side glue: translating touch events into commands and projecting scan
//! events into display state.
//!
//! Nothing here renders. The display task owns a [`BleScanView`] and a
//! [`WifiScanView`], feeds them every [`ScanEvent`](crate::messages::ScanEvent)
//! it drains, and draws whatever they report.

pub mod router;
pub mod view;

pub use router::{RequestError, ScanDuration, ScanRequester, UiEvent, route};
pub use view::{BleBand, BleScanView, BleStatus, WifiScanView};
