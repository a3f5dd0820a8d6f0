//! # flight-search-e2e
//!
//! Selector probes for the flight search form. The page objects live in
//! `flight-pages`, the scenario runner in `flight-bdd`; this crate holds
//! the `flight-probe` tool used when the site's markup drifts.

pub mod probe;

pub use probe::{
    calendar_groups, control_groups, probe_groups, probe_selectors, ProbeElement, ProbeGroup,
    SelectorReport,
};
