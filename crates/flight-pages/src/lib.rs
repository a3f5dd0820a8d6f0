//! # flight-pages
//!
//! Page objects for the kiwi.com flight search flow.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flight_pages::{Browser, HomePage, TripType};
//!
//! # #[tokio::main]
//! # async fn main() -> flight_pages::Result<()> {
//! let browser = Browser::launch().await?;
//! let page = browser.new_page("about:blank").await?;
//!
//! let home = HomePage::new(&page);
//! home.open().await?;
//! home.select_trip_type(TripType::OneWay).await?;
//! home.set_departure_airport("RTM").await?;
//! home.set_arrival_airport("MAD").await?;
//! home.set_departure_date(1).await?;
//! home.click_search_button().await?;
//! assert!(home.verify_redirected_to_results().await?);
//!
//! browser.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod datepicker;
pub mod home;
pub mod selectors;

pub use base::{BasePage, ElementState, LoadState, DEFAULT_TIMEOUT_MS};
pub use datepicker::{pick_day_cell, DateCell, DatePicker, DateStrategy, TargetDate};
pub use home::{HomePage, TripType};

// Re-export eoka types that callers need
pub use eoka::{Browser, Page, StealthConfig};

/// Result type for page object operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by page objects.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("could not select {date} in the calendar (tried: {attempts})")]
    DateNotSelectable { date: String, attempts: String },

    #[error("date out of range: {0}")]
    DateOutOfRange(String),

    #[error("unknown trip type '{0}', expected one-way or return")]
    InvalidTripType(String),
}

/// Quote a Rust string as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
