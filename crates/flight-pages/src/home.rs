//! kiwi.com landing page: the flight search form.

use std::fmt;
use std::str::FromStr;

use eoka::Page;
use tracing::{debug, info, warn};

use crate::base::{BasePage, LoadState};
use crate::datepicker::{DatePicker, DateStrategy, TargetDate, DEFAULT_ATTEMPT_TIMEOUT_MS};
use crate::{js_string, selectors, Error, Result};

/// How long fallback selectors get before the next one is tried.
const PROBE_TIMEOUT_MS: u64 = 2_000;
const COOKIE_TIMEOUT_MS: u64 = 3_000;
const TYPE_DELAY_MS: u64 = 100;
const REDIRECT_TIMEOUT_MS: u64 = 5_000;

/// Trip mode of the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    OneWay,
    Return,
}

impl FromStr for TripType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "one-way" | "oneway" | "one way" => Ok(Self::OneWay),
            "return" | "round-trip" | "roundtrip" | "round trip" => Ok(Self::Return),
            _ => Err(Error::InvalidTripType(s.to_string())),
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneWay => f.write_str("one-way"),
            Self::Return => f.write_str("return"),
        }
    }
}

/// Which place picker a field belongs to.
#[derive(Debug, Clone, Copy)]
enum PlaceField {
    Origin,
    Destination,
}

impl PlaceField {
    fn inputs(self) -> &'static [&'static str] {
        match self {
            Self::Origin => selectors::ORIGIN_INPUT,
            Self::Destination => selectors::DESTINATION_INPUT,
        }
    }

    fn clear_button(self) -> &'static str {
        match self {
            Self::Origin => selectors::ORIGIN_CLEAR,
            Self::Destination => selectors::DESTINATION_CLEAR,
        }
    }
}

impl fmt::Display for PlaceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => f.write_str("departure"),
            Self::Destination => f.write_str("arrival"),
        }
    }
}

/// Whether `url` looks like the search results page reached from `homepage`.
/// Only the part of `url` beyond the homepage URL is inspected.
pub fn is_results_url(url: &str, homepage: &str) -> bool {
    let tail = url.strip_prefix(homepage).unwrap_or(url).to_lowercase();
    selectors::RESULTS_URL_KEYWORDS
        .iter()
        .any(|keyword| tail.contains(keyword))
}

/// Marks the first visible suggestion row mentioning `code`.
const FIND_SUGGESTION_JS: &str = r#"
((rowsSel, code, attr) => {
    const needle = code.toLowerCase();
    for (const el of document.querySelectorAll(rowsSel)) {
        const r = el.getBoundingClientRect();
        if (r.width < 2 || r.height < 2) continue;
        if (!(el.innerText || '').toLowerCase().includes(needle)) continue;
        el.setAttribute(attr, '1');
        return true;
    }
    return false;
})
"#;

/// Marks the checkbox inside the first visible label mentioning `text`.
const FIND_LABELLED_CHECKBOX_JS: &str = r#"
((text, attr) => {
    const needle = text.toLowerCase();
    for (const label of document.querySelectorAll('label')) {
        if (!(label.innerText || '').toLowerCase().includes(needle)) continue;
        const box = label.querySelector('input[type="checkbox"], [role="checkbox"]')
            || (label.htmlFor && document.getElementById(label.htmlFor));
        const el = box || label;
        el.setAttribute(attr, '1');
        return true;
    }
    return false;
})
"#;

const SUGGESTION_ATTR: &str = "data-e2e-suggestion";
const CHECKBOX_ATTR: &str = "data-e2e-checkbox";

/// Page object for the kiwi.com homepage search form.
pub struct HomePage<'a> {
    base: BasePage<'a>,
    url: String,
    date_attempt_timeout_ms: u64,
}

impl<'a> HomePage<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self::with_base(BasePage::new(page))
    }

    pub fn with_base(base: BasePage<'a>) -> Self {
        debug!("Homepage page object initialized");
        Self {
            base,
            url: selectors::HOME_URL.to_string(),
            date_attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
        }
    }

    /// Point the page object at another homepage URL (mirrors, fixtures).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_date_attempt_timeout(mut self, timeout_ms: u64) -> Self {
        self.date_attempt_timeout_ms = timeout_ms;
        self
    }

    pub fn base(&self) -> &BasePage<'a> {
        &self.base
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn current_url(&self) -> Result<String> {
        self.base.current_url().await
    }

    /// Navigate to the homepage and dismiss the cookie banner.
    pub async fn open(&self) -> Result<()> {
        self.base.navigate_to(&self.url).await?;
        self.base.wait_for_load_state(LoadState::DomContentLoaded).await?;
        self.base.pause(2_000).await;
        self.handle_cookie_consent().await;
        Ok(())
    }

    async fn handle_cookie_consent(&self) {
        if let Some(selector) = self
            .base
            .first_visible(selectors::COOKIE_ACCEPT, COOKIE_TIMEOUT_MS)
            .await
        {
            info!("Clicking cookie consent: {}", selector);
            match self.base.click(selector, Some(COOKIE_TIMEOUT_MS)).await {
                Ok(()) => {
                    self.base.pause(1_000).await;
                    return;
                }
                Err(e) => debug!("Cookie consent click failed: {}", e),
            }
        }
        match self
            .base
            .click_button_by_text(selectors::COOKIE_ACCEPT_TEXTS, COOKIE_TIMEOUT_MS)
            .await
        {
            Ok(selector) => {
                info!("Clicked cookie consent by text: {}", selector);
                self.base.pause(1_000).await;
            }
            Err(_) => info!("No cookie consent popup found or already accepted"),
        }
    }

    /// Switch the search form to the given trip mode.
    pub async fn select_trip_type(&self, trip_type: TripType) -> Result<()> {
        info!("Selecting trip type: {}", trip_type);
        self.base.pause(1_000).await;

        let (picker, option) = match trip_type {
            TripType::OneWay => (
                selectors::TRIP_MODE_RETURN_ACTIVE,
                selectors::TRIP_OPTION_ONE_WAY,
            ),
            TripType::Return => (
                selectors::TRIP_MODE_ONE_WAY_ACTIVE,
                selectors::TRIP_OPTION_RETURN,
            ),
        };

        if !self.base.is_visible(picker, Some(PROBE_TIMEOUT_MS)).await {
            warn!(
                "Trip mode picker not found, assuming {} is already selected",
                trip_type
            );
            return Ok(());
        }
        self.base.click(picker, None).await?;
        self.base.click(option, Some(PROBE_TIMEOUT_MS)).await?;
        info!("✓ Trip type selected: {}", trip_type);
        self.base.pause(500).await;
        Ok(())
    }

    pub async fn set_departure_airport(&self, airport_code: &str) -> Result<()> {
        self.set_place(PlaceField::Origin, airport_code).await
    }

    pub async fn set_arrival_airport(&self, airport_code: &str) -> Result<()> {
        self.set_place(PlaceField::Destination, airport_code).await
    }

    async fn set_place(&self, field: PlaceField, airport_code: &str) -> Result<()> {
        info!("Setting {} airport: {}", field, airport_code);
        self.base.pause(1_000).await;

        let Some(input) = self.base.first_visible(field.inputs(), PROBE_TIMEOUT_MS).await else {
            return Err(Error::ElementNotFound(format!("{} airport input", field)));
        };

        // The form preselects the visitor's nearest city as a chip.
        if self.base.page().try_click(field.clear_button()).await? {
            debug!("Removed preselected {} place", field);
            self.base.pause(300).await;
        }

        self.base.click(input, None).await?;
        self.base.pause(500).await;
        self.base.fill(input, "", None).await?;
        self.base.pause(300).await;
        self.base.type_slowly(input, airport_code, TYPE_DELAY_MS).await?;
        self.base.pause(1_500).await;
        info!("✓ Typed {} in {} field", airport_code, field);

        self.select_airport_from_dropdown(airport_code).await
    }

    async fn select_airport_from_dropdown(&self, airport_code: &str) -> Result<()> {
        debug!("Looking for dropdown with: {}", airport_code);
        let js = format!(
            "{}({}, {}, {})",
            FIND_SUGGESTION_JS.trim(),
            js_string(selectors::PLACE_SUGGESTIONS),
            js_string(airport_code),
            js_string(SUGGESTION_ATTR)
        );
        let found: bool = self.base.page().evaluate(&js).await?;
        if found {
            let selector = format!("[{}='1']", SUGGESTION_ATTR);
            self.base.click(&selector, Some(PROBE_TIMEOUT_MS)).await?;
            self.base
                .page()
                .execute(&format!(
                    "document.querySelectorAll('[{}]').forEach(el => el.removeAttribute('{}'))",
                    SUGGESTION_ATTR, SUGGESTION_ATTR
                ))
                .await?;
            info!("✓ Selected {} from dropdown", airport_code);
        } else {
            info!("No dropdown suggestion found, pressing Enter");
            self.base.press("Enter").await?;
        }
        self.base.pause(500).await;
        Ok(())
    }

    /// Pick today + `weeks_from_now` weeks in the date picker.
    pub async fn set_departure_date(&self, weeks_from_now: u32) -> Result<DateStrategy> {
        info!("Setting departure date: {} week(s) from now", weeks_from_now);
        let target = TargetDate::weeks_from_now(weeks_from_now)?;
        self.select_departure_date(&target).await
    }

    /// Click the departure date field. Returns false if no field is visible.
    pub async fn open_date_picker(&self) -> Result<bool> {
        let Some(selector) = self
            .base
            .first_visible(selectors::DATE_INPUT, PROBE_TIMEOUT_MS)
            .await
        else {
            return Ok(false);
        };
        info!("Opening date picker: {}", selector);
        self.base.click(selector, None).await?;
        self.base.pause(1_500).await;
        Ok(true)
    }

    pub async fn select_departure_date(&self, target: &TargetDate) -> Result<DateStrategy> {
        info!("Target date: {}", target);

        if !self.open_date_picker().await? {
            warn!("Date field not found, assuming the calendar is already open");
        }

        let strategy = DatePicker::new(self.base)
            .with_attempt_timeout(self.date_attempt_timeout_ms)
            .select(target)
            .await?;

        if self.base.page().try_click(selectors::DATE_DONE_BUTTON).await? {
            debug!("Confirmed dates");
            self.base.pause(500).await;
        }
        Ok(strategy)
    }

    /// Uncheck the accommodation offer. A missing checkbox is only a warning.
    pub async fn uncheck_accommodation_option(&self, label: &str) -> Result<()> {
        info!("Looking for accommodation checkbox");
        self.base.pause(1_000).await;

        let selector = match self
            .base
            .first_visible(selectors::ACCOMMODATION_CHECKBOX, PROBE_TIMEOUT_MS)
            .await
        {
            Some(sel) => sel.to_string(),
            None => match self.find_labelled_checkbox(label).await? {
                Some(sel) => sel,
                None => {
                    warn!("Could not find accommodation checkbox");
                    return Ok(());
                }
            },
        };

        if self.base.is_checked(&selector).await? {
            self.base.uncheck_checkbox(&selector).await?;
            info!("✓ Accommodation checkbox unchecked: {}", selector);
        } else {
            info!("Accommodation checkbox already unchecked");
        }
        Ok(())
    }

    async fn find_labelled_checkbox(&self, label: &str) -> Result<Option<String>> {
        for needle in [label, "accommodation", "booking.com"] {
            if needle.is_empty() {
                continue;
            }
            let js = format!(
                "{}({}, {})",
                FIND_LABELLED_CHECKBOX_JS.trim(),
                js_string(needle),
                js_string(CHECKBOX_ATTR)
            );
            let found: bool = self.base.page().evaluate(&js).await?;
            if found {
                debug!("Checkbox located by label text '{}'", needle);
                return Ok(Some(format!("[{}='1']", CHECKBOX_ATTR)));
            }
        }
        Ok(None)
    }

    /// Submit the search form.
    pub async fn click_search_button(&self) -> Result<()> {
        info!("Clicking search button");
        self.base.pause(1_000).await;

        if let Some(selector) = self
            .base
            .first_visible(selectors::SEARCH_BUTTON, PROBE_TIMEOUT_MS)
            .await
        {
            info!("Found search button: {}", selector);
            self.base.click(selector, None).await?;
        } else {
            self.base
                .click_button_by_text(selectors::SEARCH_BUTTON_TEXTS, PROBE_TIMEOUT_MS)
                .await
                .map_err(|_| Error::ElementNotFound("search button".into()))?;
        }
        info!("✓ Search button clicked");
        self.base.pause(3_000).await;
        Ok(())
    }

    /// Poll the URL until it looks like the results page.
    pub async fn verify_redirected_to_results(&self) -> Result<bool> {
        info!("Verifying redirect to search results...");
        let deadline = tokio::time::Instant::now()
            + std::time::Duration::from_millis(REDIRECT_TIMEOUT_MS);
        loop {
            let url = self.base.current_url().await?;
            if is_results_url(&url, &self.url) {
                info!("✓ Redirected to search results page: {}", url);
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                warn!("URL does not appear to be results page: {}", url);
                return Ok(false);
            }
            self.base.pause(250).await;
        }
    }
}
