use crate::feature::BrowserConfig;
use crate::steps::Step;
use crate::{Error, Result};
use eoka::Page;
use flight_pages::datepicker::DEFAULT_ATTEMPT_TIMEOUT_MS;
use flight_pages::{BasePage, HomePage};
use tracing::{debug, info};

/// Per-scenario state shared by consecutive steps.
pub struct ScenarioContext<'a> {
    base: BasePage<'a>,
    date_attempt_timeout_ms: u64,
    home: HomePage<'a>,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(page: &'a Page, config: &BrowserConfig) -> Self {
        let mut base = BasePage::new(page).with_slow_mo(config.slow_mo_ms);
        if let Some(timeout_ms) = config.timeout_ms {
            base = base.with_timeout(timeout_ms);
        }
        let date_attempt_timeout_ms = config
            .date_attempt_timeout_ms
            .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT_MS);
        Self {
            base,
            date_attempt_timeout_ms,
            home: Self::home_page(base, date_attempt_timeout_ms),
        }
    }

    fn home_page(base: BasePage<'a>, date_attempt_timeout_ms: u64) -> HomePage<'a> {
        HomePage::with_base(base).with_date_attempt_timeout(date_attempt_timeout_ms)
    }

    /// Run one step against the page.
    pub async fn execute(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::NavigateHome { url } => {
                self.home =
                    Self::home_page(self.base, self.date_attempt_timeout_ms).with_url(url.clone());
                self.home.open().await?;
                let current = self.home.current_url().await?;
                if current != *url && !current.contains(url.as_str()) {
                    return Err(Error::AssertionFailed(format!(
                        "failed to navigate to {} (at {})",
                        url, current
                    )));
                }
            }
            Step::SelectTripType(trip_type) => {
                self.home.select_trip_type(*trip_type).await?;
            }
            Step::SetDepartureAirport(code) => {
                self.home.set_departure_airport(code).await?;
            }
            Step::SetArrivalAirport(code) => {
                self.home.set_arrival_airport(code).await?;
            }
            Step::SetDepartureDate { weeks } => {
                let strategy = self.home.set_departure_date(*weeks).await?;
                debug!("Departure date resolved via {}", strategy);
            }
            Step::UncheckOption(label) => {
                self.home.uncheck_accommodation_option(label).await?;
            }
            Step::ClickSearch => {
                self.home.click_search_button().await?;
            }
            Step::VerifyResults => {
                if !self.home.verify_redirected_to_results().await? {
                    let url = self.home.current_url().await?;
                    return Err(Error::AssertionFailed(format!(
                        "not redirected to search results page (at {})",
                        url
                    )));
                }
                info!("Results page reached");
            }
        }
        Ok(())
    }
}
