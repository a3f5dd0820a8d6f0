//! Day-cell resolution for the search form's calendar widget.
//!
//! The calendar is rendered asynchronously and its markup changes between
//! releases, so the resolver walks an ordered list of strategies, each
//! bounded by a short visibility timeout, and stops at the first click that
//! lands:
//!
//! 1. `data-date` attribute
//! 2. `aria-label` containing the month and day
//! 3. exact day-number text, disambiguated by [`pick_day_cell`]
//! 4. keyboard navigation from today's focused cell
//!
//! If every strategy comes up empty the selection fails.

mod cells;
mod target;

pub use cells::{pick_day_cell, DateCell};
pub use target::TargetDate;

use std::fmt;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::base::BasePage;
use crate::{js_string, selectors, Error, Result};
use cells::{COLLECT_DAY_CELLS_JS, DAY_CELL_ATTR};

/// Default visibility bound for each strategy.
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 2_000;

/// Keyboard navigation is only attempted inside this window.
const KEYBOARD_MAX_DAYS: i64 = 60;
const KEY_DELAY_MS: u64 = 100;
const FOLLOWUP_PROBE_MS: u64 = 300;

/// One way of locating the day cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStrategy {
    DataAttribute,
    AriaLabel,
    DayText,
    Keyboard,
}

impl DateStrategy {
    /// All strategies in the order they are tried.
    pub const CHAIN: [DateStrategy; 4] = [
        DateStrategy::DataAttribute,
        DateStrategy::AriaLabel,
        DateStrategy::DayText,
        DateStrategy::Keyboard,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DataAttribute => "data-attribute",
            Self::AriaLabel => "aria-label",
            Self::DayText => "day-text",
            Self::Keyboard => "keyboard",
        }
    }

    /// Direct selectors for the selector-based strategies.
    pub fn selectors(&self, target: &TargetDate) -> Vec<String> {
        match self {
            Self::DataAttribute => vec![format!("[data-date='{}']", target.iso())],
            Self::AriaLabel => {
                let month = target.month_name();
                let day = target.day();
                // Anchored so that "October 2" does not match "October 24".
                vec![
                    format!("[aria-label*='{} {},']", month, day),
                    format!("[aria-label$='{} {}']", month, day),
                    format!("[aria-label^='{} {}']", day, month),
                    format!("[aria-label*=' {} {}']", day, month),
                ]
            }
            Self::DayText | Self::Keyboard => Vec::new(),
        }
    }
}

impl fmt::Display for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of ArrowRight presses from today's cell, if within range.
pub fn keyboard_steps(target: &TargetDate, today: NaiveDate) -> Option<u32> {
    let days = target.days_from(today);
    if days > 0 && days < KEYBOARD_MAX_DAYS {
        u32::try_from(days).ok()
    } else {
        None
    }
}

/// Resolves and clicks a day cell in an already opened calendar.
pub struct DatePicker<'a> {
    base: BasePage<'a>,
    attempt_timeout_ms: u64,
    today: NaiveDate,
}

impl<'a> DatePicker<'a> {
    pub fn new(base: BasePage<'a>) -> Self {
        Self {
            base,
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_attempt_timeout(mut self, timeout_ms: u64) -> Self {
        self.attempt_timeout_ms = timeout_ms;
        self
    }

    /// Reference date for keyboard navigation.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run the strategy chain. Returns the strategy that selected the date.
    pub async fn select(&self, target: &TargetDate) -> Result<DateStrategy> {
        info!("Looking for date: {} ({})", target, target.iso());
        let mut tried = Vec::new();

        for strategy in DateStrategy::CHAIN {
            debug!("Trying date strategy: {}", strategy);
            match self.attempt(strategy, target).await {
                Ok(true) => {
                    info!("✓ Date {} selected via {}", target, strategy);
                    self.base.pause(500).await;
                    return Ok(strategy);
                }
                Ok(false) => debug!("Date strategy {} found nothing", strategy),
                Err(e) => debug!("Date strategy {} failed: {}", strategy, e),
            }
            tried.push(strategy.name());
        }

        Err(Error::DateNotSelectable {
            date: target.iso(),
            attempts: tried.join(", "),
        })
    }

    async fn attempt(&self, strategy: DateStrategy, target: &TargetDate) -> Result<bool> {
        match strategy {
            DateStrategy::DataAttribute | DateStrategy::AriaLabel => {
                // The first selector gets the full bound; the rest only a short look.
                for (i, selector) in strategy.selectors(target).iter().enumerate() {
                    let wait = if i == 0 {
                        self.attempt_timeout_ms
                    } else {
                        self.attempt_timeout_ms.min(FOLLOWUP_PROBE_MS)
                    };
                    if self.base.is_visible(selector, Some(wait)).await {
                        debug!("Date cell matched: {}", selector);
                        self.base.page().click(selector).await?;
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            DateStrategy::DayText => self.click_by_day_text(target).await,
            DateStrategy::Keyboard => self.navigate_by_keyboard(target).await,
        }
    }

    /// Collect exact-text candidates until some appear or the bound expires.
    pub async fn collect_cells(&self, target: &TargetDate) -> Result<Vec<DateCell>> {
        let roots = serde_json::to_string(selectors::CALENDAR_ROOTS)
            .map_err(|e| Error::Script(format!("encode roots: {}", e)))?;
        let js = format!(
            "{}({}, {}, {})",
            COLLECT_DAY_CELLS_JS.trim(),
            roots,
            js_string(&target.day().to_string()),
            js_string(DAY_CELL_ATTR)
        );
        let deadline = Instant::now() + Duration::from_millis(self.attempt_timeout_ms);
        loop {
            let json: String = self.base.page().evaluate(&js).await?;
            let cells: Vec<DateCell> = serde_json::from_str(&json)
                .map_err(|e| Error::Script(format!("day cell parse error: {}", e)))?;
            if !cells.is_empty() || Instant::now() >= deadline {
                return Ok(cells);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    async fn click_by_day_text(&self, target: &TargetDate) -> Result<bool> {
        let cells = self.collect_cells(target).await?;
        debug!("Found {} cells with text '{}'", cells.len(), target.day());
        let Some(cell) = pick_day_cell(&cells, target) else {
            return Ok(false);
        };
        debug!(
            "Picked <{}> class='{}' month={:?}",
            cell.tag, cell.classes, cell.month_context
        );
        self.base.page().click(&cell.selector()).await?;
        Ok(true)
    }

    async fn navigate_by_keyboard(&self, target: &TargetDate) -> Result<bool> {
        let Some(steps) = keyboard_steps(target, self.today) else {
            debug!("Target {} outside keyboard range", target);
            return Ok(false);
        };
        info!("Trying keyboard navigation: {} days from today", steps);
        let page = self.base.page();
        for _ in 0..steps {
            page.human().press_key("ArrowRight").await?;
            self.base.pause(KEY_DELAY_MS).await;
        }
        page.human().press_key("Enter").await?;
        Ok(true)
    }
}
