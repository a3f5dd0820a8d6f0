//! Base page object: semantic actions over raw selectors with bounded waits.

use std::fmt;
use std::time::Duration;

use eoka::Page;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{js_string, Error, Result};

/// Default timeout for waits and interactions.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Polling interval for script-based waits.
const POLL_INTERVAL_MS: u64 = 100;

/// Attribute used to hand an element found by script back to a CSS selector.
const MARK_ATTR: &str = "data-e2e-mark";

/// Page load states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// `document.readyState === "complete"`
    #[default]
    Load,
    /// `document.readyState` past `"loading"`
    DomContentLoaded,
    /// No network activity for 500ms
    NetworkIdle,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::DomContentLoaded => f.write_str("domcontentloaded"),
            Self::NetworkIdle => f.write_str("networkidle"),
        }
    }
}

/// Element states for [`BasePage::wait_for_element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementState {
    Attached,
    Detached,
    #[default]
    Visible,
    Hidden,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attached => f.write_str("attached"),
            Self::Detached => f.write_str("detached"),
            Self::Visible => f.write_str("visible"),
            Self::Hidden => f.write_str("hidden"),
        }
    }
}

/// True when no element matches or the match is not rendered.
const IS_HIDDEN_JS: &str = r#"
(selector => {
    const el = document.querySelector(selector);
    if (!el) return true;
    const r = el.getBoundingClientRect();
    const s = getComputedStyle(el);
    return r.width < 1 || r.height < 1 || s.display === 'none' || s.visibility === 'hidden';
})
"#;

/// Finds the first visible button whose whitespace-collapsed text equals one
/// of the needles (case-insensitive), marks it and returns the mark.
const FIND_BUTTON_BY_TEXT_JS: &str = r#"
((needles, attr) => {
    const BUTTONS = 'button, input[type="submit"], input[type="button"], [role="button"]';
    const norm = s => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
    const visible = el => {
        const r = el.getBoundingClientRect();
        if (r.width < 1 || r.height < 1) return false;
        const s = getComputedStyle(el);
        return s.display !== 'none' && s.visibility !== 'hidden' && parseFloat(s.opacity) >= 0.1;
    };
    const nodes = Array.from(document.querySelectorAll(BUTTONS));
    for (const needle of needles) {
        const n = norm(needle);
        for (const el of nodes) {
            if (norm(el.innerText || el.value) !== n || !visible(el)) continue;
            const mark = String(Date.now()) + Math.floor(Math.random() * 1e6);
            el.setAttribute(attr, mark);
            return mark;
        }
    }
    return null;
})
"#;

/// Wraps an eoka `Page` with Playwright-style waiting semantics.
///
/// Every interaction waits for the element to become visible first, bounded
/// by the per-call timeout or the page default.
#[derive(Clone, Copy)]
pub struct BasePage<'a> {
    page: &'a Page,
    timeout_ms: u64,
    slow_mo_ms: u64,
}

impl<'a> BasePage<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self {
            page,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            slow_mo_ms: 0,
        }
    }

    /// Override the default timeout.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Delay inserted after each interaction, for watching headed runs.
    pub fn with_slow_mo(mut self, slow_mo_ms: u64) -> Self {
        self.slow_mo_ms = slow_mo_ms;
        self
    }

    /// The underlying eoka page.
    pub fn page(&self) -> &'a Page {
        self.page
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn timeout(&self, timeout_ms: Option<u64>) -> u64 {
        timeout_ms.unwrap_or(self.timeout_ms)
    }

    async fn settle(&self) {
        if self.slow_mo_ms > 0 {
            self.page.wait(self.slow_mo_ms).await;
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub async fn navigate_to(&self, url: &str) -> Result<()> {
        info!("Navigating to: {}", url);
        self.page.goto(url).await?;
        self.wait_for_load_state(LoadState::DomContentLoaded).await
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?)
    }

    /// Wait until the URL contains `pattern`.
    pub async fn wait_for_url(&self, pattern: &str, timeout_ms: Option<u64>) -> Result<()> {
        let timeout = self.timeout(timeout_ms);
        info!("Waiting for URL pattern: {}", pattern);
        self.page
            .wait_for_url_contains(pattern, timeout)
            .await
            .map_err(|e| Error::Timeout(format!("url containing '{}': {}", pattern, e)))
    }

    pub async fn wait_for_load_state(&self, state: LoadState) -> Result<()> {
        debug!("Waiting for load state: {}", state);
        match state {
            LoadState::Load => {
                self.wait_until("document.readyState === 'complete'", self.timeout_ms, "load")
                    .await
            }
            LoadState::DomContentLoaded => {
                self.wait_until(
                    "document.readyState !== 'loading'",
                    self.timeout_ms,
                    "domcontentloaded",
                )
                .await
            }
            LoadState::NetworkIdle => {
                self.page
                    .wait_for_network_idle(500, self.timeout_ms)
                    .await?;
                Ok(())
            }
        }
    }

    /// Fixed delay.
    pub async fn pause(&self, ms: u64) {
        self.page.wait(ms).await;
    }

    // =========================================================================
    // Element state
    // =========================================================================

    /// Whether the element becomes visible within the timeout. Never errors.
    pub async fn is_visible(&self, selector: &str, timeout_ms: Option<u64>) -> bool {
        self.page
            .wait_for_visible(selector, self.timeout(timeout_ms))
            .await
            .is_ok()
    }

    /// Try each selector in order; return the first one that becomes visible.
    pub async fn first_visible<'s>(
        &self,
        selectors: &[&'s str],
        timeout_ms: u64,
    ) -> Option<&'s str> {
        for &selector in selectors {
            debug!("Trying selector: {}", selector);
            if self.is_visible(selector, Some(timeout_ms)).await {
                return Some(selector);
            }
        }
        None
    }

    pub async fn wait_for_element(
        &self,
        selector: &str,
        state: ElementState,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout = self.timeout(timeout_ms);
        debug!("Waiting for element {} to be {}", selector, state);
        let waited = match state {
            ElementState::Attached => self.page.wait_for(selector, timeout).await.map(|_| ()),
            ElementState::Visible => self
                .page
                .wait_for_visible(selector, timeout)
                .await
                .map(|_| ()),
            ElementState::Hidden => {
                let js = format!("{}({})", IS_HIDDEN_JS.trim(), js_string(selector));
                return self.wait_until(&js, timeout, selector).await;
            }
            ElementState::Detached => {
                let js = format!("!document.querySelector({})", js_string(selector));
                return self.wait_until(&js, timeout, selector).await;
            }
        };
        waited.map_err(|e| Error::Timeout(format!("{} to be {}: {}", selector, state, e)))
    }

    /// Trimmed text content of the element.
    pub async fn get_text(&self, selector: &str, timeout_ms: Option<u64>) -> Result<String> {
        self.require_visible(selector, timeout_ms).await?;
        let js = format!(
            "document.querySelector({})?.textContent?.trim() ?? null",
            js_string(selector)
        );
        let text: Option<String> = self.page.evaluate(&js).await?;
        text.ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    pub async fn is_checked(&self, selector: &str) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return null;
                const input = el.matches('input') ? el : el.querySelector('input[type="checkbox"]');
                if (input) return !!input.checked;
                return el.getAttribute('aria-checked') === 'true';
            }})()"#,
            js_string(selector)
        );
        let checked: Option<bool> = self.page.evaluate(&js).await?;
        checked.ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    async fn require_visible(&self, selector: &str, timeout_ms: Option<u64>) -> Result<()> {
        let timeout = self.timeout(timeout_ms);
        self.page
            .wait_for_visible(selector, timeout)
            .await
            .map(|_| ())
            .map_err(|_| {
                Error::ElementNotFound(format!("{} (not visible after {}ms)", selector, timeout))
            })
    }

    async fn wait_until(&self, condition_js: &str, timeout_ms: u64, what: &str) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let done: bool = self.page.evaluate(condition_js).await.unwrap_or(false);
            if done {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!("{} after {}ms", what, timeout_ms)));
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    pub async fn click(&self, selector: &str, timeout_ms: Option<u64>) -> Result<()> {
        info!("Clicking element: {}", selector);
        self.require_visible(selector, timeout_ms).await?;
        self.page.click(selector).await?;
        self.settle().await;
        Ok(())
    }

    /// Clear the field and set its value.
    pub async fn fill(&self, selector: &str, text: &str, timeout_ms: Option<u64>) -> Result<()> {
        info!("Filling element {} with: {}", selector, text);
        self.require_visible(selector, timeout_ms).await?;
        self.page.fill(selector, text).await?;
        self.settle().await;
        Ok(())
    }

    /// Focus the field and type one character at a time.
    pub async fn type_slowly(&self, selector: &str, text: &str, delay_ms: u64) -> Result<()> {
        debug!("Typing '{}' into {} ({}ms/char)", text, selector, delay_ms);
        self.focus(selector).await?;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.page.type_text(ch.encode_utf8(&mut buf)).await?;
            self.page.wait(delay_ms).await;
        }
        self.settle().await;
        Ok(())
    }

    pub async fn focus(&self, selector: &str) -> Result<()> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return false; el.focus(); return true; }})()",
            js_string(selector)
        );
        let focused: bool = self.page.evaluate(&js).await?;
        if !focused {
            return Err(Error::ElementNotFound(selector.to_string()));
        }
        Ok(())
    }

    /// Focus the element and press a key.
    pub async fn press_key(&self, selector: &str, key: &str) -> Result<()> {
        info!("Pressing key {} on element: {}", key, selector);
        self.focus(selector).await?;
        self.press(key).await
    }

    /// Press a key on whatever currently has focus.
    pub async fn press(&self, key: &str) -> Result<()> {
        self.page.human().press_key(key).await?;
        self.settle().await;
        Ok(())
    }

    /// Select a dropdown option by value, falling back to visible text.
    pub async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        info!("Selecting option {} in: {}", value, selector);
        self.require_visible(selector, None).await?;
        if let Err(e) = self.page.select(selector, value).await {
            debug!("No option valued '{}' ({}), trying by text", value, e);
            self.page
                .select_by_text(selector, value)
                .await
                .map_err(|e| {
                    Error::ActionFailed(format!(
                        "option '{}' not found in {}: {}",
                        value, selector, e
                    ))
                })?;
        }
        self.settle().await;
        Ok(())
    }

    pub async fn check_checkbox(&self, selector: &str) -> Result<()> {
        info!("Checking checkbox: {}", selector);
        self.set_checked(selector, true).await
    }

    pub async fn uncheck_checkbox(&self, selector: &str) -> Result<()> {
        info!("Unchecking checkbox: {}", selector);
        self.set_checked(selector, false).await
    }

    async fn set_checked(&self, selector: &str, want: bool) -> Result<()> {
        if self.is_checked(selector).await? == want {
            return Ok(());
        }
        // Styled checkboxes often hide the input; fall back to a DOM click.
        if self.page.click(selector).await.is_err() {
            debug!("Native click failed on {}, using element.click()", selector);
            self.page
                .execute(&format!(
                    "document.querySelector({})?.click()",
                    js_string(selector)
                ))
                .await?;
        }
        self.settle().await;
        if self.is_checked(selector).await? != want {
            return Err(Error::ActionFailed(format!(
                "checkbox {} did not become {}",
                selector,
                if want { "checked" } else { "unchecked" }
            )));
        }
        Ok(())
    }

    pub async fn hover(&self, selector: &str) -> Result<()> {
        info!("Hovering over: {}", selector);
        self.require_visible(selector, None).await?;
        self.page.hover(selector).await?;
        self.settle().await;
        Ok(())
    }

    /// Click the first visible button whose text is exactly one of `texts`
    /// (case and surrounding whitespace ignored), polling until the timeout.
    /// Needles are tried in order. Returns the matched selector.
    pub async fn click_button_by_text(&self, texts: &[&str], timeout_ms: u64) -> Result<String> {
        let needles = serde_json::to_string(texts)
            .map_err(|e| Error::Script(format!("encode needles: {}", e)))?;
        let js = format!(
            "{}({}, {})",
            FIND_BUTTON_BY_TEXT_JS.trim(),
            needles,
            js_string(MARK_ATTR)
        );
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let mark: Option<String> = self.page.evaluate(&js).await?;
            if let Some(mark) = mark {
                let selector = format!("[{}='{}']", MARK_ATTR, mark);
                debug!("Button text {:?} resolved to {}", texts, selector);
                self.page.click(&selector).await?;
                self.settle().await;
                return Ok(selector);
            }
            if Instant::now() >= deadline {
                return Err(Error::ElementNotFound(format!("button with text {:?}", texts)));
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }
}
