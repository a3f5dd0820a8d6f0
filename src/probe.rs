//! Selector discovery: report what candidate selectors match on a live page.

use std::fmt;

use eoka::Page;
use flight_pages::{selectors, DateStrategy, Error, Result, TargetDate};
use serde::{Deserialize, Serialize};

/// Elements reported per selector.
pub const DEFAULT_LIMIT: usize = 3;

/// An element matched by a probed selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeElement {
    pub tag: String,
    pub text: String,
    #[serde(default)]
    pub classes: String,
    pub data_date: Option<String>,
    pub aria_label: Option<String>,
    pub data_test: Option<String>,
    pub visible: bool,
    /// Only set for checkboxes and radios.
    pub checked: Option<bool>,
    /// Truncated outer HTML.
    pub html: String,
}

/// What one selector matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorReport {
    pub selector: String,
    /// Total matches, including those not listed in `elements`.
    pub count: usize,
    pub elements: Vec<ProbeElement>,
    /// Set when the browser rejected the selector.
    #[serde(default)]
    pub error: Option<String>,
}

impl SelectorReport {
    pub fn visible_count(&self) -> usize {
        self.elements.iter().filter(|e| e.visible).count()
    }

    pub fn found(&self) -> bool {
        self.count > 0
    }
}

impl fmt::Display for SelectorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref error) = self.error {
            return write!(f, "✗ {}: {}", self.selector, error);
        }
        if !self.found() {
            return write!(f, "✗ {}: not found", self.selector);
        }
        write!(f, "✓ {}: {} match(es)", self.selector, self.count)?;
        for (i, el) in self.elements.iter().enumerate() {
            write!(f, "\n   [{}] <{}> text='{}'", i, el.tag, el.text)?;
            if !el.visible {
                f.write_str(" (hidden)")?;
            }
            if let Some(checked) = el.checked {
                write!(f, " checked={}", checked)?;
            }
            if !el.classes.is_empty() {
                write!(f, "\n       class='{}'", el.classes)?;
            }
            if let Some(ref date) = el.data_date {
                write!(f, "\n       data-date='{}'", date)?;
            }
            if let Some(ref label) = el.aria_label {
                write!(f, "\n       aria-label='{}'", label)?;
            }
            if let Some(ref test) = el.data_test {
                write!(f, "\n       data-test='{}'", test)?;
            }
            write!(f, "\n       html: {}", el.html)?;
        }
        Ok(())
    }
}

/// A titled list of selectors to probe together.
#[derive(Debug, Clone)]
pub struct ProbeGroup {
    pub title: &'static str,
    pub selectors: Vec<String>,
}

impl ProbeGroup {
    fn new<I, S>(title: &'static str, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            title,
            selectors: selectors
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
        }
    }
}

const DAY_CELL_CANDIDATES: &[&str] = &[
    "[data-test*='CalendarDay']",
    "div[class*='Day']",
    "button[class*='Day']",
    "td[class*='Day']",
    "[role='gridcell']",
];

/// Selectors worth checking once the calendar is open.
pub fn calendar_groups(target: &TargetDate) -> Vec<ProbeGroup> {
    vec![
        ProbeGroup::new("Calendar containers", selectors::CALENDAR_ROOTS),
        ProbeGroup::new(
            "data-date cells",
            DateStrategy::DataAttribute.selectors(target),
        ),
        ProbeGroup::new("aria-label cells", DateStrategy::AriaLabel.selectors(target)),
        ProbeGroup::new("Day cells", DAY_CELL_CANDIDATES),
        ProbeGroup::new("Confirm button", [selectors::DATE_DONE_BUTTON]),
    ]
}

/// Form controls on the search page, before the calendar is opened.
pub fn control_groups() -> Vec<ProbeGroup> {
    vec![
        ProbeGroup::new("Origin field", selectors::ORIGIN_INPUT),
        ProbeGroup::new("Destination field", selectors::DESTINATION_INPUT),
        ProbeGroup::new("Date field", selectors::DATE_INPUT),
        ProbeGroup::new(
            "Accommodation checkbox",
            selectors::ACCOMMODATION_CHECKBOX
                .iter()
                .chain(&["[data-test*='ccommodation']", "input[type='checkbox']"]),
        ),
        ProbeGroup::new("Search button", selectors::SEARCH_BUTTON),
    ]
}

const PROBE_JS: &str = r#"
((selectors, limit) => {
    const clip = (s, n) => {
        s = (s || '').trim().replace(/\s+/g, ' ');
        return s.length > n ? s.substring(0, n - 3) + '...' : s;
    };
    const visible = el => {
        const r = el.getBoundingClientRect();
        if (r.width < 2 || r.height < 2) return false;
        const s = getComputedStyle(el);
        return s.display !== 'none' && s.visibility !== 'hidden' && parseFloat(s.opacity) >= 0.1;
    };

    return JSON.stringify(selectors.map(selector => {
        let found;
        try {
            found = Array.from(document.querySelectorAll(selector));
        } catch (e) {
            return { selector, count: 0, elements: [], error: String(e.message || e) };
        }
        const elements = found.slice(0, limit).map(el => {
            const type = (el.getAttribute('type') || '').toLowerCase();
            return {
                tag: el.tagName.toLowerCase(),
                text: clip(el.innerText || el.textContent, 60),
                classes: clip(el.getAttribute('class'), 100),
                data_date: el.getAttribute('data-date'),
                aria_label: el.getAttribute('aria-label'),
                data_test: el.getAttribute('data-test'),
                visible: visible(el),
                checked: (type === 'checkbox' || type === 'radio') ? !!el.checked : null,
                html: clip(el.outerHTML, 150),
            };
        });
        return { selector, count: found.length, elements, error: null };
    }));
})
"#;

/// Probe each selector on the page, listing up to `limit` matches.
pub async fn probe_selectors(
    page: &Page,
    selectors: &[String],
    limit: usize,
) -> Result<Vec<SelectorReport>> {
    let list = serde_json::to_string(selectors)
        .map_err(|e| Error::Script(format!("encode selectors: {}", e)))?;
    let js = format!("{}({}, {})", PROBE_JS.trim(), list, limit);
    let json: String = page.evaluate(&js).await?;
    serde_json::from_str(&json).map_err(|e| Error::Script(format!("probe parse error: {}", e)))
}

/// Probe every group, in order.
pub async fn probe_groups(
    page: &Page,
    groups: &[ProbeGroup],
    limit: usize,
) -> Result<Vec<(&'static str, Vec<SelectorReport>)>> {
    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
        let reports = probe_selectors(page, &group.selectors, limit).await?;
        out.push((group.title, reports));
    }
    Ok(out)
}
