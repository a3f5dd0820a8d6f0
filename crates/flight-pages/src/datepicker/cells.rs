//! Day-cell candidates for the exact-text strategy.
//!
//! A calendar typically shows two months and pads each grid with days from
//! the neighbouring months, so the same day number is rendered several
//! times. The in-page script collects every element whose text is exactly
//! the day number; [`pick_day_cell`] chooses among them.

use serde::Deserialize;

use super::TargetDate;

/// Attribute the collector script stamps on each candidate.
pub(crate) const DAY_CELL_ATTR: &str = "data-e2e-day";

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A candidate day cell as reported by the collector script.
#[derive(Debug, Clone, Deserialize)]
pub struct DateCell {
    /// Position in document order, also the value of the stamped attribute.
    pub index: usize,
    pub tag: String,
    #[serde(default)]
    pub classes: String,
    pub visible: bool,
    pub disabled: bool,
    /// Button-like element or pointer cursor.
    pub clickable: bool,
    /// Label of the enclosing month grid, if any.
    #[serde(default)]
    pub month_context: Option<String>,
}

impl DateCell {
    /// CSS selector for this candidate (valid until the next collection).
    pub fn selector(&self) -> String {
        format!("[{}='{}']", DAY_CELL_ATTR, self.index)
    }

    fn is_outside_month(&self) -> bool {
        let classes = self.classes.to_lowercase();
        classes.contains("outside") || classes.contains("other-month")
    }

    fn has_day_class(&self) -> bool {
        self.classes.to_lowercase().contains("day")
    }
}

#[derive(Debug, PartialEq, Eq)]
enum MonthRelation {
    Same,
    Other,
    Unknown,
}

fn month_relation(context: Option<&str>, target: &TargetDate) -> MonthRelation {
    let Some(context) = context else {
        return MonthRelation::Unknown;
    };
    let context = context.to_lowercase();
    let wanted = target.month_name().to_lowercase();
    if context.contains(&wanted) {
        return MonthRelation::Same;
    }
    if MONTHS.iter().any(|m| context.contains(m)) {
        MonthRelation::Other
    } else {
        MonthRelation::Unknown
    }
}

fn score(cell: &DateCell, target: &TargetDate) -> u32 {
    let mut score = 0;
    if month_relation(cell.month_context.as_deref(), target) == MonthRelation::Same {
        score += 4;
    }
    if cell.has_day_class() {
        score += 2;
    }
    if cell.clickable {
        score += 1;
    }
    score
}

/// Choose the cell to click among duplicate text matches.
///
/// Hidden, disabled and outside-month cells are dropped, as are cells whose
/// grid is labelled with a different month. The rest are ranked by month
/// match, day-like class and clickability; ties go to document order.
pub fn pick_day_cell<'c>(cells: &'c [DateCell], target: &TargetDate) -> Option<&'c DateCell> {
    cells
        .iter()
        .filter(|c| c.visible && !c.disabled && !c.is_outside_month())
        .filter(|c| month_relation(c.month_context.as_deref(), target) != MonthRelation::Other)
        .min_by_key(|c| std::cmp::Reverse(score(c, target)))
}

/// Collects exact-text candidates, stamping each with `DAY_CELL_ATTR`.
/// Called as `(roots, day, attr)`; returns a JSON array of [`DateCell`].
pub(crate) const COLLECT_DAY_CELLS_JS: &str = r#"
((roots, day, attr) => {
    document.querySelectorAll('[' + attr + ']').forEach(el => el.removeAttribute(attr));

    let scopes = [];
    for (const sel of roots) {
        try { scopes = Array.from(document.querySelectorAll(sel)); } catch (e) { scopes = []; }
        if (scopes.length) break;
    }
    if (!scopes.length) scopes = [document.body];

    const visible = el => {
        const r = el.getBoundingClientRect();
        if (r.width < 2 || r.height < 2) return false;
        const s = getComputedStyle(el);
        return s.display !== 'none' && s.visibility !== 'hidden' && parseFloat(s.opacity) >= 0.1;
    };

    const seen = new Set();
    const cells = [];
    for (const scope of scopes) {
        for (const el of scope.querySelectorAll('*')) {
            if (seen.has(el)) continue;
            seen.add(el);
            if ((el.innerText || el.textContent || '').trim() !== day) continue;

            const cls = el.getAttribute('class') || '';
            const clickable = el.matches('button, a, [role="button"], [role="gridcell"], [onclick], [tabindex]')
                || getComputedStyle(el).cursor === 'pointer';
            const disabled = el.matches(':disabled')
                || !!el.closest('[aria-disabled="true"], [disabled]')
                || /disabled/i.test(cls);

            let month = null;
            const grid = el.parentElement
                && el.parentElement.closest('[data-month], [class*="Month"], [data-test*="Month"], [role="grid"][aria-label]');
            if (grid) {
                month = grid.getAttribute('data-month')
                    || grid.getAttribute('aria-label')
                    || (grid.innerText || '').trim().split('\n')[0].slice(0, 40);
            }

            const index = cells.length;
            el.setAttribute(attr, String(index));
            cells.push({
                index,
                tag: el.tagName.toLowerCase(),
                classes: cls,
                visible: visible(el),
                disabled,
                clickable,
                month_context: month,
            });
        }
    }
    return JSON.stringify(cells);
})
"#;
