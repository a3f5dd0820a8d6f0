//! Selector fallback chains for kiwi.com, ordered most to least specific.
//!
//! The site ships no stable test contract; these were collected with
//! `flight-probe` and are tried in order until one becomes visible.

pub const HOME_URL: &str = "https://www.kiwi.com/en/";

pub const COOKIE_ACCEPT: &[&str] = &["[data-test='CookiesPopup-Accept']", "#cookies-accept"];
pub const COOKIE_ACCEPT_TEXTS: &[&str] = &["Accept all", "Accept", "OK"];

pub const TRIP_MODE_RETURN_ACTIVE: &str = "[data-test='SearchFormModesPicker-active-return']";
pub const TRIP_MODE_ONE_WAY_ACTIVE: &str = "[data-test='SearchFormModesPicker-active-oneWay']";
pub const TRIP_OPTION_ONE_WAY: &str = "[data-test='ModePopupOption-oneWay']";
pub const TRIP_OPTION_RETURN: &str = "[data-test='ModePopupOption-return']";

pub const ORIGIN_INPUT: &[&str] = &[
    "[data-test='PlacePickerInput-origin'] [data-test='SearchField-input']",
    "[data-test='SearchField-input'][data-test*='origin']",
    "input[placeholder*='From']",
    "[data-test='SearchField-input']:first-of-type",
];
pub const ORIGIN_CLEAR: &str =
    "[data-test='PlacePickerInput-origin'] [data-test='PlacePickerInputPlace-close']";

pub const DESTINATION_INPUT: &[&str] = &[
    "[data-test='PlacePickerInput-destination'] [data-test='SearchField-input']",
    "[data-test='SearchField-input'][data-test*='destination']",
    "input[placeholder*='To']",
];
pub const DESTINATION_CLEAR: &str =
    "[data-test='PlacePickerInput-destination'] [data-test='PlacePickerInputPlace-close']";

/// Suggestion rows in the place picker dropdown.
pub const PLACE_SUGGESTIONS: &str = "[data-test*='PlacePickerRow'], [role='option']";

pub const DATE_INPUT: &[&str] = &[
    "[data-test='SearchDateInput']",
    "[data-test='SearchFieldDateInput']",
    "div[data-test*='Date']",
];
pub const DATE_DONE_BUTTON: &str = "[data-test='SearchFormDoneButton']";

/// Containers that scope the day-text search when present.
pub const CALENDAR_ROOTS: &[&str] = &[
    "[data-test*='Calendar']",
    "[data-test*='DatePicker']",
    "[class*='Calendar']",
    "[class*='DatePicker']",
    "[role='grid']",
];

pub const ACCOMMODATION_CHECKBOX: &[&str] = &[
    "[data-test='bookingCheckbox']",
    "[data-test='accommodationCheckbox']",
    "[data-test='BookingCheckbox']",
    "input[type='checkbox'][name*='booking']",
    "input[type='checkbox'][name*='accommodation']",
];

pub const SEARCH_BUTTON: &[&str] = &[
    "[data-test='LandingSearchButton']",
    "[data-test='SearchButton']",
    "button[type='submit']",
];
pub const SEARCH_BUTTON_TEXTS: &[&str] = &["Search flights", "Search"];

/// URL fragments that identify the results page.
pub const RESULTS_URL_KEYWORDS: &[&str] = &["search", "results", "booking"];
