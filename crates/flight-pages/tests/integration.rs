//! Integration tests for the page objects against a local search-form fixture.
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test -p flight-pages --test integration -- --ignored

use chrono::NaiveDate;
use flight_pages::{
    BasePage, Browser, DatePicker, DateStrategy, ElementState, Error, HomePage, LoadState,
    TargetDate, TripType,
};

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

fn fixture_url(mode: &str, date: &str) -> String {
    fixture_url_with(mode, date, "")
}

/// Fixture URL with extra query parameters, e.g. `&cookies=0`.
fn fixture_url_with(mode: &str, date: &str, extra: &str) -> String {
    format!(
        "file://{}/tests/fixtures/home.html?mode={}&date={}&today={}{}",
        env!("CARGO_MANIFEST_DIR"),
        mode,
        date,
        today(),
        extra
    )
}

fn controls_url() -> String {
    format!(
        "file://{}/tests/fixtures/controls.html",
        env!("CARGO_MANIFEST_DIR")
    )
}

fn target() -> TargetDate {
    TargetDate::new(NaiveDate::from_ymd_opt(2026, 10, 29).unwrap())
}

/// The fixture's notion of today: 19 days before the target.
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 10).unwrap()
}

async fn selected_date(page: &eoka::Page) -> String {
    page.evaluate("document.getElementById('state').dataset.date")
        .await
        .expect("Failed to read state")
}

/// Open the fixture calendar and run the resolver against it.
async fn pick_in_mode(mode: &str) -> (Result<DateStrategy, Error>, String) {
    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page(&fixture_url(mode, &target().iso()))
        .await
        .expect("Failed to create page");

    let base = BasePage::new(&page).with_timeout(5_000);
    base.click("[data-test='SearchDateInput']", None)
        .await
        .expect("Failed to open calendar");

    let result = DatePicker::new(base)
        .with_attempt_timeout(1_000)
        .with_today(today())
        .select(&target())
        .await;
    let selected = selected_date(&page).await;

    browser.close().await.expect("Failed to close browser");
    (result, selected)
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_date_by_data_attribute() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (result, selected) = pick_in_mode("data").await;
    assert_eq!(result.expect("date not selected"), DateStrategy::DataAttribute);
    assert_eq!(selected, "2026-10-29");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_date_by_aria_label() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (result, selected) = pick_in_mode("aria").await;
    assert_eq!(result.expect("date not selected"), DateStrategy::AriaLabel);
    assert_eq!(selected, "2026-10-29");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_date_by_text_skips_padding_and_next_month() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // "29" is rendered four times: September padding, October, October
    // padding inside the November grid, and November itself.
    let (result, selected) = pick_in_mode("text").await;
    assert_eq!(result.expect("date not selected"), DateStrategy::DayText);
    assert_eq!(selected, "2026-10-29");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_date_by_keyboard_when_cells_have_no_text() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // Day numbers are CSS-drawn; the picker focuses today's cell on open.
    let (result, selected) = pick_in_mode("keys").await;
    assert_eq!(result.expect("date not selected"), DateStrategy::Keyboard);
    assert_eq!(selected, "2026-10-29");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_disabled_date_exhausts_chain() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let target = TargetDate::new(NaiveDate::from_ymd_opt(2026, 10, 2).unwrap());
    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page(&fixture_url("text", &target.iso()))
        .await
        .expect("Failed to create page");

    let base = BasePage::new(&page);
    base.click("[data-test='SearchDateInput']", None)
        .await
        .expect("Failed to open calendar");

    // Far enough back that keyboard navigation is out of range too.
    let result = DatePicker::new(base)
        .with_attempt_timeout(500)
        .with_today(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap())
        .select(&target)
        .await;

    match result {
        Err(Error::DateNotSelectable { date, attempts }) => {
            assert_eq!(date, "2026-10-02");
            assert_eq!(attempts, "data-attribute, aria-label, day-text, keyboard");
        }
        other => panic!("expected DateNotSelectable, got {:?}", other),
    }
    assert_eq!(selected_date(&page).await, "");

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_one_way_search_flow() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    let home = HomePage::new(&page).with_url(fixture_url("text", &target().iso()));
    home.open().await.expect("Failed to open homepage");
    home.select_trip_type(TripType::OneWay)
        .await
        .expect("Failed to select trip type");
    home.set_departure_airport("RTM")
        .await
        .expect("Failed to set origin");
    home.set_arrival_airport("MAD")
        .await
        .expect("Failed to set destination");
    let strategy = home
        .select_departure_date(&target())
        .await
        .expect("Failed to set date");
    assert_eq!(strategy, DateStrategy::DayText);
    home.uncheck_accommodation_option("Check accommodation with booking.com")
        .await
        .expect("Failed to uncheck accommodation");
    assert!(!home
        .base()
        .is_checked("[data-test='bookingCheckbox']")
        .await
        .expect("checkbox missing"));
    home.click_search_button()
        .await
        .expect("Failed to click search");
    assert!(home
        .verify_redirected_to_results()
        .await
        .expect("Failed to read URL"));

    let state: String = page
        .evaluate(
            "(() => { const s = document.getElementById('state').dataset; \
             return [s.mode, s.origin, s.destination, s.date].join('|'); })()",
        )
        .await
        .expect("Failed to read state");
    assert_eq!(state, "oneWay|RTM|MAD|2026-10-29");

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_missing_search_button_is_an_error() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("data:text/html,<p>No form here</p>")
        .await
        .expect("Failed to create page");

    let home = HomePage::new(&page);
    let err = home.click_search_button().await.unwrap_err();
    assert!(matches!(err, Error::ElementNotFound(_)), "got {:?}", err);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_missing_cookie_banner_leaves_checkbox_checked() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    // "OK" is a substring of the booking.com label next to the checkbox.
    let home =
        HomePage::new(&page).with_url(fixture_url_with("text", &target().iso(), "&cookies=0"));
    home.open().await.expect("Failed to open homepage");

    let banner: bool = page
        .evaluate("!!document.getElementById('cookies')")
        .await
        .expect("Failed to read banner");
    assert!(!banner);
    assert!(home
        .base()
        .is_checked("[data-test='bookingCheckbox']")
        .await
        .expect("checkbox missing"));

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_search_button_found_by_exact_text() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");

    // A "Search history" button comes first and the real one has no data-test.
    let home =
        HomePage::new(&page).with_url(fixture_url_with("text", &target().iso(), "&search=text"));
    home.open().await.expect("Failed to open homepage");
    home.click_search_button()
        .await
        .expect("Failed to click search");

    let url = page.url().await.expect("Failed to read URL");
    assert!(url.ends_with("#/search/results"), "landed on {}", url);
    assert!(home
        .verify_redirected_to_results()
        .await
        .expect("Failed to read URL"));

    browser.close().await.expect("Failed to close browser");
}

/// Launch a browser on the controls fixture.
async fn open_controls() -> (Browser, eoka::Page) {
    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page(&controls_url())
        .await
        .expect("Failed to create page");
    (browser, page)
}

async fn state(page: &eoka::Page, key: &str) -> String {
    page.evaluate(&format!("document.getElementById('state').dataset.{}", key))
        .await
        .expect("Failed to read state")
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_wait_for_element_hidden_and_detached() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = open_controls().await;
    let base = BasePage::new(&page).with_timeout(3_000);

    base.wait_for_element("#toast", ElementState::Visible, None)
        .await
        .expect("toast should be visible");
    let err = base
        .wait_for_element("#toast", ElementState::Hidden, Some(300))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);

    // Hidden by CSS but still attached.
    base.click("#dismiss", None).await.expect("Failed to dismiss");
    base.wait_for_element("#toast", ElementState::Hidden, None)
        .await
        .expect("toast should hide");
    base.wait_for_element("#toast", ElementState::Attached, None)
        .await
        .expect("toast should stay attached");

    base.click("#finish", None).await.expect("Failed to finish");
    base.wait_for_element("#spinner", ElementState::Detached, None)
        .await
        .expect("spinner should be removed");
    let err = base
        .wait_for_element("#greeting", ElementState::Detached, Some(300))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_select_option_by_value_then_text() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = open_controls().await;
    let base = BasePage::new(&page).with_timeout(3_000);

    base.select_option("#cabin", "business")
        .await
        .expect("Failed to select by value");
    assert_eq!(state(&page, "cabin").await, "business");

    base.select_option("#cabin", "Economy")
        .await
        .expect("Failed to select by text");
    assert_eq!(state(&page, "cabin").await, "economy");

    let err = base.select_option("#cabin", "First").await.unwrap_err();
    assert!(matches!(err, Error::ActionFailed(_)), "got {:?}", err);

    let err = base.select_option("#nope", "economy").await;
    assert!(matches!(err, Err(Error::ElementNotFound(_))));

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_hover_and_get_text() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = open_controls().await;
    let base = BasePage::new(&page).with_timeout(3_000);

    assert!(!base.is_visible("#menu", Some(200)).await);
    base.hover("#menu-trigger").await.expect("Failed to hover");
    assert_eq!(
        base.get_text("#menu", None).await.expect("menu text"),
        "Manage booking"
    );
    assert_eq!(
        base.get_text("#greeting", None).await.expect("greeting text"),
        "Hello, traveller"
    );

    let err = base.hover("#nope").await.unwrap_err();
    assert!(matches!(err, Error::ElementNotFound(_)), "got {:?}", err);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_wait_for_url_after_delayed_navigation() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = open_controls().await;
    let base = BasePage::new(&page).with_timeout(3_000);

    let err = base.wait_for_url("#/search", Some(200)).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);

    base.click("#go", None).await.expect("Failed to click");
    base.wait_for_url("#/search/results", None)
        .await
        .expect("URL should change");

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_check_checkbox_and_press_key() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = open_controls().await;
    let base = BasePage::new(&page).with_timeout(3_000);

    base.check_checkbox("#terms").await.expect("Failed to check");
    assert!(base.is_checked("#terms").await.unwrap());
    // Already checked: no second click.
    base.check_checkbox("#terms").await.expect("Failed to re-check");
    assert!(base.is_checked("#terms").await.unwrap());

    base.press_key("#keys", "Escape")
        .await
        .expect("Failed to press key");
    assert_eq!(state(&page, "key").await, "Escape");

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_load_states() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, page) = open_controls().await;
    let base = BasePage::new(&page).with_timeout(5_000);

    base.wait_for_load_state(LoadState::Load)
        .await
        .expect("page should finish loading");
    base.wait_for_load_state(LoadState::NetworkIdle)
        .await
        .expect("static page should go idle");

    browser.close().await.expect("Failed to close browser");
}
