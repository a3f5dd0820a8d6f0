//! Step definitions: natural-language patterns bound to page actions.
//!
//! Patterns use `{name}` for free text and `{name:d}` for integers. A
//! literal `(s)` after a word makes the plural optional, so
//! `week(s)` accepts "week", "weeks" and "week(s)".

use crate::{Error, Result};
use flight_pages::{TargetDate, TripType};
use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;

/// Gherkin step keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Given,
    When,
    Then,
    And,
    But,
}

impl Keyword {
    /// `And`/`But` continue the previous step's keyword.
    pub fn is_conjunction(&self) -> bool {
        matches!(self, Keyword::And | Keyword::But)
    }
}

impl FromStr for Keyword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "given" => Ok(Keyword::Given),
            "when" => Ok(Keyword::When),
            "then" => Ok(Keyword::Then),
            "and" => Ok(Keyword::And),
            "but" => Ok(Keyword::But),
            _ => Err(Error::Config(format!("unknown step keyword '{}'", s))),
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Keyword::Given => "Given",
            Keyword::When => "When",
            Keyword::Then => "Then",
            Keyword::And => "And",
            Keyword::But => "But",
        };
        f.write_str(s)
    }
}

/// A step line as written in a feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepText {
    pub keyword: Keyword,
    pub text: String,
}

impl StepText {
    pub fn new(keyword: Keyword, text: impl Into<String>) -> Self {
        Self {
            keyword,
            text: text.into(),
        }
    }
}

impl fmt::Display for StepText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword, self.text)
    }
}

/// Page action a step resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    NavigateHome { url: String },
    SelectTripType(TripType),
    SetDepartureAirport(String),
    SetArrivalAirport(String),
    SetDepartureDate { weeks: u32 },
    UncheckOption(String),
    ClickSearch,
    VerifyResults,
}

/// A step line matched to its action, with `And`/`But` resolved.
#[derive(Debug, Clone)]
pub struct BoundStep {
    pub keyword: Keyword,
    pub source: StepText,
    pub step: Step,
}

impl fmt::Display for BoundStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

type Builder = fn(&Captures<'_>) -> Result<Step>;

struct StepDef {
    keyword: Keyword,
    pattern: &'static str,
    regex: Regex,
    build: Builder,
}

/// Compile a step pattern into an anchored regex.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut re = String::from("^");
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        push_literal(&mut re, &rest[..open]);
        let close = rest[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| Error::Config(format!("unclosed '{{' in pattern '{}'", pattern)))?;
        let inner = &rest[open + 1..close];
        let (name, kind) = inner.split_once(':').unwrap_or((inner, ""));
        match kind {
            "" => re.push_str(&format!("(?P<{}>.+?)", name)),
            "d" => re.push_str(&format!("(?P<{}>\\d+)", name)),
            other => {
                return Err(Error::Config(format!(
                    "unknown placeholder type '{}' in pattern '{}'",
                    other, pattern
                )))
            }
        }
        rest = &rest[close + 1..];
    }
    push_literal(&mut re, rest);
    re.push('$');

    Regex::new(&re).map_err(|e| Error::Config(format!("bad step pattern '{}': {}", pattern, e)))
}

fn push_literal(re: &mut String, literal: &str) {
    let mut parts = literal.split("(s)").peekable();
    while let Some(part) = parts.next() {
        re.push_str(&regex::escape(part));
        if parts.peek().is_some() {
            re.push_str(r"(?:s|\(s\))?");
        }
    }
}

fn navigate_home(c: &Captures<'_>) -> Result<Step> {
    Ok(Step::NavigateHome {
        url: c["url"].trim().to_string(),
    })
}

fn one_way(_: &Captures<'_>) -> Result<Step> {
    Ok(Step::SelectTripType(TripType::OneWay))
}

fn return_trip(_: &Captures<'_>) -> Result<Step> {
    Ok(Step::SelectTripType(TripType::Return))
}

fn departure_airport(c: &Captures<'_>) -> Result<Step> {
    Ok(Step::SetDepartureAirport(c["airport_code"].trim().to_string()))
}

fn arrival_airport(c: &Captures<'_>) -> Result<Step> {
    Ok(Step::SetArrivalAirport(c["airport_code"].trim().to_string()))
}

fn departure_date(c: &Captures<'_>) -> Result<Step> {
    let weeks = c["weeks"]
        .parse()
        .map_err(|_| Error::Config(format!("week count out of range: {}", &c["weeks"])))?;
    TargetDate::weeks_from_now(weeks)
        .map_err(|e| Error::Config(format!("departure date {} week(s) ahead: {}", weeks, e)))?;
    Ok(Step::SetDepartureDate { weeks })
}

fn uncheck_option(c: &Captures<'_>) -> Result<Step> {
    Ok(Step::UncheckOption(c["option"].to_string()))
}

fn click_search(_: &Captures<'_>) -> Result<Step> {
    Ok(Step::ClickSearch)
}

fn verify_results(_: &Captures<'_>) -> Result<Step> {
    Ok(Step::VerifyResults)
}

const BUILTIN: &[(Keyword, &str, Builder)] = &[
    (
        Keyword::Given,
        "As an not logged user navigate to homepage {url}",
        navigate_home,
    ),
    (Keyword::When, "I select one-way trip type", one_way),
    (Keyword::When, "I select return trip type", return_trip),
    (
        Keyword::When,
        "Set as departure airport {airport_code}",
        departure_airport,
    ),
    (
        Keyword::When,
        "Set the arrival Airport {airport_code}",
        arrival_airport,
    ),
    (
        Keyword::When,
        "Set the departure time {weeks:d} week(s) in the future starting current date",
        departure_date,
    ),
    (Keyword::When, "Uncheck the \"{option}\" option", uncheck_option),
    (Keyword::When, "Click the search button", click_search),
    (
        Keyword::Then,
        "I am redirected to search results page",
        verify_results,
    ),
];

/// The step table.
pub struct StepRegistry {
    defs: Vec<StepDef>,
}

impl StepRegistry {
    pub fn new() -> Result<Self> {
        let defs = BUILTIN
            .iter()
            .map(|&(keyword, pattern, build)| {
                Ok(StepDef {
                    keyword,
                    pattern,
                    regex: compile_pattern(pattern)?,
                    build,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { defs })
    }

    /// `(keyword, pattern)` for every definition.
    pub fn patterns(&self) -> impl Iterator<Item = (Keyword, &'static str)> + '_ {
        self.defs.iter().map(|d| (d.keyword, d.pattern))
    }

    /// Resolve step text under a concrete (non-conjunction) keyword.
    pub fn find(&self, keyword: Keyword, text: &str) -> Result<Step> {
        let text = text.trim();
        for def in self.defs.iter().filter(|d| d.keyword == keyword) {
            if let Some(caps) = def.regex.captures(text) {
                return (def.build)(&caps);
            }
        }
        if let Some(def) = self.defs.iter().find(|d| d.regex.is_match(text)) {
            return Err(Error::UndefinedStep(format!(
                "'{} {}' is defined as a {} step",
                keyword, text, def.keyword
            )));
        }
        Err(Error::UndefinedStep(format!("{} {}", keyword, text)))
    }

    /// Bind a scenario's steps in order.
    pub fn bind(&self, steps: &[StepText]) -> Result<Vec<BoundStep>> {
        let mut current: Option<Keyword> = None;
        let mut bound = Vec::with_capacity(steps.len());
        for line in steps {
            let keyword = if line.keyword.is_conjunction() {
                current.ok_or_else(|| {
                    Error::Config(format!("'{}' has no preceding step to continue", line))
                })?
            } else {
                line.keyword
            };
            let step = self.find(keyword, &line.text)?;
            current = Some(keyword);
            bound.push(BoundStep {
                keyword,
                source: line.clone(),
                step,
            });
        }
        Ok(bound)
    }
}
