use crate::tags::TagExpr;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Named scenario selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suite {
    #[default]
    All,
    Smoke,
    BasicSearch,
    /// The one-way basic search scenario.
    T1,
}

impl Suite {
    pub const ALL: [Suite; 4] = [Suite::All, Suite::Smoke, Suite::BasicSearch, Suite::T1];

    pub fn name(&self) -> &'static str {
        match self {
            Suite::All => "all",
            Suite::Smoke => "smoke",
            Suite::BasicSearch => "basic_search",
            Suite::T1 => "t1",
        }
    }

    /// Tag expression selecting this suite; `None` selects everything.
    pub fn expression(&self) -> Option<&'static str> {
        match self {
            Suite::All => None,
            Suite::Smoke => Some("smoke"),
            Suite::BasicSearch => Some("basic_search"),
            Suite::T1 => Some("basic_search and one_way"),
        }
    }

    /// The suite's filter combined with an extra `-m` expression.
    pub fn filter(&self, extra: Option<&str>) -> Result<Option<TagExpr>> {
        let suite = self.expression().map(TagExpr::parse).transpose()?;
        let extra = extra.map(TagExpr::parse).transpose()?;
        Ok(match (suite, extra) {
            (Some(a), Some(b)) => Some(a.and(b)),
            (a, b) => a.or(b),
        })
    }
}

impl FromStr for Suite {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Suite::ALL
            .into_iter()
            .find(|suite| suite.name() == normalized)
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown suite '{}', expected one of: all, smoke, basic_search, t1",
                    s
                ))
            })
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
