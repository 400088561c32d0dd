//! Age-band selectors.
//!
//! Overrides name the bands they touch either exactly (a label or a
//! comma-separated list) or by comparison against band ranges: `">35"`
//! selects every band lying entirely above age 35, `"<18"` every band
//! entirely below 18. `"all"`, or saying nothing, selects every band.
//! Selectors are resolved against the baseline's bands when a scenario is
//! planned, never at definition time.

use std::fmt;
use std::str::FromStr;

use natal_core::bands::{AgeBand, AgeBands};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScenarioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AgeSelector {
    /// Every band.
    All,
    /// Bands by exact label.
    Bands(Vec<String>),
    /// Bands whose whole age range satisfies the comparison.
    Cmp { op: CmpOp, age: u32 },
}

impl Default for AgeSelector {
    fn default() -> Self {
        AgeSelector::All
    }
}

impl AgeSelector {
    pub fn parse(text: &str) -> Result<Self> {
        let t = text.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("all") {
            return Ok(AgeSelector::All);
        }
        // A comma always means a list of labels; labels themselves may
        // start with a comparison character ("<18" names a band in the
        // default baseline).
        if t.contains(',') {
            let mut labels = Vec::new();
            for part in t.split(',') {
                let label = part.trim();
                if label.is_empty() {
                    return Err(ScenarioError::Configuration(format!(
                        "empty band label in {text:?}"
                    )));
                }
                labels.push(label.to_string());
            }
            return Ok(AgeSelector::Bands(labels));
        }
        if let Some(rest) = t.strip_prefix('>').or_else(|| t.strip_prefix('<')) {
            let gt = t.starts_with('>');
            let (op, digits) = match rest.strip_prefix('=') {
                Some(digits) if gt => (CmpOp::Ge, digits),
                Some(digits) => (CmpOp::Le, digits),
                None if gt => (CmpOp::Gt, rest),
                None => (CmpOp::Lt, rest),
            };
            let age = digits.trim().parse::<u32>().map_err(|_| {
                ScenarioError::Configuration(format!("unparsable age expression {text:?}"))
            })?;
            return Ok(AgeSelector::Cmp { op, age });
        }
        Ok(AgeSelector::Bands(vec![t.to_string()]))
    }

    /// The band labels this selector picks, in band-table order, each at
    /// most once. Unknown labels and selections matching nothing are
    /// errors.
    pub fn resolve(&self, bands: &AgeBands) -> Result<Vec<String>> {
        let selected: Vec<String> = match self {
            AgeSelector::All => bands.labels().map(str::to_string).collect(),
            AgeSelector::Bands(labels) => {
                for label in labels {
                    bands.require(label)?;
                }
                bands
                    .labels()
                    .filter(|l| labels.iter().any(|x| x == l))
                    .map(str::to_string)
                    .collect()
            }
            AgeSelector::Cmp { op, age } => bands
                .iter()
                .filter(|b| matches(*op, *age, b))
                .map(|b| b.label.clone())
                .collect(),
        };
        if selected.is_empty() {
            return Err(ScenarioError::EmptySelection(self.to_string()));
        }
        Ok(selected)
    }
}

fn matches(op: CmpOp, age: u32, band: &AgeBand) -> bool {
    match op {
        CmpOp::Gt => band.min_age > age,
        CmpOp::Ge => band.min_age >= age,
        CmpOp::Lt => band.max_age < age,
        CmpOp::Le => band.max_age <= age,
    }
}

impl fmt::Display for AgeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeSelector::All => write!(f, "all"),
            AgeSelector::Bands(labels) => write!(f, "{}", labels.join(",")),
            AgeSelector::Cmp { op, age } => write!(f, "{op}{age}"),
        }
    }
}

impl FromStr for AgeSelector {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AgeSelector {
    type Error = ScenarioError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<AgeSelector> for String {
    fn from(selector: AgeSelector) -> String {
        selector.to_string()
    }
}
