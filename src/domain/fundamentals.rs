//! Quarterly earnings and institutional ownership for growth screens.

use std::collections::BTreeSet;

/// Large asset managers counted as reputable holders. Matched as a
/// case-insensitive substring of the holder name.
pub const REPUTABLE_INSTITUTIONS: &[&str] = &[
    "Vanguard",
    "Blackrock",
    "State Street",
    "Fidelity",
    "T. Rowe",
    "Invesco",
    "Morgan Stanley",
    "JPMorgan",
    "Bank of America",
    "Wellington",
    "Geode",
    "Northern Trust",
    "Goldman Sachs",
    "UBS",
    "Franklin",
    "Charles Schwab",
    "Capital Group",
    "Dodge & Cox",
    "Massachusetts Financial",
    "FMR",
    "FIL Ltd",
    "Ameriprise",
    "AllianceBernstein",
    "Fundsmith",
    "Norges Bank",
    "Cohen & Steers",
    "Parnassus",
    "Susquehanna",
    "Victory Capital",
    "APG Asset Management",
    "Hotchkis & Wiley",
    "Polen Capital",
    "Kayne Anderson",
    "Renaissance Technologies",
    "State Farm",
    "First Eagle",
    "Boston Partners",
    "Artisan Partners",
    "Brown Advisory",
    "Harris Associates",
    "Primecap",
    "Amundi",
    "Royal Bank of Canada",
    "Bank of New York Mellon",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Holder {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fundamentals {
    pub symbol: String,
    /// Quarterly net income, most recent quarter first.
    pub net_income: Vec<f64>,
    pub holders: Vec<Holder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionalSummary {
    pub total_value: f64,
    /// Distinct reputable institutions found among the holders, sorted.
    pub reputable: Vec<String>,
}

impl InstitutionalSummary {
    pub fn reputable_count(&self) -> usize {
        self.reputable.len()
    }
}

fn growth_pct(latest: f64, prior: f64) -> Option<f64> {
    if prior == 0.0 {
        None
    } else {
        Some((latest - prior) / prior.abs() * 100.0)
    }
}

impl Fundamentals {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Latest quarter vs. the one before, in percent.
    pub fn quarterly_growth(&self) -> Option<f64> {
        match self.net_income.as_slice() {
            [latest, prior, ..] => growth_pct(*latest, *prior),
            _ => None,
        }
    }

    /// Trailing four quarters vs. the four before them. With fewer than eight
    /// quarters the trailing sum is compared to the fifth quarter, or to the
    /// oldest one when only four exist.
    pub fn annual_growth(&self) -> Option<f64> {
        let ni = &self.net_income;
        if ni.len() < 4 {
            return None;
        }
        let latest_year: f64 = ni[..4].iter().sum();
        let prior = if ni.len() >= 8 {
            ni[4..8].iter().sum()
        } else if ni.len() > 4 {
            ni[4]
        } else {
            ni[ni.len() - 1]
        };
        growth_pct(latest_year, prior)
    }

    pub fn institutional_summary(&self) -> InstitutionalSummary {
        let total_value = self.holders.iter().map(|h| h.value).sum();
        let reputable: BTreeSet<&str> = self
            .holders
            .iter()
            .flat_map(|h| {
                let name = h.name.to_lowercase();
                REPUTABLE_INSTITUTIONS
                    .iter()
                    .copied()
                    .filter(move |rep| name.contains(&rep.to_lowercase()))
            })
            .collect();
        InstitutionalSummary {
            total_value,
            reputable: reputable.into_iter().map(String::from).collect(),
        }
    }
}
