use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How loudly a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// NoticeKind – every non-fatal condition the pipeline can report
// ---------------------------------------------------------------------------

/// A non-fatal condition raised while resolving, fetching, building or
/// extracting. None of these abort processing of unaffected entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    /// A requested country has no rows for the indicator.
    MissingCountry { indicator: String, country: String },
    /// A requested indicator is absent from the fetched table.
    MissingIndicator { indicator: String },
    /// The observation source failed; cached fetch state was reset.
    FetchFailed { countries: Vec<String>, reason: String },
    /// The panel holds no valid value at all.
    NoUsableData { indicator: String },
    /// Extremes had to fall back past complete rows.
    PartialCoverage { indicator: String, strategy: String },
    /// A country is missing from the first or last cross-section.
    AbsentFromCrossSection { indicator: String, country: String },
    /// A non-positive value cannot take part in a proportion view.
    NonPositive {
        indicator: String,
        country: String,
        value: f64,
    },
}

impl NoticeKind {
    pub fn severity(&self) -> Severity {
        match self {
            NoticeKind::FetchFailed { .. } => Severity::Error,
            NoticeKind::PartialCoverage { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::MissingCountry { indicator, country } => {
                write!(f, "No data for {indicator} and country {country} fetched")
            }
            NoticeKind::MissingIndicator { indicator } => {
                write!(f, "No data for indicator {indicator}")
            }
            NoticeKind::FetchFailed { countries, reason } => write!(
                f,
                "Error fetching data for [{}]: {reason}",
                countries.join(", ")
            ),
            NoticeKind::NoUsableData { indicator } => {
                write!(f, "No usable data for indicator {indicator}")
            }
            NoticeKind::PartialCoverage { indicator, strategy } => {
                write!(f, "Incomplete data for {indicator}; extremes use {strategy}")
            }
            NoticeKind::AbsentFromCrossSection { indicator, country } => {
                write!(f, "{indicator}: country {country} is not in last or first period")
            }
            NoticeKind::NonPositive {
                indicator,
                country,
                value,
            } => write!(
                f,
                "{indicator}: non-positive value {value} for country {country} could not be displayed in pie chart"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Notice / Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: NoticeKind,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.kind)
    }
}

/// Ordered collector of notices for one analysis run.
///
/// Every notice is also forwarded to the `log` facade at the matching level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NoticeKind) {
        let severity = kind.severity();
        match severity {
            Severity::Info => log::info!("{kind}"),
            Severity::Warning => log::warn!("{kind}"),
            Severity::Error => log::error!("{kind}"),
        }
        self.items.push(Notice { severity, kind });
    }

    pub fn extend(&mut self, other: Notices) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    /// Notices to present. With warnings switched off only errors remain.
    pub fn visible(&self, show_warnings: bool) -> impl Iterator<Item = &Notice> {
        self.items
            .iter()
            .filter(move |n| show_warnings || n.severity == Severity::Error)
    }

    /// Number of notices whose kind satisfies `pred`.
    pub fn count(&self, pred: impl Fn(&NoticeKind) -> bool) -> usize {
        self.items.iter().filter(|n| pred(&n.kind)).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_kind() {
        let mut notices = Notices::new();
        notices.push(NoticeKind::NoUsableData {
            indicator: "NY.GDP.MKTP.CD".into(),
        });
        notices.push(NoticeKind::FetchFailed {
            countries: vec!["DEU".into()],
            reason: "timeout".into(),
        });
        let severities: Vec<Severity> = notices.iter().map(|n| n.severity).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
    }

    #[test]
    fn hidden_warnings_keep_errors_visible() {
        let mut notices = Notices::new();
        notices.push(NoticeKind::MissingIndicator {
            indicator: "SP.POP.TOTL".into(),
        });
        notices.push(NoticeKind::FetchFailed {
            countries: vec![],
            reason: "offline".into(),
        });
        assert_eq!(notices.visible(true).count(), 2);
        let hidden: Vec<&Notice> = notices.visible(false).collect();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].severity, Severity::Error);
    }

    #[test]
    fn display_names_indicator_and_country() {
        let kind = NoticeKind::NonPositive {
            indicator: "BN.CAB.XOKA.GD.ZS".into(),
            country: "BRA".into(),
            value: -3.0,
        };
        let text = kind.to_string();
        assert!(text.contains("BRA"));
        assert!(text.contains("BN.CAB.XOKA.GD.ZS"));
    }
}
