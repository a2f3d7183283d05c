use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::change::{FieldDiff, Tracked};
use crate::domain::InstrumentType;
use crate::error::{Entity, ValidationError};
use crate::persistence::Record;
use crate::validation::{require, require_non_negative, Validate};

/// Field name under which the sector/industry-group conflict is reported.
pub const SECTOR_AND_IG_DEFINED: &str = "sectorAndIgDefined";

/// Universe a statistic is computed over.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum StatisticScope {
    #[default]
    All,
    Sector(i64),
    IndustryGroup(i64),
}

impl StatisticScope {
    /// Builds the scope from two independently optional references.
    pub fn from_references(
        sector_id: Option<i64>,
        industry_group_id: Option<i64>,
    ) -> Result<Self, ValidationError> {
        match (sector_id, industry_group_id) {
            (Some(_), Some(_)) => Err(ValidationError::mutually_exclusive(
                Entity::Statistic,
                SECTOR_AND_IG_DEFINED,
            )),
            (Some(id), None) => Ok(Self::Sector(id)),
            (None, Some(id)) => Ok(Self::IndustryGroup(id)),
            (None, None) => Ok(Self::All),
        }
    }

    pub const fn kind(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sector(_) => "sector",
            Self::IndustryGroup(_) => "industryGroup",
        }
    }

    pub const fn reference_id(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Sector(id) | Self::IndustryGroup(id) => Some(id),
        }
    }

    pub const fn sector_id(self) -> Option<i64> {
        match self {
            Self::Sector(id) => Some(id),
            _ => None,
        }
    }

    pub const fn industry_group_id(self) -> Option<i64> {
        match self {
            Self::IndustryGroup(id) => Some(id),
            _ => None,
        }
    }

    /// Inverse of [`StatisticScope::kind`] and [`StatisticScope::reference_id`].
    pub fn from_parts(kind: &str, reference_id: Option<i64>) -> Option<Self> {
        match (kind, reference_id) {
            ("all", None) => Some(Self::All),
            ("sector", Some(id)) => Some(Self::Sector(id)),
            ("industryGroup", Some(id)) => Some(Self::IndustryGroup(id)),
            _ => None,
        }
    }
}

impl Display for StatisticScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.reference_id() {
            Some(id) => write!(f, "{}:{id}", self.kind()),
            None => f.write_str(self.kind()),
        }
    }
}

/// Identity of a statistic row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticKey {
    pub date: Date,
    pub instrument_type: InstrumentType,
    pub scope: StatisticScope,
}

impl Display for StatisticKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.date, self.instrument_type, self.scope)
    }
}

/// Daily market-breadth counts for one instrument type and scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    pub date: Date,
    pub instrument_type: InstrumentType,
    #[serde(default)]
    pub scope: StatisticScope,
    pub number_advance: i64,
    pub number_decline: i64,
    pub number_above_sma50: i64,
    pub number_at_or_below_sma50: i64,
    pub number_above_sma200: i64,
    pub number_at_or_below_sma200: i64,
    /// Cumulative value maintained by the job that computes statistics.
    pub advance_decline_sum: i64,
}

/// Derived breadth values of a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadth {
    pub advance_decline_number: i64,
    pub percent_above_sma50: f64,
    pub percent_above_sma200: f64,
}

impl Statistic {
    pub fn new(date: Date, instrument_type: InstrumentType, scope: StatisticScope) -> Self {
        Self {
            date,
            instrument_type,
            scope,
            number_advance: 0,
            number_decline: 0,
            number_above_sma50: 0,
            number_at_or_below_sma50: 0,
            number_above_sma200: 0,
            number_at_or_below_sma200: 0,
            advance_decline_sum: 0,
        }
    }

    pub fn with_advances(mut self, advance: i64, decline: i64) -> Self {
        self.number_advance = advance;
        self.number_decline = decline;
        self
    }

    pub fn with_sma50(mut self, above: i64, at_or_below: i64) -> Self {
        self.number_above_sma50 = above;
        self.number_at_or_below_sma50 = at_or_below;
        self
    }

    pub fn with_sma200(mut self, above: i64, at_or_below: i64) -> Self {
        self.number_above_sma200 = above;
        self.number_at_or_below_sma200 = at_or_below;
        self
    }

    pub fn with_advance_decline_sum(mut self, sum: i64) -> Self {
        self.advance_decline_sum = sum;
        self
    }

    /// Calendar day of a timestamp, taken in UTC with the time of day dropped.
    pub fn date_of(value: OffsetDateTime) -> Date {
        value.to_offset(UtcOffset::UTC).date()
    }

    pub const fn key_parts(&self) -> StatisticKey {
        StatisticKey {
            date: self.date,
            instrument_type: self.instrument_type,
            scope: self.scope,
        }
    }

    pub const fn advance_decline_number(&self) -> i64 {
        self.number_advance.saturating_sub(self.number_decline)
    }

    /// Percentage of instruments above their 50-day average, `0.0` when none were counted.
    pub fn percent_above_sma50(&self) -> f64 {
        percentage(self.number_above_sma50, self.number_at_or_below_sma50)
    }

    /// Percentage of instruments above their 200-day average, `0.0` when none were counted.
    pub fn percent_above_sma200(&self) -> f64 {
        percentage(self.number_above_sma200, self.number_at_or_below_sma200)
    }

    pub fn breadth(&self) -> Breadth {
        Breadth {
            advance_decline_number: self.advance_decline_number(),
            percent_above_sma50: self.percent_above_sma50(),
            percent_above_sma200: self.percent_above_sma200(),
        }
    }

    fn counts(&self) -> [(&'static str, i64); 6] {
        [
            ("numberAdvance", self.number_advance),
            ("numberDecline", self.number_decline),
            ("numberAboveSma50", self.number_above_sma50),
            ("numberAtOrBelowSma50", self.number_at_or_below_sma50),
            ("numberAboveSma200", self.number_above_sma200),
            ("numberAtOrBelowSma200", self.number_at_or_below_sma200),
        ]
    }
}

fn percentage(above: i64, at_or_below: i64) -> f64 {
    let total = above.saturating_add(at_or_below);
    if total <= 0 {
        return 0.0;
    }
    100.0 * above as f64 / total as f64
}

fn validate_counts(counts: [(&'static str, i64); 6]) -> Result<(), ValidationError> {
    for (field, value) in counts {
        require_non_negative(Entity::Statistic, field, value)?;
    }
    Ok(())
}

impl Validate for Statistic {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_counts(self.counts())
    }
}

impl Tracked for Statistic {
    type Key = StatisticKey;

    const ENTITY: Entity = Entity::Statistic;

    fn key(&self) -> Option<StatisticKey> {
        Some(self.key_parts())
    }

    fn changed_fields(&self, stored: &Self) -> Vec<&'static str> {
        FieldDiff::new()
            .field("date", &self.date, &stored.date)
            .field("instrumentType", &self.instrument_type, &stored.instrument_type)
            .field("scope", &self.scope, &stored.scope)
            .field("numberAdvance", &self.number_advance, &stored.number_advance)
            .field("numberDecline", &self.number_decline, &stored.number_decline)
            .field("numberAboveSma50", &self.number_above_sma50, &stored.number_above_sma50)
            .field(
                "numberAtOrBelowSma50",
                &self.number_at_or_below_sma50,
                &stored.number_at_or_below_sma50,
            )
            .field("numberAboveSma200", &self.number_above_sma200, &stored.number_above_sma200)
            .field(
                "numberAtOrBelowSma200",
                &self.number_at_or_below_sma200,
                &stored.number_at_or_below_sma200,
            )
            .field("advanceDeclineSum", &self.advance_decline_sum, &stored.advance_decline_sum)
            .finish()
    }
}

/// Filter for listing statistics. Date bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticFilter {
    pub instrument_type: Option<InstrumentType>,
    pub scope: Option<StatisticScope>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl Record for Statistic {
    type Filter = StatisticFilter;

    fn matches(&self, filter: &StatisticFilter) -> bool {
        filter
            .instrument_type
            .is_none_or(|value| value == self.instrument_type)
            && filter.scope.is_none_or(|value| value == self.scope)
            && filter.from.is_none_or(|from| self.date >= from)
            && filter.to.is_none_or(|to| self.date <= to)
    }
}

/// Statistic as submitted by an input layer that carries both references separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatisticInput {
    pub date: Option<Date>,
    pub instrument_type: Option<InstrumentType>,
    pub sector_id: Option<i64>,
    pub industry_group_id: Option<i64>,
    pub number_advance: i64,
    pub number_decline: i64,
    pub number_above_sma50: i64,
    pub number_at_or_below_sma50: i64,
    pub number_above_sma200: i64,
    pub number_at_or_below_sma200: i64,
    pub advance_decline_sum: i64,
}

impl StatisticInput {
    /// Validates and converts into a [`Statistic`].
    pub fn into_statistic(self) -> Result<Statistic, ValidationError> {
        let date = *require(Entity::Statistic, "date", self.date.as_ref())?;
        let instrument_type =
            *require(Entity::Statistic, "instrumentType", self.instrument_type.as_ref())?;
        let scope = StatisticScope::from_references(self.sector_id, self.industry_group_id)?;

        let statistic = Statistic {
            date,
            instrument_type,
            scope,
            number_advance: self.number_advance,
            number_decline: self.number_decline,
            number_above_sma50: self.number_above_sma50,
            number_at_or_below_sma50: self.number_at_or_below_sma50,
            number_above_sma200: self.number_above_sma200,
            number_at_or_below_sma200: self.number_at_or_below_sma200,
            advance_decline_sum: self.advance_decline_sum,
        };
        statistic.validate()?;
        Ok(statistic)
    }
}

impl Validate for StatisticInput {
    fn validate(&self) -> Result<(), ValidationError> {
        self.clone().into_statistic().map(|_| ())
    }
}

impl From<&Statistic> for StatisticInput {
    fn from(value: &Statistic) -> Self {
        Self {
            date: Some(value.date),
            instrument_type: Some(value.instrument_type),
            sector_id: value.scope.sector_id(),
            industry_group_id: value.scope.industry_group_id(),
            number_advance: value.number_advance,
            number_decline: value.number_decline,
            number_above_sma50: value.number_above_sma50,
            number_at_or_below_sma50: value.number_at_or_below_sma50,
            number_above_sma200: value.number_above_sma200,
            number_at_or_below_sma200: value.number_at_or_below_sma200,
            advance_decline_sum: value.advance_decline_sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;
    use crate::error::Constraint;
    use crate::messages::ENGLISH;

    fn statistic() -> Statistic {
        Statistic::new(date!(2024 - 01 - 15), InstrumentType::Stock, StatisticScope::All)
    }

    #[test]
    fn derives_breadth_from_counts() {
        let statistic = statistic()
            .with_advances(4, 1)
            .with_sma50(3, 2)
            .with_sma200(2, 3);
        assert_eq!(statistic.advance_decline_number(), 3);
        assert_eq!(statistic.percent_above_sma50(), 60.0);
        assert_eq!(statistic.percent_above_sma200(), 40.0);
    }

    #[test]
    fn percentage_without_counted_instruments_is_zero() {
        let statistic = statistic();
        assert_eq!(statistic.percent_above_sma50(), 0.0);
        assert_eq!(statistic.percent_above_sma200(), 0.0);
    }

    #[test]
    fn keeps_fractional_percentages() {
        let statistic = statistic().with_sma50(1, 2);
        assert!((statistic.percent_above_sma50() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn strips_time_of_day_in_utc() {
        assert_eq!(
            Statistic::date_of(datetime!(2024-01-15 23:30 -05:00)),
            date!(2024 - 01 - 16)
        );
        assert_eq!(
            Statistic::date_of(datetime!(2024-01-15 00:00:01 UTC)),
            date!(2024 - 01 - 15)
        );
    }

    #[test]
    fn reports_first_negative_count() {
        let err = statistic()
            .with_advances(1, -1)
            .with_sma50(-1, 0)
            .validate()
            .expect_err("must fail");
        assert_eq!(err.field(), "numberDecline");
        assert_eq!(err.constraint(), Constraint::NonNegative);
    }

    #[test]
    fn both_references_are_mutually_exclusive() {
        let input = StatisticInput {
            date: Some(date!(2024 - 01 - 15)),
            instrument_type: Some(InstrumentType::Stock),
            sector_id: Some(3),
            industry_group_id: Some(8),
            ..StatisticInput::default()
        };
        let err = input.validate().expect_err("must fail");
        assert_eq!(err.field(), SECTOR_AND_IG_DEFINED);
        assert_eq!(err.constraint(), Constraint::MutuallyExclusive);
        assert_eq!(
            err.message_in(&ENGLISH),
            "A statistic can be defined either for a sector or for an industry group, not for both."
        );
    }

    #[test]
    fn input_checks_identity_before_references() {
        let input = StatisticInput {
            sector_id: Some(3),
            industry_group_id: Some(8),
            number_advance: -5,
            ..StatisticInput::default()
        };
        assert_eq!(input.validate().expect_err("date").field(), "date");

        let input = StatisticInput {
            date: Some(date!(2024 - 01 - 15)),
            ..input
        };
        assert_eq!(input.validate().expect_err("type").field(), "instrumentType");

        let input = StatisticInput {
            instrument_type: Some(InstrumentType::Etf),
            ..input
        };
        assert_eq!(input.validate().expect_err("scope").field(), SECTOR_AND_IG_DEFINED);

        let input = StatisticInput {
            industry_group_id: None,
            ..input
        };
        assert_eq!(input.validate().expect_err("count").field(), "numberAdvance");
    }

    #[test]
    fn input_converts_single_reference_into_scope() {
        let input = StatisticInput {
            date: Some(date!(2024 - 01 - 15)),
            instrument_type: Some(InstrumentType::Stock),
            industry_group_id: Some(8),
            number_advance: 4,
            number_decline: 1,
            ..StatisticInput::default()
        };
        let statistic = input.clone().into_statistic().expect("valid");
        assert_eq!(statistic.scope, StatisticScope::IndustryGroup(8));
        assert_eq!(StatisticInput::from(&statistic), input);
    }

    #[test]
    fn validation_is_repeatable() {
        let statistic = statistic().with_advances(4, 1);
        let before = statistic.clone();
        assert!(statistic.validate().is_ok());
        assert!(statistic.validate().is_ok());
        assert_eq!(statistic, before);
    }

    #[test]
    fn every_field_takes_part_in_change_detection() {
        let stored = statistic()
            .with_advances(4, 1)
            .with_sma50(3, 2)
            .with_sma200(2, 3)
            .with_advance_decline_sum(120);
        assert!(stored.changed_fields(&stored).is_empty());

        let variants = [
            Statistic {
                date: date!(2024 - 01 - 16),
                ..stored.clone()
            },
            Statistic {
                instrument_type: InstrumentType::Etf,
                ..stored.clone()
            },
            Statistic {
                scope: StatisticScope::Sector(1),
                ..stored.clone()
            },
            Statistic {
                number_advance: 5,
                ..stored.clone()
            },
            Statistic {
                number_decline: 2,
                ..stored.clone()
            },
            Statistic {
                number_above_sma50: 4,
                ..stored.clone()
            },
            Statistic {
                number_at_or_below_sma50: 1,
                ..stored.clone()
            },
            Statistic {
                number_above_sma200: 1,
                ..stored.clone()
            },
            Statistic {
                number_at_or_below_sma200: 4,
                ..stored.clone()
            },
            Statistic {
                advance_decline_sum: 121,
                ..stored.clone()
            },
        ];
        for variant in variants {
            assert_eq!(variant.changed_fields(&stored).len(), 1, "{variant:?}");
        }
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let statistic = statistic();
        let filter = StatisticFilter {
            from: Some(date!(2024 - 01 - 15)),
            to: Some(date!(2024 - 01 - 15)),
            ..StatisticFilter::default()
        };
        assert!(statistic.matches(&filter));
        let filter = StatisticFilter {
            instrument_type: Some(InstrumentType::Etf),
            ..StatisticFilter::default()
        };
        assert!(!statistic.matches(&filter));
    }

    #[test]
    fn scope_serializes_as_tagged_value() {
        let json = serde_json::to_string(&StatisticScope::Sector(3)).expect("serialize");
        assert_eq!(json, r#"{"kind":"sector","id":3}"#);
        assert_eq!(
            StatisticScope::from_parts("industryGroup", Some(8)),
            Some(StatisticScope::IndustryGroup(8))
        );
        assert_eq!(StatisticScope::from_parts("sector", None), None);
    }
}
