//! Lookup of legacy rate overrides.
//!
//! Kimai v1 stores overrides as `(user?, project?, activity?) -> rate` rows in
//! two tables, `fixedRates` (no user column) and `rates`. Each lookup below is
//! a pattern over those three slots; a row matches when every slot matches.
//! Among matching rows the most specific one (most non-null keys) wins and
//! ties go to the later row.

use crate::legacy::{LegacyFixedRate, LegacyRate, decimal_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    Fixed,
    Hourly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateRule {
    pub kind: RateKind,
    pub user: Option<i64>,
    pub project: Option<i64>,
    pub activity: Option<i64>,
    pub rate: f64,
}

impl RateRule {
    fn specificity(&self) -> usize {
        [self.user, self.project, self.activity]
            .iter()
            .filter(|k| k.is_some())
            .count()
    }
}

/// Pattern for one key slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// The key must be null.
    Unset,
    /// The key must equal the value.
    Is(i64),
    /// The key must be null or equal the value.
    UnsetOr(i64),
    /// Any key.
    Any,
}

impl Slot {
    fn matches(self, key: Option<i64>) -> bool {
        match (self, key) {
            (Slot::Any, _) => true,
            (Slot::Unset, None) => true,
            (Slot::Unset, Some(_)) => false,
            (Slot::Is(v), Some(k)) => v == k,
            (Slot::Is(_), None) => false,
            (Slot::UnsetOr(_), None) => true,
            (Slot::UnsetOr(v), Some(k)) => v == k,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rules: Vec<RateRule>,
}

impl RateTable {
    pub fn from_rows(fixed: &[LegacyFixedRate], hourly: &[LegacyRate]) -> Self {
        let fixed = fixed.iter().map(|row| RateRule {
            kind: RateKind::Fixed,
            user: None,
            project: row.project_id,
            activity: row.activity_id,
            rate: decimal_to_f64(row.rate),
        });
        let hourly = hourly.iter().map(|row| RateRule {
            kind: RateKind::Hourly,
            user: row.user_id,
            project: row.project_id,
            activity: row.activity_id,
            rate: decimal_to_f64(row.rate),
        });
        Self {
            rules: fixed.chain(hourly).collect(),
        }
    }

    fn lookup(&self, kind: RateKind, user: Slot, project: Slot, activity: Slot) -> Option<f64> {
        self.rules
            .iter()
            .filter(|r| r.kind == kind)
            .filter(|r| user.matches(r.user) && project.matches(r.project) && activity.matches(r.activity))
            .fold(None::<&RateRule>, |best, rule| match best {
                Some(b) if b.specificity() > rule.specificity() => Some(b),
                _ => Some(rule),
            })
            .map(|r| r.rate)
    }

    /// User default: `(user, -, -)`.
    pub fn user_hourly(&self, user: i64) -> Option<f64> {
        self.lookup(RateKind::Hourly, Slot::Is(user), Slot::Unset, Slot::Unset)
    }

    /// Project fixed rate: `(-, project, -)`.
    pub fn project_fixed(&self, project: i64) -> Option<f64> {
        self.lookup(RateKind::Fixed, Slot::Any, Slot::Is(project), Slot::Unset)
    }

    /// Project hourly rate: `(-, project, -)`.
    pub fn project_hourly(&self, project: i64) -> Option<f64> {
        self.lookup(RateKind::Hourly, Slot::Unset, Slot::Is(project), Slot::Unset)
    }

    /// Activity fixed rate for an activity, global when `project` is `None`.
    pub fn activity_fixed(&self, activity: i64, project: Option<i64>) -> Option<f64> {
        self.lookup(RateKind::Fixed, Slot::Any, project_slot(project), Slot::Is(activity))
    }

    /// Activity hourly rate: like [`RateTable::activity_fixed`] but only rows without a user.
    pub fn activity_hourly(&self, activity: i64, project: Option<i64>) -> Option<f64> {
        self.lookup(RateKind::Hourly, Slot::Unset, project_slot(project), Slot::Is(activity))
    }
}

fn project_slot(project: Option<i64>) -> Slot {
    match project {
        Some(p) => Slot::UnsetOr(p),
        None => Slot::Unset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn fixed(project: Option<i64>, activity: Option<i64>, rate: i64) -> LegacyFixedRate {
        LegacyFixedRate {
            project_id: project,
            activity_id: activity,
            rate: Decimal::from(rate),
        }
    }

    fn hourly(user: Option<i64>, project: Option<i64>, activity: Option<i64>, rate: i64) -> LegacyRate {
        LegacyRate {
            user_id: user,
            project_id: project,
            activity_id: activity,
            rate: Decimal::from(rate),
        }
    }

    #[test]
    fn test_user_hourly_requires_exact_shape() {
        let table = RateTable::from_rows(
            &[],
            &[
                hourly(Some(1), Some(5), None, 99),
                hourly(Some(1), None, None, 40),
                hourly(Some(2), None, Some(3), 77),
            ],
        );
        assert_eq!(table.user_hourly(1), Some(40.0));
        assert_eq!(table.user_hourly(2), None);
        assert_eq!(table.rules.len(), 3);
    }

    #[test]
    fn test_project_rates() {
        let table = RateTable::from_rows(
            &[fixed(Some(5), None, 500), fixed(Some(5), Some(3), 10)],
            &[hourly(None, Some(5), None, 60), hourly(Some(1), Some(5), None, 70)],
        );
        assert_eq!(table.project_fixed(5), Some(500.0));
        assert_eq!(table.project_hourly(5), Some(60.0));
        assert_eq!(table.project_fixed(6), None);
    }

    #[test]
    fn test_activity_rate_prefers_project_specific_row() {
        let table = RateTable::from_rows(
            &[fixed(Some(5), Some(3), 30), fixed(None, Some(3), 20)],
            &[hourly(None, None, Some(3), 45), hourly(Some(1), Some(5), Some(3), 99)],
        );
        assert_eq!(table.activity_fixed(3, Some(5)), Some(30.0));
        assert_eq!(table.activity_fixed(3, Some(6)), Some(20.0));
        assert_eq!(table.activity_fixed(3, None), Some(20.0));
        assert_eq!(table.activity_hourly(3, Some(5)), Some(45.0));
        assert_eq!(table.activity_fixed(4, None), None);
    }

    #[test]
    fn test_ties_go_to_later_row() {
        let table = RateTable::from_rows(&[fixed(Some(5), None, 1), fixed(Some(5), None, 2)], &[]);
        assert_eq!(table.project_fixed(5), Some(2.0));
    }
}
