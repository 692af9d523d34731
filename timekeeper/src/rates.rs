//! Billed-rate computation shared by the importer and the live timesheet lifecycle.

/// Prorate an hourly rate over a duration in seconds.
///
/// No rounding is applied; callers round for display.
pub fn calculate_rate(hourly_rate: f64, duration_secs: i64) -> f64 {
    hourly_rate * (duration_secs as f64 / 3600.0)
}

/// The billed amount of a record: the fixed rate when set, otherwise the
/// prorated hourly rate, otherwise zero.
pub fn billed_rate(fixed_rate: Option<f64>, hourly_rate: Option<f64>, duration_secs: i64) -> f64 {
    match (fixed_rate, hourly_rate) {
        (Some(fixed), _) => fixed,
        (None, Some(hourly)) => calculate_rate(hourly, duration_secs),
        (None, None) => 0.0,
    }
}

/// Rate overrides available to a timesheet, from most to least specific owner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateSources {
    pub activity_fixed: Option<f64>,
    pub activity_hourly: Option<f64>,
    pub project_fixed: Option<f64>,
    pub project_hourly: Option<f64>,
    pub user_hourly: Option<f64>,
}

impl RateSources {
    /// Resolve `(fixed_rate, hourly_rate)`.
    ///
    /// Fixed rates come from the activity, then the project. Hourly rates come
    /// from the activity, then the project, then the user's preference.
    pub fn resolve(&self) -> (Option<f64>, Option<f64>) {
        let fixed = self.activity_fixed.or(self.project_fixed);
        let hourly = self
            .activity_hourly
            .or(self.project_hourly)
            .or(self.user_hourly);
        (fixed, hourly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_rate_is_prorated_without_rounding() {
        assert_eq!(calculate_rate(50.0, 3600), 50.0);
        assert_eq!(calculate_rate(50.0, 4500), 62.5);
        assert_eq!(calculate_rate(100.0, 1), 100.0 * (1.0 / 3600.0));
        assert_eq!(calculate_rate(33.33, 0), 0.0);
    }

    #[test]
    fn test_fixed_rate_overrides_hourly() {
        assert_eq!(billed_rate(Some(120.0), Some(50.0), 7200), 120.0);
        assert_eq!(billed_rate(Some(120.0), None, 1), 120.0);
    }

    #[test]
    fn test_billed_rate_without_rates_is_zero() {
        assert_eq!(billed_rate(None, None, 7200), 0.0);
    }

    #[test]
    fn test_billed_rate_hourly_only() {
        assert_eq!(billed_rate(None, Some(80.0), 5400), 120.0);
    }

    #[test]
    fn test_sources_prefer_activity_then_project_then_user() {
        let sources = RateSources {
            activity_fixed: None,
            activity_hourly: Some(90.0),
            project_fixed: Some(500.0),
            project_hourly: Some(70.0),
            user_hourly: Some(40.0),
        };
        assert_eq!(sources.resolve(), (Some(500.0), Some(90.0)));

        let sources = RateSources {
            user_hourly: Some(40.0),
            ..Default::default()
        };
        assert_eq!(sources.resolve(), (None, Some(40.0)));

        let sources = RateSources {
            activity_fixed: Some(10.0),
            project_fixed: Some(500.0),
            ..Default::default()
        };
        assert_eq!(sources.resolve(), (Some(10.0), None));
    }
}
