use super::clock::Clock;
use crate::error::{CropSafeError, Result};
use crate::models::{ApplicationStatus, FarmStatus, PesticideApplication};
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use uuid::Uuid;

/// Input for logging a new pesticide application.
#[derive(Debug, Clone)]
pub struct ApplicationRequest {
    pub product_name: String,
    pub withdrawal_days: i64,
    pub applied_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ApplicationRequest {
    pub fn new(product_name: impl Into<String>, withdrawal_days: i64) -> Self {
        Self {
            product_name: product_name.into(),
            withdrawal_days,
            applied_date: None,
            notes: None,
        }
    }

    pub fn applied_on(mut self, date: NaiveDate) -> Self {
        self.applied_date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        let notes = notes.trim();
        self.notes = (!notes.is_empty()).then(|| notes.to_string());
        self
    }
}

/// Validate a request and append the resulting record to `applications`.
///
/// Nothing is appended when validation fails. Persisting the collection is
/// left to the caller.
pub fn add_application(
    applications: &mut Vec<PesticideApplication>,
    request: ApplicationRequest,
    clock: &dyn Clock,
) -> Result<PesticideApplication> {
    let product_name = request.product_name.trim();
    if product_name.is_empty() {
        return Err(CropSafeError::Validation(
            "product name must not be empty".into(),
        ));
    }
    if request.withdrawal_days < 1 {
        return Err(CropSafeError::Validation(format!(
            "withdrawal period must be at least 1 day, got {}",
            request.withdrawal_days
        )));
    }
    let withdrawal_days = u32::try_from(request.withdrawal_days).map_err(|_| {
        CropSafeError::Validation(format!(
            "withdrawal period of {} days is too large",
            request.withdrawal_days
        ))
    })?;

    let applied_date = request.applied_date.unwrap_or_else(|| clock.today());
    let safe_date = safe_harvest_date(applied_date, withdrawal_days)?;

    let application = PesticideApplication {
        id: Uuid::new_v4(),
        product_name: product_name.to_string(),
        withdrawal_days,
        applied_date,
        safe_date,
        notes: request.notes,
        created_at: clock.timestamp(),
    };

    tracing::debug!(
        product = %application.product_name,
        %applied_date,
        %safe_date,
        "Logged pesticide application"
    );

    applications.push(application.clone());
    Ok(application)
}

/// Calendar-day addition; month and year rollover come from `NaiveDate`.
pub fn safe_harvest_date(applied_date: NaiveDate, withdrawal_days: u32) -> Result<NaiveDate> {
    applied_date
        .checked_add_days(Days::new(u64::from(withdrawal_days)))
        .ok_or_else(|| {
            CropSafeError::Validation(format!(
                "safe date for {} + {} days is out of range",
                applied_date, withdrawal_days
            ))
        })
}

pub fn days_remaining(application: &PesticideApplication, as_of: NaiveDate) -> i64 {
    application
        .safe_date
        .signed_duration_since(as_of)
        .num_days()
}

pub fn is_safe_to_harvest(application: &PesticideApplication, as_of: NaiveDate) -> bool {
    days_remaining(application, as_of) <= 0
}

/// Fraction of the withdrawal period still to run, clamped to [0, 1].
pub fn withdrawal_progress(application: &PesticideApplication, as_of: NaiveDate) -> f64 {
    if application.withdrawal_days == 0 {
        return 0.0;
    }
    let ratio = days_remaining(application, as_of) as f64 / f64::from(application.withdrawal_days);
    ratio.clamp(0.0, 1.0)
}

pub fn application_status(
    application: &PesticideApplication,
    as_of: NaiveDate,
) -> ApplicationStatus {
    let days_remaining = days_remaining(application, as_of);
    ApplicationStatus {
        days_remaining,
        is_safe: days_remaining <= 0,
        progress: withdrawal_progress(application, as_of),
    }
}

/// Split into (active, cleared) as of the given date.
pub fn partition(
    applications: &[PesticideApplication],
    as_of: NaiveDate,
) -> (Vec<&PesticideApplication>, Vec<&PesticideApplication>) {
    applications
        .iter()
        .partition(|app| !is_safe_to_harvest(app, as_of))
}

/// Recomputed from scratch on every call; the minimum moves with the date
/// even when the set of applications does not change.
pub fn aggregate_farm_status(applications: &[PesticideApplication], as_of: NaiveDate) -> FarmStatus {
    let (active, _cleared) = partition(applications, as_of);

    match active.iter().map(|app| days_remaining(app, as_of)).min() {
        None => FarmStatus::Clear,
        Some(min_days_remaining) => FarmStatus::Restricted {
            active_count: active.len(),
            min_days_remaining,
        },
    }
}

/// Owns the application list for a view and threads one clock through it.
pub struct WithdrawalTracker {
    applications: Vec<PesticideApplication>,
    clock: Arc<dyn Clock>,
}

impl WithdrawalTracker {
    pub fn new(applications: Vec<PesticideApplication>, clock: Arc<dyn Clock>) -> Self {
        Self {
            applications,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn add(&mut self, request: ApplicationRequest) -> Result<PesticideApplication> {
        add_application(&mut self.applications, request, self.clock.as_ref())
    }

    pub fn remove(&mut self, id: Uuid) -> Result<PesticideApplication> {
        let index = self
            .applications
            .iter()
            .position(|app| app.id == id)
            .ok_or_else(|| CropSafeError::NotFound(format!("application {}", id)))?;
        Ok(self.applications.remove(index))
    }

    /// Resolve a full id or an unambiguous prefix of its simple form.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<&PesticideApplication> {
        let needle = prefix.trim().to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(CropSafeError::Validation("id must not be empty".into()));
        }

        let mut matches = self
            .applications
            .iter()
            .filter(|app| app.id.simple().to_string().starts_with(&needle));

        match (matches.next(), matches.next()) {
            (Some(app), None) => Ok(app),
            (Some(_), Some(_)) => Err(CropSafeError::Validation(format!(
                "id prefix '{}' matches more than one application",
                prefix
            ))),
            (None, _) => Err(CropSafeError::NotFound(format!("application {}", prefix))),
        }
    }

    /// Storage order, as handed to the persistence layer.
    pub fn applications(&self) -> &[PesticideApplication] {
        &self.applications
    }

    /// Most recent application first. Records logged at the same instant
    /// fall back to reverse storage order.
    pub fn sorted_for_display(&self) -> Vec<&PesticideApplication> {
        let mut sorted: Vec<(usize, &PesticideApplication)> =
            self.applications.iter().enumerate().collect();
        sorted.sort_by(|(ia, a), (ib, b)| {
            b.applied_date
                .cmp(&a.applied_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| ib.cmp(ia))
        });
        sorted.into_iter().map(|(_, app)| app).collect()
    }

    pub fn status_of(&self, application: &PesticideApplication) -> ApplicationStatus {
        application_status(application, self.today())
    }

    pub fn farm_status(&self, as_of: NaiveDate) -> FarmStatus {
        aggregate_farm_status(&self.applications, as_of)
    }

    /// Active applications ordered by soonest safe date.
    pub fn upcoming_clearances(&self, as_of: NaiveDate) -> Vec<(&PesticideApplication, i64)> {
        let (active, _) = partition(&self.applications, as_of);
        let mut upcoming: Vec<(&PesticideApplication, i64)> = active
            .into_iter()
            .map(|app| (app, days_remaining(app, as_of)))
            .collect();
        upcoming.sort_by_key(|(app, days)| (*days, app.safe_date));
        upcoming
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clock::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn applied(product: &str, days: i64, on: NaiveDate) -> PesticideApplication {
        let mut apps = Vec::new();
        add_application(
            &mut apps,
            ApplicationRequest::new(product, days).applied_on(on),
            &FixedClock::on(on),
        )
        .unwrap()
    }

    #[test]
    fn safe_date_rolls_over_month_boundary() {
        let app = applied("Mancozeb", 5, date(2023, 1, 30));
        assert_eq!(app.safe_date, date(2023, 2, 4));
    }

    #[test]
    fn safe_date_rolls_over_year_and_leap_day() {
        assert_eq!(
            applied("Sulfur", 5, date(2023, 12, 30)).safe_date,
            date(2024, 1, 4)
        );
        assert_eq!(
            applied("Sulfur", 3, date(2024, 2, 27)).safe_date,
            date(2024, 3, 1)
        );
        assert_eq!(
            applied("Sulfur", 3, date(2023, 2, 27)).safe_date,
            date(2023, 3, 2)
        );
    }

    #[test]
    fn safe_date_is_exactly_withdrawal_days_after() {
        let start = date(2024, 1, 1);
        for days in [1, 2, 7, 30, 31, 90, 365, 400] {
            let app = applied("Thiram", days, start);
            assert_eq!(
                app.safe_date.signed_duration_since(app.applied_date).num_days(),
                days
            );
            assert_eq!(app.withdrawal_days as i64, days);
        }
    }

    #[test]
    fn withdrawal_scenario_august() {
        let app = applied("Copper Oxychloride", 7, date(2024, 8, 1));
        assert_eq!(app.safe_date, date(2024, 8, 8));

        assert_eq!(days_remaining(&app, date(2024, 8, 5)), 3);
        assert!(!is_safe_to_harvest(&app, date(2024, 8, 5)));

        assert_eq!(days_remaining(&app, date(2024, 8, 8)), 0);
        assert!(is_safe_to_harvest(&app, date(2024, 8, 8)));

        assert_eq!(days_remaining(&app, date(2024, 8, 9)), -1);
        assert!(is_safe_to_harvest(&app, date(2024, 8, 9)));
    }

    #[test]
    fn days_remaining_never_increases() {
        let app = applied("Malathion", 14, date(2024, 6, 20));
        let mut previous = i64::MAX;
        let mut as_of = date(2024, 6, 1);
        while as_of < date(2024, 8, 1) {
            let remaining = days_remaining(&app, as_of);
            assert!(remaining <= previous);
            assert_eq!(is_safe_to_harvest(&app, as_of), remaining <= 0);
            previous = remaining;
            as_of = as_of.succ_opt().unwrap();
        }
    }

    #[test]
    fn applied_date_defaults_to_clock() {
        let mut apps = Vec::new();
        let clock = FixedClock::on(date(2024, 3, 10));
        let app = add_application(&mut apps, ApplicationRequest::new("Neem Oil", 3), &clock).unwrap();
        assert_eq!(app.applied_date, date(2024, 3, 10));
        assert_eq!(app.safe_date, date(2024, 3, 13));
        assert_eq!(apps.len(), 1);
    }

    #[test]
    fn empty_product_name_rejected_without_record() {
        let mut apps = Vec::new();
        let clock = FixedClock::on(date(2024, 3, 10));
        for name in ["", "   "] {
            let result = add_application(&mut apps, ApplicationRequest::new(name, 5), &clock);
            assert!(matches!(result, Err(CropSafeError::Validation(_))));
        }
        assert!(apps.is_empty());
    }

    #[test]
    fn non_positive_withdrawal_days_rejected() {
        let mut apps = Vec::new();
        let clock = FixedClock::on(date(2024, 3, 10));
        for days in [0, -1, -30] {
            let result = add_application(&mut apps, ApplicationRequest::new("Zinc", days), &clock);
            assert!(matches!(result, Err(CropSafeError::Validation(_))));
        }
        assert!(apps.is_empty());
    }

    #[test]
    fn out_of_range_withdrawal_days_rejected() {
        let mut apps = Vec::new();
        let clock = FixedClock::on(date(2024, 3, 10));
        let too_big = i64::from(u32::MAX) + 1;
        assert!(add_application(&mut apps, ApplicationRequest::new("Zinc", too_big), &clock).is_err());
        let past_calendar = i64::from(u32::MAX);
        assert!(
            add_application(&mut apps, ApplicationRequest::new("Zinc", past_calendar), &clock)
                .is_err()
        );
        assert!(apps.is_empty());
    }

    #[test]
    fn product_name_and_notes_trimmed() {
        let app = {
            let mut apps = Vec::new();
            add_application(
                &mut apps,
                ApplicationRequest::new("  Carbofuran ", 21).with_notes("  "),
                &FixedClock::on(date(2024, 5, 1)),
            )
            .unwrap()
        };
        assert_eq!(app.product_name, "Carbofuran");
        assert_eq!(app.notes, None);
    }

    #[test]
    fn farm_status_clear_when_empty() {
        assert_eq!(aggregate_farm_status(&[], date(2024, 8, 1)), FarmStatus::Clear);
    }

    #[test]
    fn farm_status_restricted_with_most_urgent_minimum() {
        let apps = vec![
            applied("Carbofuran", 21, date(2024, 8, 1)),
            applied("Neem Oil", 3, date(2024, 8, 1)),
            applied("Mancozeb", 5, date(2024, 7, 1)),
        ];
        assert_eq!(
            aggregate_farm_status(&apps, date(2024, 8, 2)),
            FarmStatus::Restricted {
                active_count: 2,
                min_days_remaining: 2,
            }
        );
        // Neem oil clears, minimum moves without any new application.
        assert_eq!(
            aggregate_farm_status(&apps, date(2024, 8, 4)),
            FarmStatus::Restricted {
                active_count: 1,
                min_days_remaining: 18,
            }
        );
        assert_eq!(aggregate_farm_status(&apps, date(2024, 8, 22)), FarmStatus::Clear);
    }

    #[test]
    fn restricted_iff_any_application_has_days_remaining() {
        let apps = vec![
            applied("Sulfur", 7, date(2024, 8, 1)),
            applied("Thiram", 10, date(2024, 8, 3)),
        ];
        let mut as_of = date(2024, 7, 25);
        while as_of < date(2024, 8, 20) {
            let any_active = apps.iter().any(|a| days_remaining(a, as_of) > 0);
            assert_eq!(!aggregate_farm_status(&apps, as_of).is_clear(), any_active);
            as_of = as_of.succ_opt().unwrap();
        }
    }

    #[test]
    fn partition_splits_active_and_cleared() {
        let apps = vec![
            applied("Sulfur", 7, date(2024, 8, 1)),
            applied("Zinc", 5, date(2024, 7, 1)),
        ];
        let (active, cleared) = partition(&apps, date(2024, 8, 3));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].product_name, "Sulfur");
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].product_name, "Zinc");
    }

    #[test]
    fn progress_clamped_to_unit_interval() {
        let app = applied("Malathion", 14, date(2024, 8, 1));
        assert_eq!(withdrawal_progress(&app, date(2024, 8, 1)), 1.0);
        assert_eq!(withdrawal_progress(&app, date(2024, 8, 8)), 0.5);
        assert_eq!(withdrawal_progress(&app, date(2024, 8, 15)), 0.0);
        assert_eq!(withdrawal_progress(&app, date(2024, 9, 1)), 0.0);
        // future application date
        assert_eq!(withdrawal_progress(&app, date(2024, 7, 20)), 1.0);
    }

    #[test]
    fn tracker_add_remove_and_lookup() {
        let clock = Arc::new(FixedClock::on(date(2024, 8, 5)));
        let mut tracker = WithdrawalTracker::new(Vec::new(), clock);

        let first = tracker
            .add(ApplicationRequest::new("Sulfur", 7).applied_on(date(2024, 8, 1)))
            .unwrap();
        let second = tracker.add(ApplicationRequest::new("Neem Oil", 3)).unwrap();
        assert_eq!(tracker.len(), 2);

        let found = tracker.find_by_prefix(&first.short_id()).unwrap();
        assert_eq!(found.id, first.id);
        assert!(matches!(
            tracker.find_by_prefix("zzzz"),
            Err(CropSafeError::NotFound(_))
        ));

        let status = tracker.status_of(&first);
        assert_eq!(status.days_remaining, 3);
        assert!(!status.is_safe);

        let removed = tracker.remove(second.id).unwrap();
        assert_eq!(removed.product_name, "Neem Oil");
        assert!(matches!(
            tracker.remove(second.id),
            Err(CropSafeError::NotFound(_))
        ));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn tracker_display_order_is_most_recent_first() {
        let clock = Arc::new(FixedClock::on(date(2024, 8, 10)));
        let mut tracker = WithdrawalTracker::new(Vec::new(), clock);
        tracker
            .add(ApplicationRequest::new("Zinc", 5).applied_on(date(2024, 8, 2)))
            .unwrap();
        tracker
            .add(ApplicationRequest::new("Sulfur", 7).applied_on(date(2024, 8, 9)))
            .unwrap();
        tracker
            .add(ApplicationRequest::new("Thiram", 10).applied_on(date(2024, 8, 4)))
            .unwrap();

        let names: Vec<&str> = tracker
            .sorted_for_display()
            .iter()
            .map(|a| a.product_name.as_str())
            .collect();
        assert_eq!(names, vec!["Sulfur", "Thiram", "Zinc"]);

        let upcoming: Vec<(&str, i64)> = tracker
            .upcoming_clearances(date(2024, 8, 10))
            .iter()
            .map(|(a, d)| (a.product_name.as_str(), *d))
            .collect();
        assert_eq!(upcoming, vec![("Thiram", 4), ("Sulfur", 6)]);
    }

    #[test]
    fn created_at_comes_from_the_clock() {
        let clock = FixedClock::on(date(2024, 8, 10));
        let mut apps = Vec::new();
        let created =
            add_application(&mut apps, ApplicationRequest::new("Sulfur", 7), &clock).unwrap();
        assert_eq!(created.created_at, clock.timestamp());
    }

    #[test]
    fn same_instant_ties_show_latest_logged_first() {
        let clock = Arc::new(FixedClock::on(date(2024, 8, 10)));
        let mut tracker = WithdrawalTracker::new(Vec::new(), clock);
        for product in ["Zinc", "Sulfur", "Thiram"] {
            tracker.add(ApplicationRequest::new(product, 5)).unwrap();
        }

        let names: Vec<&str> = tracker
            .sorted_for_display()
            .iter()
            .map(|a| a.product_name.as_str())
            .collect();
        assert_eq!(names, vec!["Thiram", "Sulfur", "Zinc"]);
    }

    #[test]
    fn tracker_evaluates_on_the_given_date() {
        let clock = Arc::new(FixedClock::on(date(2024, 8, 10)));
        let mut tracker = WithdrawalTracker::new(Vec::new(), clock);
        tracker
            .add(ApplicationRequest::new("Mancozeb", 5).applied_on(date(2024, 8, 8)))
            .unwrap();

        let later = date(2024, 8, 12);
        assert_eq!(
            tracker.upcoming_clearances(later)[0].1,
            1,
            "days remaining follow the given date"
        );
        assert_eq!(
            tracker.farm_status(later),
            FarmStatus::Restricted {
                active_count: 1,
                min_days_remaining: 1
            }
        );
        assert_eq!(tracker.farm_status(date(2024, 8, 13)), FarmStatus::Clear);
    }
}
