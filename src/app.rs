use crate::config::Config;
use crate::db::{ApplicationStore, Database};
use crate::error::{CropSafeError, Result};
use crate::logic::withdrawal::application_status;
use crate::logic::{ApplicationRequest, Clock, ProductRegistry, RiskEngine, WithdrawalTracker};
use crate::models::{
    AlertSummary, ApplicationStatus, PesticideApplication, RiskAlert, WeatherObservation,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// Label of the product option that switches the form to a free-text name.
pub const OTHER_PRODUCT: &str = "Other...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Withdrawals,
    Alerts,
}

impl Screen {
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Screen::Dashboard),
            '2' => Some(Screen::Withdrawals),
            '3' => Some(Screen::Alerts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Product,
    CustomName,
    Days,
    Notes,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Product => "Product",
            FormField::CustomName => "Product name",
            FormField::Days => "Withdrawal days",
            FormField::Notes => "Notes",
        }
    }
}

/// State of the "log application" form on the withdrawals screen.
pub struct AddForm {
    pub options: Vec<String>,
    pub product_index: usize,
    pub custom_name: String,
    pub days: String,
    pub notes: String,
    pub focused: FormField,
}

impl AddForm {
    pub fn new(registry: &ProductRegistry) -> Self {
        let mut options: Vec<String> = registry.names().into_iter().map(String::from).collect();
        options.push(OTHER_PRODUCT.to_string());

        let mut form = Self {
            options,
            product_index: 0,
            custom_name: String::new(),
            days: String::new(),
            notes: String::new(),
            focused: FormField::Product,
        };
        form.prefill_days(registry);
        form
    }

    pub fn is_custom(&self) -> bool {
        self.product_index + 1 == self.options.len()
    }

    pub fn selected_option(&self) -> &str {
        self.options
            .get(self.product_index)
            .map(String::as_str)
            .unwrap_or(OTHER_PRODUCT)
    }

    pub fn product_name(&self) -> &str {
        if self.is_custom() {
            self.custom_name.trim()
        } else {
            self.selected_option()
        }
    }

    /// Visible fields in tab order. The free-text name only shows for "Other".
    pub fn fields(&self) -> Vec<FormField> {
        if self.is_custom() {
            vec![
                FormField::Product,
                FormField::CustomName,
                FormField::Days,
                FormField::Notes,
            ]
        } else {
            vec![FormField::Product, FormField::Days, FormField::Notes]
        }
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focused).unwrap_or(0);
        self.focused = fields[(pos + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focused).unwrap_or(0);
        self.focused = fields[(pos + fields.len() - 1) % fields.len()];
    }

    pub fn next_product(&mut self, registry: &ProductRegistry) {
        self.product_index = (self.product_index + 1) % self.options.len();
        self.prefill_days(registry);
    }

    pub fn prev_product(&mut self, registry: &ProductRegistry) {
        self.product_index = (self.product_index + self.options.len() - 1) % self.options.len();
        self.prefill_days(registry);
    }

    fn prefill_days(&mut self, registry: &ProductRegistry) {
        self.days = registry
            .suggested_withdrawal_days(self.product_name())
            .to_string();
    }

    pub fn input_char(&mut self, c: char) {
        match self.focused {
            FormField::Product => {}
            FormField::CustomName => self.custom_name.push(c),
            FormField::Days => {
                if c.is_ascii_digit() || (c == '-' && self.days.is_empty()) {
                    self.days.push(c);
                }
            }
            FormField::Notes => self.notes.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focused {
            FormField::Product => {}
            FormField::CustomName => {
                self.custom_name.pop();
            }
            FormField::Days => {
                self.days.pop();
            }
            FormField::Notes => {
                self.notes.pop();
            }
        }
    }

    pub fn to_request(&self) -> Result<ApplicationRequest> {
        let days: i64 = self.days.trim().parse().map_err(|_| {
            CropSafeError::Validation(format!(
                "withdrawal period must be a whole number of days, got '{}'",
                self.days
            ))
        })?;
        Ok(ApplicationRequest::new(self.product_name(), days).with_notes(&self.notes))
    }
}

pub struct WithdrawalsState {
    pub selected_index: usize,
    pub form: Option<AddForm>,
}

impl WithdrawalsState {
    pub fn new() -> Self {
        Self {
            selected_index: 0,
            form: None,
        }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn clamp(&mut self, max: usize) {
        self.selected_index = self.selected_index.min(max.saturating_sub(1));
    }
}

pub struct AlertsState {
    pub selected_index: usize,
}

impl AlertsState {
    pub fn new() -> Self {
        Self { selected_index: 0 }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub should_quit: bool,
    pub config: Config,
    pub db: Database,

    // Data
    pub tracker: WithdrawalTracker,
    pub registry: ProductRegistry,
    pub observations: Vec<WeatherObservation>,
    pub alerts: Vec<RiskAlert>,
    pub summary: AlertSummary,
    pub forecast_source: String,

    // Screen states
    pub withdrawals_state: WithdrawalsState,
    pub alerts_state: AlertsState,

    // Services
    pub engine: RiskEngine,

    // UI state
    pub status_message: Option<String>,
    pub refreshing: bool,
    pub needs_refresh: bool,
}

impl App {
    pub fn new(config: Config, db: Database, clock: Arc<dyn Clock>) -> Result<Self> {
        let applications = db.load()?;
        tracing::info!(count = applications.len(), "Loaded pesticide applications");

        let registry = config.product_registry();

        Ok(Self {
            screen: Screen::Dashboard,
            should_quit: false,
            config,
            db,
            tracker: WithdrawalTracker::new(applications, clock),
            registry,
            observations: Vec::new(),
            alerts: Vec::new(),
            summary: AlertSummary::default(),
            forecast_source: String::new(),
            withdrawals_state: WithdrawalsState::new(),
            alerts_state: AlertsState::new(),
            engine: RiskEngine::new(),
            status_message: None,
            refreshing: false,
            needs_refresh: false,
        })
    }

    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    pub fn request_refresh(&mut self) {
        self.needs_refresh = true;
        self.set_status("Refreshing forecast...");
    }

    pub fn is_editing(&self) -> bool {
        self.withdrawals_state.form.is_some()
    }

    /// Replace the forecast and re-run the risk engine over it.
    pub fn update_forecast(&mut self, source: &str, observations: Vec<WeatherObservation>) {
        self.alerts = self.engine.evaluate(&observations);
        self.summary = RiskEngine::summarize(&self.alerts);
        self.observations = observations;
        self.forecast_source = source.to_string();
        if self.alerts_state.selected_index >= self.alerts.len() {
            self.alerts_state.selected_index = self.alerts.len().saturating_sub(1);
        }
        tracing::debug!(
            observations = self.observations.len(),
            alerts = self.alerts.len(),
            "Forecast evaluated"
        );
    }

    /// Validate, append and persist. The in-memory list is rolled back if
    /// the save fails so it never drifts from storage.
    pub fn add_application(&mut self, request: ApplicationRequest) -> Result<PesticideApplication> {
        let created = self.tracker.add(request)?;
        if let Err(e) = self.db.save(self.tracker.applications()) {
            let _ = self.tracker.remove(created.id);
            return Err(e);
        }
        Ok(created)
    }

    /// Persist the list without the record first; memory changes only once
    /// storage has accepted the removal.
    pub fn delete_application(&mut self, id: Uuid) -> Result<PesticideApplication> {
        let remaining: Vec<PesticideApplication> = self
            .tracker
            .applications()
            .iter()
            .filter(|app| app.id != id)
            .cloned()
            .collect();
        if remaining.len() == self.tracker.len() {
            return Err(CropSafeError::NotFound(format!("application {}", id)));
        }

        self.db.save(&remaining)?;
        let removed = self.tracker.remove(id)?;
        self.withdrawals_state.clamp(self.tracker.len());
        Ok(removed)
    }

    /// Withdrawal table rows, newest first, all evaluated on `today`.
    pub fn withdrawal_rows(&self, today: NaiveDate) -> Vec<(&PesticideApplication, ApplicationStatus)> {
        self.tracker
            .sorted_for_display()
            .into_iter()
            .map(|app| (app, application_status(app, today)))
            .collect()
    }

    /// Active records by soonest safe date, all evaluated on `today`.
    pub fn clearance_rows(&self, today: NaiveDate) -> Vec<(&PesticideApplication, ApplicationStatus)> {
        self.tracker
            .upcoming_clearances(today)
            .into_iter()
            .map(|(app, _)| (app, application_status(app, today)))
            .collect()
    }

    pub fn open_add_form(&mut self) {
        self.withdrawals_state.form = Some(AddForm::new(&self.registry));
    }

    pub fn cancel_add_form(&mut self) {
        self.withdrawals_state.form = None;
    }

    /// Submit the open form. On a validation error the form stays open so
    /// the user can correct it.
    pub fn submit_add_form(&mut self) {
        let request = match self.withdrawals_state.form.as_ref().map(AddForm::to_request) {
            Some(Ok(request)) => request,
            Some(Err(e)) => {
                self.set_status(&e.to_string());
                return;
            }
            None => return,
        };

        match self.add_application(request) {
            Ok(created) => {
                self.withdrawals_state.form = None;
                self.withdrawals_state.selected_index = 0;
                let status = self.tracker.status_of(&created);
                self.set_status(&format!(
                    "Logged {} - safe to harvest {} ({})",
                    created.product_name,
                    created.safe_date.format("%Y-%m-%d"),
                    status.label()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to log application");
                self.set_status(&e.to_string());
            }
        }
    }

    pub fn delete_selected(&mut self) {
        let id = self
            .tracker
            .sorted_for_display()
            .get(self.withdrawals_state.selected_index)
            .map(|app| app.id);

        if let Some(id) = id {
            match self.delete_application(id) {
                Ok(removed) => self.set_status(&format!("Removed {}", removed.product_name)),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to remove application");
                    self.set_status(&format!("Delete failed: {}", e));
                }
            }
        }
    }

    pub fn selected_alert(&self) -> Option<&RiskAlert> {
        self.alerts.get(self.alerts_state.selected_index)
    }
}
