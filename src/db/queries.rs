use super::ApplicationStore;
use crate::db::Database;
use crate::error::{CropSafeError, Result};
use crate::logic::withdrawal::safe_harvest_date;
use crate::models::PesticideApplication;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tracing::warn;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl ApplicationStore for Database {
    fn load(&self) -> Result<Vec<PesticideApplication>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM pesticide_applications ORDER BY position ASC",
            )?;
            let apps = stmt
                .query_map([], row_to_application)?
                .filter_map(|r| match r {
                    Ok(app) => Some(app),
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable pesticide application row");
                        None
                    }
                })
                .collect();
            Ok(apps)
        })
    }

    fn save(&self, applications: &[PesticideApplication]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM pesticide_applications", [])?;
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO pesticide_applications
                        (id, position, product_name, withdrawal_days, applied_date, safe_date, notes, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )?;
                for (position, app) in applications.iter().enumerate() {
                    stmt.execute(params![
                        app.id.to_string(),
                        position as i64,
                        app.product_name,
                        app.withdrawal_days,
                        app.applied_date.format(DATE_FORMAT).to_string(),
                        app.safe_date.format(DATE_FORMAT).to_string(),
                        app.notes,
                        app.created_at.to_rfc3339(),
                    ])?;
                }
            }
            tx.commit()?;
            tracing::debug!(count = applications.len(), "Saved pesticide applications");
            Ok(())
        })
    }
}

fn row_to_application(row: &Row) -> rusqlite::Result<PesticideApplication> {
    let id_str: String = row.get("id")?;
    let applied_str: String = row.get("applied_date")?;
    let safe_str: String = row.get("safe_date")?;
    let created_at_str: String = row.get("created_at")?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let applied_date =
        NaiveDate::parse_from_str(&applied_str, DATE_FORMAT).map_err(|e| conversion_error(4, e))?;
    let safe_date =
        NaiveDate::parse_from_str(&safe_str, DATE_FORMAT).map_err(|e| conversion_error(5, e))?;

    let withdrawal_days: u32 = row.get("withdrawal_days")?;
    let expected = safe_harvest_date(applied_date, withdrawal_days)
        .map_err(|e| conversion_error(5, e))?;
    if safe_date != expected {
        return Err(conversion_error(
            5,
            CropSafeError::InvalidData(format!(
                "safe date {} does not match {} + {} days",
                safe_date, applied_date, withdrawal_days
            )),
        ));
    }

    Ok(PesticideApplication {
        id,
        product_name: row.get("product_name")?,
        withdrawal_days,
        applied_date,
        safe_date,
        notes: row.get("notes")?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| {
                warn!(id = %id_str, created_at = %created_at_str, "Unparseable created_at");
                Utc::now()
            }),
    })
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}
