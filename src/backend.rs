use chrono::NaiveDate;

use crate::error::LogError;
use crate::logger::FileLogger;
use crate::row::RowTable;
use crate::severity::Severity;

/// The operations every log store offers.
///
/// Object safe, so callers can hold a `Box<dyn LogBackend>` and stay unaware
/// of where records end up.
pub trait LogBackend: Send + Sync {
    fn write(&self, severity: Severity, message: &str, user: &str, permission: i32);

    fn query_by_date(&self, severity: Severity, date: NaiveDate) -> Result<RowTable, LogError>;

    fn query_by_date_range(&self, severity: Severity, first: NaiveDate, second: NaiveDate) -> Result<RowTable, LogError>;
}

impl LogBackend for FileLogger {
    #[track_caller]
    fn write(&self, severity: Severity, message: &str, user: &str, permission: i32) {
        FileLogger::write(self, severity, message, user, permission);
    }

    fn query_by_date(&self, severity: Severity, date: NaiveDate) -> Result<RowTable, LogError> {
        FileLogger::query_by_date(self, severity, date)
    }

    fn query_by_date_range(&self, severity: Severity, first: NaiveDate, second: NaiveDate) -> Result<RowTable, LogError> {
        FileLogger::query_by_date_range(self, severity, first, second)
    }
}
