//! CSV export of the daily table.

use crate::error::Result;
use crate::models::DailyRecord;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Writes `date,mean,median,n`; absent statistics become empty fields.
pub fn write_daily_csv(daily: &[DailyRecord], out_path: &Path) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(out_path)?;
    if daily.is_empty() {
        // serialize() only emits the header alongside the first record
        writer.write_record(["date", "mean", "median", "n"])?;
    }
    for row in daily {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!("Wrote {} daily rows to {}", daily.len(), out_path.display());
    Ok(())
}
