use anyhow::{bail, Context as AnyhowContext, Result};
use chrono::{DateTime, NaiveDate, Utc};
use roadmapper_store::resolve_project_root;
use serde::Serialize;
use std::path::PathBuf;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to read current directory")
}

/// Project containing the working directory.
pub(crate) fn project_root() -> Result<PathBuf> {
    let cwd = current_dir()?;
    match resolve_project_root(Some(&cwd)) {
        Some(root) => Ok(root),
        None => bail!("Not in a roadmapper project (run 'roadmapper init' first)"),
    }
}

/// `YYYY-MM-DD` as midnight UTC.
pub(crate) fn parse_since(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {raw}. Use YYYY-MM-DD"))?;
    Ok(date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
}

/// Leading `YYYY-MM-DD` of a stored timestamp.
pub(crate) fn short_date(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn since_parses_calendar_dates_only() {
        let since = parse_since(Some("2025-11-04")).unwrap().unwrap();
        assert_eq!(since.to_rfc3339(), "2025-11-04T00:00:00+00:00");
        assert!(parse_since(Some("11/04/2025")).is_err());
        assert!(parse_since(None).unwrap().is_none());
    }

    #[test]
    fn short_date_tolerates_short_input() {
        assert_eq!(short_date("2025-11-04T10:00:00Z"), "2025-11-04");
        assert_eq!(short_date("bad"), "bad");
    }
}
