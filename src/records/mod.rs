use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::classifier::dto::ClassificationResult;
use crate::classifier::CONDITIONS;
use crate::error::ApiError;

pub mod handlers;

pub use handlers::router;

/// Append-only classification log: one row per inference event with all 13
/// condition columns in fixed order, the user uuid and a timestamp. Rows are
/// never rewritten or reordered.
pub struct InferenceLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl InferenceLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Appends one row keyed by `user_uuid`. Conditions absent from `results`
    /// default to 0.0. Refuses to write anything without an authenticated
    /// uuid.
    pub fn record(
        &self,
        results: &ClassificationResult,
        user_uuid: Option<&str>,
    ) -> Result<(), ApiError> {
        let uuid = match user_uuid {
            Some(u) if !u.is_empty() => u,
            _ => return Err(ApiError::NotAuthenticated),
        };

        let _guard = self.lock.lock().expect("inference log lock poisoned");

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create inference log dir {}", dir.display()))?;
        }

        let existed = self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("open inference log {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !existed {
            let header: Vec<&str> = CONDITIONS
                .iter()
                .copied()
                .chain(["uuid", "timestamp"])
                .collect();
            writer.write_record(&header).context("write log header")?;
        }

        let mut row: Vec<String> = CONDITIONS
            .iter()
            .map(|name| {
                results
                    .get(*name)
                    .map(|score| score.probability)
                    .unwrap_or(0.0)
                    .to_string()
            })
            .collect();
        row.push(uuid.to_string());
        row.push(now_local_iso());

        writer.write_record(&row).context("write log row")?;
        writer.flush().context("flush inference log")?;
        Ok(())
    }
}

/// ISO-8601 timestamp in the local offset, falling back to UTC when the
/// platform refuses to report the local offset.
fn now_local_iso() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let fmt = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]"
    );
    now.format(&fmt).unwrap_or_else(|_| now.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::dto::ConditionScore;

    fn results_with(pairs: &[(&str, f32)]) -> ClassificationResult {
        pairs
            .iter()
            .map(|(name, p)| {
                (
                    name.to_string(),
                    ConditionScore {
                        probability: *p,
                        label: if *p >= 0.3 { "Y" } else { "N" }.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn refuses_without_uuid_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = InferenceLog::new(dir.path().join("user_inferences.csv"));
        let results = results_with(&[("Pneumonia", 0.9)]);

        for uuid in [None, Some("")] {
            let err = log.record(&results, uuid).unwrap_err();
            assert!(matches!(err, ApiError::NotAuthenticated));
        }
        assert!(!log.path().exists());
    }

    #[test]
    fn header_once_then_rows_in_condition_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = InferenceLog::new(dir.path().join("user_inferences.csv"));

        log.record(&results_with(&[("Pneumonia", 0.9), ("Edema", 0.4)]), Some("u-1"))
            .unwrap();
        log.record(&results_with(&[("Fracture", 0.75)]), Some("u-2"))
            .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Enlarged Cardiomediastinum,Cardiomegaly,"));
        assert!(lines[0].ends_with(",uuid,timestamp"));

        let first: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(first.len(), 15);
        // Edema is column 5, Pneumonia column 7 (1-based)
        assert_eq!(first[4], "0.4");
        assert_eq!(first[6], "0.9");
        assert_eq!(first[0], "0");
        assert_eq!(first[13], "u-1");

        let second: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(second[11], "0.75");
        assert_eq!(second[13], "u-2");
    }

    #[test]
    fn timestamp_is_iso8601_like() {
        let ts = now_local_iso();
        // e.g. 2026-08-07T14:03:22.123456
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert!(ts.len() >= 26);
    }
}
