use std::collections::HashSet;

use super::NewSubscriber;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ImportRowError {
    /// 1-based, not counting the header.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct ImportRow {
    pub row: usize,
    pub subscriber: NewSubscriber,
}

#[derive(Debug, Default)]
pub struct ImportBatch {
    pub subscribers: Vec<ImportRow>,
    pub errors: Vec<ImportRowError>,
}

#[derive(Debug, serde::Deserialize)]
struct ImportRecord {
    email: Option<String>,
    #[serde(alias = "firstName")]
    first_name: Option<String>,
    #[serde(alias = "lastName")]
    last_name: Option<String>,
}

/// Parse a subscriber CSV export. The header row must contain an `email`
/// column; `firstName`/`first_name` and `lastName`/`last_name` are optional
/// and any other column is ignored. Rows repeating an earlier email are
/// reported as errors.
pub fn parse_subscriber_import(csv_text: &str, tags: &[String]) -> Result<ImportBatch, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut batch = ImportBatch::default();
    let mut seen = HashSet::new();

    for (index, record) in reader.deserialize::<ImportRecord>().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                batch.errors.push(ImportRowError {
                    row,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let parsed = NewSubscriber::parse(
            record.email.unwrap_or_default(),
            record.first_name,
            record.last_name,
            tags.to_vec(),
            Default::default(),
        );
        match parsed {
            Ok(subscriber) => {
                if seen.insert(subscriber.email.as_ref().to_lowercase()) {
                    batch.subscribers.push(ImportRow { row, subscriber });
                } else {
                    batch.errors.push(ImportRowError {
                        row,
                        reason: format!("{} appears more than once.", subscriber.email),
                    });
                }
            }
            Err(reason) => batch.errors.push(ImportRowError { row, reason }),
        }
    }

    Ok(batch)
}
