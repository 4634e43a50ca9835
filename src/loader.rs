use std::{fs::File, io::Read, path::Path};

use rand::Rng;

use crate::domain::{DeliveryMode, MessageKind, NewRecipientRecord, RecipientRecord};

const EMAIL_COLUMN: &str = "email";
const NAME_COLUMN: &str = "name";

/// Fields every loaded record gets, since the sheet only carries contact details.
#[derive(Debug, Clone, Copy)]
pub struct LoadDefaults {
    pub campaign_id: u32,
    pub message_kind: MessageKind,
    pub delivery_mode: DeliveryMode,
}

/// A row of the sheet before validation. `None` means the cell was absent.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SkippedRow {
    /// 1-based, counting data rows only.
    pub row_number: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub records: Vec<RecipientRecord>,
    pub total_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

#[derive(thiserror::Error, Debug)]
pub enum LoaderError {
    #[error("couldn't open recipients file {path}, {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't read recipients, {0}")]
    Csv(#[from] csv::Error),
}

#[tracing::instrument(
    name = "Loading recipients from file",
    skip(path, defaults),
    fields(path = %path.display())
)]
pub fn load_from_path(path: &Path, defaults: &LoadDefaults) -> Result<LoadOutcome, LoaderError> {
    let file = File::open(path).map_err(|source| LoaderError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let outcome = load_from_reader(file, defaults)?;
    tracing::info!(
        total_rows = outcome.total_rows,
        valid = outcome.records.len(),
        skipped = outcome.skipped.len(),
        "Successfully loaded recipients file"
    );
    Ok(outcome)
}

/// Reads a CSV export of the recipients sheet. Columns are matched by header,
/// case-insensitively: `Email` is required per row, `Name` is optional.
pub fn load_from_reader<R: Read>(
    reader: R,
    defaults: &LoadDefaults,
) -> Result<LoadOutcome, LoaderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(wanted))
    };
    let email_column = column(EMAIL_COLUMN);
    let name_column = column(NAME_COLUMN);
    if email_column.is_none() {
        tracing::warn!(headers = ?headers, "Recipients file has no Email column");
    }

    let mut rows = Vec::new();
    for row in csv_reader.records() {
        // A row the reader can't decode is skipped like any other bad row.
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                rows.push(Err(format!("unreadable row, {}", e)));
                continue;
            }
        };
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };
        rows.push(Ok(RawRow {
            email: cell(email_column),
            name: cell(name_column),
        }));
    }

    Ok(validate_rows(rows, defaults, &mut rand::rng()))
}

/// Validates rows into records. Invalid rows are logged and reported in
/// `skipped`; they never stop the load.
pub fn load_rows<I, R>(rows: I, defaults: &LoadDefaults, rng: &mut R) -> LoadOutcome
where
    I: IntoIterator<Item = RawRow>,
    R: Rng,
{
    validate_rows(rows.into_iter().map(Ok), defaults, rng)
}

fn validate_rows<I, R>(rows: I, defaults: &LoadDefaults, rng: &mut R) -> LoadOutcome
where
    I: IntoIterator<Item = Result<RawRow, String>>,
    R: Rng,
{
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut total_rows = 0;

    for (index, row) in rows.into_iter().enumerate() {
        total_rows += 1;
        let row_number = index + 1;

        let result = row.and_then(|row| match row.email {
            None => Err("missing email".to_string()),
            Some(email) => RecipientRecord::new(
                NewRecipientRecord {
                    email,
                    display_name: row.name,
                    campaign_id: defaults.campaign_id,
                    message_kind: defaults.message_kind,
                    delivery_mode: defaults.delivery_mode,
                    unique_id: None,
                },
                rng,
            ),
        });

        match result {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::error!(row_number, %reason, "Skipping row due to validation error");
                skipped.push(SkippedRow { row_number, reason });
            }
        }
    }

    LoadOutcome {
        records,
        total_rows,
        skipped,
    }
}
