use std::{
    fmt::{Display, Formatter},
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{
    appliance::{ApplianceRecord, Source},
    prelude::*,
    quantity::{power::Watts, time::Hours},
};

/// Column headers of the data file.
pub const HEADER: [&str; 4] = ["Appliance", "Wattage", "Hours", "Source"];

/// Appliance records in the order they were entered.
#[must_use]
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    derive_more::Deref,
    derive_more::From,
    derive_more::IntoIterator,
)]
#[into_iterator(owned, ref)]
pub struct RecordTable(Vec<ApplianceRecord>);

impl RecordTable {
    /// Read the table, skipping malformed rows.
    ///
    /// Returns the table and the number of skipped rows.
    pub fn read_from(reader: impl Read) -> csv::Result<(Self, usize)> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        reader.headers()?;
        let mut records = Vec::new();
        let mut n_skipped = 0;
        for result in reader.deserialize::<ApplianceRecord>() {
            match result {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!("skipping a malformed row: {error}");
                    n_skipped += 1;
                }
            }
        }
        Ok((Self(records), n_skipped))
    }

    /// Write the header followed by the records, the header is present even without any records.
    pub fn write_to(&self, writer: impl Write) -> csv::Result<()> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        writer.write_record(HEADER)?;
        for record in self {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Form field of a new appliance, in the order they are filled in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    Name,
    Wattage,
    Hours,
    Source,
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "appliance name"),
            Self::Wattage => write!(f, "wattage"),
            Self::Hours => write!(f, "hours per day"),
            Self::Source => write!(f, "energy source"),
        }
    }
}

impl Field {
    const fn parse_hint(self) -> &'static str {
        match self {
            Self::Wattage | Self::Hours => "Wattage and Hours must be numbers.",
            Self::Source => "Source must be Renewable or Non-Renewable.",
            Self::Name => "Appliance name is not valid.",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    #[error("Please fill all fields. The {field} is empty.")]
    Validation { field: Field },

    #[error("{} Got `{text}` for the {field}.", .field.parse_hint())]
    Parse { field: Field, text: String },

    #[error("failed to save the appliance table")]
    Persistence(#[from] csv::Error),
}

/// Raw text of the appliance form.
#[derive(Copy, Clone)]
pub struct ApplianceForm<'a> {
    pub name: &'a str,
    pub wattage: &'a str,
    pub hours: &'a str,
    pub source: &'a str,
}

impl ApplianceForm<'_> {
    /// Check that every field is filled in first, and only then parse them.
    pub fn parse(&self) -> Result<ApplianceRecord, AppendError> {
        let fields = [
            (Field::Name, self.name),
            (Field::Wattage, self.wattage),
            (Field::Hours, self.hours),
            (Field::Source, self.source),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, text)| text.trim().is_empty()) {
            return Err(AppendError::Validation { field: *field });
        }
        Ok(ApplianceRecord {
            name: self.name.trim().to_owned(),
            wattage: Watts(parse_number(Field::Wattage, self.wattage)?),
            hours_per_day: Hours(parse_number(Field::Hours, self.hours)?),
            source: self.source.trim().parse::<Source>().map_err(|_| AppendError::Parse {
                field: Field::Source,
                text: self.source.to_owned(),
            })?,
        })
    }
}

fn parse_number(field: Field, text: &str) -> Result<f64, AppendError> {
    text.trim().parse().map_err(|_| AppendError::Parse { field, text: text.to_owned() })
}

/// Append-only appliance table backed by a CSV file.
///
/// The file is rewritten in full after every append. When the file could not be read in full,
/// it is copied to [`RecordStore::backup_path`] before the first rewrite.
pub struct RecordStore {
    path: PathBuf,
    table: RecordTable,
    needs_backup: bool,
}

impl RecordStore {
    /// Load the table, or start empty and create the file when there is none.
    ///
    /// Unreadable files are treated as no data yet, malformed rows are skipped.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (table, needs_backup) = match Self::load_fallibly(&path) {
            Ok((table, n_skipped)) => (table, n_skipped != 0),
            Err(error) => {
                warn!("failed to load the appliances, starting empty: {error:#}");
                (RecordTable::default(), path.is_file())
            }
        };
        debug!(n_records = table.len(), needs_backup, "loaded");
        Self { path, table, needs_backup }
    }

    fn load_fallibly(path: &Path) -> Result<(RecordTable, usize)> {
        if path.is_file() {
            let file = File::open(path).context("failed to open the data file")?;
            RecordTable::read_from(file).context("failed to read the data file")
        } else {
            info!("no data file yet, creating an empty one");
            let table = RecordTable::default();
            persist(path, &table).context("failed to create the data file")?;
            Ok((table, 0))
        }
    }

    /// Copy of the original file, written before overwriting a file that was not read in full.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".bak");
        PathBuf::from(path)
    }

    pub const fn table(&self) -> &RecordTable {
        &self.table
    }

    /// Validate and parse the form, save the extended table, and then add the record in memory.
    ///
    /// Nothing changes, neither in memory nor on disk, when any step fails.
    #[instrument(skip_all, fields(name = form.name))]
    pub fn append(&mut self, form: &ApplianceForm) -> Result<&RecordTable, AppendError> {
        let record = form.parse()?;
        info!(
            wattage = %record.wattage,
            hours_per_day = %record.hours_per_day,
            source = %record.source,
            "adding…",
        );
        let mut table = self.table.clone();
        table.0.push(record);
        if self.needs_backup {
            let backup_path = self.backup_path();
            warn!(backup_path = %backup_path.display(), "backing up the partially read file…");
            fs::copy(&self.path, &backup_path).map_err(csv::Error::from)?;
        }
        persist(&self.path, &table)?;
        self.needs_backup = false;
        self.table = table;
        Ok(&self.table)
    }
}

/// Replace the file atomically so that a failed write leaves the previous contents intact.
fn persist(path: &Path, table: &RecordTable) -> csv::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory)?;
    table.write_to(&mut file)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use tempfile::TempDir;

    use super::*;

    fn form<'a>(
        name: &'a str,
        wattage: &'a str,
        hours: &'a str,
        source: &'a str,
    ) -> ApplianceForm<'a> {
        ApplianceForm { name, wattage, hours, source }
    }

    fn data_file(directory: &TempDir) -> PathBuf {
        directory.path().join("appliances.csv")
    }

    #[test]
    fn test_load_creates_empty_file() {
        let directory = TempDir::new().unwrap();
        let path = data_file(&directory);

        let store = RecordStore::load(&path);

        assert!(store.table().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "Appliance,Wattage,Hours,Source\n");
    }

    #[test]
    fn test_append_persists_and_reloads() {
        let directory = TempDir::new().unwrap();
        let path = data_file(&directory);
        let mut store = RecordStore::load(&path);

        store.append(&form("Lamp", "60", "5", "Renewable")).unwrap();
        let table = store.append(&form("Heater", "1000", "3.5", "Non-Renewable")).unwrap();
        assert_eq!(table.len(), 2);

        let reloaded = RecordStore::load(&path);
        assert_eq!(reloaded.table(), store.table());
        assert_eq!(reloaded.table()[0].name, "Lamp");
        assert_eq!(reloaded.table()[1].source, Source::NonRenewable);
        assert_abs_diff_eq!(reloaded.table()[1].hours_per_day.0, 3.5);
    }

    #[test]
    fn test_round_trip_preserves_order_and_values() {
        let table = RecordTable::from(vec![
            ApplianceRecord::builder()
                .name("Fridge, kitchen")
                .wattage(Watts(150.0))
                .hours_per_day(Hours(24.0))
                .source(Source::NonRenewable)
                .build(),
            ApplianceRecord::builder()
                .name("Fridge, kitchen")
                .wattage(Watts(0.1))
                .hours_per_day(Hours(1.0 / 3.0))
                .source(Source::Renewable)
                .build(),
        ]);
        let mut buffer = Vec::new();
        table.write_to(&mut buffer).unwrap();
        assert_eq!(RecordTable::read_from(buffer.as_slice()).unwrap(), (table, 0));
    }

    #[test]
    fn test_read_tolerates_spaces_after_commas() {
        let text = "Appliance, Wattage, Hours, Source\nFridge, 150.0, 24.0, Non-Renewable\n";
        let (table, n_skipped) = RecordTable::read_from(text.as_bytes()).unwrap();
        assert_eq!(n_skipped, 0);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].wattage, Watts(150.0));
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let directory = TempDir::new().unwrap();
        let path = data_file(&directory);
        let mut store = RecordStore::load(&path);
        store.append(&form("Lamp", "60", "5", "Renewable")).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        for (invalid, expected) in [
            (form("", "60", "5", "Renewable"), Field::Name),
            (form("Lamp", " ", "5", "Renewable"), Field::Wattage),
            (form("Lamp", "60", "", "Renewable"), Field::Hours),
            (form("Lamp", "60", "5", ""), Field::Source),
            (form("", "", "", ""), Field::Name),
        ] {
            let error = store.append(&invalid).unwrap_err();
            assert!(matches!(error, AppendError::Validation { field } if field == expected));
        }

        assert_eq!(store.table().len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_non_numeric_fields_are_rejected() {
        let directory = TempDir::new().unwrap();
        let path = data_file(&directory);
        let mut store = RecordStore::load(&path);
        let before = fs::read_to_string(&path).unwrap();

        for (invalid, expected) in [
            (form("Lamp", "sixty", "5", "Renewable"), Field::Wattage),
            (form("Lamp", "60", "5h", "Renewable"), Field::Hours),
            (form("Lamp", "60", "5", "Solar"), Field::Source),
        ] {
            let error = store.append(&invalid).unwrap_err();
            assert!(matches!(error, AppendError::Parse { field, .. } if field == expected));
        }

        assert!(store.table().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_negative_values_are_accepted() {
        let directory = TempDir::new().unwrap();
        let mut store = RecordStore::load(data_file(&directory));
        let table = store.append(&form("Generator", "-100", "0", "Renewable")).unwrap();
        assert_eq!(table[0].wattage, Watts(-100.0));
    }

    #[test]
    fn test_load_accepts_lenient_source_labels() {
        let directory = TempDir::new().unwrap();
        let path = data_file(&directory);
        fs::write(
            &path,
            "Appliance,Wattage,Hours,Source\nFridge,150,24,non-renewable\nPanel,0,8,renewable\n",
        )
        .unwrap();

        let store = RecordStore::load(&path);

        assert_eq!(store.table().len(), 2);
        assert_eq!(store.table()[0].source, Source::NonRenewable);
        assert_eq!(store.table()[1].source, Source::Renewable);
    }

    #[test]
    fn test_malformed_row_is_skipped_and_backed_up() {
        let directory = TempDir::new().unwrap();
        let path = data_file(&directory);
        let original = "Appliance,Wattage,Hours,Source\n\
                        Fridge,150,24,Non-Renewable\n\
                        Panel,lots,8,Renewable\n\
                        TV,100,4,Renewable\n";
        fs::write(&path, original).unwrap();

        let mut store = RecordStore::load(&path);
        assert_eq!(store.table().len(), 2);
        assert_eq!(store.table()[1].name, "TV");

        store.append(&form("Lamp", "60", "5", "Renewable")).unwrap();

        assert_eq!(fs::read_to_string(store.backup_path()).unwrap(), original);
        let (reloaded, n_skipped) = RecordTable::read_from(File::open(&path).unwrap()).unwrap();
        assert_eq!(n_skipped, 0);
        let names: Vec<&str> = reloaded.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, ["Fridge", "TV", "Lamp"]);
    }

    #[test]
    fn test_clean_file_is_not_backed_up() {
        let directory = TempDir::new().unwrap();
        let mut store = RecordStore::load(data_file(&directory));
        store.append(&form("Lamp", "60", "5", "Renewable")).unwrap();
        assert!(!store.backup_path().exists());
    }

    #[test]
    fn test_unreadable_file_is_backed_up_before_rewrite() {
        let directory = TempDir::new().unwrap();
        let path = data_file(&directory);
        fs::write(&path, b"\xff\xfe not a table").unwrap();

        let mut store = RecordStore::load(&path);
        assert!(store.table().is_empty());
        store.append(&form("Lamp", "60", "5", "Renewable")).unwrap();

        assert_eq!(fs::read(store.backup_path()).unwrap(), b"\xff\xfe not a table");
    }

    #[test]
    fn test_input_error_messages() {
        let directory = TempDir::new().unwrap();
        let mut store = RecordStore::load(data_file(&directory));

        let error = store.append(&form("Lamp", "", "5", "Renewable")).unwrap_err();
        assert_eq!(error.to_string(), "Please fill all fields. The wattage is empty.");

        let error = store.append(&form("Lamp", "60", "five", "Renewable")).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Wattage and Hours must be numbers. Got `five` for the hours per day.",
        );

        let error = store.append(&form("Lamp", "60", "5", "Solar")).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Source must be Renewable or Non-Renewable. Got `Solar` for the energy source.",
        );
    }

    #[test]
    fn test_failed_write_keeps_table() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("missing").join("appliances.csv");
        let mut store = RecordStore::load(&path);

        let error = store.append(&form("Lamp", "60", "5", "Renewable")).unwrap_err();

        assert!(matches!(error, AppendError::Persistence(_)));
        assert!(store.table().is_empty());
    }
}
