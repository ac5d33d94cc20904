//! Per-batch file writer.
//!
//! Every flushed batch becomes a CSV file (UTF-8 with BOM, every cell
//! quoted, CRLF line endings) and, unless disabled, an env-style file of
//! `TICKET_<id>_<FIELD>="value"` lines. Both list records sorted by id.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use tracing::debug;
use zendesk_api_rs::models::Record;
use zendesk_harvest_rs::{Batch, BatchSink, OutputError};

use super::helpers::{batch_file_name, cell_value, column_names, env_var_name, sorted_by_id};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes batch files into one directory under one run stamp.
#[derive(Debug)]
pub struct BatchFileWriter {
    dir: PathBuf,
    stamp: String,
    write_env: bool,
    quiet: bool,
    use_colors: bool,
    written: Vec<PathBuf>,
}

impl BatchFileWriter {
    /// Creates a writer, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>, stamp: impl Into<String>) -> Result<Self, OutputError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| OutputError::io(&dir, e))?;
        Ok(Self {
            dir,
            stamp: stamp.into(),
            write_env: true,
            quiet: true,
            use_colors: false,
            written: Vec::new(),
        })
    }

    /// Enables or disables the env-style file.
    pub fn with_env_file(mut self, write_env: bool) -> Self {
        self.write_env = write_env;
        self
    }

    /// Prints a line per written file unless `quiet`.
    pub fn with_reporting(mut self, quiet: bool, use_colors: bool) -> Self {
        self.quiet = quiet;
        self.use_colors = use_colors;
        self
    }

    /// Every file written so far, in order.
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }

    fn report(&self, message: &str, path: &Path) {
        if self.quiet {
            return;
        }
        if self.use_colors {
            println!("{} -> {}", message, path.display().green());
        } else {
            println!("{} -> {}", message, path.display());
        }
    }

    fn write_csv(&self, path: &Path, records: &[&Record]) -> Result<(), OutputError> {
        let columns = column_names(records.iter().copied());

        let mut file = File::create(path).map_err(|e| OutputError::io(path, e))?;
        file.write_all(UTF8_BOM).map_err(|e| OutputError::io(path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);

        let csv_err = |e: csv::Error| OutputError::io(path, e.into());
        writer.write_record(&columns).map_err(csv_err)?;
        for record in records {
            writer
                .write_record(columns.iter().map(|c| cell_value(record.get(c))))
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|e| OutputError::io(path, e))?;
        Ok(())
    }

    fn write_env(&self, path: &Path, records: &[&Record]) -> Result<(), OutputError> {
        let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
        let mut out = BufWriter::new(file);

        for record in records {
            let id = match record.get("id") {
                None | Some(serde_json::Value::Null) => continue,
                Some(_) => record.text("id"),
            };
            for (key, value) in record.public_fields() {
                writeln!(out, "{}=\"{}\"", env_var_name(&id, key), cell_value(Some(value)))
                    .map_err(|e| OutputError::io(path, e))?;
            }
        }
        out.flush().map_err(|e| OutputError::io(path, e))?;
        Ok(())
    }
}

impl BatchSink for BatchFileWriter {
    fn write_batch(&mut self, batch: &Batch) -> Result<usize, OutputError> {
        let records = sorted_by_id(&batch.records);

        let csv_path = self.dir.join(batch_file_name(&self.stamp, batch.index, "csv"));
        self.write_csv(&csv_path, &records)?;
        self.report(&format!("Wrote {} tickets", records.len()), &csv_path);
        debug!(path = %csv_path.display(), records = records.len(), "wrote csv");
        self.written.push(csv_path);

        if self.write_env {
            let env_path = self.dir.join(batch_file_name(&self.stamp, batch.index, "env"));
            self.write_env(&env_path, &records)?;
            self.report("Wrote ticket-variable file", &env_path);
            self.written.push(env_path);
        }

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const STAMP: &str = "2025-07-31_02-52-31";

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn sample_batch() -> Batch {
        let mut second = record(json!({
            "id": 20,
            "subject": "Printer\r\non fire",
            "status": "open",
            "tags": ["vip"]
        }));
        second.insert("_role", "cc");
        Batch {
            index: 3,
            records: vec![
                second,
                record(json!({"id": 10, "subject": "Say \"hi\"", "due_at": null})),
            ],
        }
    }

    #[test]
    fn test_csv_layout() {
        let dir = TempDir::new().unwrap();
        let mut writer = BatchFileWriter::new(dir.path(), STAMP).unwrap();
        assert_eq!(writer.write_batch(&sample_batch()).unwrap(), 2);

        let path = dir
            .path()
            .join("zendesk_tickets_2025-07-31_02-52-31_batch_00003.csv");
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], r#""id","due_at","status","subject","tags""#);
        assert_eq!(lines[1], r#""10","","","Say ""hi""","""#);
        assert_eq!(
            lines[2],
            r#""20","","open","Printer  on fire","[""vip""]""#
        );
        assert_eq!(lines[3], "");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_env_file() {
        let dir = TempDir::new().unwrap();
        let mut writer = BatchFileWriter::new(dir.path(), STAMP).unwrap();
        let mut batch = sample_batch();
        batch.records.push(record(json!({"subject": "no id"})));
        writer.write_batch(&batch).unwrap();

        let env = fs::read_to_string(
            dir.path()
                .join("zendesk_tickets_2025-07-31_02-52-31_batch_00003.env"),
        )
        .unwrap();
        let lines: Vec<&str> = env.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"TICKET_10_ID="10""#,
                r#"TICKET_10_SUBJECT="Say "hi"""#,
                r#"TICKET_10_DUE_AT="""#,
                r#"TICKET_20_ID="20""#,
                r#"TICKET_20_SUBJECT="Printer  on fire""#,
                r#"TICKET_20_STATUS="open""#,
                r#"TICKET_20_TAGS="["vip"]""#,
            ]
        );
        assert_eq!(writer.written_files().len(), 2);
    }

    #[test]
    fn test_env_file_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let mut writer = BatchFileWriter::new(dir.path(), STAMP)
            .unwrap()
            .with_env_file(false);
        writer.write_batch(&sample_batch()).unwrap();
        assert_eq!(writer.written_files().len(), 1);
        assert!(writer.written_files()[0]
            .to_string_lossy()
            .ends_with("_batch_00003.csv"));
    }

    #[test]
    fn test_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("exports").join("july");
        let mut writer = BatchFileWriter::new(&nested, STAMP).unwrap();
        writer.write_batch(&sample_batch()).unwrap();
        assert!(nested.is_dir());
    }
}
