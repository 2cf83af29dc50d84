use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::debug;

use crate::error::{PrsError, Result};

/// Reads a headerless, comma separated matrix of reals.
pub fn read_csv_matrix(path: &Path) -> Result<Vec<Vec<f64>>> {
    let csv_err = |source: csv::Error| PrsError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record: StringRecord = record.map_err(csv_err)?;
        let row: Vec<f64> = record
            .iter()
            .enumerate()
            .map(|(j, field)| {
                field.parse::<f64>().map_err(|_| {
                    PrsError::InputMalformed(format!(
                        "{}: row {} column {}: `{}` is not a number",
                        path.display(),
                        i,
                        j,
                        field
                    ))
                })
            })
            .collect::<Result<_>>()?;
        rows.push(row);
    }

    if rows.is_empty() || rows[0].is_empty() {
        return Err(PrsError::InputMalformed(format!(
            "{} holds no values",
            path.display()
        )));
    }
    debug!(
        "read {} rows of {} values from {}",
        rows.len(),
        rows[0].len(),
        path.display()
    );
    Ok(rows)
}

/// Writes rows as headerless CSV in scientific notation, creating the
/// parent directory if needed.
pub fn write_csv_matrix(path: &Path, rows: &[Vec<f64>]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PrsError::io(parent, e))?;
    }
    let csv_err = |source: csv::Error| PrsError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    for row in rows {
        writer
            .write_record(row.iter().map(|x| format!("{:E}", x)))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| PrsError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("pheno_data_test.csv");
        let rows: Vec<Vec<f64>> = vec![vec![1.0, -0.015625], vec![5.0, 1234.5]];
        write_csv_matrix(&path, &rows).unwrap();
        let text: String = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("1E0,-1.5625E-2"));
        assert_eq!(read_csv_matrix(&path).unwrap(), rows);
    }

    #[test]
    fn rejects_non_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.csv");
        fs::write(&path, "0,1,2\n1,x,0\n").unwrap();
        assert!(matches!(
            read_csv_matrix(&path),
            Err(PrsError::InputMalformed(_))
        ));
    }

    #[test]
    fn rejects_ragged_rows_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let ragged = dir.path().join("ragged.csv");
        fs::write(&ragged, "0,1,2\n1,0\n").unwrap();
        assert!(matches!(read_csv_matrix(&ragged), Err(PrsError::Csv { .. })));

        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "").unwrap();
        assert!(matches!(
            read_csv_matrix(&empty),
            Err(PrsError::InputMalformed(_))
        ));
    }

    #[test]
    fn missing_file_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_csv_matrix(&dir.path().join("missing.csv")),
            Err(PrsError::Csv { .. })
        ));
    }
}
