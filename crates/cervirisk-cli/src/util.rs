use anyhow::Result;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

/// Fail early on a training data path that is not an existing `.csv` file.
pub fn validate_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    if ext.as_deref() != Some("csv") {
        anyhow::bail!("File must have a .csv extension: {}", path);
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

pub fn write_bytes_to_file<P: AsRef<Path>>(path: P, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path.as_ref())?;
    file.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_extension_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let tsv = dir.path().join("data.tsv");
        write_bytes_to_file(&tsv, b"a\tb\n").unwrap();
        assert!(validate_csv_file(tsv.to_str().unwrap()).is_err());

        let csv = dir.path().join("data.CSV");
        write_bytes_to_file(&csv, b"a,b\n").unwrap();
        assert!(validate_csv_file(csv.to_str().unwrap()).is_ok());
        assert!(validate_csv_file("does/not/exist.csv").is_err());
    }
}
