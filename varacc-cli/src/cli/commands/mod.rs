pub mod cluster;
pub mod deprecate;
pub mod import;
pub mod release;
pub mod stats;
pub mod submit;

use serde::de::DeserializeOwned;
use std::io::{BufRead, BufReader};
use std::path::Path;
use varacc_core::{Accession, VarAccError, VarAccResult};

/// Parse a JSON lines file, skipping blank lines
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> VarAccResult<Vec<T>> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            VarAccError::Serialization(format!("{}:{}: {}", path.display(), index + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Accept `123` as well as an external identifier such as `rs123`
pub fn parse_accession(value: &str, prefix: &str) -> VarAccResult<Accession> {
    let trimmed = value.trim();
    let digits = match trimmed.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &trimmed[prefix.len()..],
        _ => trimmed,
    };
    digits
        .parse()
        .map_err(|_| VarAccError::InvalidInput(format!("'{}' is not an accession", value)))
}
