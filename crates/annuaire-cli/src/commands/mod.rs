//! Command implementations.

pub mod add;
pub mod ingest;
pub mod list;
pub mod replace;
pub mod settings;

pub use self::add::execute_add;
pub use self::ingest::execute_ingest;
pub use self::list::execute_list;
pub use self::replace::execute_replace;
pub use self::settings::execute_settings;

use crate::error::{CliError, Result};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};

/// Read a JSON payload from a file or stdin.
pub(crate) fn read_payload(file: Option<&str>, stdin: bool) -> Result<Value> {
    let json_data = if stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file_path) = file {
        fs::read_to_string(file_path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either --file or --stdin".to_string(),
        ));
    };

    Ok(serde_json::from_str(&json_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_payload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        fs::write(&path, r#"[{"numero": 1, "nom_evenement": "Concert"}]"#).unwrap();

        let payload = read_payload(path.to_str(), false).unwrap();
        assert_eq!(payload[0]["numero"], 1);
    }

    #[test]
    fn test_read_payload_needs_a_source() {
        assert!(matches!(
            read_payload(None, false),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_read_payload_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_payload(path.to_str(), false),
            Err(CliError::Serialization(_))
        ));
    }
}
