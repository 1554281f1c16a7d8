//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use annuaire_domain::RecordKind;
use annuaire_pipeline::Source;
use annuaire_server::AppIngestor;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Execute the ingest command.
pub async fn execute_ingest(
    args: IngestArgs,
    ingestor: &AppIngestor,
    formatter: &Formatter,
) -> Result<()> {
    let kind: RecordKind = args.kind.into();
    let source = source_from_args(&args)?;

    let result = ingestor.ingest(kind, source).await?;
    println!("{}", formatter.format_batch(kind, &result)?);

    Ok(())
}

/// Build the ingestion source, with the same precedence as the HTTP form
fn source_from_args(args: &IngestArgs) -> Result<Source> {
    let file = match &args.file {
        Some(path) => {
            let bytes = fs::read(path)?;
            let name = Path::new(path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(path)
                .to_string();
            Some((name, bytes))
        }
        None => None,
    };

    let text = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    } else {
        args.text.clone()
    };

    Source::select(args.url.clone(), file, text)
        .map_err(|e| CliError::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::KindArg;

    fn args() -> IngestArgs {
        IngestArgs {
            kind: KindArg::Annuaire,
            url: None,
            file: None,
            text: None,
            stdin: false,
        }
    }

    #[test]
    fn test_file_source_keeps_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partenaires.csv");
        fs::write(&path, "nom,prenom\nDupont,Jean\n").unwrap();

        let source = source_from_args(&IngestArgs {
            file: Some(path.to_string_lossy().into_owned()),
            text: Some("ignored".to_string()),
            ..args()
        })
        .unwrap();

        match source {
            Source::File { name, bytes } => {
                assert_eq!(name, "partenaires.csv");
                assert!(!bytes.is_empty());
            }
            other => panic!("Expected a file source, got {:?}", other),
        }
    }

    #[test]
    fn test_no_source_is_invalid_input() {
        let err = source_from_args(&args()).unwrap_err();
        assert!(err.to_string().contains("No input provided"));
    }
}
