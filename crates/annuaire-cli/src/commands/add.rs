//! Add command implementation.

use super::read_payload;
use crate::cli::PayloadArgs;
use crate::error::Result;
use crate::output::Formatter;
use annuaire_domain::RecordKind;
use annuaire_server::AppIngestor;

/// Execute the add command.
pub async fn execute_add(
    args: PayloadArgs,
    ingestor: &AppIngestor,
    formatter: &Formatter,
) -> Result<()> {
    let kind: RecordKind = args.kind.into();
    let payload = read_payload(args.file.as_deref(), args.stdin)?;

    let stored = ingestor.add(kind, &payload).await?;
    println!(
        "{}",
        formatter.success(&format!(
            "Added {} as {} #{}",
            stored.record.display_name(),
            kind.table(),
            stored.id
        ))
    );

    Ok(())
}
