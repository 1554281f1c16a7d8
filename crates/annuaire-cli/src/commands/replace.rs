//! Replace command implementation.

use super::read_payload;
use crate::cli::PayloadArgs;
use crate::error::Result;
use crate::output::Formatter;
use annuaire_domain::RecordKind;
use annuaire_server::AppIngestor;

/// Execute the replace command.
pub async fn execute_replace(
    args: PayloadArgs,
    ingestor: &AppIngestor,
    formatter: &Formatter,
) -> Result<()> {
    let kind: RecordKind = args.kind.into();
    let payload = read_payload(args.file.as_deref(), args.stdin)?;

    let updated = ingestor.replace(kind, &payload).await?;
    println!(
        "{}",
        formatter.success(&format!("Replaced {} entries in {}", updated, kind.table()))
    );

    Ok(())
}
