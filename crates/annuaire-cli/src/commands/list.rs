//! List command implementation.

use crate::cli::ListArgs;
use crate::error::Result;
use crate::output::Formatter;
use annuaire_server::AppIngestor;

/// Execute the list command.
pub async fn execute_list(
    args: ListArgs,
    ingestor: &AppIngestor,
    formatter: &Formatter,
) -> Result<()> {
    let kind = args.kind.into();
    let records = ingestor.list(kind).await?;

    println!("{}", formatter.format_records(kind, &records)?);

    Ok(())
}
