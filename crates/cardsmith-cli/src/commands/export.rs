//! Export command implementation.

use crate::cli::ExportArgs;
use crate::error::Result;
use crate::output::Formatter;
use cardsmith_store::{export_csv, load_all_records};

/// Execute the export command.
pub fn execute_export(args: ExportArgs, formatter: &Formatter) -> Result<()> {
    let subject = args.subject.as_deref().filter(|s| !s.is_empty());
    let subtopic = args.subtopic.as_deref().filter(|s| !s.is_empty());

    let records: Vec<_> = load_all_records(&args.output)?
        .into_iter()
        .filter(|r| subject.is_none_or(|s| r.subject == s))
        .filter(|r| subtopic.is_none_or(|s| r.subtopic == s))
        .collect();

    if records.is_empty() {
        println!("{}", formatter.warning("No flashcards match; writing header only"));
    }

    let written = export_csv(&records, &args.file)?;
    println!(
        "{}",
        formatter.success(&format!("Exported {} flashcard(s) to {}", written, args.file.display()))
    );
    Ok(())
}
