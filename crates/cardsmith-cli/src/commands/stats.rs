//! Stats command implementation.

use crate::cli::StatsArgs;
use crate::error::Result;
use crate::output::{Formatter, StoreCount};
use cardsmith_domain::FlashcardRecord;
use cardsmith_store::load_all_records;
use std::collections::BTreeMap;

/// Execute the stats command.
pub fn execute_stats(args: StatsArgs, formatter: &Formatter) -> Result<()> {
    let records = load_all_records(&args.output)?;
    let counts = count_by_topic(&records, args.subject.as_deref(), args.subtopic.as_deref());
    println!("{}", formatter.format_store_counts(&counts)?);
    Ok(())
}

/// Count records per (subject, subtopic), sorted, with optional filters.
///
/// Blank filters match everything.
pub fn count_by_topic(
    records: &[FlashcardRecord],
    subject: Option<&str>,
    subtopic: Option<&str>,
) -> Vec<StoreCount> {
    let subject = subject.filter(|s| !s.is_empty());
    let subtopic = subtopic.filter(|s| !s.is_empty());

    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for record in records {
        if subject.is_some_and(|s| record.subject != s) || subtopic.is_some_and(|s| record.subtopic != s) {
            continue;
        }
        *counts
            .entry((record.subject.as_str(), record.subtopic.as_str()))
            .or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((subject, subtopic), cards)| StoreCount {
            subject: subject.to_string(),
            subtopic: subtopic.to_string(),
            cards,
        })
        .collect()
}
