//! Row filtering ahead of the mismatch computation.

use std::collections::{HashMap, HashSet};

use crate::catalog::store::ReferenceDatabase;
use crate::core::typing::{TypingRow, TypingTable};
use crate::utils::validation::ValidationError;

/// Codes typed when an allele is unknown. `DRB345*` is not tracked: it is fine for
/// DRB3/4/5 to be absent on either side.
pub const WILDCARD_ALLELES: [&str; 8] = [
    "A*", "B*", "C*", "DRB1*", "DQA1*", "DQB1*", "DPA1*", "DPB1*",
];

/// Split a table into rows whose alleles are all in the database, and the rest
#[must_use]
pub fn filter_unknown(table: TypingTable, db: &ReferenceDatabase) -> (TypingTable, TypingTable) {
    let mut kept = table.empty_like();
    let mut removed = table.empty_like();

    for row in table.rows {
        if row.alleles.iter().all(|a| db.is_known(a)) {
            kept.push(row);
        } else {
            removed.push(row);
        }
    }

    (kept, removed)
}

/// Keep only the rows whose id is present in both tables. Row order is preserved.
#[must_use]
pub fn intersect_by_index(
    mut donors: TypingTable,
    mut recipients: TypingTable,
) -> (TypingTable, TypingTable) {
    let recipient_ids: HashSet<String> = recipients.rows.iter().map(|r| r.id.clone()).collect();
    donors.rows.retain(|row| recipient_ids.contains(&row.id));

    let donor_ids: HashSet<String> = donors.rows.iter().map(|r| r.id.clone()).collect();
    recipients.rows.retain(|row| donor_ids.contains(&row.id));

    (donors, recipients)
}

/// First row/gene where wildcard alleles are placed inconsistently between donor and
/// recipient, or `None`.
///
/// Rows are paired by id; donor rows with no recipient are skipped. For each tracked gene with `<gene>1` and `<gene>2`
/// columns on both sides:
/// - no wildcard, or a wildcard in all four slots, is fine
/// - wildcards only in slot 2 are fine when both slot 1 alleles are equal (a homozygote
///   typed on one chromosome)
/// - any other placement is a violation
#[must_use]
pub fn find_parity_violation(
    donors: &TypingTable,
    recipients: &TypingTable,
) -> Option<ValidationError> {
    let slots: Vec<_> = WILDCARD_ALLELES
        .iter()
        .filter_map(|&wildcard| {
            let gene = wildcard.strip_suffix('*')?;
            Some((
                wildcard,
                gene,
                donors.column_index(&format!("{gene}1"))?,
                donors.column_index(&format!("{gene}2"))?,
                recipients.column_index(&format!("{gene}1"))?,
                recipients.column_index(&format!("{gene}2"))?,
            ))
        })
        .collect();

    let by_id: HashMap<&str, &TypingRow> = recipients
        .rows
        .iter()
        .map(|row| (row.id.as_str(), row))
        .collect();

    for donor in &donors.rows {
        let Some(recipient) = by_id.get(donor.id.as_str()) else {
            continue;
        };
        for &(wildcard, gene, d1, d2, r1, r2) in &slots {
            let d = [cell(&donor.alleles, d1), cell(&donor.alleles, d2)];
            let r = [cell(&recipient.alleles, r1), cell(&recipient.alleles, r2)];

            if !wildcard_parity_ok(wildcard, d, r) {
                return Some(ValidationError::UnknownAlleleParity {
                    row: donor.id.clone(),
                    gene: gene.to_string(),
                });
            }
        }
    }

    None
}

fn cell(alleles: &[String], i: usize) -> &str {
    alleles.get(i).map_or("", String::as_str)
}

fn wildcard_parity_ok(wildcard: &str, donor: [&str; 2], recipient: [&str; 2]) -> bool {
    let [d1, d2] = donor.map(|a| a == wildcard);
    let [r1, r2] = recipient.map(|a| a == wildcard);

    match (d1, d2, r1, r2) {
        (false, false, false, false) | (true, true, true, true) => true,
        (false, _, false, _) => donor[0] == recipient[0],
        _ => false,
    }
}

/// Wildcard parity between donor and recipient, see [`find_parity_violation`]
#[must_use]
pub fn check_unknown_count_parity(donors: &TypingTable, recipients: &TypingTable) -> bool {
    find_parity_violation(donors, recipients).is_none()
}
