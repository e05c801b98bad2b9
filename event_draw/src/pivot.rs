use std::collections::BTreeMap;

use crate::config::*;
use crate::report::Reporter;

// (name, email)
type Identity = (String, String);

/// Reshapes survey answers from one row per answer into one row per participant.
///
/// Rows without an answer are dropped first: a missing value means that the
/// participant did not give this answer, not that the answer was blank. The
/// remaining answers keep their original order within each participant, and
/// the number of answer columns is the largest number of answers given by any
/// participant. Participants with fewer answers are padded with `None`.
///
/// The participants are returned sorted by (name, email).
pub fn pivot(rows: &[AnswerRow], reporter: &dyn Reporter) -> Result<PivotTable, PivotError> {
    let mut groups: BTreeMap<Identity, Vec<(usize, String)>> = BTreeMap::new();
    let mut skipped = 0;
    for (row_idx, row) in rows.iter().enumerate() {
        let answer = match row.answer_value.as_deref() {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let name = identity_part(&row.participant_name, row_idx, "name")?;
        let email = identity_part(&row.participant_email, row_idx, "email")?;
        groups.entry((name, email)).or_default().push((row_idx, answer));
    }
    reporter.info(&format!(
        "pivot: {} rows, {} without an answer, {} participants",
        rows.len(),
        skipped,
        groups.len()
    ));

    // The ordinal of each answer inside its group is its answer index.
    let width = groups.values().map(|answers| answers.len()).max().unwrap_or(0);

    let mut participants: Vec<PivotedParticipant> = Vec::with_capacity(groups.len());
    for ((name, email), answers) in groups {
        let mut slots: Vec<Option<String>> = vec![None; width];
        for (index, (row_idx, answer)) in answers.into_iter().enumerate() {
            match slots.get_mut(index) {
                Some(slot @ None) => *slot = Some(answer),
                _ => {
                    return DataShapeSnafu {
                        row: row_idx,
                        index,
                        width,
                    }
                    .fail()
                }
            }
        }
        participants.push(PivotedParticipant {
            name,
            email,
            answers: slots,
        });
    }
    reporter.info(&format!(
        "pivot: {} participants over {} answer columns",
        participants.len(),
        width
    ));
    Ok(PivotTable {
        width,
        participants,
    })
}

fn identity_part(
    value: &Option<String>,
    row: usize,
    column: &'static str,
) -> Result<String, PivotError> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => ConfigurationSnafu { row, column }.fail(),
    }
}
