use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::report::Reporter;

/// Maximum number of wins for a volunteer. Everyone else wins at most once.
pub const MAX_VOLUNTEER_WINS: usize = 2;

/// Who may not win again, as derived from the ledger of past winners.
///
/// This is recomputed for every draw and never stored.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct EligibilityState {
    pub ineligible_names: HashSet<String>,
    pub excluded_ticket_ids: HashSet<String>,
}

impl EligibilityState {
    pub fn from_ledger(ledger: &WinnerLedger, reporter: &dyn Reporter) -> EligibilityState {
        if ledger.is_empty() {
            reporter.info("No previous winners: every ticket is eligible");
            return EligibilityState::default();
        }
        let schema = ledger.schema();

        let ineligible_names = if schema.has_name && schema.has_role {
            names_excluded_by_role(ledger.entries())
        } else {
            // Old ledgers predate the role rule.
            reporter.warn(
                "The winners ledger has no name or role column: the repeat-win rule is skipped, \
                 only the drawn tickets are excluded",
            );
            HashSet::new()
        };

        let excluded_ticket_ids: HashSet<String> = if schema.has_ticket {
            ledger
                .entries()
                .iter()
                .map(|w| w.participant.ticket_id.clone())
                .filter(|t| !t.is_empty())
                .collect()
        } else {
            reporter.warn(
                "The winners ledger has no ticket column: drawn tickets cannot be excluded",
            );
            HashSet::new()
        };

        reporter.info(&format!(
            "{} people are not eligible anymore (previous wins), {} tickets already drawn",
            ineligible_names.len(),
            excluded_ticket_ids.len()
        ));
        EligibilityState {
            ineligible_names,
            excluded_ticket_ids,
        }
    }

    pub fn is_eligible(&self, candidate: &ParticipantRecord) -> bool {
        !self.ineligible_names.contains(&candidate.name)
            && !self.excluded_ticket_ids.contains(&candidate.ticket_id)
    }
}

fn names_excluded_by_role(entries: &[WinnerRecord]) -> HashSet<String> {
    let mut volunteer_wins: HashMap<&str, usize> = HashMap::new();
    let mut excluded: HashSet<String> = HashSet::new();
    for w in entries.iter().filter(|w| !w.participant.name.is_empty()) {
        let name = w.participant.name.as_str();
        if w.participant.role == Role::Volunteer {
            *volunteer_wins.entry(name).or_insert(0) += 1;
        } else {
            excluded.insert(name.to_string());
        }
    }
    excluded.extend(
        volunteer_wins
            .into_iter()
            .filter(|(_, wins)| *wins >= MAX_VOLUNTEER_WINS)
            .map(|(name, _)| name.to_string()),
    );
    excluded
}

/// Returns the candidates that may still win, in their original order.
///
/// A candidate is excluded when its ticket was already drawn, or when its name
/// reached the win limit of its role in the ledger. Duplicated candidates are
/// kept as they are: merging the pools is the job of the caller.
pub fn compute_eligible(
    candidate_pool: &[ParticipantRecord],
    ledger: &WinnerLedger,
    reporter: &dyn Reporter,
) -> Vec<ParticipantRecord> {
    let state = EligibilityState::from_ledger(ledger, reporter);
    let eligible: Vec<ParticipantRecord> = candidate_pool
        .iter()
        .filter(|c| state.is_eligible(c))
        .cloned()
        .collect();
    reporter.info(&format!(
        "{} eligible tickets out of {} candidates",
        eligible.len(),
        candidate_pool.len()
    ));
    eligible
}
