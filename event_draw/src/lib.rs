/*!
Survey answer pivoting and role-aware prize draws for event registrations.

The crate has three engines, all free of file I/O:

* [pivot()] turns survey answers stored as one row per answer into one row per participant.
* [compute_eligible] filters the candidates using the ledger of past winners: a ticket
  never wins twice, a visitor or a sponsor wins once, a volunteer wins at most twice.
* [LotteryDraw] draws winners uniformly from the eligible pool, with an injectable
  random generator.

[run_lottery] chains the last two and hands back the ledger with the new winners appended,
ready to be written by the caller.

See the [manual] for the file formats used by the `evdraw` command.
*/

mod config;
mod draw;
mod eligibility;
pub mod manual;
mod pivot;
mod report;

use chrono::{Local, NaiveDateTime};
use rand::Rng;

pub use crate::config::*;
pub use crate::draw::LotteryDraw;
pub use crate::eligibility::{compute_eligible, EligibilityState, MAX_VOLUNTEER_WINS};
pub use crate::pivot::pivot;
pub use crate::report::{LogReporter, Reporter};

/// The result of a successful draw.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LotteryOutcome {
    /// The candidates that took part in the draw.
    pub eligible: Vec<ParticipantRecord>,
    /// The new winners, in draw order.
    pub winners: Vec<WinnerRecord>,
    /// The previous ledger followed by the new winners.
    pub ledger: WinnerLedger,
}

/// Runs one draw of `count` winners over the candidates, taking the ledger of
/// previous winners into account.
///
/// Nothing is returned on failure: the caller must only persist
/// [LotteryOutcome::ledger] after a success.
pub fn run_lottery<R: Rng>(
    candidate_pool: &[ParticipantRecord],
    ledger: WinnerLedger,
    count: i64,
    lottery: &mut LotteryDraw<R>,
    reporter: &dyn Reporter,
) -> Result<LotteryOutcome, LotteryError> {
    run_lottery_at(
        candidate_pool,
        ledger,
        count,
        lottery,
        reporter,
        Local::now().naive_local(),
    )
}

/// Same as [run_lottery], with an explicit draw time.
pub fn run_lottery_at<R: Rng>(
    candidate_pool: &[ParticipantRecord],
    mut ledger: WinnerLedger,
    count: i64,
    lottery: &mut LotteryDraw<R>,
    reporter: &dyn Reporter,
    at: NaiveDateTime,
) -> Result<LotteryOutcome, LotteryError> {
    reporter.info(&format!(
        "Drawing {} winners among {} candidates ({} previous winners)",
        count,
        candidate_pool.len(),
        ledger.len()
    ));
    let eligible = compute_eligible(candidate_pool, &ledger, reporter);
    let winners = match lottery.draw_at(&eligible, count, at) {
        Ok(w) => w,
        Err(e) => {
            reporter.warn(&format!("The draw was aborted: {}", e));
            return Err(e);
        }
    };
    ledger.append(&winners);
    reporter.info(&format!(
        "{} new winners, the ledger now holds {} entries",
        winners.len(),
        ledger.len()
    ));
    Ok(LotteryOutcome {
        eligible,
        winners,
        ledger,
    })
}
