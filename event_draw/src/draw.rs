use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snafu::ensure;

use crate::config::*;

/// Draws winners out of a pool of eligible tickets.
///
/// The source of randomness is owned by the draw so that tests (or an operator
/// who wants to replay a draw) can pass a seeded generator.
pub struct LotteryDraw<R: Rng = StdRng> {
    rng: R,
}

impl LotteryDraw<StdRng> {
    /// A draw seeded from the operating system.
    pub fn from_entropy() -> LotteryDraw<StdRng> {
        LotteryDraw::new(StdRng::from_entropy())
    }

    /// A reproducible draw: the same seed and pool give the same winners.
    pub fn from_seed(seed: u64) -> LotteryDraw<StdRng> {
        LotteryDraw::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> LotteryDraw<R> {
    pub fn new(rng: R) -> LotteryDraw<R> {
        LotteryDraw { rng }
    }

    /// Draws `count` distinct winners, stamped with the current local time.
    pub fn draw(
        &mut self,
        eligible_pool: &[ParticipantRecord],
        count: i64,
    ) -> Result<Vec<WinnerRecord>, LotteryError> {
        self.draw_at(eligible_pool, count, Local::now().naive_local())
    }

    /// Draws `count` distinct winners uniformly, without replacement.
    ///
    /// The draw is all or nothing: if the pool is too small, no winner is
    /// returned at all.
    pub fn draw_at(
        &mut self,
        eligible_pool: &[ParticipantRecord],
        count: i64,
        at: NaiveDateTime,
    ) -> Result<Vec<WinnerRecord>, LotteryError> {
        ensure!(count > 0, InvalidRequestSnafu { count });
        let requested = count as usize;
        let available = eligible_pool.len();
        ensure!(
            requested <= available,
            InsufficientPoolSnafu {
                requested,
                available
            }
        );

        let draw_timestamp = DrawTimestamp::at(at);
        let winners = rand::seq::index::sample(&mut self.rng, available, requested)
            .into_iter()
            .map(|idx| WinnerRecord {
                participant: eligible_pool[idx].clone(),
                draw_timestamp: draw_timestamp.clone(),
            })
            .collect();
        Ok(winners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn pool(n: usize) -> Vec<ParticipantRecord> {
        (0..n)
            .map(|i| {
                ParticipantRecord::new(
                    &format!("P{}", i),
                    &format!("p{}@example.com", i),
                    &format!("{}", i + 1),
                    Role::Visitor,
                )
            })
            .collect()
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 5))
            .unwrap()
    }

    #[test]
    fn draws_distinct_tickets() {
        let candidates = pool(20);
        let mut lottery = LotteryDraw::from_seed(7);
        let winners = lottery.draw_at(&candidates, 20, noon()).unwrap();
        assert_eq!(winners.len(), 20);
        let tickets: HashSet<&str> = winners
            .iter()
            .map(|w| w.participant.ticket_id.as_str())
            .collect();
        assert_eq!(tickets.len(), 20);
    }

    #[test]
    fn stamps_the_draw_time() {
        let mut lottery = LotteryDraw::from_seed(1);
        let winners = lottery.draw_at(&pool(3), 2, noon()).unwrap();
        for w in winners.iter() {
            assert_eq!(w.draw_timestamp.as_str(), "2024-05-01 12:30:05");
            assert_eq!(w.draw_timestamp.parsed(), Some(noon()));
        }
    }

    #[test]
    fn same_seed_same_winners() {
        let candidates = pool(50);
        let a = LotteryDraw::from_seed(42)
            .draw_at(&candidates, 5, noon())
            .unwrap();
        let b = LotteryDraw::from_seed(42)
            .draw_at(&candidates, 5, noon())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_positive_counts() {
        let mut lottery = LotteryDraw::from_seed(3);
        for count in [0, -1, -100] {
            let err = lottery.draw_at(&pool(3), count, noon()).unwrap_err();
            assert!(matches!(err, LotteryError::InvalidRequest { .. }));
        }
    }

    #[test]
    fn rejects_too_large_requests() {
        let mut lottery = LotteryDraw::from_seed(3);
        let err = lottery.draw_at(&pool(3), 5, noon()).unwrap_err();
        assert!(matches!(
            err,
            LotteryError::InsufficientPool {
                requested: 5,
                available: 3
            }
        ));
        assert_eq!(err.shortfall(), Some(2));
    }

    #[test]
    fn empty_pool_cannot_draw() {
        let mut lottery = LotteryDraw::from_seed(3);
        let err = lottery.draw_at(&[], 1, noon()).unwrap_err();
        assert_eq!(err.shortfall(), Some(1));
    }

    #[test]
    fn every_ticket_can_win() {
        // Single-winner draws over a small pool: each ticket shows up.
        let candidates = pool(4);
        let mut lottery = LotteryDraw::from_seed(11);
        let mut seen: HashSet<String> = HashSet::new();
        for _ in 0..200 {
            let w = lottery.draw_at(&candidates, 1, noon()).unwrap();
            seen.insert(w[0].participant.ticket_id.clone());
        }
        assert_eq!(seen.len(), 4);
    }
}
