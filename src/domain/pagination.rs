//! Harvest pagination state machine.
//!
//! The listing page paginates by infinite scroll: every scroll triggers one
//! request to the search endpoint, and the harvester awaits the intercepted
//! response. Stop/continue decisions live here as a pure transition function
//! so that "stalled" and "source exhausted" are distinct, testable outcomes.
//!
//! ```text
//! Init ──navigated──▶ AwaitingFirstBatch ─┐
//!                                         ├─ batch, budget left ──▶ Scrolling ──scrolled──▶ AwaitingBatch
//!                      AwaitingBatch ─────┤
//!                                         ├─ bad status ──▶ (same awaiting state)
//!                                         ├─ empty + !hasMore / budget spent ──▶ Done
//!                                         └─ timeout (tolerance reached) ──▶ Aborted
//! ```

use serde::{Deserialize, Serialize};

/// Where the harvester currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestState {
    Init,
    AwaitingFirstBatch,
    Scrolling,
    AwaitingBatch,
    /// Source exhausted or cycle budget spent
    Done,
    /// No response arrived within the timeout
    Aborted,
}

impl HarvestState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    pub const fn is_awaiting(self) -> bool {
        matches!(self, Self::AwaitingFirstBatch | Self::AwaitingBatch)
    }
}

/// Things that happen to the harvester between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestEvent {
    Navigated,
    Scrolled,
    /// No intercepted response within the bounded wait
    TimedOut,
    /// A response arrived with a non-success HTTP status
    BadStatus(u16),
    /// A response was decoded; `listings` may be zero for malformed frames
    Decoded { listings: usize, has_more: bool },
}

/// Cursor carried across cycles. Single-use per harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    state: HarvestState,
    /// Awaits performed so far; each one consumes a unit of the budget
    cycle: u32,
    max_cycles: u32,
    consecutive_timeouts: u32,
    stall_tolerance: u32,
    exhausted: bool,
}

impl PaginationState {
    pub fn new(max_cycles: u32, stall_tolerance: u32) -> Self {
        Self {
            state: HarvestState::Init,
            cycle: 0,
            max_cycles,
            consecutive_timeouts: 0,
            stall_tolerance: stall_tolerance.max(1),
            exhausted: false,
        }
    }

    pub const fn state(&self) -> HarvestState {
        self.state
    }

    /// Number of awaits performed (1-based index of the current cycle while awaiting)
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    pub const fn max_cycles(&self) -> u32 {
        self.max_cycles
    }

    pub const fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts
    }

    /// Set once the source reported `hasMore = false`
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    const fn budget_left(&self) -> bool {
        self.cycle < self.max_cycles
    }

    /// Mark the start of an await; the cycle counter advances here so that
    /// every response (good, bad or missing) consumes budget.
    pub fn begin_cycle(&mut self) -> u32 {
        self.cycle += 1;
        self.cycle
    }

    /// Apply an event and return the new state. Events that do not apply to
    /// the current state leave it untouched; terminal states are absorbing.
    pub fn apply(&mut self, event: HarvestEvent) -> HarvestState {
        let next = self.transition(event);
        self.state = next;
        next
    }

    fn transition(&mut self, event: HarvestEvent) -> HarvestState {
        use HarvestEvent as E;
        use HarvestState as S;

        match (self.state, event) {
            (S::Done | S::Aborted, _) => self.state,

            (S::Init, E::Navigated) => {
                if self.max_cycles == 0 {
                    S::Done
                } else {
                    S::AwaitingFirstBatch
                }
            }

            (S::Scrolling, E::Scrolled) => S::AwaitingBatch,

            (awaiting, E::TimedOut) if awaiting.is_awaiting() => {
                self.consecutive_timeouts += 1;
                if self.consecutive_timeouts >= self.stall_tolerance {
                    S::Aborted
                } else if self.budget_left() {
                    awaiting
                } else {
                    S::Done
                }
            }

            (awaiting, E::BadStatus(_)) if awaiting.is_awaiting() => {
                self.consecutive_timeouts = 0;
                if self.budget_left() { awaiting } else { S::Done }
            }

            (awaiting, E::Decoded { listings, has_more }) if awaiting.is_awaiting() => {
                self.consecutive_timeouts = 0;
                if listings == 0 && !has_more {
                    self.exhausted = true;
                    S::Done
                } else if self.budget_left() {
                    S::Scrolling
                } else {
                    S::Done
                }
            }

            (current, _) => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaiting(max_cycles: u32) -> PaginationState {
        let mut state = PaginationState::new(max_cycles, 1);
        state.apply(HarvestEvent::Navigated);
        state.begin_cycle();
        state
    }

    #[test]
    fn navigation_enters_first_await() {
        let mut state = PaginationState::new(3, 1);
        assert_eq!(state.apply(HarvestEvent::Navigated), HarvestState::AwaitingFirstBatch);
    }

    #[test]
    fn zero_budget_finishes_immediately() {
        let mut state = PaginationState::new(0, 1);
        assert_eq!(state.apply(HarvestEvent::Navigated), HarvestState::Done);
    }

    #[test]
    fn first_timeout_aborts() {
        let mut state = awaiting(3);
        assert_eq!(state.apply(HarvestEvent::TimedOut), HarvestState::Aborted);
        assert_eq!(state.consecutive_timeouts(), 1);
        assert!(state.state().is_terminal());
    }

    #[test]
    fn higher_stall_tolerance_keeps_waiting() {
        let mut state = PaginationState::new(3, 2);
        state.apply(HarvestEvent::Navigated);
        state.begin_cycle();
        assert_eq!(state.apply(HarvestEvent::TimedOut), HarvestState::AwaitingFirstBatch);
        state.begin_cycle();
        assert_eq!(state.apply(HarvestEvent::TimedOut), HarvestState::Aborted);
    }

    #[test]
    fn bad_status_reawaits_without_scrolling() {
        let mut state = awaiting(3);
        assert_eq!(state.apply(HarvestEvent::BadStatus(503)), HarvestState::AwaitingFirstBatch);
        assert_eq!(state.cycle(), 1);
        state.begin_cycle();
        assert_eq!(state.cycle(), 2);
    }

    #[test]
    fn bad_status_on_last_cycle_finishes() {
        let mut state = awaiting(1);
        assert_eq!(state.apply(HarvestEvent::BadStatus(500)), HarvestState::Done);
    }

    #[test]
    fn batch_scrolls_while_budget_remains() {
        let mut state = awaiting(2);
        let next = state.apply(HarvestEvent::Decoded { listings: 3, has_more: true });
        assert_eq!(next, HarvestState::Scrolling);
        assert_eq!(state.apply(HarvestEvent::Scrolled), HarvestState::AwaitingBatch);
        state.begin_cycle();
        let last = state.apply(HarvestEvent::Decoded { listings: 3, has_more: true });
        assert_eq!(last, HarvestState::Done);
        assert!(!state.is_exhausted());
    }

    #[test]
    fn empty_list_without_more_is_done() {
        let mut state = awaiting(5);
        let next = state.apply(HarvestEvent::Decoded { listings: 0, has_more: false });
        assert_eq!(next, HarvestState::Done);
        assert!(state.is_exhausted());
    }

    #[test]
    fn empty_list_with_more_continues() {
        let mut state = awaiting(5);
        let next = state.apply(HarvestEvent::Decoded { listings: 0, has_more: true });
        assert_eq!(next, HarvestState::Scrolling);
    }

    #[test]
    fn response_resets_timeout_streak() {
        let mut state = PaginationState::new(5, 2);
        state.apply(HarvestEvent::Navigated);
        state.begin_cycle();
        state.apply(HarvestEvent::TimedOut);
        state.begin_cycle();
        state.apply(HarvestEvent::Decoded { listings: 1, has_more: true });
        assert_eq!(state.consecutive_timeouts(), 0);
    }

    #[test]
    fn terminal_states_absorb_events() {
        let mut state = awaiting(3);
        state.apply(HarvestEvent::TimedOut);
        assert_eq!(
            state.apply(HarvestEvent::Decoded { listings: 3, has_more: true }),
            HarvestState::Aborted
        );
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let mut state = PaginationState::new(3, 1);
        assert_eq!(state.apply(HarvestEvent::Scrolled), HarvestState::Init);
        assert_eq!(state.apply(HarvestEvent::TimedOut), HarvestState::Init);
    }
}
