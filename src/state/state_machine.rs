use thiserror::Error;

/// Lifecycle of one play-through, from quiz selection to the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayPhase {
    /// Nothing selected yet.
    Idle,
    /// A quiz and its shuffle mode have been chosen.
    ShuffleSelected,
    /// The question window length has been chosen; ready to start.
    TimerSelected,
    /// Questions are being emitted.
    Running,
    /// Every window (and the grace period) has elapsed; counts are being read.
    Finalizing,
    /// Terminal: report delivered or session abandoned.
    Done,
}

impl PlayPhase {
    /// Whether the session can no longer move.
    pub fn is_terminal(self) -> bool {
        matches!(self, PlayPhase::Done)
    }
}

/// Events that can be applied to a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayEvent {
    /// The player picked a quiz and a shuffle mode.
    ShuffleChosen,
    /// The player picked an allowed question window.
    TimerChosen,
    /// Emission begins.
    Start,
    /// The last window and the grace period are over, or emission failed.
    QuestionsExhausted,
    /// The report has been computed and delivered.
    Finalized,
    /// Superseded, cancelled or shut down.
    Abandon,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: PlayPhase,
    /// The event that cannot be applied from this phase.
    pub event: PlayEvent,
}

/// State machine guarding the play flow of a single session.
#[derive(Debug, Clone)]
pub struct PlayStateMachine {
    phase: PlayPhase,
    version: usize,
}

impl Default for PlayStateMachine {
    fn default() -> Self {
        Self {
            phase: PlayPhase::Idle,
            version: 0,
        }
    }
}

impl PlayStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> PlayPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Apply `event`, returning the new phase. The machine is left untouched on error.
    pub fn apply(&mut self, event: PlayEvent) -> Result<PlayPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: PlayEvent) -> Result<PlayPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (PlayPhase::Idle, PlayEvent::ShuffleChosen) => PlayPhase::ShuffleSelected,
            (PlayPhase::ShuffleSelected, PlayEvent::TimerChosen) => PlayPhase::TimerSelected,
            (PlayPhase::TimerSelected, PlayEvent::Start) => PlayPhase::Running,
            (PlayPhase::Running, PlayEvent::QuestionsExhausted) => PlayPhase::Finalizing,
            (PlayPhase::Finalizing, PlayEvent::Finalized) => PlayPhase::Done,
            (from, PlayEvent::Abandon) if !from.is_terminal() => PlayPhase::Done,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_idle() {
        let sm = PlayStateMachine::new();
        assert_eq!(sm.phase(), PlayPhase::Idle);
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut sm = PlayStateMachine::new();

        assert_eq!(
            sm.apply(PlayEvent::ShuffleChosen),
            Ok(PlayPhase::ShuffleSelected)
        );
        assert_eq!(sm.apply(PlayEvent::TimerChosen), Ok(PlayPhase::TimerSelected));
        assert_eq!(sm.apply(PlayEvent::Start), Ok(PlayPhase::Running));
        assert_eq!(
            sm.apply(PlayEvent::QuestionsExhausted),
            Ok(PlayPhase::Finalizing)
        );
        assert_eq!(sm.apply(PlayEvent::Finalized), Ok(PlayPhase::Done));
        assert_eq!(sm.version(), 5);
    }

    #[test]
    fn start_requires_a_timer() {
        let mut sm = PlayStateMachine::new();
        sm.apply(PlayEvent::ShuffleChosen).unwrap();

        let err = sm.apply(PlayEvent::Start).unwrap_err();
        assert_eq!(err.from, PlayPhase::ShuffleSelected);
        assert_eq!(err.event, PlayEvent::Start);
        assert_eq!(sm.phase(), PlayPhase::ShuffleSelected);
        assert_eq!(sm.version(), 1);
    }

    #[test]
    fn abandon_is_allowed_from_every_live_phase() {
        let paths: [&[PlayEvent]; 5] = [
            &[],
            &[PlayEvent::ShuffleChosen],
            &[PlayEvent::ShuffleChosen, PlayEvent::TimerChosen],
            &[
                PlayEvent::ShuffleChosen,
                PlayEvent::TimerChosen,
                PlayEvent::Start,
            ],
            &[
                PlayEvent::ShuffleChosen,
                PlayEvent::TimerChosen,
                PlayEvent::Start,
                PlayEvent::QuestionsExhausted,
            ],
        ];

        for path in paths {
            let mut sm = PlayStateMachine::new();
            for event in path {
                sm.apply(*event).unwrap();
            }
            assert_eq!(sm.apply(PlayEvent::Abandon), Ok(PlayPhase::Done));
        }
    }

    #[test]
    fn done_is_terminal() {
        let mut sm = PlayStateMachine::new();
        sm.apply(PlayEvent::Abandon).unwrap();
        assert!(sm.apply(PlayEvent::Abandon).is_err());
        assert!(sm.apply(PlayEvent::ShuffleChosen).is_err());
    }
}
