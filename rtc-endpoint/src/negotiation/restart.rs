//! Batching of track-set mutations into renegotiation rounds.
//!
//! Tracks are added and removed in bursts while transport-level failures
//! arrive concurrently; starting a round per trigger would cause SDP churn
//! and glare. The coordinator coalesces triggers: one round in flight, at
//! most one queued behind it.

use log::{debug, info};
use std::fmt;

/// Remote ICE credentials learned from the latest offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCredentials {
    pub ufrag: String,
    pub password: String,
}

/// Composite coordinator state. A restart request arriving while a round is
/// in flight flips `queued` instead of starting a second round.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RestartState {
    #[default]
    Idle,
    /// A mutation occurred that requires a round once one can start.
    WaitingRestart,
    /// A renegotiation round is in flight.
    Restarting { queued: bool },
}

impl fmt::Display for RestartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RestartState::Idle => write!(f, "idle"),
            RestartState::WaitingRestart => write!(f, "waiting-restart"),
            RestartState::Restarting { queued } => write!(f, "restarting (queued: {queued})"),
        }
    }
}

#[derive(Default, Debug)]
pub struct RestartCoordinator {
    state: RestartState,
    /// Whether any negotiation round has ever started.
    started_any: bool,
    remote_credentials: Option<IceCredentials>,
}

impl RestartCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RestartState {
        self.state
    }

    pub fn is_restarting(&self) -> bool {
        matches!(self.state, RestartState::Restarting { .. })
    }

    /// Records that a round is owed. Safe to call in any state: while a
    /// round is in flight the request is coalesced into the queued flag,
    /// never dropped and never duplicated.
    pub fn request_restart(&mut self) {
        let next = match self.state {
            RestartState::Idle | RestartState::WaitingRestart => RestartState::WaitingRestart,
            RestartState::Restarting { .. } => RestartState::Restarting { queued: true },
        };
        if next != self.state {
            debug!("restart coordinator {} -> {}", self.state, next);
            self.state = next;
        }
    }

    /// Starts a round if one is owed and none is in flight. Returns true
    /// exactly when the caller must promote the pending track cohort and
    /// emit the ICE-stream-restart command.
    ///
    /// The first-ever round is special-cased: an inbound-only session never
    /// initiates an offer, so with no outbound tracks and no round ever
    /// started the owed request is void.
    pub fn maybe_start(&mut self, have_outbound: bool) -> bool {
        match self.state {
            RestartState::WaitingRestart => {
                if !self.started_any && !have_outbound {
                    debug!("restart coordinator: inbound-only session, no round needed");
                    self.state = RestartState::Idle;
                    return false;
                }
                info!("restart coordinator: starting negotiation round");
                self.state = RestartState::Restarting { queued: false };
                self.started_any = true;
                true
            }
            RestartState::Idle | RestartState::Restarting { .. } => false,
        }
    }

    /// The in-flight round resolved successfully. Any queued request moves
    /// back to `WaitingRestart` for the caller to drain via
    /// [`maybe_start`](Self::maybe_start).
    pub fn finish_round(&mut self) {
        if let RestartState::Restarting { queued } = self.state {
            self.state = if queued {
                RestartState::WaitingRestart
            } else {
                RestartState::Idle
            };
            info!("restart coordinator: round finished, now {}", self.state);
        }
    }

    /// The connection failed. A failed connection always warrants another
    /// attempt, whatever the current state.
    pub fn fail_round(&mut self) {
        info!("restart coordinator: round failed, forcing another attempt");
        self.state = RestartState::WaitingRestart;
    }

    pub fn remote_credentials(&self) -> Option<&IceCredentials> {
        self.remote_credentials.as_ref()
    }

    /// Returns true when the credentials differ from the currently known
    /// ones, i.e. the transport must be updated.
    pub fn update_remote_credentials(&mut self, credentials: IceCredentials) -> bool {
        if self.remote_credentials.as_ref() == Some(&credentials) {
            return false;
        }
        self.remote_credentials = Some(credentials);
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_idle_round_trip() {
        let mut c = RestartCoordinator::new();
        assert_eq!(c.state(), RestartState::Idle);

        c.request_restart();
        assert_eq!(c.state(), RestartState::WaitingRestart);

        assert!(c.maybe_start(true));
        assert_eq!(c.state(), RestartState::Restarting { queued: false });

        c.finish_round();
        assert_eq!(c.state(), RestartState::Idle);
    }

    #[test]
    fn test_request_while_restarting_is_coalesced() {
        let mut c = RestartCoordinator::new();
        c.request_restart();
        assert!(c.maybe_start(true));

        // Two triggers mid-round coalesce into one queued request.
        c.request_restart();
        c.request_restart();
        assert_eq!(c.state(), RestartState::Restarting { queued: true });

        // No second round while one is in flight.
        assert!(!c.maybe_start(true));

        c.finish_round();
        assert_eq!(c.state(), RestartState::WaitingRestart);
        assert!(c.maybe_start(true));
        c.finish_round();
        assert_eq!(c.state(), RestartState::Idle);
    }

    #[test]
    fn test_first_round_needs_an_outbound_track() {
        let mut c = RestartCoordinator::new();
        c.request_restart();
        assert!(!c.maybe_start(false));
        assert_eq!(c.state(), RestartState::Idle);

        // Once an outbound track exists the next request starts normally.
        c.request_restart();
        assert!(c.maybe_start(true));
    }

    #[test]
    fn test_later_rounds_start_even_without_outbound_tracks() {
        let mut c = RestartCoordinator::new();
        c.request_restart();
        assert!(c.maybe_start(true));
        c.finish_round();

        c.request_restart();
        assert!(c.maybe_start(false));
    }

    #[test]
    fn test_failure_forces_another_attempt() {
        let mut c = RestartCoordinator::new();
        c.request_restart();
        assert!(c.maybe_start(true));

        c.fail_round();
        assert_eq!(c.state(), RestartState::WaitingRestart);
        assert!(c.maybe_start(true));
    }

    #[test]
    fn test_remote_credentials_change_detection() {
        let mut c = RestartCoordinator::new();
        let creds = IceCredentials {
            ufrag: "u1".to_owned(),
            password: "p1".to_owned(),
        };

        assert!(c.update_remote_credentials(creds.clone()));
        assert!(!c.update_remote_credentials(creds));
        assert!(c.update_remote_credentials(IceCredentials {
            ufrag: "u2".to_owned(),
            password: "p2".to_owned(),
        }));
    }
}
