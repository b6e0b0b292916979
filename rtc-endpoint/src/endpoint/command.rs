/// Commands issued to the transport collaborator. Emitted through
/// [`poll_event`](sansio::Protocol::poll_event) and never awaited; the
/// transport reports back via
/// [`TransportEvent`](super::event::TransportEvent)s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Start gathering local candidates. Issued exactly once per session.
    GatherCandidates,
    SetRemoteCandidate { candidate: String },
    SetRemoteCredentials { ufrag: String, password: String },
    /// Restart the ICE stream for a new negotiation round.
    RestartIceStream,
}
