use crate::codec::PayloadType;
use crate::signaling::RelayServer;
use crate::track::{OutboundTrackInit, TrackId, SSRC};
use bytes::Bytes;

/// Voice activity as detected by the transport's audio-level processing,
/// passed through to the application unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoiceActivity {
    Speech,
    Silence,
}

/// Notifications consumed from the ICE/DTLS/RTP transport collaborator.
/// The transport performs the actual connectivity checks, handshakes, and
/// packet I/O; the endpoint only reacts to its outcomes.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local ICE candidate was discovered.
    CandidateDiscovered { candidate: String },
    /// Local candidate gathering finished.
    CandidateGatheringDone,
    /// The local DTLS certificate fingerprint, as raw digest bytes.
    DtlsFingerprint {
        algorithm: String,
        fingerprint: Vec<u8>,
    },
    /// Local ICE credentials became available.
    LocalIceCredentials { ufrag: String, password: String },
    /// A previously unseen RTP stream was observed on the wire, with its
    /// raw header extensions as (id, payload) pairs.
    NewRtpStream {
        ssrc: SSRC,
        payload_type: PayloadType,
        extensions: Vec<(u8, Bytes)>,
    },
    /// The connection reached a working state.
    ConnectionReady,
    /// The connection terminally failed; the transport has given up on it.
    ConnectionFailed,
    /// An integrated relay (TURN) server was allocated for this session.
    RelayServerAllocated(RelayServer),
    VoiceActivity { ssrc: SSRC, activity: VoiceActivity },
}

/// Requests from the owning application (the local control surface).
#[derive(Debug, Clone)]
pub enum ControlRequest {
    /// Insert outbound tracks and request a renegotiation round.
    AddTracks(Vec<OutboundTrackInit>),
    /// Disable outbound tracks and request a renegotiation round.
    RemoveTracks(Vec<TrackId>),
    /// Force a round with no track delta.
    RenegotiateTracks,
}
