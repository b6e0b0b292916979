use crate::codec::DepayloaderKind;
use crate::endpoint::event::VoiceActivity;
use crate::track::{InboundTrack, Rid, TrackId, SSRC};

/// Notifications emitted upward to the owning application via
/// [`poll_read`](sansio::Protocol::poll_read).
#[derive(Debug, Clone)]
pub enum EndpointNotification {
    /// A new inbound track (or, for simulcast, a new spatial layer of one)
    /// was discovered. The depayloader is resolved from the negotiated
    /// encoding once, at track creation.
    NewInboundTrack {
        id: TrackId,
        rid: Option<Rid>,
        encoding: String,
        depayloader: Option<DepayloaderKind>,
    },
    /// The remote peer removed these tracks from the session.
    TracksRemoved(Vec<InboundTrack>),
    /// A negotiation round completed; the listed outbound tracks became
    /// fully linked.
    NegotiationCompleted(Vec<TrackId>),
    VoiceActivity {
        track_id: TrackId,
        activity: VoiceActivity,
    },
    /// A remote stream violated the signaling contract and was dropped
    /// (only under
    /// [`ProtocolViolationPolicy::DropStream`](crate::configuration::ProtocolViolationPolicy)).
    ProtocolViolation { ssrc: SSRC, reason: String },
}
