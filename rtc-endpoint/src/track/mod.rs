pub mod simulcast;

use crate::codec::{DepayloaderKind, MediaKind, RtpExtension, RtpMapping};
use crate::configuration::EndpointDirection;
use crate::error::{Error, Result};
use crate::signaling::TrackCounts;
use log::trace;
use std::collections::HashMap;
use std::fmt;

/// SSRC represents a synchronization source
/// A synchronization source is a randomly chosen
/// value meant to be globally unique within a particular
/// RTP session. Used to identify a single stream of media.
/// <https://tools.ietf.org/html/rfc3550#section-3>
#[allow(clippy::upper_case_acronyms)]
pub type SSRC = u32;

pub type TrackId = String;

/// Simulcast layer identifier carried in the sdes rtp-stream-id header
/// extension.
pub type Rid = String;

/// Lifecycle of an outbound track across negotiation rounds.
///
/// Within one round the status only moves forward: `Pending -> Ready ->
/// Linked`, or to `Disabled` from any non-terminal state.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutboundTrackStatus {
    /// Added locally, not yet part of any negotiation round.
    #[default]
    Pending,
    /// Part of the in-flight negotiation round.
    Ready,
    /// Fully negotiated and connected.
    Linked,
    /// Removed; kept in the registry until the next answer has been
    /// rendered and stripped.
    Disabled,
}

impl fmt::Display for OutboundTrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            OutboundTrackStatus::Pending => "pending",
            OutboundTrackStatus::Ready => "ready",
            OutboundTrackStatus::Linked => "linked",
            OutboundTrackStatus::Disabled => "disabled",
        };
        write!(f, "{s}")
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum InboundTrackStatus {
    /// Known from SDP, no RTP stream resolved to it yet.
    #[default]
    Unlinked,
    /// At least one RTP stream resolved to the track.
    Linked,
}

/// A unit of media sent by this endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundTrack {
    pub id: TrackId,
    pub kind: MediaKind,
    pub status: OutboundTrackStatus,
    pub encoding: String,
    pub ssrc: SSRC,
    /// Media-line identity, set when the track is first paired with an
    /// offered media section.
    pub mid: Option<String>,
    pub rtp_mapping: Option<RtpMapping>,
    pub extensions: Vec<RtpExtension>,
}

impl OutboundTrack {
    pub(crate) fn advance(&mut self, to: OutboundTrackStatus) {
        if self.status != to {
            trace!("outbound track {} status {} -> {}", self.id, self.status, to);
            self.status = to;
        }
    }
}

/// Descriptor the application hands in when adding an outbound track.
#[derive(Debug, Clone)]
pub struct OutboundTrackInit {
    pub id: TrackId,
    pub kind: MediaKind,
    pub encoding: String,
    /// Fresh session-unique SSRC is assigned when absent.
    pub ssrc: Option<SSRC>,
}

/// A unit of media received from the remote peer, created from an offered
/// media section.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundTrack {
    pub id: TrackId,
    pub kind: MediaKind,
    pub status: InboundTrackStatus,
    pub encoding: String,
    pub mid: String,
    /// Ordered set of observed SSRCs; one per spatial layer for simulcast.
    pub ssrcs: Vec<SSRC>,
    /// Simulcast layer id to the SSRC observed for that layer, populated
    /// lazily as RTP streams arrive. Every entry's SSRC also appears in
    /// `ssrcs`.
    pub rid_to_ssrc: HashMap<Rid, SSRC>,
    /// Layer identifiers announced in the offer; empty for non-simulcast
    /// tracks.
    pub rids: Vec<Rid>,
    pub rtp_mapping: RtpMapping,
    pub extensions: Vec<RtpExtension>,
    pub depayloader: Option<DepayloaderKind>,
}

impl InboundTrack {
    pub fn is_simulcast(&self) -> bool {
        !self.rids.is_empty()
    }

    /// The layer a given SSRC was observed for, if any.
    pub fn rid_for_ssrc(&self, ssrc: SSRC) -> Option<&Rid> {
        self.rid_to_ssrc
            .iter()
            .find(|(_, s)| **s == ssrc)
            .map(|(rid, _)| rid)
    }
}

/// Authoritative owner of the inbound/outbound track maps and the
/// session-wide SSRC index. Collaborators receive copies or read-only
/// views; all mutation goes through the owning endpoint.
#[derive(Default, Debug)]
pub struct TrackRegistry {
    direction: EndpointDirection,
    outbound: HashMap<TrackId, OutboundTrack>,
    inbound: HashMap<TrackId, InboundTrack>,
    ssrc_index: HashMap<SSRC, TrackId>,
}

impl TrackRegistry {
    pub fn new(direction: EndpointDirection) -> Self {
        TrackRegistry {
            direction,
            ..Default::default()
        }
    }

    /// Merges new outbound tracks into the registry, assigning fresh
    /// session-unique SSRCs where the descriptor carries none. All tracks
    /// start out `Pending` until a negotiation round picks them up.
    pub fn add_outbound(&mut self, tracks: Vec<OutboundTrackInit>) -> Result<Vec<TrackId>> {
        if !self.direction.can_send() {
            return Err(Error::ErrDirectionMismatch);
        }

        let mut added = Vec::with_capacity(tracks.len());
        for init in tracks {
            if self.outbound.contains_key(&init.id) {
                return Err(Error::ErrDuplicateTrackId);
            }

            let ssrc = match init.ssrc {
                Some(ssrc) => ssrc,
                None => self.fresh_ssrc(),
            };

            trace!(
                "adding outbound track {} ({} {}, ssrc {})",
                init.id,
                init.kind,
                init.encoding,
                ssrc
            );

            self.ssrc_index.insert(ssrc, init.id.clone());
            added.push(init.id.clone());
            self.outbound.insert(
                init.id.clone(),
                OutboundTrack {
                    id: init.id,
                    kind: init.kind,
                    status: OutboundTrackStatus::Pending,
                    encoding: init.encoding,
                    ssrc,
                    mid: None,
                    rtp_mapping: None,
                    extensions: vec![],
                },
            );
        }

        Ok(added)
    }

    pub fn add_inbound(&mut self, track: InboundTrack) -> Result<()> {
        if !self.direction.can_recv() {
            return Err(Error::ErrDirectionMismatch);
        }
        if self.inbound.contains_key(&track.id) {
            return Err(Error::ErrDuplicateTrackId);
        }

        trace!(
            "adding inbound track {} ({} {}, mid {})",
            track.id,
            track.kind,
            track.encoding,
            track.mid
        );

        for ssrc in &track.ssrcs {
            self.ssrc_index.insert(*ssrc, track.id.clone());
        }
        self.inbound.insert(track.id.clone(), track);

        Ok(())
    }

    /// Marks outbound tracks `Disabled` rather than deleting them: a
    /// render-and-strip step must still occur in the next SDP answer before
    /// they can be dropped from memory. Returns the ids that were actually
    /// affected.
    pub fn remove_outbound(&mut self, track_ids: &[TrackId]) -> Vec<TrackId> {
        let mut affected = vec![];
        for id in track_ids {
            if let Some(track) = self.outbound.get_mut(id) {
                if track.status != OutboundTrackStatus::Disabled {
                    track.advance(OutboundTrackStatus::Disabled);
                    affected.push(id.clone());
                }
            }
        }
        affected
    }

    /// Drops `Disabled` outbound tracks from memory after an answer without
    /// them has been rendered.
    pub fn strip_disabled(&mut self) -> Vec<OutboundTrack> {
        let ids: Vec<TrackId> = self
            .outbound
            .iter()
            .filter(|(_, t)| t.status == OutboundTrackStatus::Disabled)
            .map(|(id, _)| id.clone())
            .collect();

        let mut stripped = vec![];
        for id in ids {
            if let Some(track) = self.outbound.remove(&id) {
                self.ssrc_index.remove(&track.ssrc);
                stripped.push(track);
            }
        }
        stripped
    }

    /// Removes inbound tracks whose media sections disappeared from the
    /// remote offer, stripping their SSRCs from the index.
    pub fn remove_inbound(&mut self, track_ids: &[TrackId]) -> Vec<InboundTrack> {
        let mut removed = vec![];
        for id in track_ids {
            if let Some(track) = self.inbound.remove(id) {
                for ssrc in &track.ssrcs {
                    self.ssrc_index.remove(ssrc);
                }
                removed.push(track);
            }
        }
        removed
    }

    /// Bulk-transitions every outbound track currently in `from` to `to`,
    /// advancing the whole cohort atomically at a renegotiation checkpoint.
    /// Returns the affected ids.
    pub fn transition_outbound(
        &mut self,
        from: OutboundTrackStatus,
        to: OutboundTrackStatus,
    ) -> Vec<TrackId> {
        let mut affected = vec![];
        for track in self.outbound.values_mut() {
            if track.status == from {
                track.advance(to);
                affected.push(track.id.clone());
            }
        }
        affected.sort();
        affected
    }

    pub fn outbound_by_id(&self, id: &str) -> Result<&OutboundTrack> {
        self.outbound.get(id).ok_or(Error::ErrTrackNotFound)
    }

    pub fn inbound_by_id(&self, id: &str) -> Result<&InboundTrack> {
        self.inbound.get(id).ok_or(Error::ErrTrackNotFound)
    }

    /// Resolves an SSRC through the session-wide index. A miss is not
    /// necessarily an error: the caller falls back to the simulcast
    /// resolver for tracks whose SSRCs are only learned from the wire.
    pub fn by_ssrc(&self, ssrc: SSRC) -> Result<&TrackId> {
        self.ssrc_index.get(&ssrc).ok_or(Error::ErrTrackNotFound)
    }

    pub(crate) fn register_ssrc(&mut self, ssrc: SSRC, track_id: TrackId) {
        self.ssrc_index.insert(ssrc, track_id);
    }

    pub fn outbound_tracks(&self) -> impl Iterator<Item = &OutboundTrack> {
        self.outbound.values()
    }

    pub fn inbound_tracks(&self) -> impl Iterator<Item = &InboundTrack> {
        self.inbound.values()
    }

    pub(crate) fn inbound_by_id_mut(&mut self, id: &str) -> Option<&mut InboundTrack> {
        self.inbound.get_mut(id)
    }

    pub(crate) fn outbound_by_id_mut(&mut self, id: &str) -> Option<&mut OutboundTrack> {
        self.outbound.get_mut(id)
    }

    /// First outbound track of the given kind that has not been paired with
    /// a media section yet. Pending tracks are excluded: they have not been
    /// through a negotiation checkpoint and must not be offered prematurely.
    pub(crate) fn unpaired_outbound_mut(&mut self, kind: MediaKind) -> Option<&mut OutboundTrack> {
        let mut candidates: Vec<&TrackId> = self
            .outbound
            .iter()
            .filter(|(_, t)| {
                t.mid.is_none()
                    && t.kind == kind
                    && (t.status == OutboundTrackStatus::Ready
                        || t.status == OutboundTrackStatus::Linked)
            })
            .map(|(id, _)| id)
            .collect();
        candidates.sort();

        let id = candidates.first().map(|id| (*id).clone())?;
        self.outbound.get_mut(&id)
    }

    /// True when at least one non-disabled outbound track exists.
    pub fn has_outbound(&self) -> bool {
        self.outbound
            .values()
            .any(|t| t.status != OutboundTrackStatus::Disabled)
    }

    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.inbound.is_empty()
    }

    fn fresh_ssrc(&self) -> SSRC {
        let mut ssrc = rand::random::<u32>();
        while ssrc == 0 || self.ssrc_index.contains_key(&ssrc) {
            ssrc = rand::random::<u32>();
        }
        ssrc
    }

    /// Counts of outbound tracks that still need a negotiation round: not
    /// yet paired with a media section and not disabled.
    pub(crate) fn unnegotiated_counts(&self) -> TrackCounts {
        let mut counts = TrackCounts::default();
        for track in self.outbound.values() {
            if track.mid.is_some() || track.status == OutboundTrackStatus::Disabled {
                continue;
            }
            match track.kind {
                MediaKind::Audio => counts.audio += 1,
                MediaKind::Video => counts.video += 1,
                MediaKind::Unspecified => {}
            }
        }
        counts
    }
}
