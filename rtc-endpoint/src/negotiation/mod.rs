//! SDP offer/answer negotiation against the current track registry.
//!
//! The endpoint is always the answering side: the remote peer produces
//! offers (on its own initiative or after an `offerData` request) and this
//! module diffs each offer against the registry, classifies every media
//! section, and renders the matching answer. The SDP grammar itself lives in
//! the `sdp` collaborator crate; only the fields read and written here are
//! part of this module's contract.

pub mod restart;

use self::restart::IceCredentials;
use crate::codec::{DepayloaderKind, MediaKind, PayloadType, RtpExtension, SDES_RTP_STREAM_ID_URI};
use crate::configuration::RTCEndpointConfiguration;
use crate::constants::*;
use crate::error::{Error, Result};
use crate::track::{
    InboundTrack, InboundTrackStatus, OutboundTrackStatus, Rid, TrackId, TrackRegistry, SSRC,
};
use log::{debug, trace, warn};
use sdp::description::media::{MediaDescription, RangedPort};
use sdp::description::session::{Origin, SessionDescription};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

/// Local DTLS certificate fingerprint as rendered into answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtlsFingerprint {
    pub algorithm: String,
    pub value: String,
}

/// One codec offered on a media line (`a=rtpmap` plus its `a=fmtp`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OfferedCodec {
    pub(crate) payload_type: PayloadType,
    pub(crate) encoding: String,
    pub(crate) clock_rate: u32,
    pub(crate) channels: u16,
    pub(crate) fmtp: String,
}

/// Result of negotiating one remote offer.
#[derive(Debug, Default)]
pub struct NegotiationOutcome {
    /// Inbound tracks created by this round.
    pub new_inbound: Vec<TrackId>,
    /// Inbound tracks whose media sections disappeared from the offer;
    /// already removed from the registry.
    pub removed_inbound: Vec<InboundTrack>,
    /// All inbound tracks covered by the answer (new and continuing).
    pub resolved_inbound: Vec<TrackId>,
    /// Outbound tracks paired with a media section by this round.
    pub resolved_outbound: Vec<TrackId>,
    /// Rendered answer document.
    pub answer_sdp: String,
    /// mid correlation table for the next round, simulcast sub-tracks
    /// collapsed to one entry per track.
    pub mid_to_track_id: HashMap<String, TrackId>,
}

enum PlanEntry {
    Inbound(TrackId),
    Outbound(TrackId),
    Rejected,
}

/// Per-media-section answer plan, filled in during classification and
/// consumed by the renderer.
struct MediaPlan {
    mid: String,
    media_name: String,
    codec: Option<OfferedCodec>,
    extensions: Vec<RtpExtension>,
    rids: Vec<Rid>,
    offered_formats: Vec<String>,
    entry: PlanEntry,
}

pub(crate) fn parse_session_description(sdp_text: &str) -> Result<SessionDescription> {
    let mut reader = Cursor::new(sdp_text.as_bytes());
    Ok(SessionDescription::unmarshal(&mut reader)?)
}

/// Negotiates a remote offer against the registry: classifies every media
/// section as a new inbound track, a continuing track, an outbound pairing,
/// or a rejection, applies the track delta, and renders the answer.
#[allow(clippy::too_many_arguments)]
pub(crate) fn negotiate(
    offer: &SessionDescription,
    mid_to_track_id: &HashMap<String, TrackId>,
    registry: &mut TrackRegistry,
    config: &RTCEndpointConfiguration,
    local_credentials: &IceCredentials,
    fingerprint: &DtlsFingerprint,
    sdp_origin: &mut Origin,
) -> Result<NegotiationOutcome> {
    let mut outcome = NegotiationOutcome::default();

    // A previously known mid that disappeared from the offer means the
    // remote removed the track. Strip those first so their SSRCs leave the
    // index before new sections are processed.
    let offered_mids: HashSet<String> = offer
        .media_descriptions
        .iter()
        .filter_map(|m| get_mid_value(m).map(ToOwned::to_owned))
        .collect();
    let removed_ids: Vec<TrackId> = mid_to_track_id
        .iter()
        .filter(|(mid, id)| !offered_mids.contains(*mid) && registry.inbound_by_id(id).is_ok())
        .map(|(_, id)| id.clone())
        .collect();
    outcome.removed_inbound = registry.remove_inbound(&removed_ids);

    let mut plans = vec![];
    for media in &offer.media_descriptions {
        let mid = match get_mid_value(media) {
            Some(mid) if !mid.is_empty() => mid.to_owned(),
            _ => return Err(Error::ErrRemoteDescriptionWithoutMid),
        };

        let media_name = media.media_name.media.clone();
        let offered_formats = media.media_name.formats.clone();
        let kind = MediaKind::from(media_name.as_str());
        let direction = get_peer_direction(media);

        // Anything that is not an audio/video section the remote actually
        // uses (data channels, inactive sections) is mirrored as rejected.
        if kind == MediaKind::Unspecified
            || direction == PeerDirection::Unspecified
            || direction == PeerDirection::Inactive
        {
            plans.push(MediaPlan {
                mid,
                media_name,
                codec: None,
                extensions: vec![],
                rids: vec![],
                offered_formats,
                entry: PlanEntry::Rejected,
            });
            continue;
        }

        let codecs = parse_rtpmaps(media);
        let extensions = intersect_extensions(media, config);
        // Layer announcements only matter when simulcast is on; otherwise
        // the track is treated (and answered) as a casual one.
        let rids = if config.simulcast {
            get_rids(media)
        } else {
            vec![]
        };

        let entry = if direction.remote_is_sending() {
            classify_inbound(
                media,
                &mid,
                kind,
                &codecs,
                &extensions,
                &rids,
                mid_to_track_id,
                registry,
                config,
                &mut outcome,
            )?
        } else {
            classify_outbound(&mid, kind, &codecs, &extensions, mid_to_track_id, registry, config)
        };

        let codec = match &entry {
            PlanEntry::Inbound(id) => registry
                .inbound_by_id(id)
                .ok()
                .and_then(|t| codecs.iter().find(|c| c.payload_type == t.rtp_mapping.payload_type))
                .cloned(),
            PlanEntry::Outbound(id) => registry
                .outbound_by_id(id)
                .ok()
                .and_then(|t| t.rtp_mapping.as_ref().map(|m| m.payload_type))
                .and_then(|pt| codecs.iter().find(|c| c.payload_type == pt))
                .cloned(),
            PlanEntry::Rejected => None,
        };

        plans.push(MediaPlan {
            mid,
            media_name,
            codec,
            extensions,
            rids,
            offered_formats,
            entry,
        });
    }

    for plan in &plans {
        match &plan.entry {
            PlanEntry::Inbound(id) => {
                outcome.mid_to_track_id.insert(plan.mid.clone(), id.clone());
                outcome.resolved_inbound.push(id.clone());
            }
            PlanEntry::Outbound(id) => {
                outcome.mid_to_track_id.insert(plan.mid.clone(), id.clone());
                outcome.resolved_outbound.push(id.clone());
            }
            PlanEntry::Rejected => {}
        }
    }

    let mut answer = render_answer(&plans, config, local_credentials, fingerprint, registry);
    update_sdp_origin(sdp_origin, &mut answer);
    outcome.answer_sdp = answer.marshal();

    Ok(outcome)
}

/// The remote is sending on this section: either a continuing inbound track
/// (mid already correlated) or a brand new one.
#[allow(clippy::too_many_arguments)]
fn classify_inbound(
    media: &MediaDescription,
    mid: &str,
    kind: MediaKind,
    codecs: &[OfferedCodec],
    extensions: &[RtpExtension],
    rids: &[Rid],
    mid_to_track_id: &HashMap<String, TrackId>,
    registry: &mut TrackRegistry,
    config: &RTCEndpointConfiguration,
    outcome: &mut NegotiationOutcome,
) -> Result<PlanEntry> {
    let accepted = codecs
        .iter()
        .find(|c| (config.codec_filter)(kind, &c.encoding, c.clock_rate));
    let Some(codec) = accepted else {
        debug!("rejecting media section {mid}: no acceptable codec");
        return Ok(PlanEntry::Rejected);
    };

    if let Some(id) = mid_to_track_id.get(mid) {
        if let Some(track) = registry.inbound_by_id_mut(id) {
            // Continuing track: refresh what the new offer may have changed.
            track.encoding = codec.encoding.clone();
            track.rtp_mapping = crate::codec::RtpMapping {
                payload_type: codec.payload_type,
                clock_rate: codec.clock_rate,
                channels: codec.channels,
            };
            track.extensions = extensions.to_vec();
            track.rids = rids.to_vec();
            trace!("media section {mid} continues inbound track {id}");
            return Ok(PlanEntry::Inbound(id.clone()));
        }
    }

    let mut id = inbound_track_id(media, kind, mid);
    if registry.inbound_by_id(&id).is_ok() {
        id = format!("{id}-{mid}");
    }

    let ssrcs = get_ssrcs(media);
    let track = InboundTrack {
        id: id.clone(),
        kind,
        status: InboundTrackStatus::Unlinked,
        encoding: codec.encoding.clone(),
        mid: mid.to_owned(),
        ssrcs,
        rid_to_ssrc: HashMap::new(),
        rids: rids.to_vec(),
        rtp_mapping: crate::codec::RtpMapping {
            payload_type: codec.payload_type,
            clock_rate: codec.clock_rate,
            channels: codec.channels,
        },
        extensions: extensions.to_vec(),
        depayloader: DepayloaderKind::for_encoding(&codec.encoding),
    };
    registry.add_inbound(track)?;
    outcome.new_inbound.push(id.clone());
    debug!("media section {mid} introduces inbound track {id}");

    Ok(PlanEntry::Inbound(id))
}

/// The remote only receives on this section: pair it with one of our
/// outbound tracks. Pending tracks are not eligible; they are still awaiting
/// their first renegotiation checkpoint.
#[allow(clippy::too_many_arguments)]
fn classify_outbound(
    mid: &str,
    kind: MediaKind,
    codecs: &[OfferedCodec],
    extensions: &[RtpExtension],
    mid_to_track_id: &HashMap<String, TrackId>,
    registry: &mut TrackRegistry,
    config: &RTCEndpointConfiguration,
) -> PlanEntry {
    // Continuing pairing from a previous round.
    if let Some(id) = mid_to_track_id.get(mid) {
        let id = id.clone();
        if let Some(track) = registry.outbound_by_id_mut(&id) {
            if track.status == OutboundTrackStatus::Disabled {
                debug!("rejecting media section {mid}: outbound track {id} was removed");
                return PlanEntry::Rejected;
            }
            if let Some(codec) = select_outbound_codec(&track.encoding, codecs, kind, config) {
                track.rtp_mapping = Some(crate::codec::RtpMapping {
                    payload_type: codec.payload_type,
                    clock_rate: codec.clock_rate,
                    channels: codec.channels,
                });
                track.extensions = extensions.to_vec();
                return PlanEntry::Outbound(id);
            }
            debug!("rejecting media section {mid}: codec of track {id} no longer offered");
            return PlanEntry::Rejected;
        }
    }

    let paired_id = {
        let Some(track) = registry.unpaired_outbound_mut(kind) else {
            debug!("rejecting media section {mid}: no outbound {kind} track to pair");
            return PlanEntry::Rejected;
        };
        let Some(codec) = select_outbound_codec(&track.encoding, codecs, kind, config) else {
            debug!(
                "rejecting media section {mid}: remote does not accept {}",
                track.encoding
            );
            return PlanEntry::Rejected;
        };
        track.mid = Some(mid.to_owned());
        track.rtp_mapping = Some(crate::codec::RtpMapping {
            payload_type: codec.payload_type,
            clock_rate: codec.clock_rate,
            channels: codec.channels,
        });
        track.extensions = extensions.to_vec();
        trace!("media section {mid} pairs outbound track {}", track.id);
        track.id.clone()
    };

    PlanEntry::Outbound(paired_id)
}

fn select_outbound_codec<'a>(
    encoding: &str,
    codecs: &'a [OfferedCodec],
    kind: MediaKind,
    config: &RTCEndpointConfiguration,
) -> Option<&'a OfferedCodec> {
    codecs.iter().find(|c| {
        c.encoding.eq_ignore_ascii_case(encoding)
            && (config.codec_filter)(kind, &c.encoding, c.clock_rate)
    })
}

fn render_answer(
    plans: &[MediaPlan],
    config: &RTCEndpointConfiguration,
    local_credentials: &IceCredentials,
    fingerprint: &DtlsFingerprint,
    registry: &TrackRegistry,
) -> SessionDescription {
    let mut d = SessionDescription::new_jsep_session_description(false);

    if config.ice_lite {
        d = d.with_property_attribute(SDP_ATTRIBUTE_ICE_LITE.to_owned());
    }

    let accepted_mids: Vec<&str> = plans
        .iter()
        .filter(|p| !matches!(p.entry, PlanEntry::Rejected))
        .map(|p| p.mid.as_str())
        .collect();
    if !accepted_mids.is_empty() {
        let bundle = format!("BUNDLE {}", accepted_mids.join(" "));
        d = d.with_value_attribute(SDP_ATTRIBUTE_GROUP.to_owned(), bundle);
    }

    // One answer media line per offered one, in offer order; rejected
    // sections keep their format list but carry port zero.
    for plan in plans {
        let mut m = MediaDescription::new_jsep_media_description(plan.media_name.clone(), vec![]);

        if matches!(plan.entry, PlanEntry::Rejected) {
            m.media_name.port = RangedPort {
                value: 0,
                range: None,
            };
            m.media_name.formats = plan.offered_formats.clone();
            m = m
                .with_value_attribute(SDP_ATTRIBUTE_MID.to_owned(), plan.mid.clone())
                .with_property_attribute("inactive".to_owned());
            d.media_descriptions.push(m);
            continue;
        }

        if let Some(codec) = &plan.codec {
            m = m.with_codec(
                codec.payload_type,
                codec.encoding.clone(),
                codec.clock_rate,
                codec.channels,
                codec.fmtp.clone(),
            );
        }

        m = m.with_value_attribute(SDP_ATTRIBUTE_MID.to_owned(), plan.mid.clone());

        for ext in &plan.extensions {
            m = m.with_value_attribute(
                SDP_ATTRIBUTE_EXTMAP.to_owned(),
                format!("{} {}", ext.id, ext.uri),
            );
        }

        match &plan.entry {
            PlanEntry::Inbound(_) => {
                m = m.with_property_attribute("recvonly".to_owned());
                if !plan.rids.is_empty() {
                    for rid in &plan.rids {
                        m = m.with_value_attribute(
                            SDP_ATTRIBUTE_RID.to_owned(),
                            format!("{rid} recv"),
                        );
                    }
                    m = m.with_value_attribute(
                        SDP_ATTRIBUTE_SIMULCAST.to_owned(),
                        format!("recv {}", plan.rids.join(";")),
                    );
                }
            }
            PlanEntry::Outbound(id) => {
                m = m.with_property_attribute("sendonly".to_owned());
                if let Ok(track) = registry.outbound_by_id(id) {
                    m = m.with_media_source(
                        track.ssrc,
                        track.id.clone(),
                        "endpoint".to_owned(),
                        track.id.clone(),
                    );
                }
            }
            PlanEntry::Rejected => {}
        }

        m = m
            .with_property_attribute(SDP_ATTRIBUTE_RTCP_MUX.to_owned())
            .with_value_attribute(SDP_ATTRIBUTE_SETUP.to_owned(), "passive".to_owned())
            .with_ice_credentials(
                local_credentials.ufrag.clone(),
                local_credentials.password.clone(),
            )
            .with_fingerprint(fingerprint.algorithm.clone(), fingerprint.value.clone());

        d.media_descriptions.push(m);
    }

    d
}

/// Keeps the `o=` line stable across answers: the first render adopts the
/// generated identity, later ones bump the session version.
pub(crate) fn update_sdp_origin(origin: &mut Origin, d: &mut SessionDescription) {
    if origin.session_id == 0 {
        origin.clone_from(&d.origin);
    } else {
        origin.session_version += 1;
        d.origin = origin.clone();
    }
}

pub(crate) fn get_mid_value(media: &MediaDescription) -> Option<&str> {
    media.attribute(SDP_ATTRIBUTE_MID).and_then(|o| o)
}

/// Media direction from the remote peer's perspective.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PeerDirection {
    #[default]
    Unspecified,
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl PeerDirection {
    fn remote_is_sending(self) -> bool {
        matches!(self, PeerDirection::SendRecv | PeerDirection::SendOnly)
    }
}

pub(crate) fn get_peer_direction(media: &MediaDescription) -> PeerDirection {
    for a in &media.attributes {
        match a.key.as_str() {
            "sendrecv" => return PeerDirection::SendRecv,
            "sendonly" => return PeerDirection::SendOnly,
            "recvonly" => return PeerDirection::RecvOnly,
            "inactive" => return PeerDirection::Inactive,
            _ => {}
        }
    }
    PeerDirection::Unspecified
}

pub(crate) fn parse_rtpmaps(media: &MediaDescription) -> Vec<OfferedCodec> {
    let mut codecs = vec![];
    for a in &media.attributes {
        if a.key != SDP_ATTRIBUTE_RTPMAP {
            continue;
        }
        let Some(value) = a.value.as_deref() else {
            continue;
        };
        // "96 H264/90000" or "111 opus/48000/2"
        let mut parts = value.splitn(2, ' ');
        let (Some(pt), Some(codec)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(payload_type) = pt.parse::<PayloadType>() else {
            continue;
        };
        let mut fields = codec.trim().split('/');
        let Some(encoding) = fields.next() else {
            continue;
        };
        let Some(clock_rate) = fields.next().and_then(|c| c.parse::<u32>().ok()) else {
            continue;
        };
        let channels = fields
            .next()
            .and_then(|c| c.parse::<u16>().ok())
            .unwrap_or(0);

        codecs.push(OfferedCodec {
            payload_type,
            encoding: encoding.to_owned(),
            clock_rate,
            channels,
            fmtp: find_fmtp(media, payload_type).unwrap_or_default(),
        });
    }
    codecs
}

fn find_fmtp(media: &MediaDescription, payload_type: PayloadType) -> Option<String> {
    for a in &media.attributes {
        if a.key != SDP_ATTRIBUTE_FMTP {
            continue;
        }
        let Some(value) = a.value.as_deref() else {
            continue;
        };
        let mut parts = value.splitn(2, ' ');
        if parts.next() == Some(payload_type.to_string().as_str()) {
            return parts.next().map(|s| s.trim().to_owned());
        }
    }
    None
}

/// Offered `a=extmap` entries intersected with the configured extension
/// set. Ids are mirrored from the offer so both sides agree on the wire
/// encoding; the rtp-stream-id extension only survives when simulcast is
/// enabled.
pub(crate) fn intersect_extensions(
    media: &MediaDescription,
    config: &RTCEndpointConfiguration,
) -> Vec<RtpExtension> {
    let mut extensions = vec![];
    for a in &media.attributes {
        if a.key != SDP_ATTRIBUTE_EXTMAP {
            continue;
        }
        let Some(value) = a.value.as_deref() else {
            continue;
        };
        // "4 urn:..." or "4/sendrecv urn:..."
        let mut parts = value.split_whitespace();
        let (Some(id_part), Some(uri)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(id) = id_part
            .split('/')
            .next()
            .and_then(|i| i.parse::<u8>().ok())
        else {
            continue;
        };

        if !config.extensions.iter().any(|u| u == uri) {
            continue;
        }
        if uri == SDES_RTP_STREAM_ID_URI && !config.simulcast {
            continue;
        }
        extensions.push(RtpExtension {
            id,
            uri: uri.to_owned(),
        });
    }
    extensions
}

/// Simulcast layer ids the remote announces it will send.
pub(crate) fn get_rids(media: &MediaDescription) -> Vec<Rid> {
    let mut rids = vec![];
    for a in &media.attributes {
        if a.key != SDP_ATTRIBUTE_RID {
            continue;
        }
        let Some(value) = a.value.as_deref() else {
            continue;
        };
        let mut parts = value.split_whitespace();
        let (Some(rid), Some(direction)) = (parts.next(), parts.next()) else {
            continue;
        };
        if direction == "send" {
            rids.push(rid.to_owned());
        }
    }
    rids
}

/// SSRCs announced on the media line, first occurrence order preserved.
pub(crate) fn get_ssrcs(media: &MediaDescription) -> Vec<SSRC> {
    let mut ssrcs: Vec<SSRC> = vec![];
    for a in &media.attributes {
        if a.key != SDP_ATTRIBUTE_SSRC {
            continue;
        }
        let Some(value) = a.value.as_deref() else {
            continue;
        };
        let Some(ssrc) = value
            .split_whitespace()
            .next()
            .and_then(|s| s.parse::<SSRC>().ok())
        else {
            continue;
        };
        if !ssrcs.contains(&ssrc) {
            ssrcs.push(ssrc);
        }
    }
    ssrcs
}

/// Inbound track ids derive from the media-line identity: the msid track
/// part when announced, a kind-mid pair otherwise.
fn inbound_track_id(media: &MediaDescription, kind: MediaKind, mid: &str) -> TrackId {
    if let Some(Some(msid)) = media.attribute(SDP_ATTRIBUTE_MSID) {
        if let Some(track_part) = msid.split_whitespace().nth(1) {
            return track_part.to_owned();
        }
    }
    format!("{kind}-{mid}")
}

/// Splits remote ICE credentials and candidates out of the offer. The first
/// media line wins; session-level attributes are the fallback.
pub(crate) fn extract_ice_details(
    d: &SessionDescription,
) -> Result<(IceCredentials, Vec<String>)> {
    let mut ufrag: Option<String> = None;
    let mut password: Option<String> = None;
    let mut candidates = vec![];

    if let Some(value) = d.attribute(SDP_ATTRIBUTE_ICE_UFRAG) {
        ufrag = Some(value.to_owned());
    }
    if let Some(value) = d.attribute(SDP_ATTRIBUTE_ICE_PWD) {
        password = Some(value.to_owned());
    }

    for media in &d.media_descriptions {
        if ufrag.is_none() {
            if let Some(Some(value)) = media.attribute(SDP_ATTRIBUTE_ICE_UFRAG) {
                ufrag = Some(value.to_owned());
            }
        }
        if password.is_none() {
            if let Some(Some(value)) = media.attribute(SDP_ATTRIBUTE_ICE_PWD) {
                password = Some(value.to_owned());
            }
        }
        for a in &media.attributes {
            if a.key == SDP_ATTRIBUTE_CANDIDATE {
                if let Some(value) = a.value.as_deref() {
                    candidates.push(value.to_owned());
                }
            }
        }
    }

    match (ufrag, password) {
        (Some(ufrag), Some(password)) => Ok((IceCredentials { ufrag, password }, candidates)),
        _ => {
            warn!("offer carries no ice credentials");
            Err(Error::ErrRemoteDescriptionWithoutCredentials)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sdp::description::common::Attribute;

    fn attr(key: &str, value: Option<&str>) -> Attribute {
        Attribute {
            key: key.to_owned(),
            value: value.map(ToOwned::to_owned),
        }
    }

    fn video_media() -> MediaDescription {
        MediaDescription {
            attributes: vec![
                attr("mid", Some("1")),
                attr("sendonly", None),
                attr("rtpmap", Some("96 H264/90000")),
                attr("rtpmap", Some("98 VP9/90000")),
                attr("fmtp", Some("96 profile-level-id=42e01f")),
                attr("extmap", Some("4 urn:ietf:params:rtp-hdrext:sdes:mid")),
                attr(
                    "extmap",
                    Some("10/recvonly urn:ietf:params:rtp-hdrext:sdes:rtp-stream-id"),
                ),
                attr("rid", Some("h send")),
                attr("rid", Some("l send")),
                attr("ssrc", Some("445566 cname:remote")),
                attr("ssrc", Some("445566 msid:s t")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_get_mid_value() {
        assert_eq!(get_mid_value(&video_media()), Some("1"));
        assert_eq!(get_mid_value(&MediaDescription::default()), None);
    }

    #[test]
    fn test_get_peer_direction() {
        assert_eq!(get_peer_direction(&video_media()), PeerDirection::SendOnly);
        assert_eq!(
            get_peer_direction(&MediaDescription::default()),
            PeerDirection::Unspecified
        );
    }

    #[test]
    fn test_parse_rtpmaps_with_fmtp() {
        let codecs = parse_rtpmaps(&video_media());
        assert_eq!(codecs.len(), 2);
        assert_eq!(codecs[0].payload_type, 96);
        assert_eq!(codecs[0].encoding, "H264");
        assert_eq!(codecs[0].clock_rate, 90000);
        assert_eq!(codecs[0].fmtp, "profile-level-id=42e01f");
        assert_eq!(codecs[1].encoding, "VP9");
        assert_eq!(codecs[1].fmtp, "");
    }

    #[test]
    fn test_intersect_extensions_respects_simulcast_flag() {
        let media = video_media();

        let without = crate::configuration::RTCEndpointConfigurationBuilder::new().build();
        let exts = intersect_extensions(&media, &without);
        assert_eq!(exts.len(), 1);
        assert_eq!(exts[0].id, 4);

        let with = crate::configuration::RTCEndpointConfigurationBuilder::new()
            .with_simulcast(true)
            .build();
        let exts = intersect_extensions(&media, &with);
        assert_eq!(exts.len(), 2);
        assert_eq!(exts[1].id, 10);
        assert_eq!(exts[1].uri, SDES_RTP_STREAM_ID_URI);
    }

    #[test]
    fn test_get_rids_only_counts_send_layers() {
        let mut media = video_media();
        media.attributes.push(attr("rid", Some("x recv")));
        assert_eq!(get_rids(&media), vec!["h".to_owned(), "l".to_owned()]);
    }

    #[test]
    fn test_get_ssrcs_dedupes() {
        assert_eq!(get_ssrcs(&video_media()), vec![445566]);
    }

    #[test]
    fn test_extract_ice_details_prefers_media_level() {
        let sdp_text = concat!(
            "v=0\r\n",
            "o=- 1 1 IN IP4 127.0.0.1\r\n",
            "s=-\r\n",
            "t=0 0\r\n",
            "m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n",
            "c=IN IP4 0.0.0.0\r\n",
            "a=mid:0\r\n",
            "a=ice-ufrag:frag\r\n",
            "a=ice-pwd:pwd\r\n",
            "a=candidate:1 1 UDP 2122260223 192.168.0.10 49152 typ host\r\n",
        );
        let parsed = parse_session_description(sdp_text).unwrap();
        let (credentials, candidates) = extract_ice_details(&parsed).unwrap();
        assert_eq!(credentials.ufrag, "frag");
        assert_eq!(credentials.password, "pwd");
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].starts_with("1 1 UDP"));
    }

    #[test]
    fn test_extract_ice_details_requires_credentials() {
        let sdp_text = concat!(
            "v=0\r\n",
            "o=- 1 1 IN IP4 127.0.0.1\r\n",
            "s=-\r\n",
            "t=0 0\r\n",
            "m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n",
            "c=IN IP4 0.0.0.0\r\n",
            "a=mid:0\r\n",
        );
        let parsed = parse_session_description(sdp_text).unwrap();
        assert_eq!(
            extract_ice_details(&parsed),
            Err(Error::ErrRemoteDescriptionWithoutCredentials)
        );
    }
}
