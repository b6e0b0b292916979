//! Resolution of freshly observed RTP streams to tracks.
//!
//! Simulcast tracks do not announce their SSRCs in SDP, so the first packets
//! of each spatial layer are the only way to learn them. The remote peer
//! tags those packets with the sdes mid and rtp-stream-id header extensions;
//! both are mandatory for RID-based simulcast, and their absence is a
//! protocol violation rather than something to paper over.

use super::{InboundTrackStatus, Rid, TrackId, TrackRegistry, SSRC};
use crate::codec::{SDES_MID_URI, SDES_RTP_STREAM_ID_URI};
use crate::error::{Error, Result};
use bytes::Bytes;
use log::trace;

/// Outcome of resolving an observed RTP stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub track_id: TrackId,
    /// Spatial layer for simulcast tracks, `None` for casual tracks.
    pub rid: Option<Rid>,
    /// False when the SSRC was already indexed; re-observing a stream is a
    /// no-op, not a duplicate registration.
    pub newly_linked: bool,
}

/// Resolves an RTP stream (SSRC plus raw header extensions as observed on
/// the wire) to the track it belongs to and, for simulcast, to the specific
/// spatial layer. On success the track's SSRC set, RID mapping, and the
/// session-wide SSRC index are extended.
pub fn resolve_stream(
    registry: &mut TrackRegistry,
    ssrc: SSRC,
    extensions: &[(u8, Bytes)],
) -> Result<ResolvedStream> {
    // Fast path: casual tracks announce their SSRC in SDP and simulcast
    // layers are indexed on first sight.
    if let Ok(track_id) = registry.by_ssrc(ssrc) {
        let track_id = track_id.clone();
        let rid = registry
            .inbound_by_id(&track_id)
            .ok()
            .and_then(|t| t.rid_for_ssrc(ssrc))
            .cloned();
        if let Some(track) = registry.inbound_by_id_mut(&track_id) {
            track.status = InboundTrackStatus::Linked;
        }
        return Ok(ResolvedStream {
            track_id,
            rid,
            newly_linked: false,
        });
    }

    let mut any_simulcast = false;
    let mut decoded_any_mid = false;
    let mut matched: Option<(TrackId, Rid)> = None;

    for track in registry.inbound_tracks() {
        if !track.is_simulcast() {
            continue;
        }
        any_simulcast = true;

        // Decode with this track's negotiated extension set; ids are only
        // meaningful per media section.
        let mid_id = extension_id(track, SDES_MID_URI);
        let Some(mid) = extension_str(extensions, mid_id) else {
            continue;
        };
        decoded_any_mid = true;

        if mid != track.mid {
            continue;
        }

        let rid_id = extension_id(track, SDES_RTP_STREAM_ID_URI);
        match extension_str(extensions, rid_id) {
            Some(rid) => {
                matched = Some((track.id.clone(), rid));
                break;
            }
            // RID-based simulcast is the only supported mode.
            None => return Err(Error::ErrMissingRidExtension),
        }
    }

    if let Some((track_id, rid)) = matched {
        if let Some(track) = registry.inbound_by_id_mut(&track_id) {
            if !track.ssrcs.contains(&ssrc) {
                track.ssrcs.push(ssrc);
            }
            track.rid_to_ssrc.entry(rid.clone()).or_insert(ssrc);
            track.status = InboundTrackStatus::Linked;
        }
        registry.register_ssrc(ssrc, track_id.clone());

        trace!("resolved rtp stream {ssrc} to track {track_id} layer {rid}");
        return Ok(ResolvedStream {
            track_id,
            rid: Some(rid),
            newly_linked: true,
        });
    }

    if any_simulcast && !decoded_any_mid {
        // Known legacy browser bug: simulcast packets without the mandatory
        // mid extension are undecodable.
        return Err(Error::ErrMissingMidExtension);
    }

    Err(Error::ErrUnresolvedStream(ssrc))
}

fn extension_id(track: &super::InboundTrack, uri: &str) -> Option<u8> {
    track
        .extensions
        .iter()
        .find(|e| e.uri == uri)
        .map(|e| e.id)
}

fn extension_str(extensions: &[(u8, Bytes)], id: Option<u8>) -> Option<String> {
    let id = id?;
    let (_, payload) = extensions.iter().find(|(eid, _)| *eid == id)?;
    let value = String::from_utf8_lossy(payload);
    let value = value.trim_end_matches('\0').trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{MediaKind, RtpExtension, RtpMapping};
    use crate::configuration::EndpointDirection;
    use crate::track::InboundTrack;
    use std::collections::HashMap;

    const MID_ID: u8 = 4;
    const RID_ID: u8 = 10;

    fn simulcast_track(id: &str, mid: &str) -> InboundTrack {
        InboundTrack {
            id: id.to_owned(),
            kind: MediaKind::Video,
            status: Default::default(),
            encoding: "H264".to_owned(),
            mid: mid.to_owned(),
            ssrcs: vec![],
            rid_to_ssrc: HashMap::new(),
            rids: vec!["h".to_owned(), "m".to_owned(), "l".to_owned()],
            rtp_mapping: RtpMapping {
                payload_type: 96,
                clock_rate: 90000,
                channels: 0,
            },
            extensions: vec![
                RtpExtension {
                    id: MID_ID,
                    uri: SDES_MID_URI.to_owned(),
                },
                RtpExtension {
                    id: RID_ID,
                    uri: SDES_RTP_STREAM_ID_URI.to_owned(),
                },
            ],
            depayloader: None,
        }
    }

    fn registry_with_simulcast() -> TrackRegistry {
        let mut registry = TrackRegistry::new(EndpointDirection::SendRecv);
        registry.add_inbound(simulcast_track("cam", "1")).unwrap();
        registry
    }

    fn exts(mid: Option<&str>, rid: Option<&str>) -> Vec<(u8, Bytes)> {
        let mut extensions = vec![];
        if let Some(mid) = mid {
            extensions.push((MID_ID, Bytes::copy_from_slice(mid.as_bytes())));
        }
        if let Some(rid) = rid {
            extensions.push((RID_ID, Bytes::copy_from_slice(rid.as_bytes())));
        }
        extensions
    }

    #[test]
    fn test_resolves_layer_and_registers_ssrc() {
        let mut registry = registry_with_simulcast();

        let resolved = resolve_stream(&mut registry, 111, &exts(Some("1"), Some("h"))).unwrap();
        assert_eq!(resolved.track_id, "cam");
        assert_eq!(resolved.rid.as_deref(), Some("h"));
        assert!(resolved.newly_linked);

        let track = registry.inbound_by_id("cam").unwrap();
        assert_eq!(track.ssrcs, vec![111]);
        assert_eq!(track.rid_to_ssrc.get("h"), Some(&111));
        assert_eq!(track.status, InboundTrackStatus::Linked);
        assert_eq!(registry.by_ssrc(111).unwrap(), "cam");
    }

    #[test]
    fn test_resolving_same_ssrc_twice_is_a_noop() {
        let mut registry = registry_with_simulcast();

        resolve_stream(&mut registry, 111, &exts(Some("1"), Some("h"))).unwrap();
        let second = resolve_stream(&mut registry, 111, &exts(Some("1"), Some("h"))).unwrap();

        assert_eq!(second.track_id, "cam");
        assert_eq!(second.rid.as_deref(), Some("h"));
        assert!(!second.newly_linked);

        let track = registry.inbound_by_id("cam").unwrap();
        assert_eq!(track.ssrcs, vec![111]);
        assert_eq!(track.rid_to_ssrc.len(), 1);
    }

    #[test]
    fn test_each_layer_gets_its_own_mapping() {
        let mut registry = registry_with_simulcast();

        resolve_stream(&mut registry, 111, &exts(Some("1"), Some("h"))).unwrap();
        resolve_stream(&mut registry, 222, &exts(Some("1"), Some("m"))).unwrap();

        let track = registry.inbound_by_id("cam").unwrap();
        assert_eq!(track.ssrcs, vec![111, 222]);
        assert_eq!(track.rid_to_ssrc.get("h"), Some(&111));
        assert_eq!(track.rid_to_ssrc.get("m"), Some(&222));
        // Every RID entry's SSRC appears in the track's SSRC set.
        for ssrc in track.rid_to_ssrc.values() {
            assert!(track.ssrcs.contains(ssrc));
        }
    }

    #[test]
    fn test_missing_mid_is_a_protocol_violation() {
        let mut registry = registry_with_simulcast();
        assert_eq!(
            resolve_stream(&mut registry, 111, &exts(None, Some("h"))),
            Err(Error::ErrMissingMidExtension)
        );
    }

    #[test]
    fn test_missing_rid_is_a_protocol_violation() {
        let mut registry = registry_with_simulcast();
        assert_eq!(
            resolve_stream(&mut registry, 111, &exts(Some("1"), None)),
            Err(Error::ErrMissingRidExtension)
        );
    }

    #[test]
    fn test_unknown_mid_leaves_stream_unresolved() {
        let mut registry = registry_with_simulcast();
        assert_eq!(
            resolve_stream(&mut registry, 111, &exts(Some("7"), Some("h"))),
            Err(Error::ErrUnresolvedStream(111))
        );
    }

    #[test]
    fn test_no_simulcast_tracks_leaves_stream_unresolved() {
        let mut registry = TrackRegistry::new(EndpointDirection::SendRecv);
        assert_eq!(
            resolve_stream(&mut registry, 42, &exts(Some("1"), Some("h"))),
            Err(Error::ErrUnresolvedStream(42))
        );
    }
}
