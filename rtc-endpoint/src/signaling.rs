//! Outward signaling protocol exchanged with the remote peer.
//!
//! The endpoint never talks to the network itself; these messages are
//! produced by [`poll_write`](sansio::Protocol::poll_write) and consumed by
//! [`handle_read`](sansio::Protocol::handle_read), with transport over an
//! opaque signaling channel (WebSocket, HTTP, ...) owned by the embedder.

use crate::track::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Numbers of locally added tracks awaiting their first negotiation round,
/// advertised in `offerData` so the remote side can pre-allocate matching
/// media sections in its offer.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCounts {
    pub audio: usize,
    pub video: usize,
}

/// One integrated relay (TURN) server the remote peer may use to reach this
/// endpoint.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayServer {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credential: String,
}

/// Messages exchanged with the remote signaling channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SignalingMessage {
    /// Sent by the far side to request or update the session.
    Offer { sdp: String },
    /// Sent in response to an offer. Carries the mid to track id
    /// correlation table the remote side needs for the next round.
    Answer {
        sdp: String,
        mid_to_track_id: HashMap<String, TrackId>,
    },
    /// Incremental ICE candidate, exchanged in both directions.
    Candidate {
        candidate: String,
        #[serde(default)]
        sdp_m_line_index: u32,
    },
    /// Asks the remote side to initiate an offer/answer round for locally
    /// added tracks.
    OfferData {
        tracks: TrackCounts,
        integrated_relay_servers: Vec<RelayServer>,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_signaling_message_json() {
        let tests = vec![
            (
                SignalingMessage::Offer {
                    sdp: "sdp".to_owned(),
                },
                r#"{"type":"offer","sdp":"sdp"}"#,
            ),
            (
                SignalingMessage::Candidate {
                    candidate: "candidate:0 1 UDP 2122260223 127.0.0.1 49152 typ host"
                        .to_owned(),
                    sdp_m_line_index: 0,
                },
                r#"{"type":"candidate","candidate":"candidate:0 1 UDP 2122260223 127.0.0.1 49152 typ host","sdpMLineIndex":0}"#,
            ),
            (
                SignalingMessage::OfferData {
                    tracks: TrackCounts { audio: 1, video: 2 },
                    integrated_relay_servers: vec![],
                },
                r#"{"type":"offerData","tracks":{"audio":1,"video":2},"integratedRelayServers":[]}"#,
            ),
        ];

        for (msg, expected) in tests {
            let json = serde_json::to_string(&msg).expect("marshal");
            assert_eq!(json, expected);

            let back: SignalingMessage = serde_json::from_str(&json).expect("unmarshal");
            assert_eq!(back, msg);
        }
    }

    #[test]
    fn test_answer_carries_mid_table() {
        let mut mid_to_track_id = HashMap::new();
        mid_to_track_id.insert("0".to_owned(), "audio-0".to_owned());

        let msg = SignalingMessage::Answer {
            sdp: "v=0".to_owned(),
            mid_to_track_id,
        };

        let json = serde_json::to_string(&msg).expect("marshal");
        assert!(json.contains(r#""midToTrackId":{"0":"audio-0"}"#), "{json}");
    }
}
