use crate::codec::{
    MediaKind, AUDIO_LEVEL_URI, ENCODING_H264, ENCODING_OPUS, ENCODING_VP8, SDES_MID_URI,
    SDES_RTP_STREAM_ID_URI,
};
use crate::signaling::RelayServer;
use std::fmt;

/// Which way media may flow through the endpoint.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointDirection {
    #[default]
    SendRecv,
    /// Output only: the endpoint sends media but accepts no inbound tracks.
    SendOnly,
    /// Input only: the endpoint receives media but accepts no outbound tracks.
    RecvOnly,
}

impl EndpointDirection {
    pub(crate) fn can_send(self) -> bool {
        self != EndpointDirection::RecvOnly
    }

    pub(crate) fn can_recv(self) -> bool {
        self != EndpointDirection::SendOnly
    }
}

impl fmt::Display for EndpointDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            EndpointDirection::SendRecv => "sendrecv",
            EndpointDirection::SendOnly => "sendonly",
            EndpointDirection::RecvOnly => "recvonly",
        };
        write!(f, "{s}")
    }
}

/// What to do when a remote stream violates the simulcast signaling
/// contract (missing sdes mid or rtp-stream-id header extension). Legacy
/// peers are known to omit them; the media is undecodable either way, so the
/// violation is never swallowed silently.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtocolViolationPolicy {
    /// Fail the whole session: the violation propagates as an error out of
    /// the event handler.
    #[default]
    FailSession,
    /// Drop the offending stream, log it, and emit a protocol-violation
    /// notification to the application.
    DropStream,
}

/// Predicate deciding whether an offered encoding is acceptable for a media
/// line of the given kind. Applied to every `a=rtpmap` entry of the remote
/// offer; media lines with no acceptable entry are rejected in the answer.
pub type CodecFilter = fn(MediaKind, &str, u32) -> bool;

pub(crate) fn default_codec_filter(kind: MediaKind, encoding: &str, clock_rate: u32) -> bool {
    match kind {
        MediaKind::Audio => encoding.eq_ignore_ascii_case(ENCODING_OPUS) && clock_rate == 48000,
        MediaKind::Video => {
            (encoding.eq_ignore_ascii_case(ENCODING_H264)
                || encoding.eq_ignore_ascii_case(ENCODING_VP8))
                && clock_rate == 90000
        }
        MediaKind::Unspecified => false,
    }
}

/// A Configuration defines how the endpoint negotiates with its remote
/// peer. Configurations may be set up once and reused across endpoints;
/// they are treated as readonly after `build()`.
#[derive(Clone)]
pub struct RTCEndpointConfiguration {
    pub(crate) direction: EndpointDirection,
    pub(crate) codec_filter: CodecFilter,
    /// Header-extension URIs the endpoint is willing to negotiate. Offered
    /// `a=extmap` entries outside this set are dropped from the answer.
    pub(crate) extensions: Vec<String>,
    pub(crate) simulcast: bool,
    pub(crate) ice_lite: bool,
    pub(crate) relay_servers: Vec<RelayServer>,
    pub(crate) violation_policy: ProtocolViolationPolicy,
}

impl Default for RTCEndpointConfiguration {
    fn default() -> Self {
        RTCEndpointConfigurationBuilder::new().build()
    }
}

#[derive(Default)]
pub struct RTCEndpointConfigurationBuilder {
    direction: EndpointDirection,
    codec_filter: Option<CodecFilter>,
    extensions: Option<Vec<String>>,
    simulcast: bool,
    ice_lite: bool,
    relay_servers: Vec<RelayServer>,
    violation_policy: ProtocolViolationPolicy,
}

impl RTCEndpointConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: EndpointDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Replaces the default allow-list (Opus at 48 kHz, H264/VP8 at 90 kHz)
    /// with a custom predicate.
    pub fn with_codec_filter(mut self, codec_filter: CodecFilter) -> Self {
        self.codec_filter = Some(codec_filter);
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn with_simulcast(mut self, simulcast: bool) -> Self {
        self.simulcast = simulcast;
        self
    }

    /// Marks the endpoint as an ICE-lite agent; the answer carries the
    /// session-level `a=ice-lite` indicator.
    pub fn with_ice_lite(mut self, ice_lite: bool) -> Self {
        self.ice_lite = ice_lite;
        self
    }

    pub fn with_relay_servers(mut self, relay_servers: Vec<RelayServer>) -> Self {
        self.relay_servers = relay_servers;
        self
    }

    pub fn with_violation_policy(mut self, violation_policy: ProtocolViolationPolicy) -> Self {
        self.violation_policy = violation_policy;
        self
    }

    pub fn build(self) -> RTCEndpointConfiguration {
        RTCEndpointConfiguration {
            direction: self.direction,
            codec_filter: self.codec_filter.unwrap_or(default_codec_filter),
            extensions: self.extensions.unwrap_or_else(|| {
                vec![
                    SDES_MID_URI.to_owned(),
                    SDES_RTP_STREAM_ID_URI.to_owned(),
                    AUDIO_LEVEL_URI.to_owned(),
                ]
            }),
            simulcast: self.simulcast,
            ice_lite: self.ice_lite,
            relay_servers: self.relay_servers,
            violation_policy: self.violation_policy,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_codec_filter() {
        assert!(default_codec_filter(MediaKind::Audio, "opus", 48000));
        assert!(default_codec_filter(MediaKind::Video, "H264", 90000));
        assert!(default_codec_filter(MediaKind::Video, "VP8", 90000));
        assert!(!default_codec_filter(MediaKind::Audio, "opus", 8000));
        assert!(!default_codec_filter(MediaKind::Video, "AV1", 90000));
    }

    #[test]
    fn test_builder_defaults() {
        let config = RTCEndpointConfigurationBuilder::new().build();
        assert_eq!(config.direction, EndpointDirection::SendRecv);
        assert!(!config.simulcast);
        assert!(config.extensions.iter().any(|uri| uri == SDES_MID_URI));
    }
}
