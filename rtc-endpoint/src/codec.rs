use std::fmt;

/// PayloadType identifies the format of the RTP payload and determines
/// its interpretation by the application.
/// <https://tools.ietf.org/html/rfc3550#section-3>
pub type PayloadType = u8;

pub const ENCODING_H264: &str = "H264";
pub const ENCODING_VP8: &str = "VP8";
pub const ENCODING_OPUS: &str = "opus";

/// URI of the sdes mid RTP header extension.
/// <https://tools.ietf.org/html/rfc8843>
pub const SDES_MID_URI: &str = "urn:ietf:params:rtp-hdrext:sdes:mid";

/// URI of the sdes rtp-stream-id RTP header extension carrying the
/// simulcast layer identifier.
/// <https://tools.ietf.org/html/rfc8852>
pub const SDES_RTP_STREAM_ID_URI: &str = "urn:ietf:params:rtp-hdrext:sdes:rtp-stream-id";

/// URI of the ssrc-audio-level RTP header extension used for
/// voice-activity detection.
pub const AUDIO_LEVEL_URI: &str = "urn:ietf:params:rtp-hdrext:ssrc-audio-level";

/// Kind of media carried by a track or media section.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Unspecified or unknown media kind
    #[default]
    Unspecified,

    Audio,

    Video,
}

impl From<&str> for MediaKind {
    fn from(raw: &str) -> Self {
        match raw {
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            _ => MediaKind::Unspecified,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Unspecified => crate::constants::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// Clock rate and payload type pair used for RTP framing, as negotiated
/// through an `a=rtpmap` line.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct RtpMapping {
    pub payload_type: PayloadType,
    pub clock_rate: u32,
    /// Number of audio channels, 0 when not applicable.
    pub channels: u16,
}

/// One negotiated RTP header extension (`a=extmap`). The id is taken from
/// the remote offer so both sides agree on the wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpExtension {
    pub id: u8,
    pub uri: String,
}

/// Depayloading filter selected for an inbound track. Resolved once at
/// track creation from the negotiated encoding name, never re-dispatched
/// per packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DepayloaderKind {
    H264,
    Vp8,
    Opus,
}

impl DepayloaderKind {
    /// Looks up the depayloader for an encoding name. Unknown encodings get
    /// no depayloader; the application receives raw RTP payloads for them.
    pub fn for_encoding(encoding: &str) -> Option<DepayloaderKind> {
        if encoding.eq_ignore_ascii_case(ENCODING_H264) {
            Some(DepayloaderKind::H264)
        } else if encoding.eq_ignore_ascii_case(ENCODING_VP8) {
            Some(DepayloaderKind::Vp8)
        } else if encoding.eq_ignore_ascii_case(ENCODING_OPUS) {
            Some(DepayloaderKind::Opus)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_media_kind_from_str() {
        assert_eq!(MediaKind::from("audio"), MediaKind::Audio);
        assert_eq!(MediaKind::from("video"), MediaKind::Video);
        assert_eq!(MediaKind::from("application"), MediaKind::Unspecified);
    }

    #[test]
    fn test_depayloader_lookup_is_case_insensitive() {
        assert_eq!(
            DepayloaderKind::for_encoding("h264"),
            Some(DepayloaderKind::H264)
        );
        assert_eq!(
            DepayloaderKind::for_encoding("OPUS"),
            Some(DepayloaderKind::Opus)
        );
        assert_eq!(DepayloaderKind::for_encoding("AV1"), None);
    }
}
