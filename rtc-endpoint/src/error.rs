use crate::track::SSRC;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("track direction is not allowed by the endpoint direction")]
    ErrDirectionMismatch,
    #[error("duplicate track id")]
    ErrDuplicateTrackId,
    #[error("track not found")]
    ErrTrackNotFound,
    #[error("rtp stream is missing the sdes mid header extension")]
    ErrMissingMidExtension,
    #[error("rtp stream is missing the sdes rtp-stream-id header extension")]
    ErrMissingRidExtension,
    #[error("rtp stream with ssrc {0} does not match any track")]
    ErrUnresolvedStream(SSRC),
    #[error("remote description media section without a mid value")]
    ErrRemoteDescriptionWithoutMid,
    #[error("remote description without ice credentials")]
    ErrRemoteDescriptionWithoutCredentials,
    #[error("local ice credentials are not available yet")]
    ErrNoLocalCredentials,
    #[error("dtls fingerprint is not available yet")]
    ErrNoDtlsFingerprint,
    #[error("endpoint is closed")]
    ErrEndpointClosed,

    #[error("Sdp Err: {0}")]
    Sdp(String),
    #[error("Signaling Err: {0}")]
    Signaling(String),
    #[error("{0}")]
    Other(String),
}

impl From<sdp::Error> for Error {
    fn from(e: sdp::Error) -> Self {
        Error::Sdp(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Signaling(e.to_string())
    }
}
