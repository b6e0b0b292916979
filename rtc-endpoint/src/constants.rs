pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";

pub(crate) const SDP_ATTRIBUTE_MID: &str = "mid";
pub(crate) const SDP_ATTRIBUTE_RID: &str = "rid";
pub(crate) const SDP_ATTRIBUTE_SIMULCAST: &str = "simulcast";
pub(crate) const SDP_ATTRIBUTE_RTPMAP: &str = "rtpmap";
pub(crate) const SDP_ATTRIBUTE_FMTP: &str = "fmtp";
pub(crate) const SDP_ATTRIBUTE_EXTMAP: &str = "extmap";
pub(crate) const SDP_ATTRIBUTE_SSRC: &str = "ssrc";
pub(crate) const SDP_ATTRIBUTE_MSID: &str = "msid";
pub(crate) const SDP_ATTRIBUTE_GROUP: &str = "group";
pub(crate) const SDP_ATTRIBUTE_SETUP: &str = "setup";
pub(crate) const SDP_ATTRIBUTE_ICE_UFRAG: &str = "ice-ufrag";
pub(crate) const SDP_ATTRIBUTE_ICE_PWD: &str = "ice-pwd";
pub(crate) const SDP_ATTRIBUTE_ICE_LITE: &str = "ice-lite";
pub(crate) const SDP_ATTRIBUTE_CANDIDATE: &str = "candidate";
pub(crate) const SDP_ATTRIBUTE_RTCP_MUX: &str = "rtcp-mux";
