//! # RTC Endpoint - Sans-I/O WebRTC Negotiation Core
//!
//! This crate negotiates and maintains a WebRTC peer connection on behalf
//! of a media-processing pipeline, using a **sans-I/O architecture**: it
//! turns SDP offer/answer exchanges and ICE/DTLS signaling events into a
//! live set of inbound and outbound media tracks, and keeps that track set
//! consistent as tracks are added, removed, or renegotiated mid-session.
//!
//! The endpoint performs no I/O of its own. Three collaborators surround
//! it, all owned by the embedder:
//!
//! - a **signaling channel** to the remote peer, carrying
//!   [`SignalingMessage`](signaling::SignalingMessage)s,
//! - a **transport** doing the actual ICE connectivity checks, DTLS
//!   handshake, and RTP I/O, reporting
//!   [`TransportEvent`](endpoint::event::TransportEvent)s and executing
//!   [`TransportCommand`](endpoint::command::TransportCommand)s,
//! - the **owning application**, issuing
//!   [`ControlRequest`](endpoint::event::ControlRequest)s and consuming
//!   [`EndpointNotification`](endpoint::notification::EndpointNotification)s.
//!
//! ## Event Loop
//!
//! ```no_run
//! use rtc_endpoint::configuration::RTCEndpointConfigurationBuilder;
//! use rtc_endpoint::endpoint::RTCEndpoint;
//! use rtc_endpoint::endpoint::event::{ControlRequest, TransportEvent};
//! use rtc_endpoint::sansio::Protocol;
//! use rtc_endpoint::signaling::SignalingMessage;
//!
//! # fn recv_signaling() -> Option<String> { None }
//! # fn send_signaling(_: &str) {}
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use rtc_endpoint::codec::MediaKind;
//! use rtc_endpoint::track::OutboundTrackInit;
//!
//! let config = RTCEndpointConfigurationBuilder::new()
//!     .with_simulcast(true)
//!     .build();
//! let mut endpoint = RTCEndpoint::new(config);
//!
//! // Transport bootstrap (normally driven by the ICE/DTLS stack).
//! endpoint.handle_event(TransportEvent::LocalIceCredentials {
//!     ufrag: "frag".to_owned(),
//!     password: "pwd".to_owned(),
//! })?;
//! endpoint.handle_event(TransportEvent::DtlsFingerprint {
//!     algorithm: "sha-256".to_owned(),
//!     fingerprint: vec![0xaa; 32],
//! })?;
//!
//! // Publish a video track; the endpoint asks the remote side for an
//! // offer and restarts its ICE stream.
//! endpoint.handle_write(ControlRequest::AddTracks(vec![OutboundTrackInit {
//!     id: "camera".to_owned(),
//!     kind: MediaKind::Video,
//!     encoding: "H264".to_owned(),
//!     ssrc: None,
//! }]))?;
//!
//! loop {
//!     // 1. Feed inbound signaling.
//!     if let Some(json) = recv_signaling() {
//!         let msg: SignalingMessage = serde_json::from_str(&json)?;
//!         endpoint.handle_read(msg)?;
//!     }
//!
//!     // 2. Flush outbound signaling.
//!     while let Some(msg) = endpoint.poll_write() {
//!         send_signaling(&serde_json::to_string(&msg)?);
//!     }
//!
//!     // 3. Drive the transport.
//!     while let Some(command) = endpoint.poll_event() {
//!         // transport.execute(command);
//!         let _ = command;
//!     }
//!
//!     // 4. Deliver notifications to the application.
//!     while let Some(notification) = endpoint.poll_read() {
//!         let _ = notification;
//!     }
//!     # break;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`endpoint`]** - the signaling façade owning all session state
//! - **[`track`]** - track registry and simulcast stream resolution
//! - **[`negotiation`]** - SDP offer diffing, answer rendering, and the
//!   ICE-restart coordinator
//! - **[`signaling`]** - the outward offer/answer/candidate/offerData
//!   protocol
//! - **[`configuration`]** - endpoint configuration builder
//! - **[`codec`]** - codec, RTP mapping, and header-extension types

#![warn(rust_2018_idioms)]

pub use {sansio, sdp};

pub mod codec;
pub mod configuration;
mod constants;
pub mod endpoint;
pub mod error;
pub mod negotiation;
pub mod signaling;
pub mod track;
