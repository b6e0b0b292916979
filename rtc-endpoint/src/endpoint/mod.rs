pub mod command;
pub mod event;
pub mod notification;

use crate::configuration::{ProtocolViolationPolicy, RTCEndpointConfiguration};
use crate::endpoint::command::TransportCommand;
use crate::endpoint::event::{ControlRequest, TransportEvent};
use crate::endpoint::notification::EndpointNotification;
use crate::error::{Error, Result};
use crate::negotiation::restart::{IceCredentials, RestartCoordinator, RestartState};
use crate::negotiation::{self, DtlsFingerprint, NegotiationOutcome};
use crate::signaling::{RelayServer, SignalingMessage};
use crate::track::simulcast;
use crate::track::{OutboundTrackStatus, TrackId, TrackRegistry};
use log::{debug, info, warn};
use sdp::description::session::Origin;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Local candidate-gathering phase. Gathering starts exactly once, the
/// first time any track exists; later rounds replay what was gathered.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GatheringPhase {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

/// The endpoint negotiates and maintains a WebRTC peer connection on
/// behalf of a media-processing pipeline. It owns the session state
/// exclusively; every state transition is driven by one of three
/// serialized inputs and all effects leave through polling queues:
///
/// - [`handle_read`](sansio::Protocol::handle_read): signaling messages
///   from the remote peer; answers and candidates come back out of
///   [`poll_write`](sansio::Protocol::poll_write).
/// - [`handle_write`](sansio::Protocol::handle_write): track add/remove
///   and renegotiation requests from the owning application;
///   notifications come back out of [`poll_read`](sansio::Protocol::poll_read).
/// - [`handle_event`](sansio::Protocol::handle_event): transport
///   collaborator notifications; commands to the transport come back out
///   of [`poll_event`](sansio::Protocol::poll_event).
///
/// Nothing blocks and no timers run inside the endpoint; retry and timeout
/// behavior for connectivity belongs to the transport collaborator.
pub struct RTCEndpoint {
    configuration: RTCEndpointConfiguration,
    registry: TrackRegistry,
    coordinator: RestartCoordinator,
    /// mid correlation table carried between negotiation rounds.
    mid_to_track_id: HashMap<String, TrackId>,
    local_credentials: Option<IceCredentials>,
    dtls_fingerprint: Option<DtlsFingerprint>,
    /// Gathered local candidates, kept for replay in later rounds.
    local_candidates: Vec<String>,
    gathering: GatheringPhase,
    relay_servers: Vec<RelayServer>,
    sdp_origin: Origin,
    closed: bool,

    signaling_outs: VecDeque<SignalingMessage>,
    command_outs: VecDeque<TransportCommand>,
    notification_outs: VecDeque<EndpointNotification>,
}

impl RTCEndpoint {
    pub fn new(configuration: RTCEndpointConfiguration) -> Self {
        let registry = TrackRegistry::new(configuration.direction);
        let relay_servers = configuration.relay_servers.clone();
        RTCEndpoint {
            configuration,
            registry,
            coordinator: RestartCoordinator::new(),
            mid_to_track_id: HashMap::new(),
            local_credentials: None,
            dtls_fingerprint: None,
            local_candidates: vec![],
            gathering: GatheringPhase::default(),
            relay_servers,
            sdp_origin: Origin::default(),
            closed: false,
            signaling_outs: VecDeque::new(),
            command_outs: VecDeque::new(),
            notification_outs: VecDeque::new(),
        }
    }

    /// Read-only view of the track registry.
    pub fn tracks(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn restart_state(&self) -> RestartState {
        self.coordinator.state()
    }

    pub fn gathering_phase(&self) -> GatheringPhase {
        self.gathering
    }

    pub fn configuration(&self) -> &RTCEndpointConfiguration {
        &self.configuration
    }

    /// Hex-encoded local DTLS fingerprint, once the transport reported it.
    pub fn dtls_fingerprint(&self) -> Option<&str> {
        self.dtls_fingerprint.as_ref().map(|f| f.value.as_str())
    }

    fn handle_offer(&mut self, sdp_text: &str) -> Result<()> {
        let offer = negotiation::parse_session_description(sdp_text)?;

        // Remote ICE details ride along in the offer; split them out for
        // the transport before touching the track set.
        let (remote_credentials, candidates) = negotiation::extract_ice_details(&offer)?;
        if self
            .coordinator
            .update_remote_credentials(remote_credentials.clone())
        {
            self.command_outs
                .push_back(TransportCommand::SetRemoteCredentials {
                    ufrag: remote_credentials.ufrag,
                    password: remote_credentials.password,
                });
        }
        for candidate in candidates {
            self.command_outs
                .push_back(TransportCommand::SetRemoteCandidate { candidate });
        }

        let local_credentials = self
            .local_credentials
            .clone()
            .ok_or(Error::ErrNoLocalCredentials)?;
        let fingerprint = self
            .dtls_fingerprint
            .clone()
            .ok_or(Error::ErrNoDtlsFingerprint)?;

        let NegotiationOutcome {
            new_inbound,
            removed_inbound,
            resolved_inbound,
            resolved_outbound,
            answer_sdp,
            mid_to_track_id,
        } = negotiation::negotiate(
            &offer,
            &self.mid_to_track_id,
            &mut self.registry,
            &self.configuration,
            &local_credentials,
            &fingerprint,
            &mut self.sdp_origin,
        )?;

        debug!(
            "negotiated offer: {} new inbound, {} removed, {} inbound, {} outbound",
            new_inbound.len(),
            removed_inbound.len(),
            resolved_inbound.len(),
            resolved_outbound.len()
        );

        if !removed_inbound.is_empty() {
            self.notification_outs
                .push_back(EndpointNotification::TracksRemoved(removed_inbound));
        }

        for id in &new_inbound {
            if let Ok(track) = self.registry.inbound_by_id(id) {
                // Simulcast tracks become usable layer by layer, once their
                // streams resolve from the wire; only casual tracks are
                // announced at negotiation time.
                if track.is_simulcast() {
                    continue;
                }
                self.notification_outs
                    .push_back(EndpointNotification::NewInboundTrack {
                        id: track.id.clone(),
                        rid: None,
                        encoding: track.encoding.clone(),
                        depayloader: track.depayloader,
                    });
            }
        }

        self.signaling_outs.push_back(SignalingMessage::Answer {
            sdp: answer_sdp,
            mid_to_track_id: mid_to_track_id.clone(),
        });
        self.mid_to_track_id = mid_to_track_id;

        // Disabled tracks were just rendered out of the session; now they
        // can actually be dropped.
        let stripped = self.registry.strip_disabled();
        if !stripped.is_empty() {
            debug!("stripped {} disabled outbound tracks", stripped.len());
        }

        if !self.registry.is_empty() {
            match self.gathering {
                GatheringPhase::NotStarted => {
                    self.gathering = GatheringPhase::InProgress;
                    self.command_outs
                        .push_back(TransportCommand::GatherCandidates);
                }
                GatheringPhase::InProgress | GatheringPhase::Done => {
                    // Renegotiation rounds re-emit what was already
                    // gathered instead of gathering again.
                    for candidate in &self.local_candidates {
                        self.signaling_outs.push_back(SignalingMessage::Candidate {
                            candidate: candidate.clone(),
                            sdp_m_line_index: 0,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Starts a renegotiation round if the coordinator owes one and none is
    /// in flight: the pending cohort advances to ready, the transport gets
    /// an ICE-stream-restart command, and the remote side is asked to
    /// produce an offer.
    fn try_start_round(&mut self) {
        if !self.coordinator.maybe_start(self.registry.has_outbound()) {
            return;
        }

        let promoted = self
            .registry
            .transition_outbound(OutboundTrackStatus::Pending, OutboundTrackStatus::Ready);
        if !promoted.is_empty() {
            debug!("promoted {} pending tracks to ready", promoted.len());
        }

        self.command_outs
            .push_back(TransportCommand::RestartIceStream);
        self.signaling_outs.push_back(SignalingMessage::OfferData {
            tracks: self.registry.unnegotiated_counts(),
            integrated_relay_servers: self.relay_servers.clone(),
        });
    }

    fn handle_transport_event(&mut self, evt: TransportEvent) -> Result<()> {
        match evt {
            TransportEvent::CandidateDiscovered { candidate } => {
                self.local_candidates.push(candidate.clone());
                self.signaling_outs.push_back(SignalingMessage::Candidate {
                    candidate,
                    sdp_m_line_index: 0,
                });
                Ok(())
            }
            TransportEvent::CandidateGatheringDone => {
                debug!("candidate gathering done, {} gathered", self.local_candidates.len());
                self.gathering = GatheringPhase::Done;
                Ok(())
            }
            TransportEvent::DtlsFingerprint {
                algorithm,
                fingerprint,
            } => {
                let value = fingerprint
                    .iter()
                    .map(|b| format!("{b:02x}"))
                    .collect::<Vec<_>>()
                    .join(":");
                self.dtls_fingerprint = Some(DtlsFingerprint { algorithm, value });
                Ok(())
            }
            TransportEvent::LocalIceCredentials { ufrag, password } => {
                self.local_credentials = Some(IceCredentials { ufrag, password });
                Ok(())
            }
            TransportEvent::NewRtpStream {
                ssrc, extensions, ..
            } => self.handle_new_rtp_stream(ssrc, &extensions),
            TransportEvent::ConnectionReady => {
                if self.coordinator.is_restarting() {
                    let linked = self
                        .registry
                        .transition_outbound(OutboundTrackStatus::Ready, OutboundTrackStatus::Linked);
                    self.coordinator.finish_round();
                    info!("negotiation completed, {} tracks linked", linked.len());
                    self.notification_outs
                        .push_back(EndpointNotification::NegotiationCompleted(linked));
                    // Drain a restart queued behind the finished round.
                    self.try_start_round();
                } else {
                    debug!("connection ready outside of a negotiation round");
                }
                Ok(())
            }
            TransportEvent::ConnectionFailed => {
                self.coordinator.fail_round();
                self.try_start_round();
                Ok(())
            }
            TransportEvent::RelayServerAllocated(server) => {
                debug!("relay server allocated: {:?}", server.urls);
                self.relay_servers.push(server);
                Ok(())
            }
            TransportEvent::VoiceActivity { ssrc, activity } => {
                match self.registry.by_ssrc(ssrc) {
                    Ok(track_id) => {
                        let track_id = track_id.clone();
                        self.notification_outs
                            .push_back(EndpointNotification::VoiceActivity { track_id, activity });
                    }
                    Err(_) => warn!("voice activity for unknown ssrc {ssrc}"),
                }
                Ok(())
            }
        }
    }

    fn handle_new_rtp_stream(
        &mut self,
        ssrc: crate::track::SSRC,
        extensions: &[(u8, bytes::Bytes)],
    ) -> Result<()> {
        match simulcast::resolve_stream(&mut self.registry, ssrc, extensions) {
            Ok(resolved) => {
                if resolved.newly_linked {
                    if let Ok(track) = self.registry.inbound_by_id(&resolved.track_id) {
                        self.notification_outs
                            .push_back(EndpointNotification::NewInboundTrack {
                                id: track.id.clone(),
                                rid: resolved.rid,
                                encoding: track.encoding.clone(),
                                depayloader: track.depayloader,
                            });
                    }
                }
                Ok(())
            }
            Err(err @ (Error::ErrMissingMidExtension | Error::ErrMissingRidExtension)) => {
                match self.configuration.violation_policy {
                    ProtocolViolationPolicy::FailSession => Err(err),
                    ProtocolViolationPolicy::DropStream => {
                        warn!("dropping rtp stream {ssrc}: {err}");
                        self.notification_outs
                            .push_back(EndpointNotification::ProtocolViolation {
                                ssrc,
                                reason: err.to_string(),
                            });
                        Ok(())
                    }
                }
            }
            Err(err @ Error::ErrUnresolvedStream(_)) => {
                // Possibly a not-yet-negotiated track; drop but stay
                // observable.
                warn!("dropping rtp stream {ssrc}: {err}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl sansio::Protocol<SignalingMessage, ControlRequest, TransportEvent> for RTCEndpoint {
    type Rout = EndpointNotification;
    type Wout = SignalingMessage;
    type Eout = TransportCommand;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: SignalingMessage) -> Result<()> {
        if self.closed {
            return Err(Error::ErrEndpointClosed);
        }
        match msg {
            SignalingMessage::Offer { sdp } => self.handle_offer(&sdp),
            SignalingMessage::Candidate { candidate, .. } => {
                self.command_outs
                    .push_back(TransportCommand::SetRemoteCandidate { candidate });
                Ok(())
            }
            SignalingMessage::Answer { .. } | SignalingMessage::OfferData { .. } => {
                // The endpoint is always the answering side.
                warn!("unexpected signaling message, ignoring");
                Ok(())
            }
        }
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.notification_outs.pop_front()
    }

    fn handle_write(&mut self, req: ControlRequest) -> Result<()> {
        if self.closed {
            return Err(Error::ErrEndpointClosed);
        }
        match req {
            ControlRequest::AddTracks(inits) => {
                let added = self.registry.add_outbound(inits)?;
                info!("added {} outbound tracks", added.len());
                self.coordinator.request_restart();
                self.try_start_round();
            }
            ControlRequest::RemoveTracks(ids) => {
                let affected = self.registry.remove_outbound(&ids);
                if !affected.is_empty() {
                    info!("disabled {} outbound tracks", affected.len());
                    self.coordinator.request_restart();
                    self.try_start_round();
                }
            }
            ControlRequest::RenegotiateTracks => {
                self.coordinator.request_restart();
                self.try_start_round();
            }
        }
        Ok(())
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.signaling_outs.pop_front()
    }

    fn handle_event(&mut self, evt: TransportEvent) -> Result<()> {
        if self.closed {
            return Err(Error::ErrEndpointClosed);
        }
        self.handle_transport_event(evt)
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.command_outs.pop_front()
    }

    fn handle_timeout(&mut self, _now: Instant) -> Result<()> {
        // No timers inside the core; connectivity retry and timeout belong
        // to the transport collaborator.
        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Instant> {
        None
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            info!("endpoint closed");
        }
        Ok(())
    }
}
