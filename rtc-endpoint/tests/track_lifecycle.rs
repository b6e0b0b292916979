/// Full lifecycle of a locally added outbound track:
///
/// 1. The application adds a pending video track.
/// 2. The coordinator starts a round: the track becomes ready, the
///    transport gets an ICE-stream-restart command, and the remote side is
///    asked via offerData to produce an offer.
/// 3. The remote offer pairs the track with a media section; the answer
///    goes back out.
/// 4. On connection-ready the track becomes linked and the application is
///    told the negotiation completed.
use anyhow::Result;
use rtc_endpoint::codec::MediaKind;
use rtc_endpoint::configuration::RTCEndpointConfigurationBuilder;
use rtc_endpoint::endpoint::command::TransportCommand;
use rtc_endpoint::endpoint::event::{ControlRequest, TransportEvent};
use rtc_endpoint::endpoint::notification::EndpointNotification;
use rtc_endpoint::endpoint::{GatheringPhase, RTCEndpoint};
use rtc_endpoint::negotiation::restart::RestartState;
use rtc_endpoint::sansio::Protocol;
use rtc_endpoint::signaling::SignalingMessage;
use rtc_endpoint::track::{OutboundTrackInit, OutboundTrackStatus};

fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn bootstrapped_endpoint() -> Result<RTCEndpoint> {
    let mut endpoint = RTCEndpoint::new(RTCEndpointConfigurationBuilder::new().build());
    endpoint.handle_event(TransportEvent::LocalIceCredentials {
        ufrag: "localfrag".to_owned(),
        password: "localpwd".to_owned(),
    })?;
    endpoint.handle_event(TransportEvent::DtlsFingerprint {
        algorithm: "sha-256".to_owned(),
        fingerprint: vec![0xab, 0xcd, 0xef],
    })?;
    Ok(endpoint)
}

fn drain_commands(endpoint: &mut RTCEndpoint) -> Vec<TransportCommand> {
    let mut commands = vec![];
    while let Some(command) = endpoint.poll_event() {
        commands.push(command);
    }
    commands
}

fn drain_signaling(endpoint: &mut RTCEndpoint) -> Vec<SignalingMessage> {
    let mut messages = vec![];
    while let Some(msg) = endpoint.poll_write() {
        messages.push(msg);
    }
    messages
}

fn drain_notifications(endpoint: &mut RTCEndpoint) -> Vec<EndpointNotification> {
    let mut notifications = vec![];
    while let Some(n) = endpoint.poll_read() {
        notifications.push(n);
    }
    notifications
}

const REMOTE_OFFER: &str = concat!(
    "v=0\r\n",
    "o=- 100 2 IN IP4 127.0.0.1\r\n",
    "s=-\r\n",
    "t=0 0\r\n",
    "a=group:BUNDLE 0\r\n",
    "m=video 9 UDP/TLS/RTP/SAVPF 96\r\n",
    "c=IN IP4 0.0.0.0\r\n",
    "a=mid:0\r\n",
    "a=recvonly\r\n",
    "a=rtpmap:96 H264/90000\r\n",
    "a=setup:actpass\r\n",
    "a=ice-ufrag:remotefrag\r\n",
    "a=ice-pwd:remotepwd\r\n",
    "a=candidate:1 1 UDP 2122260223 192.168.0.10 49152 typ host\r\n",
);

#[test]
fn test_outbound_track_lifecycle() -> Result<()> {
    init_logging();

    let mut endpoint = bootstrapped_endpoint()?;
    assert_eq!(endpoint.restart_state(), RestartState::Idle);

    // 1. Add a pending video track; the coordinator starts a round.
    endpoint.handle_write(ControlRequest::AddTracks(vec![OutboundTrackInit {
        id: "camera".to_owned(),
        kind: MediaKind::Video,
        encoding: "H264".to_owned(),
        ssrc: None,
    }]))?;

    assert_eq!(
        endpoint.restart_state(),
        RestartState::Restarting { queued: false }
    );
    assert_eq!(
        endpoint.tracks().outbound_by_id("camera").unwrap().status,
        OutboundTrackStatus::Ready
    );

    let commands = drain_commands(&mut endpoint);
    assert_eq!(commands, vec![TransportCommand::RestartIceStream]);

    let messages = drain_signaling(&mut endpoint);
    assert_eq!(messages.len(), 1);
    match &messages[0] {
        SignalingMessage::OfferData { tracks, .. } => {
            assert_eq!(tracks.video, 1);
            assert_eq!(tracks.audio, 0);
        }
        other => panic!("expected offerData, got {other:?}"),
    }

    // 2. The remote offer arrives and pairs the track.
    endpoint.handle_read(SignalingMessage::Offer {
        sdp: REMOTE_OFFER.to_owned(),
    })?;

    let commands = drain_commands(&mut endpoint);
    assert!(commands.contains(&TransportCommand::SetRemoteCredentials {
        ufrag: "remotefrag".to_owned(),
        password: "remotepwd".to_owned(),
    }));
    assert!(commands
        .iter()
        .any(|c| matches!(c, TransportCommand::SetRemoteCandidate { .. })));
    // First round with tracks present: gathering starts exactly once.
    assert!(commands.contains(&TransportCommand::GatherCandidates));
    assert_eq!(endpoint.gathering_phase(), GatheringPhase::InProgress);

    let messages = drain_signaling(&mut endpoint);
    assert_eq!(messages.len(), 1);
    match &messages[0] {
        SignalingMessage::Answer {
            sdp,
            mid_to_track_id,
        } => {
            assert_eq!(mid_to_track_id.get("0"), Some(&"camera".to_owned()));
            assert!(sdp.contains("a=sendonly"), "{sdp}");
            assert!(sdp.contains("a=rtpmap:96 H264/90000"), "{sdp}");
            assert!(sdp.contains("a=ice-ufrag:localfrag"), "{sdp}");
            assert!(sdp.contains("a=fingerprint:sha-256 ab:cd:ef"), "{sdp}");
            assert!(sdp.contains("a=setup:passive"), "{sdp}");
        }
        other => panic!("expected answer, got {other:?}"),
    }

    // Still ready until the transport reports the connection working.
    assert_eq!(
        endpoint.tracks().outbound_by_id("camera").unwrap().status,
        OutboundTrackStatus::Ready
    );
    let track = endpoint.tracks().outbound_by_id("camera").unwrap();
    assert_eq!(track.mid.as_deref(), Some("0"));
    assert_eq!(track.rtp_mapping.unwrap().clock_rate, 90000);

    // 3. Connection ready: the track links and the round completes.
    endpoint.handle_event(TransportEvent::ConnectionReady)?;
    assert_eq!(endpoint.restart_state(), RestartState::Idle);
    assert_eq!(
        endpoint.tracks().outbound_by_id("camera").unwrap().status,
        OutboundTrackStatus::Linked
    );

    let notifications = drain_notifications(&mut endpoint);
    assert!(notifications.iter().any(|n| matches!(
        n,
        EndpointNotification::NegotiationCompleted(ids) if ids == &vec!["camera".to_owned()]
    )));

    Ok(())
}

#[test]
fn test_candidates_are_accumulated_and_replayed() -> Result<()> {
    init_logging();

    let mut endpoint = bootstrapped_endpoint()?;
    endpoint.handle_write(ControlRequest::AddTracks(vec![OutboundTrackInit {
        id: "camera".to_owned(),
        kind: MediaKind::Video,
        encoding: "H264".to_owned(),
        ssrc: None,
    }]))?;
    endpoint.handle_read(SignalingMessage::Offer {
        sdp: REMOTE_OFFER.to_owned(),
    })?;
    drain_commands(&mut endpoint);
    drain_signaling(&mut endpoint);

    // Transport discovers candidates; each goes out as it arrives.
    endpoint.handle_event(TransportEvent::CandidateDiscovered {
        candidate: "1 1 UDP 2122260223 10.0.0.2 50000 typ host".to_owned(),
    })?;
    endpoint.handle_event(TransportEvent::CandidateGatheringDone)?;
    assert_eq!(endpoint.gathering_phase(), GatheringPhase::Done);

    let live: Vec<_> = drain_signaling(&mut endpoint);
    assert_eq!(live.len(), 1);
    assert!(matches!(live[0], SignalingMessage::Candidate { .. }));

    // A renegotiation round replays the gathered candidate instead of
    // gathering again.
    endpoint.handle_event(TransportEvent::ConnectionReady)?;
    endpoint.handle_read(SignalingMessage::Offer {
        sdp: REMOTE_OFFER.to_owned(),
    })?;

    let commands = drain_commands(&mut endpoint);
    assert!(!commands.contains(&TransportCommand::GatherCandidates));
    // Credentials did not change, so no duplicate credentials command.
    assert!(!commands
        .iter()
        .any(|c| matches!(c, TransportCommand::SetRemoteCredentials { .. })));

    let messages = drain_signaling(&mut endpoint);
    let replayed = messages
        .iter()
        .filter(|m| matches!(m, SignalingMessage::Candidate { .. }))
        .count();
    assert_eq!(replayed, 1);

    Ok(())
}

#[test]
fn test_inbound_only_session_never_initiates() -> Result<()> {
    init_logging();

    let mut endpoint = bootstrapped_endpoint()?;
    // An explicit trigger without any outbound track is void: a lone
    // inbound-only session does not need to generate an offer.
    endpoint.handle_write(ControlRequest::RenegotiateTracks)?;

    assert_eq!(endpoint.restart_state(), RestartState::Idle);
    assert!(drain_commands(&mut endpoint).is_empty());
    assert!(drain_signaling(&mut endpoint).is_empty());

    Ok(())
}
