//! REQ/REP State Machine Integration Tests
//!
//! Tests strict and relaxed modes for REQ socket enforcement, reply routing
//! and envelope handling.

use plinth::prelude::*;
use std::thread;
use std::time::Duration;

fn req_rep(ctx: &Context, addr: &str, options: SocketOptions) -> (Socket, Socket) {
    let mut rep = ctx.socket(SocketType::Rep).unwrap();
    rep.bind(addr).unwrap();
    let mut req = ctx.socket_with_options(SocketType::Req, options).unwrap();
    req.connect(addr).unwrap();
    (req, rep)
}

fn recv_str(socket: &mut Socket) -> String {
    let msg = socket.recv(Flags::DONTWAIT).unwrap();
    assert_eq!(msg.len(), 1, "envelope must be hidden");
    msg.parse_frame_str(0).unwrap().to_owned()
}

/// Test strict REQ state machine - send→send should fail
#[test]
fn test_req_strict_send_send_fails() {
    let ctx = Context::new();
    let (mut req, mut rep) = req_rep(&ctx, "inproc://strict-send", SocketOptions::default());

    req.send_string("request1", Flags::DONTWAIT).unwrap();
    let err = req.send_string("request2", Flags::DONTWAIT).unwrap_err();
    assert!(matches!(err, PlinthError::ProtocolViolation(_)));
    assert!(err.to_string().contains("AwaitingReply"));

    // Only the first request reached the server.
    assert_eq!(recv_str(&mut rep), "request1");
    rep.send_string("reply1", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "reply1");
}

/// Test strict REQ state machine - recv→recv should fail
#[test]
fn test_req_strict_recv_recv_fails() {
    let ctx = Context::new();
    let (mut req, mut rep) = req_rep(&ctx, "inproc://strict-recv", SocketOptions::default());

    let err = req.recv(Flags::DONTWAIT).unwrap_err();
    assert!(matches!(err, PlinthError::ProtocolViolation(_)));
    assert!(err.to_string().contains("Idle"));

    req.send_string("request1", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut rep), "request1");
    rep.send_string("reply1", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "reply1");

    // Back in Idle.
    assert!(matches!(
        req.recv(Flags::DONTWAIT),
        Err(PlinthError::ProtocolViolation(_))
    ));
}

#[test]
fn test_rep_must_receive_before_sending() {
    let ctx = Context::new();
    let (mut req, mut rep) = req_rep(&ctx, "inproc://rep-order", SocketOptions::default());

    assert!(matches!(
        rep.send_string("unsolicited", Flags::DONTWAIT),
        Err(PlinthError::ProtocolViolation(_))
    ));

    req.send_string("ping", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut rep), "ping");

    // Reply still owed.
    assert!(matches!(
        rep.recv(Flags::DONTWAIT),
        Err(PlinthError::ProtocolViolation(_))
    ));
    rep.send_string("pong", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "pong");
}

#[test]
fn test_req_waits_with_would_block_while_reply_pending() {
    let ctx = Context::new();
    let (mut req, _rep) = req_rep(&ctx, "inproc://pending", SocketOptions::default());

    req.send_string("request", Flags::DONTWAIT).unwrap();
    let err = req.recv(Flags::DONTWAIT).unwrap_err();
    assert!(err.is_would_block());
}

#[test]
fn test_multipart_request_and_reply() {
    let ctx = Context::new();
    let (mut req, mut rep) = req_rep(&ctx, "inproc://multipart", SocketOptions::default());

    req.send_strings(&["a", "b", "c"], Flags::DONTWAIT).unwrap();
    let mut frames = Vec::new();
    assert_eq!(rep.recv_multipart(&mut frames, Flags::DONTWAIT).unwrap(), 3);
    assert_eq!(&frames[0][..], b"a");

    rep.send_strings(&["x", "y"], Flags::DONTWAIT).unwrap();
    frames.clear();
    assert_eq!(req.recv_multipart(&mut frames, Flags::DONTWAIT).unwrap(), 2);
    assert_eq!(&frames[1][..], b"y");
}

/// Test relaxed REQ mode - send→send should succeed
#[test]
fn test_req_relaxed_send_send_succeeds() {
    let ctx = Context::new();
    let (mut req, mut rep) = req_rep(
        &ctx,
        "inproc://relaxed",
        SocketOptions::default().with_req_relaxed(true),
    );

    req.send_string("request1", Flags::DONTWAIT).unwrap();
    req.send_string("request2", Flags::DONTWAIT).unwrap();

    // The server answers the abandoned request first; REQ discards it.
    assert_eq!(recv_str(&mut rep), "request1");
    rep.send_string("reply1", Flags::DONTWAIT).unwrap();
    assert!(req.recv(Flags::DONTWAIT).unwrap_err().is_would_block());

    assert_eq!(recv_str(&mut rep), "request2");
    rep.send_string("reply2", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "reply2");
}

#[test]
fn test_req_relaxed_resend_while_queued_keeps_current_reply() {
    let ctx = Context::new();
    let mut req = ctx
        .socket_with_options(SocketType::Req, SocketOptions::default().with_req_relaxed(true))
        .unwrap();
    req.bind("inproc://relaxed-queued").unwrap();

    // No servers yet: both requests would sit in the outbound queue.
    req.send_string("a", Flags::DONTWAIT).unwrap();
    req.send_string("b", Flags::DONTWAIT).unwrap();

    let mut first = ctx
        .socket_with_options(SocketType::Rep, SocketOptions::default().with_recv_hwm(1))
        .unwrap();
    first.connect("inproc://relaxed-queued").unwrap();
    let mut second = ctx.socket(SocketType::Rep).unwrap();
    second.connect("inproc://relaxed-queued").unwrap();

    // The abandoned request never goes out.
    assert_eq!(recv_str(&mut first), "b");
    assert!(second.recv(Flags::DONTWAIT).unwrap_err().is_would_block());

    first.send_string("reply-to-b", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "reply-to-b");
}

#[test]
fn test_relaxed_option_rejected_on_other_roles() {
    let ctx = Context::new();
    let mut rep = ctx.socket(SocketType::Rep).unwrap();
    assert!(matches!(
        rep.set_option(SocketOption::ReqRelaxed(true)),
        Err(PlinthError::InvalidArgument(_))
    ));
}

#[test]
fn test_replies_route_to_their_requesters() {
    let ctx = Context::new();
    let mut rep = ctx.socket(SocketType::Rep).unwrap();
    rep.bind("inproc://many-clients").unwrap();

    let mut clients: Vec<Socket> = (0..3)
        .map(|_| {
            let mut req = ctx.socket(SocketType::Req).unwrap();
            req.connect("inproc://many-clients").unwrap();
            req
        })
        .collect();

    for (i, req) in clients.iter_mut().enumerate() {
        req.send_string(&format!("client-{i}"), Flags::DONTWAIT).unwrap();
    }

    for _ in 0..clients.len() {
        let request = recv_str(&mut rep);
        rep.send_string(&format!("re:{request}"), Flags::DONTWAIT)
            .unwrap();
    }

    for (i, req) in clients.iter_mut().enumerate() {
        assert_eq!(recv_str(req), format!("re:client-{i}"));
    }
}

#[test]
fn test_requests_round_robin_across_servers() {
    let ctx = Context::new();
    let mut rep_a = ctx.socket(SocketType::Rep).unwrap();
    let mut rep_b = ctx.socket(SocketType::Rep).unwrap();
    rep_a.bind("inproc://server-a").unwrap();
    rep_b.bind("inproc://server-b").unwrap();

    let mut req = ctx.socket(SocketType::Req).unwrap();
    req.connect("inproc://server-a").unwrap();
    req.connect("inproc://server-b").unwrap();

    req.send_string("first", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut rep_a), "first");
    rep_a.send_string("from-a", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "from-a");

    req.send_string("second", Flags::DONTWAIT).unwrap();
    assert!(rep_a.recv(Flags::DONTWAIT).unwrap_err().is_would_block());
    assert_eq!(recv_str(&mut rep_b), "second");
    rep_b.send_string("from-b", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "from-b");
}

#[test]
fn test_reply_to_departed_requester_is_dropped() {
    let ctx = Context::new();
    let (mut req, mut rep) = req_rep(&ctx, "inproc://departed", SocketOptions::default());

    req.send_string("hello", Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut rep), "hello");
    req.close();

    rep.send_string("nobody listening", Flags::DONTWAIT).unwrap();
    // REP is ready for the next request.
    assert!(rep.recv(Flags::DONTWAIT).unwrap_err().is_would_block());
}

#[test]
fn test_router_sees_req_envelope() {
    let ctx = Context::new();
    let mut router = ctx.socket(SocketType::Router).unwrap();
    router.bind("inproc://req-router").unwrap();
    let mut req = ctx
        .socket_with_options(
            SocketType::Req,
            SocketOptions::default().with_routing_id("client"),
        )
        .unwrap();
    req.connect("inproc://req-router").unwrap();

    req.send_string("hi", Flags::DONTWAIT).unwrap();

    // identity, request id, delimiter, body
    let mut frames = Vec::new();
    assert_eq!(router.recv_multipart(&mut frames, Flags::DONTWAIT).unwrap(), 4);
    assert_eq!(&frames[0][..], b"client");
    assert!(frames[2].is_empty());
    assert_eq!(&frames[3][..], b"hi");

    // Echo the envelope back with a new body.
    let reply = vec![
        frames[0].clone(),
        frames[1].clone(),
        frames[2].clone(),
        Bytes::from_static(b"hello yourself"),
    ];
    router.send_multipart(reply, Flags::DONTWAIT).unwrap();
    assert_eq!(recv_str(&mut req), "hello yourself");
}

#[test]
fn test_blocking_recv_wakes_on_reply() {
    let ctx = Context::new();
    let (mut req, mut rep) = req_rep(&ctx, "inproc://blocking", SocketOptions::default());

    let server = thread::spawn(move || {
        let mut frames = Vec::new();
        rep.recv_multipart(&mut frames, Flags::NONE).unwrap();
        thread::sleep(Duration::from_millis(20));
        rep.send_string("late reply", Flags::NONE).unwrap();
        rep
    });

    req.send_string("request", Flags::NONE).unwrap();
    let reply = req.recv(Flags::NONE).unwrap();
    assert_eq!(reply.parse_frame_str(0).unwrap(), "late reply");
    server.join().unwrap();
}
