//! Integration tests for multipart framing and envelope policy

use bytes::Bytes;
use plinth_core::prelude::*;

#[test]
fn test_stream_of_frames_yields_whole_messages() {
    let first = Message::from_parts(["topic", "a", "b"]).unwrap();
    let second = Message::single("solo");

    let mut assembler = MessageAssembler::default();
    let mut delivered = Vec::new();
    for frame in first.frames().chain(second.frames()) {
        if let Some(msg) = assembler.push_frame(frame).unwrap() {
            delivered.push(msg);
        }
    }

    assert_eq!(delivered, vec![first, second]);
    assert!(assembler.is_idle());
}

#[test]
fn test_only_last_frame_clears_more() {
    let msg = Message::builder()
        .push_str("key")
        .push_empty()
        .push(Bytes::from_static(b"value"))
        .build()
        .unwrap();

    let flags: Vec<bool> = msg.frames().map(|f| f.more).collect();
    assert_eq!(flags, [true, true, false]);
}

#[test]
fn test_limits_reset_the_assembler() {
    let mut assembler = MessageAssembler::new(2, usize::MAX);
    assembler.append(Frame::more(Bytes::from_static(b"1"))).unwrap();
    assembler.append(Frame::more(Bytes::from_static(b"2"))).unwrap();

    let err = assembler
        .append(Frame::last(Bytes::from_static(b"3")))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert!(assembler.is_idle());
    assert!(assembler.take().is_none());
}

#[test]
fn test_visible_frame_counts_per_role() {
    for socket_type in SocketType::ALL {
        let policy = socket_type.envelope_policy();
        let expected = if policy.hides_envelope { 10 } else { 10 + policy.identity_frames };
        assert_eq!(policy.visible_frames(10), expected, "{socket_type}");
    }
}

#[test]
fn test_empty_message_is_rejected() {
    let err = Message::from_parts(Vec::<Bytes>::new()).unwrap_err();
    assert!(matches!(err, PlinthError::InvalidArgument(_)));
}
