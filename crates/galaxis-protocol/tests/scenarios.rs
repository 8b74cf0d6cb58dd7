//! End-to-end message scenarios: build, frame, unframe, dispatch on kind,
//! extract.

use galaxis_protocol::schema::SaveData;
use galaxis_protocol::{
    BincodeCodec, Envelope, HEADER_LEN, Header, HeaderFault, JsonCodec, MessageKind, Module,
    PlayerId, ProtocolError, ProtocolLimits, build, decode_header, encode_header, extract,
};

/// Writes `envelope` as a wire frame and reads it back, the way a
/// transport would.
fn reframe(envelope: &Envelope) -> Envelope {
    let limits = ProtocolLimits::default();
    let header = Header::of(envelope).to_bytes().unwrap();
    let mut frame = header.to_vec();
    frame.extend_from_slice(envelope.payload());

    let header = Header::from_bytes(&frame[..HEADER_LEN], &limits).unwrap();
    let mut received = Envelope::from_header(&header);
    received.payload_mut().copy_from_slice(&frame[HEADER_LEN..]);
    received
}

#[test]
fn test_chat_scenario() {
    let sent = build::chat(PlayerId(3), "hello");
    let received = reframe(&sent);
    assert_eq!(received, sent);

    let text = match received.kind() {
        MessageKind::HumanPlayerChat => extract::chat_text(&received).unwrap(),
        other => panic!("dispatched to {other}"),
    };
    assert_eq!(text, "hello");
    assert_eq!(received.sender(), PlayerId(3));
    assert_eq!(received.receiver(), PlayerId::SERVER);
}

#[test]
fn test_turn_orders_scenario_keeps_insertion_order() {
    let orders = vec![
        "scrap 40".to_string(),
        "move fleet 7 to 12".to_string(),
        "build scout at 3".to_string(),
    ];
    let sent = build::turn_orders(&BincodeCodec, PlayerId(2), &orders).unwrap();
    assert_eq!(sent.kind(), MessageKind::TurnOrders);
    assert_eq!(sent.receiver(), PlayerId::SERVER);

    let decoded: Vec<String> = extract::turn_orders(&BincodeCodec, &reframe(&sent)).unwrap();
    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded, orders);
}

#[test]
fn test_optional_payload_scenario() {
    let orders = vec![1u32, 2];
    let sent =
        build::client_save_data(&JsonCodec, PlayerId(1), &orders, None::<&String>).unwrap();

    // Decoding into a type no UI payload could ever match still succeeds:
    // with the presence marker unset nothing else is read.
    #[derive(Debug, serde::Deserialize)]
    struct NeverSent {
        _unused: [u64; 4],
    }

    let data: SaveData<Vec<u32>, NeverSent> =
        extract::client_save_data(&JsonCodec, &reframe(&sent)).unwrap();
    assert_eq!(data.orders, orders);
    assert!(data.ui_data.is_none());
}

#[test]
fn test_optional_payload_scenario_binary() {
    let sent = build::client_save_data(&BincodeCodec, PlayerId(1), &Vec::<u32>::new(), None::<&u64>)
        .unwrap();
    // Empty order list (u64 length 0) then the absent marker.
    assert_eq!(sent.payload(), &[0, 0, 0, 0, 0, 0, 0, 0, 0]);

    let data: SaveData<Vec<u32>, u64> = extract::client_save_data(&BincodeCodec, &sent).unwrap();
    assert!(data.orders.is_empty());
    assert_eq!(data.ui_data, None);
}

#[test]
fn test_id_allocation_scenario() {
    let request = build::request_new_object_id(PlayerId(4));
    assert_eq!(request.kind(), MessageKind::RequestNewObjectId);
    assert_eq!(request.receiver(), PlayerId::SERVER);
    assert_eq!(request.payload_len(), 0);
    assert_eq!(request.text(), "");

    let response = build::dispatch_new_object_id(request.sender(), 77);
    assert_eq!(response.receiver(), PlayerId(4));
    assert_eq!(response.module(), Module::ClientSynchronousResponse);
    assert_eq!(extract::new_object_id(&reframe(&response)).unwrap(), 77);
}

#[test]
fn test_header_round_trip_for_every_kind_and_module() {
    let limits = ProtocolLimits::default();
    for (i, &kind) in MessageKind::ALL.iter().enumerate() {
        let module = Module::ALL[i % Module::ALL.len()];
        let env = Envelope::new(kind, PlayerId(i as i32 - 1), PlayerId(0), module, vec![7; i]);
        let header = decode_header(encode_header(&env).unwrap(), &limits).unwrap();
        assert_eq!(header.kind, kind);
        assert_eq!(header.sender, env.sender());
        assert_eq!(header.receiver, PlayerId::HOST);
        assert_eq!(header.module, module);
        assert_eq!(header.payload_len, i);
    }
}

#[test]
fn test_out_of_range_kind_is_malformed() {
    let limits = ProtocolLimits::default();
    for bad in [0, 28, -3, i32::MAX] {
        let err = decode_header([bad, 1, 2, 0, 0], &limits).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::HeaderMalformed(HeaderFault::UnknownKind(k)) if k == bad
        ));
        assert!(err.is_fatal_to_connection());
    }
}

#[test]
fn test_copy_is_isolated_from_original() {
    let original = build::chat(PlayerId(1), "abc");
    let mut copy = original.clone();
    copy.payload_mut()[0] = b'x';
    assert_eq!(copy.payload(), b"xbc");
    assert_eq!(original.text(), "abc");
    assert_eq!(original.payload_len(), 3);

    // Resizing discards the copy's bytes and zero-fills.
    copy.resize(5);
    assert_eq!(copy.payload(), [0u8; 5]);
    assert_eq!(original.text(), "abc");
    assert_eq!(original.payload_len(), 3);
}

#[test]
fn test_sentinel_rendering() {
    let from_server = build::player_exit(PlayerId(2), "Ana");
    assert!(from_server.to_string().contains("-1(server/unknown)"));

    let from_host = build::host_save_game(PlayerId::HOST, "autosave");
    assert!(from_host.to_string().contains(" 0(host) -->"));
}
