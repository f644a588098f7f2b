// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Loopback-TCP end-to-end coverage for the PUT/GET round trip and NOOP
//! sequencing (scenarios S1/S2 of the design).

use std::{collections::HashMap, time::Duration};

use kinetic_client_rs::{
    bus,
    cfg::config::{Config, RuntimeConfig, SessionConfig},
    operation::Operation,
    ops::{self, Entry},
    session::Session,
    status::Status,
    wire::{
        auth,
        message::{Body, Command, KeyValue, OpCode, OuterMessage},
        pdu,
    },
};
use tokio::{net::TcpListener, sync::oneshot, time::timeout};

const HMAC_KEY: &[u8] = b"asdfasdf";

/// A minimal stand-in device: echoes NOOP, stores/returns PUT/GET entries.
async fn run_mock_device(listener: TcpListener) {
    let (stream, _) = listener.accept().await.expect("accept");
    let (mut read_half, mut write_half) = stream.into_split();
    let mut store: HashMap<Vec<u8>, KeyValue> = HashMap::new();
    let mut values: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();

    loop {
        let mut header_buf = [0u8; pdu::HEADER_LEN];
        if kinetic_client_rs::transport::read_exact(
            &mut read_half,
            &mut header_buf,
            Duration::from_secs(5),
        )
        .await
        .is_err()
        {
            return;
        }
        let prologue = pdu::Prologue::decode(&header_buf).expect("decode prologue");

        let mut rest = vec![0u8; prologue.command_len as usize + prologue.value_len as usize];
        kinetic_client_rs::transport::read_exact(&mut read_half, &mut rest, Duration::from_secs(5))
            .await
            .expect("read rest");

        let mut framed = Vec::with_capacity(pdu::HEADER_LEN + rest.len());
        framed.extend_from_slice(&header_buf);
        framed.extend_from_slice(&rest);
        let (outer_bytes, value) = pdu::unpack(&framed).expect("unpack pdu");
        let outer = OuterMessage::unpack(&outer_bytes).expect("unpack outer");
        let command = Command::unpack(&outer.command_bytes).expect("unpack command");

        let mut response = Command::new(opcode_response_of(command.header.message_type));
        response.header.ack_sequence = command.header.sequence;
        response.header.connection_id = 42;
        response.status.code = 0;

        let mut response_value = Vec::new();
        match &command.body {
            Body::KeyValue(kv) if command.header.message_type == OpCode::Put.as_u32() => {
                let mut stored = kv.clone();
                if !stored.new_version.is_empty() {
                    stored.db_version = stored.new_version.clone();
                    stored.new_version.clear();
                }
                values.insert(kv.key.clone(), value.to_vec());
                store.insert(kv.key.clone(), stored);
                response.body = Body::KeyValue(KeyValue::default());
            },
            Body::KeyValue(kv) if command.header.message_type == OpCode::Get.as_u32() => {
                if let Some(stored) = store.get(&kv.key) {
                    response.body = Body::KeyValue(stored.clone());
                    response_value = values.get(&kv.key).cloned().unwrap_or_default();
                } else {
                    response.status.code = 8; // NOT_FOUND
                }
            },
            _ => {},
        }

        let response_command_bytes = response.pack().expect("pack response command");
        let tag = auth::compute(HMAC_KEY, &response_command_bytes);
        let response_outer = OuterMessage {
            auth_type: kinetic_client_rs::wire::message::AuthType::HmacAuth,
            hmac_auth: Some(kinetic_client_rs::wire::message::HmacAuth {
                identity: 1,
                hmac: tag,
            }),
            pin_auth: None,
            command_bytes: response_command_bytes,
        };
        let response_outer_bytes = response_outer.pack().expect("pack outer");
        let framed_response =
            pdu::pack(&response_outer_bytes, &response_value).expect("pack pdu");

        if kinetic_client_rs::transport::write_all(&mut write_half, &framed_response)
            .await
            .is_err()
        {
            return;
        }
    }
}

fn opcode_response_of(message_type: u32) -> OpCode {
    if message_type == OpCode::Noop.as_u32() {
        OpCode::NoopResponse
    } else if message_type == OpCode::Put.as_u32() {
        OpCode::PutResponse
    } else {
        OpCode::GetResponse
    }
}

async fn connected_session() -> std::sync::Arc<Session> {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(run_mock_device(listener));

    let config = Config {
        session: SessionConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            identity: 1,
            hmac_key: String::from_utf8(HMAC_KEY.to_vec()).expect("utf8 key"),
            cluster_version: 0,
            timeout: Duration::from_secs(10),
            blocking: false,
            use_ssl: false,
        },
        runtime: RuntimeConfig {
            max_outstanding: 16,
            socket_read_timeout: Duration::from_secs(5),
        },
    };

    Session::connect(&config).await.expect("connect")
}

#[tokio::test]
async fn noop_round_trip() {
    let session = connected_session().await;

    let (on_done, rx) = oneshot::channel();
    let op = ops::noop::build(&session, move |status| {
        let _ = on_done.send(status);
    })
    .expect("build noop");
    bus::submit(&session, op).await.expect("submit noop");

    let status = timeout(Duration::from_secs(5), rx)
        .await
        .expect("no timeout")
        .expect("not dropped");
    assert_eq!(status, Status::Success);

    session.disconnect().await;
}

#[tokio::test]
async fn operation_wait_layers_a_future_over_the_raw_completion() {
    let session = connected_session().await;

    let (completion, rx) = Operation::wait();
    let op = Operation::new(Command::new(OpCode::Noop), completion);
    bus::submit(&session, op).await.expect("submit noop");

    let result = timeout(Duration::from_secs(5), rx)
        .await
        .expect("no timeout")
        .expect("not dropped");
    assert_eq!(result.status, Status::Success);

    session.disconnect().await;
}

#[tokio::test]
async fn put_then_get_round_trip() {
    let session = connected_session().await;

    let entry = Entry {
        key: b"GET system test blob".to_vec(),
        tag: b"SomeTagValue".to_vec(),
        new_version: b"v1.0".to_vec(),
        algorithm: 1,
        value: b"lorem ipsum... blah blah blah... etc.".to_vec(),
        force: true,
        ..Default::default()
    };

    let (on_put, put_rx) = oneshot::channel();
    let put_op = ops::put::build(&session, entry.clone(), move |status, entry| {
        let _ = on_put.send((status, entry));
    })
    .expect("build put");
    bus::submit(&session, put_op).await.expect("submit put");

    let (put_status, put_entry) = timeout(Duration::from_secs(5), put_rx)
        .await
        .expect("no timeout")
        .expect("not dropped");
    assert_eq!(put_status, Status::Success);
    assert_eq!(put_entry.db_version, b"v1.0");
    assert!(put_entry.new_version.is_empty());

    let (on_get, get_rx) = oneshot::channel();
    let get_op = ops::get::build(
        &session,
        ops::get::Direction::Exact,
        Entry {
            key: entry.key.clone(),
            ..Default::default()
        },
        move |status, entry| {
            let _ = on_get.send((status, entry));
        },
    )
    .expect("build get");
    bus::submit(&session, get_op).await.expect("submit get");

    let (get_status, get_entry) = timeout(Duration::from_secs(5), get_rx)
        .await
        .expect("no timeout")
        .expect("not dropped");
    assert_eq!(get_status, Status::Success);
    assert_eq!(get_entry.value, entry.value);
    assert_eq!(get_entry.algorithm, 1);

    session.disconnect().await;
}

#[tokio::test]
async fn sequence_numbers_are_gapless_under_concurrency() {
    let session = connected_session().await;

    let mut handles = Vec::new();
    for _ in 0..32 {
        let session = std::sync::Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            let (on_done, rx) = oneshot::channel();
            let op = ops::noop::build(&session, move |status| {
                let _ = on_done.send(status);
            })
            .expect("build noop");
            bus::submit(&session, op).await.expect("submit noop");
            timeout(Duration::from_secs(5), rx)
                .await
                .expect("no timeout")
                .expect("not dropped")
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.expect("task"), Status::Success);
    }

    session.disconnect().await;
}
