// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drives the typed client against a live server on a loopback port.

use std::{net::SocketAddr, sync::Arc};

use futures::stream;
use keeper_server::{
    api::router,
    client::{ClientError, VaultClient},
    crypto::MasterKey,
    pipeline::WriteChunk,
    state::AppState,
    storage::RedbStore,
};
use tokio::net::TcpListener;

async fn spawn_server(dir: &tempfile::TempDir) -> SocketAddr {
    let store = RedbStore::open(&dir.path().join("keeper.redb")).unwrap();
    let state = AppState::new(
        Arc::new(store),
        MasterKey::new(b"integration-master-key".to_vec()).unwrap(),
        b"integration-secret",
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn register_write_list_read_delete() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(&dir).await;
    let mut client = VaultClient::new(&format!("http://{addr}")).unwrap();

    client.register("alice", "pw1").await.unwrap();

    let id = client
        .write_record(stream::iter(vec![
            WriteChunk::new("n", "text", "abc"),
            WriteChunk::new("", "", "def"),
        ]))
        .await
        .unwrap();

    let listed = client.list_records().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].name, "n");
    assert_eq!(listed[0].kind, "text");

    let content = client.read_record(id).await.unwrap();
    assert_eq!(content.data, b"abcdef");

    assert_eq!(client.delete_record(id).await.unwrap(), 1);
    match client.read_record(id).await {
        Err(ClientError::Service(message)) => assert_eq!(message, "record not found"),
        other => panic!("expected record not found, got {other:?}"),
    }
}

#[tokio::test]
async fn chunked_upload_of_binary_data() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(&dir).await;
    let mut client = VaultClient::new(&format!("http://{addr}")).unwrap();
    client.register("bob", "pw").await.unwrap();

    let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let id = client.upload("blob", "file", data.clone(), 777).await.unwrap();

    let content = client.read_record(id).await.unwrap();
    assert_eq!(content.name, "blob");
    assert_eq!(content.kind, "file");
    assert_eq!(content.data, data);
}

#[tokio::test]
async fn login_sessions_and_isolation() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(&dir).await;
    let base = format!("http://{addr}");

    let mut alice = VaultClient::new(&base).unwrap();
    alice.register("alice", "pw1").await.unwrap();
    let id = alice.upload("secret", "text", b"alice-only".to_vec(), 4).await.unwrap();

    let mut again = VaultClient::new(&base).unwrap();
    match again.login("alice", "wrong").await {
        Err(ClientError::Service(message)) => assert_eq!(message, "login or password incorrect"),
        other => panic!("expected rejected login, got {other:?}"),
    }
    again.login("alice", "pw1").await.unwrap();
    assert_eq!(again.read_record(id).await.unwrap().data, b"alice-only");

    let mut bob = VaultClient::new(&base).unwrap();
    bob.register("bob", "pw2").await.unwrap();
    assert!(bob.list_records().await.unwrap().is_empty());
    assert!(matches!(bob.read_record(id).await, Err(ClientError::Service(_))));
    assert_eq!(bob.delete_record(id).await.unwrap(), 0);
    assert_eq!(alice.read_record(id).await.unwrap().data, b"alice-only");

    match VaultClient::new(&base).unwrap().register("alice", "pw3").await {
        Err(ClientError::Service(message)) => assert_eq!(message, "this user exists"),
        other => panic!("expected duplicate login, got {other:?}"),
    }
}

#[tokio::test]
async fn anonymous_client_is_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(&dir).await;
    let client = VaultClient::new(&format!("http://{addr}")).unwrap();

    match client.list_records().await {
        Err(ClientError::Unauthenticated(code)) => assert_eq!(code, "missing_auth_header"),
        other => panic!("expected unauthenticated, got {other:?}"),
    }

    let mut forged = client.clone();
    forged.set_token("eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
    assert!(matches!(
        forged.list_records().await,
        Err(ClientError::Unauthenticated(_))
    ));
}
