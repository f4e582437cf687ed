#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use podwire_gateway::transport::{Demultiplexer, FrameWriter};

#[tokio::test]
async fn writer_emits_payload_then_terminator() {
    let (a, mut b) = tokio::io::duplex(4096);
    let writer = FrameWriter::new(a);

    writer.write_frame(b"hello world").await.unwrap();
    writer.shutdown().await.unwrap();

    let mut raw = Vec::new();
    b.read_to_end(&mut raw).await.unwrap();
    assert_eq!(raw, b"hello worldEND_OF_TRANSMISSION");
}

#[tokio::test]
async fn concurrent_writers_do_not_interleave() {
    let (a, mut b) = tokio::io::duplex(64 * 1024);
    let writer = FrameWriter::new(a);

    let big_a = vec![b'a'; 5000];
    let big_b = vec![b'b'; 5000];
    let (wa, wb) = (writer.clone(), writer.clone());
    let ta = tokio::spawn(async move { wa.write_frame(&big_a).await });
    let tb = tokio::spawn(async move { wb.write_frame(&big_b).await });
    ta.await.unwrap().unwrap();
    tb.await.unwrap().unwrap();
    writer.shutdown().await.unwrap();

    let mut raw = Vec::new();
    b.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();
    let frames: Vec<&str> = text.split("END_OF_TRANSMISSION").filter(|s| !s.is_empty()).collect();
    assert_eq!(frames.len(), 2);
    for f in frames {
        assert_eq!(f.len(), 5000);
        let first = f.as_bytes()[0];
        assert!(f.bytes().all(|c| c == first), "frame mixes two payloads");
    }
}

#[tokio::test]
async fn demux_emits_units_in_order() {
    let (mut a, b) = tokio::io::duplex(4096);
    let (tx, mut rx) = mpsc::channel(8);
    let task = tokio::spawn(Demultiplexer::new(b, tx, None).run());

    a.write_all(b"{\"n\":1}END_OF_TRANSMISSION{\"n\":2}END_OF_TRANS").await.unwrap();
    a.write_all(b"MISSION").await.unwrap();
    drop(a);

    let first = rx.recv().await.unwrap().unwrap();
    let second = rx.recv().await.unwrap().unwrap();
    assert_eq!(&first.data[..], b"{\"n\":1}");
    assert_eq!(&second.data[..], b"{\"n\":2}");
    assert_ne!(first.id, second.id);

    // EOF ends the loop and closes the channel.
    assert!(rx.recv().await.is_none());
    task.await.unwrap();
}

#[tokio::test]
async fn demux_reassembles_large_payload() {
    let (mut a, b) = tokio::io::duplex(1024);
    let (tx, mut rx) = mpsc::channel(8);
    tokio::spawn(Demultiplexer::new(b, tx, None).run());

    let payload = vec![b'x'; 10_000];
    let writer = tokio::spawn(async move {
        a.write_all(&payload).await.unwrap();
        a.write_all(b"END_OF_TRANSMISSION").await.unwrap();
        a
    });

    let unit = rx.recv().await.unwrap().unwrap();
    assert_eq!(unit.data.len(), 10_000);
    drop(writer.await.unwrap());
}

#[tokio::test]
async fn demux_reports_oversized_frame() {
    let (mut a, b) = tokio::io::duplex(8192);
    let (tx, mut rx) = mpsc::channel(8);
    let task = tokio::spawn(Demultiplexer::new(b, tx, Some(1024)).run());

    a.write_all(&vec![b'x'; 4000]).await.unwrap();

    let err = rx.recv().await.unwrap().expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "PAYLOAD_TOO_LARGE");
    assert!(rx.recv().await.is_none());
    task.await.unwrap();
}
