//! Frame codec tests: wire vectors plus chunking properties.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use podwire_core::protocol::frame::{self, FrameDecoder, CHUNK_SIZE, TERMINATOR};
use podwire_core::PodwireError;

use vector_loader::FrameVector;

fn load(name: &str) -> FrameVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

fn drain(dec: &mut FrameDecoder) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(f) = dec.next_frame().unwrap() {
        out.push(f.to_vec());
    }
    out
}

#[test]
fn frame_vectors() {
    let files = [
        "frame_hello.json",
        "frame_back_to_back.json",
        "frame_empty.json",
        "frame_split_terminator.json",
        "frame_binary.json",
        "frame_unterminated.json",
    ];

    for f in files {
        let v = load(f);
        let wire = v.wire.decode();

        let mut dec = FrameDecoder::new();
        let mut got = Vec::new();
        for read in wire.chunks(v.read_size) {
            dec.push(read);
            got.extend(drain(&mut dec));
        }

        let want: Vec<Vec<u8>> = v.expect_frames.iter().map(|b| b.decode()).collect();
        assert_eq!(got, want, "vector={}", v.description);
        assert_eq!(dec.buffered(), v.expect_buffered, "vector={}", v.description);
    }
}

#[test]
fn hello_world_wire_bytes() {
    let wire = frame::encode(b"hello world");
    assert_eq!(&wire[..], b"hello worldEND_OF_TRANSMISSION");
}

#[test]
fn chunking_covers_boundary_lengths() {
    for n in [0, 1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE, 3 * CHUNK_SIZE + 7] {
        let payload: Vec<u8> = (0..n).map(|i| b'a' + (i % 26) as u8).collect();

        let chunks: Vec<&[u8]> = frame::chunks(&payload).collect();
        assert_eq!(chunks.len(), n.div_ceil(CHUNK_SIZE), "n={n}");
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= CHUNK_SIZE), "n={n}");
        assert_eq!(chunks.concat(), payload, "n={n}");

        let mut dec = FrameDecoder::new();
        for c in &chunks {
            dec.push(c);
            assert!(dec.next_frame().unwrap().is_none(), "n={n}");
        }
        dec.push(TERMINATOR);
        assert_eq!(dec.next_frame().unwrap().unwrap().to_vec(), payload, "n={n}");
        assert_eq!(dec.buffered(), 0, "n={n}");
    }
}

#[test]
fn payload_containing_terminator_is_cut_early() {
    let wire = frame::encode(b"beforeEND_OF_TRANSMISSIONafter");
    let mut dec = FrameDecoder::new();
    dec.push(&wire);
    assert_eq!(&dec.next_frame().unwrap().unwrap()[..], b"before");
    assert_eq!(&dec.next_frame().unwrap().unwrap()[..], b"after");
}

#[test]
fn limit_rejects_oversized_unterminated_frame() {
    let mut dec = FrameDecoder::with_limit(16);
    dec.push(&[b'x'; 16]);
    assert!(dec.next_frame().unwrap().is_none());

    dec.push(&[b'x'; 64]);
    let err = dec.next_frame().expect_err("must exceed limit");
    assert!(matches!(err, PodwireError::PayloadTooLarge));
}

#[test]
fn limit_ignores_partial_terminator_tail() {
    let mut dec = FrameDecoder::with_limit(4);
    dec.push(b"abcdEND_OF_TRANSMISSIO");
    assert!(dec.next_frame().unwrap().is_none());
    dec.push(b"N");
    assert_eq!(&dec.next_frame().unwrap().unwrap()[..], b"abcd");
}

#[test]
fn terminator_split_over_many_reads_is_found() {
    let mut dec = FrameDecoder::new();
    for part in [&b"payloadEND_OF_"[..], b"TRANS", b"MISSI", b"ONnext"] {
        dec.push(part);
        if part != b"ONnext" {
            assert!(dec.next_frame().unwrap().is_none());
        }
    }
    assert_eq!(&dec.next_frame().unwrap().unwrap()[..], b"payload");
    assert_eq!(dec.buffered(), 4);

    // Byte at a time, across two frames.
    let wire = frame::encode(b"ab");
    let mut dec = FrameDecoder::new();
    let mut got = Vec::new();
    for b in wire.iter().chain(frame::encode(b"cd").iter()) {
        dec.push(&[*b]);
        got.extend(drain(&mut dec));
    }
    assert_eq!(got, vec![b"ab".to_vec(), b"cd".to_vec()]);
}

#[test]
fn large_frame_read_in_chunks_scans_each_byte_once() {
    let payload = vec![b'x'; 8 * 1024 * 1024];
    let wire = frame::encode(&payload);

    let mut dec = FrameDecoder::with_limit(16 * 1024 * 1024);
    let mut frames = Vec::new();
    for read in wire.chunks(CHUNK_SIZE) {
        dec.push(read);
        frames.extend(drain(&mut dec));
    }
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), payload.len());
    assert_eq!(dec.buffered(), 0);
}
