use super::*;

fn pending(w: &ChunkWriter) -> usize {
    w.lock().unwrap().pending.len()
}

fn completed(w: &ChunkWriter) -> usize {
    w.lock().unwrap().chunks.len()
}

#[test]
fn long_interval_keeps_bytes_pending_until_cut() {
    let w = ChunkWriter::new(Duration::from_secs(3600));
    w.write(b"abc").unwrap();
    w.write(b"def").unwrap();
    assert_eq!(completed(&w), 0);
    assert_eq!(pending(&w), 6);
    w.cut().unwrap();
    assert_eq!(completed(&w), 1);
    assert_eq!(pending(&w), 0);
}

#[test]
fn zero_interval_cuts_every_write() {
    let w = ChunkWriter::new(Duration::ZERO);
    w.write(b"a").unwrap();
    w.write(b"b").unwrap();
    w.write(b"c").unwrap();
    let chunks = w.take_chunks().unwrap();
    let seqs: Vec<_> = chunks.iter().map(|c| c.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
    assert_eq!(concat(&chunks), b"abc");
}

#[test]
fn empty_cut_emits_nothing() {
    let w = ChunkWriter::new(Duration::ZERO);
    w.cut().unwrap();
    assert!(w.take_chunks().unwrap().is_empty());
}

#[test]
fn take_includes_pending_tail() {
    let w = ChunkWriter::new(Duration::from_secs(3600));
    w.write(b"head").unwrap();
    w.cut().unwrap();
    w.write(b"tail").unwrap();
    let chunks = w.take_chunks().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(concat(&chunks), b"headtail");
    assert!(w.take_chunks().unwrap().is_empty());
}

#[test]
fn clones_share_one_log_and_io_write_works() {
    use std::io::Write as _;
    let w = ChunkWriter::new(Duration::from_secs(3600));
    let mut other = w.clone();
    other.write_all(b"xyz").unwrap();
    assert_eq!(pending(&w), 3);
}

#[test]
fn concat_orders_by_sequence() {
    let chunks = vec![
        Chunk {
            seq: 1,
            bytes: b"world".to_vec(),
        },
        Chunk {
            seq: 0,
            bytes: b"hello ".to_vec(),
        },
    ];
    assert_eq!(concat(&chunks), b"hello world");
}
