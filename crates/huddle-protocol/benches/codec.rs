//! Codec benchmarks for huddle-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use huddle_protocol::{codec, encode_room, Command, Envelope, Member};

fn sample_room(size: usize) -> Vec<Member> {
    (0..size)
        .map(|i| {
            let mut member = Member::new(format!("board-{i}"), format!("player {i}"));
            member.broadcasting = i % 3 == 0;
            member
        })
        .collect()
}

fn bench_encode_room(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_room");
    for size in [1usize, 16, 256] {
        let members = sample_room(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("{size}_members"), |b| {
            b.iter(|| encode_room(black_box(&members)))
        });
    }
    group.finish();
}

fn bench_parse_command(c: &mut Criterion) {
    c.bench_function("parse_register", |b| {
        b.iter(|| Command::parse(black_box("register"), black_box("lobby,board-7,player seven")))
    });
}

fn bench_envelope(c: &mut Criterion) {
    let envelope = Envelope::room(encode_room(&sample_room(16)));
    let text = codec::encode_text(&envelope).unwrap();

    let mut group = c.benchmark_group("envelope");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("encode_text", |b| {
        b.iter(|| codec::encode_text(black_box(&envelope)))
    });
    group.bench_function("decode_text", |b| {
        b.iter(|| codec::decode_text(black_box(&text)))
    });
    group.finish();
}

criterion_group!(benches, bench_encode_room, bench_parse_command, bench_envelope);
criterion_main!(benches);
