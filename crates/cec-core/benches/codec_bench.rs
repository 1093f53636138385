//! Criterion benchmarks for the CEC payload codec.
//!
//! Measures frame parsing plus payload decoding, and payload encoding plus
//! frame joining, for the commands the engine answers most often.
//!
//! Run with:
//! ```bash
//! cargo bench --package cec-core --bench codec_bench
//! ```

use cec_core::protocol::codec::{decode_message, encode_message};
use cec_core::{
    AbortReason, Command, DeviceType, LogicalAddress, Message, OpCode, Packet, PhysicalAddress,
    UserControl,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ── Message fixtures ──────────────────────────────────────────────────────────

fn fixtures() -> Vec<(&'static str, Message)> {
    let msg = |command| Message::new(LogicalAddress::TV, LogicalAddress::PLAYBACK_1, command);
    vec![
        ("GivePhysicalAddress", msg(Command::GivePhysicalAddress)),
        (
            "ReportPhysicalAddress",
            msg(Command::ReportPhysicalAddress {
                address: PhysicalAddress(0x1000),
                device_type: DeviceType::Playback,
            }),
        ),
        (
            "FeatureAbort",
            msg(Command::FeatureAbort {
                abort: OpCode::GIVE_AUDIO_STATUS,
                reason: AbortReason::UNRECOGNIZED_OPCODE,
            }),
        ),
        ("SetOSDName", msg(Command::SetOsdName("cec-engine".to_string()))),
        ("ReportAudioStatus", msg(Command::ReportAudioStatus { volume: 42, muted: true })),
        ("DeviceVendorID", msg(Command::DeviceVendorId(0x101010))),
        ("UserControlPressed", msg(Command::UserControlPressed(UserControl::SELECT))),
    ]
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_message");
    for (name, msg) in fixtures() {
        group.bench_with_input(BenchmarkId::new("msg", name), &msg, |b, msg| {
            b.iter(|| encode_message(black_box(msg)).expect("encode must succeed").to_frame())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_message");
    for (name, msg) in fixtures() {
        let frame = encode_message(&msg)
            .expect("encode must succeed for benchmark setup")
            .to_frame();
        group.bench_with_input(BenchmarkId::new("msg", name), &frame, |b, frame| {
            b.iter(|| {
                let packet = Packet::from_frame(black_box(frame)).expect("frame must parse");
                decode_message(&packet).expect("decode must succeed")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
