// Criterion benchmarks for the figma-scene envelope layer
//
// Run benchmarks with:
//   cargo bench -p figma-scene-common

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use figma_scene_common::transport::encode_frame;
use figma_scene_common::{CallId, Envelope, Role};
use serde_json::json;

fn bench_call_id_generation(c: &mut Criterion) {
    c.bench_function("call_id_generate", |b| b.iter(CallId::generate));
}

fn bench_envelope_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_rendering");

    let call = Envelope::run(
        CallId::generate(),
        "({ width, height }) => { figma.ui.resize(Math.floor(width), Math.floor(height)); }",
        json!({"width": 320, "height": 480}),
    );

    group.bench_function("ui_message", |b| {
        b.iter(|| black_box(&call).to_message(Role::Ui));
    });

    group.bench_function("sandbox_message", |b| {
        b.iter(|| black_box(&call).to_message(Role::Sandbox));
    });

    group.finish();
}

fn bench_inbound_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound_filter");

    let wrapped = json!({
        "pluginMessage": {"action": "figma-scene-return", "id": "abc", "return": {"nodes": [1, 2, 3]}},
        "pluginId": "*"
    });
    let foreign = json!({"pluginMessage": {"type": "selection", "count": 3}});

    group.bench_function("recognised", |b| {
        b.iter(|| Envelope::from_message(black_box(&wrapped)));
    });

    group.bench_function("foreign", |b| {
        b.iter(|| Envelope::from_message(black_box(&foreign)));
    });

    group.finish();
}

fn bench_framing(c: &mut Criterion) {
    let data: Vec<String> = (0..100).map(|i| format!("node_{}", i)).collect();
    let message = json!({"action": "figma-scene-return", "id": "abc", "return": data});

    c.bench_function("encode_frame", |b| {
        b.iter(|| encode_frame(black_box(&message)));
    });
}

criterion_group!(
    benches,
    bench_call_id_generation,
    bench_envelope_rendering,
    bench_inbound_filter,
    bench_framing,
);
criterion_main!(benches);
