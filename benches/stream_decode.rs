use chat_relay::context::ContextAssembler;
use chat_relay::state::Turn;
use chat_relay::stream::{decode_line, StreamAccumulator};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sse_payload(fragments: usize) -> String {
    let mut out = String::from(": keep-alive\n\n");
    for i in 0..fragments {
        let line = serde_json::json!({
            "id": "chatcmpl-bench",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": format!(" word{i}")}, "finish_reason": null}]
        });
        out.push_str("data: ");
        out.push_str(&line.to_string());
        out.push_str("\n\n");
    }
    out.push_str("data: [DONE]\n\n");
    out
}

fn blocks(payload: &str, size: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < payload.len() {
        let mut end = (start + size).min(payload.len());
        while !payload.is_char_boundary(end) {
            end += 1;
        }
        out.push(&payload[start..end]);
        start = end;
    }
    out
}

fn accumulate(blocks: &[&str]) -> String {
    let mut accumulator = StreamAccumulator::new(None);
    for block in blocks {
        accumulator.feed(block);
    }
    accumulator.finish()
}

fn bench_decode_line(c: &mut Criterion) {
    let fragment = r#"data: {"choices":[{"index":0,"delta":{"content":"Hello"}}]}"#;
    let truncated = r#"data: {"choices":[{"index":0,"delta":{"cont"#;

    c.bench_function("decode_line_fragment", |b| {
        b.iter(|| black_box(decode_line(black_box(fragment))));
    });
    c.bench_function("decode_line_incomplete", |b| {
        b.iter(|| black_box(decode_line(black_box(truncated))));
    });
    c.bench_function("decode_line_terminal", |b| {
        b.iter(|| black_box(decode_line(black_box("data: [DONE]"))));
    });
}

fn bench_accumulate(c: &mut Criterion) {
    let payload = sse_payload(256);
    let whole = vec![payload.as_str()];
    let network = blocks(&payload, 1024);
    let tiny = blocks(&payload, 7);

    c.bench_function("accumulate_256_single_block", |b| {
        b.iter(|| black_box(accumulate(black_box(&whole))));
    });
    c.bench_function("accumulate_256_1k_blocks", |b| {
        b.iter(|| black_box(accumulate(black_box(&network))));
    });
    c.bench_function("accumulate_256_7b_blocks", |b| {
        b.iter(|| black_box(accumulate(black_box(&tiny))));
    });
}

fn bench_assemble(c: &mut Criterion) {
    let assembler = ContextAssembler::default();
    let history: Vec<Turn> = (0..64)
        .map(|i| Turn::new(format!("question {i}"), format!("answer {i}"), 120))
        .collect();

    c.bench_function("assemble_window_4_of_64", |b| {
        b.iter(|| black_box(assembler.assemble(black_box(&history), black_box("next"))));
    });
}

criterion_group!(benches, bench_decode_line, bench_accumulate, bench_assemble);
criterion_main!(benches);
