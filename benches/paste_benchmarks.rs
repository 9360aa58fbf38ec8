use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ueblueprint_core::{
    read, read_document, read_multiple, sanitizer, write_multiple, LinearColor, ObjectReference,
};

// ============================================================================
// Test Data: Varying Complexity and Size
// ============================================================================

const KNOT: &str = r#"Begin Object Class=/Script/BlueprintGraph.K2Node_Knot Name="K2Node_Knot_0"
   NodePosX=16
   NodePosY=-32
   NodeGuid=4ED65DE56CF47BE38B129A21A930B82E
End Object
"#;

const PRINT_SPEED: &str = include_str!("../tests/ok/print_speed.t3d");
const MATERIAL: &str = include_str!("../tests/ok/material.t3d");
const QUIRKS: &str = include_str!("../tests/ok/quirks.t3d");

// A chain of reroute nodes, each linked to the next
fn generate_knot_chain(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        let input = format!("{:032X}", i * 2 + 1);
        let output = format!("{:032X}", i * 2 + 2);
        text.push_str(&format!(
            "Begin Object Class=/Script/BlueprintGraph.K2Node_Knot Name=\"K2Node_Knot_{i}\"\n"
        ));
        text.push_str(&format!("   NodePosX={}\n   NodePosY=0\n", i * 64));
        text.push_str(&format!(
            "   CustomProperties Pin (PinId={input},PinName=\"InputPin\",PinType.PinCategory=\"wildcard\",)\n"
        ));
        let link = if i + 1 < count {
            format!("LinkedTo=(K2Node_Knot_{} {:032X},),", i + 1, i * 2 + 3)
        } else {
            String::new()
        };
        text.push_str(&format!(
            "   CustomProperties Pin (PinId={output},PinName=\"OutputPin\",Direction=\"EGPD_Output\",PinType.PinCategory=\"wildcard\",{link})\n"
        ));
        text.push_str("End Object\n");
    }
    text
}

// ============================================================================
// Value Benchmarks
// ============================================================================

fn bench_values(c: &mut Criterion) {
    c.bench_function("linear_color", |b| {
        b.iter(|| read::<LinearColor>(black_box("(R=0.000000,G=0.660000,B=1.000000,A=1.000000)")))
    });
    c.bench_function("object_reference", |b| {
        b.iter(|| {
            read::<ObjectReference>(black_box(
                r#"/Script/Engine.EdGraph'"/Engine/EditorBlueprintResources/StandardMacros.StandardMacros:Do N"'"#,
            ))
        })
    });
}

// ============================================================================
// Paste Buffer Benchmarks
// ============================================================================

fn bench_sanitizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitizer");

    for (name, source) in [("knot", KNOT), ("print_speed", PRINT_SPEED), ("quirks", QUIRKS)] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| sanitizer::pre_parse(black_box(src)))
        });
    }

    group.finish();
}

fn bench_read_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_by_size");

    for (name, source) in [
        ("knot", KNOT),
        ("material", MATERIAL),
        ("print_speed", PRINT_SPEED),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| read_multiple(black_box(src)))
        });
    }

    group.finish();
}

fn bench_read_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_node_scaling");

    for size in [10, 50, 100, 500] {
        let source = generate_knot_chain(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| read_multiple(black_box(src)))
        });
    }

    group.finish();
}

fn bench_write_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_node_scaling");

    for size in [10, 50, 100, 500] {
        let objects = read_multiple(&generate_knot_chain(size)).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &objects, |b, objects| {
            b.iter(|| write_multiple(black_box(objects)))
        });
    }

    group.finish();
}

// ============================================================================
// Document Benchmarks
// ============================================================================

fn bench_link_resolution(c: &mut Criterion) {
    let document = read_document(&generate_knot_chain(200)).unwrap();

    c.bench_function("resolve_all_links", |b| {
        b.iter(|| {
            document
                .objects
                .iter()
                .flat_map(|object| object.pins())
                .map(|pin| document.linked_pins(pin).count())
                .sum::<usize>()
        })
    });
}

fn bench_json_export(c: &mut Criterion) {
    let document = read_document(PRINT_SPEED).unwrap();

    c.bench_function("json_export", |b| b.iter(|| black_box(&document).to_json()));
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(value_benches, bench_values);

criterion_group!(
    paste_benches,
    bench_sanitizer,
    bench_read_sizes,
    bench_read_scaling,
    bench_write_scaling
);

criterion_group!(document_benches, bench_link_resolution, bench_json_export);

criterion_main!(value_benches, paste_benches, document_benches);
