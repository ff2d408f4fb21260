use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use healthreport::layout::layout;
use healthreport::{
    ids, AssembleOptions, EvaluationEngine, HealthSnapshot, PageGeometry, ReportAssembler, Sex,
    SubjectContext,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Performance benchmarks for report generation
///
/// Evaluation runs once per entry and layout once per report, so both
/// should stay negligible next to rendering.

fn create_snapshot(seed: u32) -> HealthSnapshot {
    let mut snapshot = HealthSnapshot::default();
    snapshot.subject.sex = if seed % 2 == 0 { Sex::Male } else { Sex::Female };
    snapshot.subject.body_mass_kg = Some(Decimal::from(60 + seed % 40));
    snapshot
        .readings
        .insert(ids::STEPS.to_string(), Decimal::from(2000 + (seed * 731) % 14000));
    snapshot
        .readings
        .insert(ids::HEART_RATE.to_string(), Decimal::from(55 + seed % 50));
    snapshot.readings.insert(ids::BMI.to_string(), dec!(24.3));
    snapshot.readings.insert(ids::BODY_FAT.to_string(), dec!(0.21));
    snapshot.readings.insert(ids::WATER.to_string(), dec!(1.8));
    snapshot
}

fn bench_evaluation(c: &mut Criterion) {
    let engine = EvaluationEngine::default();
    let context = SubjectContext::new(Sex::Female, Some(dec!(65)));

    let mut group = c.benchmark_group("Evaluation");

    for &id in &[ids::STEPS, ids::BODY_FAT, ids::PROTEIN, ids::BEDTIME] {
        group.bench_with_input(BenchmarkId::new("evaluate", id), &id, |b, id| {
            b.iter(|| engine.evaluate(black_box(id), black_box(dec!(22.5)), &context));
        });
    }

    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let assembler = ReportAssembler::standard().expect("standard catalog");
    let geometry = PageGeometry::a4();

    let mut group = c.benchmark_group("Layout");

    for &extended in &[false, true] {
        let sections = assembler.sections(&create_snapshot(1), extended);
        let entries: usize = sections.iter().map(|s| s.entries.len()).sum();

        group.throughput(Throughput::Elements(entries as u64));
        group.bench_with_input(
            BenchmarkId::new("paginate", entries),
            &sections,
            |b, sections| {
                b.iter(|| layout(black_box(sections), &geometry));
            },
        );
    }

    group.finish();
}

fn bench_batch_assembly(c: &mut Criterion) {
    let assembler = ReportAssembler::standard().expect("standard catalog");
    let options = AssembleOptions {
        include_narrative: true,
        ..Default::default()
    };

    let mut group = c.benchmark_group("Batch Assembly");
    group.sample_size(20);

    for &size in &[1, 10, 100] {
        let snapshots: Vec<HealthSnapshot> = (0..size).map(create_snapshot).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("assemble_batch", size),
            &snapshots,
            |b, snapshots| {
                b.iter(|| assembler.assemble_batch(black_box(snapshots), &options));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evaluation, bench_layout, bench_batch_assembly);

criterion_main!(benches);
