use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chemdrill_core::formula::compose_salt;
use chemdrill_core::generators::run_generator;
use chemdrill_core::model::PipelineStep;
use chemdrill_core::resolver::render_prompt;
use chemdrill_core::slots::SlotValues;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn bench_salt_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_salt");

    group.bench_function("NaCl", |b| {
        b.iter(|| compose_salt(black_box("Na"), 1, black_box("Cl"), 1))
    });

    group.bench_function("Ca3(PO4)2", |b| {
        b.iter(|| compose_salt(black_box("Ca"), 2, black_box("PO₄"), 3))
    });

    group.finish();
}

fn bench_generate_and_render(c: &mut Criterion) {
    let ontology = chemdrill_core::bundled::ontology().expect("bundled ontology");
    let mut group = c.benchmark_group("pipeline");

    let step = PipelineStep::new("pick_elements_same_period")
        .with_param("property", serde_json::json!("{property}"))
        .with_param("order", serde_json::json!("{order}"));
    group.bench_function("pick_elements_same_period", |b| {
        let mut rng = SmallRng::seed_from_u64(42);
        b.iter(|| run_generator(black_box(&step), &ontology, &mut rng))
    });

    let prompt = &ontology.i18n.prompts["trend_order.question"];
    let slots = SlotValues::new()
        .with("elements", vec!["Na".to_string(), "Si".to_string(), "Cl".to_string()])
        .with("property", "electronegativity")
        .with("order", "ascending")
        .with("period", 3u32);
    group.bench_function("render trend_order", |b| {
        b.iter(|| render_prompt(black_box(&slots), prompt, &ontology))
    });

    group.finish();
}

criterion_group!(benches, bench_salt_formula, bench_generate_and_render);
criterion_main!(benches);
