//! The `chemdrill generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use chemdrill_core::config::load_config_from;
use chemdrill_core::exercise::Exercise;
use chemdrill_core::{ExerciseEngine, GeneratedTask};

use super::build_engine;

pub fn execute(
    template: Option<String>,
    competency: Option<String>,
    count: usize,
    seed: Option<u64>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json"),
        "unknown format: {format} (expected text or json)"
    );

    let config = load_config_from(config_path.as_deref())?;
    let engine = build_engine(&config)?;
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let mut generated = Vec::with_capacity(count);
    for _ in 0..count {
        let task = generate_one(&engine, template.as_deref(), competency.as_deref(), &mut rng)?;
        let exercise = engine
            .to_exercise_with(&task, &mut rng)
            .with_context(|| format!("failed to shape exercise from {}", task.template_id))?;
        generated.push((task, exercise));
    }

    if format == "json" {
        let items: Vec<_> = generated
            .iter()
            .map(|(task, exercise)| {
                serde_json::json!({
                    "taskId": task.id,
                    "templateId": task.template_id,
                    "difficulty": task.difficulty,
                    "exercise": exercise,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for (i, (task, exercise)) in generated.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_text(i + 1, task, exercise);
        }
    }

    Ok(())
}

fn generate_one(
    engine: &ExerciseEngine,
    template: Option<&str>,
    competency: Option<&str>,
    rng: &mut SmallRng,
) -> Result<GeneratedTask> {
    match (template, competency) {
        (Some(id), _) => engine
            .generate_with(id, rng)
            .with_context(|| format!("failed to generate from template {id}")),
        (None, Some(id)) => engine
            .generate_for_competency_with(id, rng)
            .with_context(|| format!("failed to generate for competency {id}")),
        (None, None) => engine.generate_random_with(rng).context("failed to generate a task"),
    }
}

fn print_text(n: usize, task: &GeneratedTask, exercise: &Exercise) {
    println!("[{n}] {} ({}, difficulty {:.2})", task.template_id, exercise.kind, task.difficulty);
    println!("{}", exercise.question);

    for (i, option) in exercise.options.iter().enumerate() {
        let label = char::from(b'a' + (i % 26) as u8);
        println!("  {label}) {}", option.text);
    }
    if let Some(pairs) = &exercise.pairs {
        for pair in pairs {
            println!("  {} - ?", pair.left);
        }
    }
    if let Some(context) = &exercise.context {
        let chain: Vec<&str> = context
            .chain
            .iter()
            .enumerate()
            .map(|(i, s)| if i == context.gap_index { "___" } else { s.as_str() })
            .collect();
        println!("  chain: {}", chain.join(" → "));
    }

    println!("Answer: {}", task.correct_answer);
    if !exercise.explanation.is_empty() {
        println!("Explanation: {}", exercise.explanation);
    }
}
