//! The `chemdrill init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("chemdrill.toml").exists() {
        println!("chemdrill.toml already exists, skipping.");
    } else {
        std::fs::write("chemdrill.toml", SAMPLE_CONFIG)?;
        println!("Created chemdrill.toml");
    }

    std::fs::create_dir_all("templates")?;
    let example_path = Path::new("templates/example.json");
    if example_path.exists() {
        println!("templates/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_TEMPLATES)?;
        println!("Created templates/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit chemdrill.toml (uncomment [data] to use your own templates)");
    println!("  2. Run: chemdrill validate --templates templates/example.json");
    println!("  3. Run: chemdrill generate --competency periodic_trends");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# chemdrill configuration

# [data]
# ontology = "ontology.json"
# templates = "templates"

[engine]
distractor_count = 3
max_competency_attempts = 30

[mastery]
store_path = "${HOME}/.chemdrill/mastery.json"

[mastery.default_params]
p_l0 = 0.1
p_t = 0.1
p_s = 0.1
p_g = 0.2
"#;

const EXAMPLE_TEMPLATES: &str = r#"{
  "templates": [
    {
      "id": "example_compare_radius",
      "meta": {
        "interaction": "choice_single",
        "object_types": ["element"],
        "reasoning": ["compare"],
        "evaluation": {"mode": "exact"},
        "distractor_strategy": "element_comparison"
      },
      "pipeline": {
        "generator": {
          "id": "pick_element_pair",
          "params": {"property": "atomic_radius", "main_group": true}
        },
        "solvers": [
          {"id": "compare_property", "params": {"property": "atomic_radius"}}
        ]
      },
      "prompt_template_id": "compare_property.question",
      "explanation_template_id": "compare_property.explanation",
      "difficulty": {"target_band": [0.2, 0.4]},
      "exam_tags": ["foundation"],
      "competency_hint": {"periodic_trends": "P"}
    }
  ]
}
"#;
