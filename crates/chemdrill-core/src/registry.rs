//! Template registry.
//!
//! Built once from the loaded templates; lookups never mutate it.

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::model::TaskTemplate;

/// Indexes templates by id, exam tag and competency.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<TaskTemplate>,
    by_id: HashMap<String, usize>,
}

impl TemplateRegistry {
    /// Build the registry, rejecting duplicate template ids.
    pub fn new(templates: Vec<TaskTemplate>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(templates.len());
        for (index, template) in templates.iter().enumerate() {
            if by_id.insert(template.id.clone(), index).is_some() {
                return Err(EngineError::InvalidTemplate {
                    template_id: template.id.clone(),
                    message: "duplicate template id".into(),
                });
            }
        }
        Ok(Self { templates, by_id })
    }

    pub fn get_by_id(&self, id: &str) -> Option<&TaskTemplate> {
        self.by_id.get(id).map(|&i| &self.templates[i])
    }

    /// Like [`get_by_id`](Self::get_by_id) but reports unknown ids as errors.
    pub fn get(&self, id: &str) -> Result<&TaskTemplate> {
        self.get_by_id(id)
            .ok_or_else(|| EngineError::unknown("template", id))
    }

    pub fn get_by_exam_tag(&self, tag: &str) -> Vec<&TaskTemplate> {
        self.templates
            .iter()
            .filter(|t| t.exam_tags.iter().any(|x| x == tag))
            .collect()
    }

    pub fn get_by_competency(&self, competency_id: &str) -> Vec<&TaskTemplate> {
        self.templates
            .iter()
            .filter(|t| t.competency_hint.contains_key(competency_id))
            .collect()
    }

    pub fn all(&self) -> &[TaskTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(id: &str, tags: &[&str], competencies: &[&str]) -> TaskTemplate {
        let competency_hint: serde_json::Map<String, serde_json::Value> = competencies
            .iter()
            .map(|c| (c.to_string(), serde_json::json!("P")))
            .collect();
        serde_json::from_value(serde_json::json!({
            "id": id,
            "meta": {"interaction": "choice_single"},
            "pipeline": {"generator": {"id": "pick_element_pair"}, "solvers": [{"id": "compare_property"}]},
            "prompt_template_id": "compare.question",
            "difficulty": {"target_band": [0.2, 0.4]},
            "exam_tags": tags,
            "competency_hint": competency_hint,
        }))
        .unwrap()
    }

    #[test]
    fn lookups() {
        let registry = TemplateRegistry::new(vec![
            template("a", &["foundation"], &["periodic_trends"]),
            template("b", &["higher"], &["periodic_trends", "bonding"]),
            template("c", &["foundation", "higher"], &["salts"]),
        ])
        .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get_by_id("b").unwrap().id, "b");
        assert!(registry.get_by_id("zzz").is_none());
        assert!(matches!(
            registry.get("zzz"),
            Err(EngineError::UnknownIdentifier { kind: "template", .. })
        ));

        let ids = |v: Vec<&TaskTemplate>| v.into_iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(registry.get_by_exam_tag("foundation")), ["a", "c"]);
        assert_eq!(ids(registry.get_by_competency("periodic_trends")), ["a", "b"]);
        assert!(registry.get_by_competency("nope").is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = TemplateRegistry::new(vec![template("a", &[], &[]), template("a", &[], &[])])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTemplate { .. }));
    }
}
