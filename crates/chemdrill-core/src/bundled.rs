//! Default ontology and template set compiled into the crate.

use std::path::Path;

use anyhow::Result;

use crate::model::TaskTemplate;
use crate::ontology::Ontology;
use crate::parser::{parse_ontology_str, parse_templates_str};

pub const ONTOLOGY_JSON: &str = include_str!("../data/ontology.json");
pub const TEMPLATES_JSON: &str = include_str!("../data/templates.json");

pub fn ontology() -> Result<Ontology> {
    parse_ontology_str(ONTOLOGY_JSON, Path::new("<bundled>/ontology.json"))
}

pub fn templates() -> Result<Vec<TaskTemplate>> {
    parse_templates_str(TEMPLATES_JSON, Path::new("<bundled>/templates.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_data_parses() {
        let onto = ontology().unwrap();
        assert!(onto.core.elements.len() > 30);
        assert_eq!(onto.core.competencies.len(), 14);
        assert!(onto.core.electron_config_exceptions.contains_key(&24));
        assert!(templates().unwrap().len() >= 20);
    }
}
