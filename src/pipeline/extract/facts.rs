//! Schema-derived facts normalized into triples.
//!
//! One entity per structured-data item, one fact unit per known predicate
//! present. Facts are document-level: they anchor to the first section.

use serde_json::Value;

use super::{anchor_span, enriched_text, item_type, schema_items, Entity, Triple, Unit, UnitType};
use crate::ids::stable_id;
use crate::pipeline::segment::Section;

pub fn extract(
    schemas: &[Value],
    sections: &[Section],
    doc_id: &str,
    url: &str,
) -> (Vec<Entity>, Vec<Unit>) {
    let mut entities = Vec::new();
    let mut units = Vec::new();

    for item in schema_items(schemas) {
        let entity_type = item_type(item).unwrap_or_default().to_string();
        let name = item
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let entity_id = item
            .get("@id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| stable_id(&[url, &entity_type, &name]));
        let source_ref = item
            .get("@id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        entities.push(Entity {
            entity_id: entity_id.clone(),
            entity_type: entity_type.clone(),
            name: name.clone(),
            url: item
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or(url)
                .to_string(),
        });

        // Facts need a section to anchor to.
        let Some(first) = sections.first() else {
            continue;
        };
        let subject_label = if name.is_empty() { &entity_type } else { &name };

        let mut push_fact = |predicate: &str, object: &str, text: String, extra_ref: Option<&str>| {
            let Some((char_start, char_end)) = anchor_span(first, 0, text.len()) else {
                return;
            };
            let mut entity_refs = Vec::new();
            if !name.is_empty() {
                entity_refs.push(name.clone());
            }
            if let Some(extra) = extra_ref {
                entity_refs.push(extra.to_string());
            }
            units.push(Unit {
                unit_id: stable_id(&[url, "fact", &entity_type, predicate, object]),
                section_id: first.section_id.clone(),
                doc_id: doc_id.to_string(),
                url: url.to_string(),
                unit_type: UnitType::Fact,
                enriched_text_for_embedding: enriched_text(
                    &first.section_path,
                    url,
                    UnitType::Fact,
                    &text,
                ),
                clean_text: text,
                char_start,
                char_end,
                entity_refs,
                triple: Some(Triple {
                    subject_id: entity_id.clone(),
                    subject_type: entity_type.clone(),
                    predicate: predicate.to_string(),
                    object: object.to_string(),
                    source_ref: source_ref.clone(),
                }),
                assertion: None,
            });
        };

        if !name.is_empty() {
            let text = format!("{} ({}) name is {}.", name, entity_type, name);
            push_fact("name", &name, text, None);
        }

        if let Some(telephone) = item.get("telephone").and_then(Value::as_str) {
            let text = format!("{} telephone is {}.", subject_label, telephone);
            push_fact("telephone", telephone, text, None);
        }

        let founder = match item.get("founder") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(obj @ Value::Object(_)) => obj
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        if let Some(founder_name) = founder.filter(|f| !f.is_empty()) {
            let text = format!("{} founder is {}.", subject_label, founder_name);
            push_fact("founder", &founder_name, text, Some(&founder_name));
        }

        if let Some(same_as) = item.get("sameAs").and_then(Value::as_array) {
            for entry in same_as.iter().filter_map(Value::as_str) {
                let text = format!("{} sameAs includes {}.", subject_label, entry);
                push_fact("sameAs", entry, text, None);
            }
        }
    }

    (entities, units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://acme.example/about";

    fn first_section() -> Section {
        let text = "Acme builds artisanal widgets in three sizes and ships them worldwide from a single workshop.";
        Section {
            section_id: "sec1".to_string(),
            doc_id: "doc1".to_string(),
            url: URL.to_string(),
            section_path: "Document".to_string(),
            heading_text: String::new(),
            heading_level: 0,
            char_start: 0,
            char_end: text.len(),
            clean_text: text.to_string(),
            prev_section_id: None,
            next_section_id: None,
        }
    }

    #[test]
    fn organization_yields_name_and_telephone_facts() {
        let schemas = vec![json!({"@type": "Organization", "name": "Acme", "telephone": "555-0100"})];
        let (entities, units) = extract(&schemas, &[first_section()], "doc1", URL);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Acme");
        assert_eq!(units.len(), 2);
        let predicates: Vec<&str> = units
            .iter()
            .map(|u| u.triple.as_ref().unwrap().predicate.as_str())
            .collect();
        assert!(predicates.contains(&"name"));
        assert!(predicates.contains(&"telephone"));
        assert!(units.iter().all(|u| u.unit_type == UnitType::Fact));
    }

    #[test]
    fn same_as_yields_one_unit_per_entry() {
        let schemas = vec![json!({
            "@type": "Organization",
            "name": "Acme",
            "sameAs": ["https://social.example/acme", "https://code.example/acme"]
        })];
        let (_, units) = extract(&schemas, &[first_section()], "doc1", URL);
        let same_as: Vec<&Unit> = units
            .iter()
            .filter(|u| u.triple.as_ref().unwrap().predicate == "sameAs")
            .collect();
        assert_eq!(same_as.len(), 2);
        assert!(same_as[0].clean_text.contains("social.example"));
    }

    #[test]
    fn founder_object_uses_inner_name() {
        let schemas = vec![json!({
            "@type": "Organization",
            "name": "Acme",
            "founder": {"@type": "Person", "name": "Dana Smith"}
        })];
        let (_, units) = extract(&schemas, &[first_section()], "doc1", URL);
        let founder = units
            .iter()
            .find(|u| u.triple.as_ref().unwrap().predicate == "founder")
            .unwrap();
        assert_eq!(founder.triple.as_ref().unwrap().object, "Dana Smith");
        assert!(founder.entity_refs.contains(&"Dana Smith".to_string()));
    }

    #[test]
    fn graph_items_and_missing_sections_degrade_gracefully() {
        let schemas = vec![json!({"@graph": [
            {"@type": "Organization", "name": "Acme"},
            {"@type": "WebSite", "name": "Acme Site"}
        ]})];
        let (entities, units) = extract(&schemas, &[], "doc1", URL);
        assert_eq!(entities.len(), 2);
        assert!(units.is_empty());
    }

    #[test]
    fn facts_anchor_inside_the_first_section() {
        let schemas = vec![json!({"@type": "Organization", "name": "Acme", "telephone": "555-0100"})];
        let section = first_section();
        let (_, units) = extract(&schemas, &[section.clone()], "doc1", URL);
        for u in &units {
            assert!(u.char_start >= section.char_start);
            assert!(u.char_end <= section.char_end);
            assert_eq!(u.char_end - u.char_start, u.clean_text.len());
        }
    }
}
