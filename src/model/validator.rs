// src/model/validator.rs
//! Static validation of a workspace spec against Notion API limits.
//!
//! Runs before any network call is made. Errors block deployment;
//! warnings flag suspect constructs but let the deployment proceed.
//! The input is generator output, so every check tolerates missing
//! collections instead of panicking.

use super::{PropertyKind, WorkspaceSpec};
use crate::constants::{
    NOTION_MAX_FORMULA_LENGTH, NOTION_MAX_NAME_LENGTH, NOTION_MAX_PROPERTIES_PER_DATABASE,
};
use std::collections::HashSet;

/// The outcome of validating one spec: the full list of violations and
/// the warnings that accompany them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SpecReport {
    /// Warnings never block deployment; errors always do.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks an entire spec against Notion's structural limits.
///
/// Pure — no network I/O, no mutation of the spec.
pub fn validate(spec: &WorkspaceSpec) -> SpecReport {
    let mut report = SpecReport::default();

    let database_names: HashSet<&str> = spec
        .databases
        .iter()
        .map(|db| db.display_name())
        .collect();

    for db in &spec.databases {
        let db_name = db.display_name();

        if db.name.chars().count() > NOTION_MAX_NAME_LENGTH {
            report.errors.push(format!(
                "Database \"{}…\" name exceeds {} characters",
                truncate_for_display(&db.name),
                NOTION_MAX_NAME_LENGTH
            ));
        }

        if db.properties.len() > NOTION_MAX_PROPERTIES_PER_DATABASE {
            report.errors.push(format!(
                "Database \"{}\" has {} properties; Notion allows at most {}",
                db_name,
                db.properties.len(),
                NOTION_MAX_PROPERTIES_PER_DATABASE
            ));
        }

        let mut has_title = false;
        let mut seen_names: HashSet<&str> = HashSet::new();

        for prop in &db.properties {
            match &prop.kind {
                PropertyKind::Title => has_title = true,
                PropertyKind::Unknown(raw) => report.errors.push(format!(
                    "Database \"{}\": property \"{}\" has unsupported type \"{}\"",
                    db_name, prop.name, raw
                )),
                PropertyKind::Formula => {
                    let expression_len = prop
                        .formula_expression()
                        .map(|e| e.chars().count())
                        .unwrap_or(0);
                    if expression_len > NOTION_MAX_FORMULA_LENGTH {
                        report.warnings.push(format!(
                            "Database \"{}\": formula \"{}\" is {} characters and may be too complex",
                            db_name, prop.name, expression_len
                        ));
                    }
                }
                _ => {}
            }

            if prop.name.chars().count() > NOTION_MAX_NAME_LENGTH {
                report.errors.push(format!(
                    "Database \"{}\": property name \"{}…\" exceeds {} characters",
                    db_name,
                    truncate_for_display(&prop.name),
                    NOTION_MAX_NAME_LENGTH
                ));
            }

            if !prop.name.trim().is_empty() && !seen_names.insert(prop.name.as_str()) {
                report.warnings.push(format!(
                    "Database \"{}\": duplicate property name \"{}\" (the later definition wins)",
                    db_name, prop.name
                ));
            }
        }

        if !has_title {
            report.errors.push(format!(
                "Database \"{}\" has no title property (Notion requires one; a \"Name\" title \
                 would be injected at deployment)",
                db_name
            ));
        }

        for relation in &db.relations {
            if !relation.related_database.trim().is_empty()
                && !database_names.contains(relation.related_database.as_str())
            {
                report.warnings.push(format!(
                    "Database \"{}\": relation \"{}\" references unknown database \"{}\" and \
                     will be skipped",
                    db_name, relation.property, relation.related_database
                ));
            }
        }
    }

    for (index, page) in spec.pages.iter().enumerate() {
        if page.title.trim().is_empty() {
            report
                .errors
                .push(format!("Page {} has an empty title", index + 1));
        } else if page.title.chars().count() > NOTION_MAX_NAME_LENGTH {
            report.errors.push(format!(
                "Page {} title exceeds {} characters",
                index + 1,
                NOTION_MAX_NAME_LENGTH
            ));
        }
    }

    report
}

fn truncate_for_display(name: &str) -> String {
    name.chars().take(40).collect()
}
