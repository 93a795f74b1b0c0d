//! Document generation: runs a client layout's steps over a parsed template.
//!
//! Flow: resolve root fields → for each step (labeled values, scalar fields,
//! regions, tables, section collapse, cleanup) edit the document in place →
//! return the document with any non-fatal diagnostics collected on the way.
//!
//! Template-authoring problems (missing markers, unclosed regions, missing tables)
//! never abort generation; they are logged and reported as `Diagnostic`s.

use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::errors::AppError;
use crate::formats::{Collection, LayoutStep, TemplateLayout};
use crate::models::{Candidate, CandidateFields, EducationFields, Locale, Work, WorkFields};
use crate::placeholder::{FieldMap, FieldSource};
use crate::template::{
    collapse_empty_section, fill_table, remove_markers, replace_literal, replicate_region,
    substitute_container, RegionSpec, Replication, TableSpec,
};

/// Filler text the recruiting system stores for unknown values.
pub const UNKNOWN_VALUE: &str = "Неизвестно";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// A template-authoring problem found while filling the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Generated {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Fills `template` with `candidate` following `layout`. `today` drives ages,
/// ongoing project durations and the generation date.
pub fn generate(
    mut template: Document,
    layout: &TemplateLayout,
    candidate: &Candidate,
    today: NaiveDate,
) -> Result<Generated, AppError> {
    layout.validate()?;

    let root = CandidateFields {
        cv: candidate,
        locale: layout.locale,
        today,
    };
    let fields = finish_fields(FieldMap::resolve(&root), layout);
    debug!(format = %layout.id, fields = fields.len(), "Root fields resolved");
    let mut diagnostics = Vec::new();

    for step in &layout.steps {
        match step {
            LayoutStep::Labeled {
                placeholder,
                prefix,
                field,
            } => {
                if !fields.contains(field) {
                    diagnostics.push(Diagnostic::warning(format!(
                        "labeled step for {placeholder} names unknown field {field}"
                    )));
                }
                let value = fields.lookup(field).unwrap_or_default();
                let replacement = if value.trim().is_empty() {
                    String::new()
                } else {
                    format!("{prefix}{value}")
                };
                let n = replace_literal(&mut template, placeholder, &replacement);
                debug!(placeholder, replaced = n, "Labeled value written");
            }

            LayoutStep::Fields => {
                let n = substitute_container(&mut template, &fields, layout.dialect);
                debug!(replaced = n, "Root fields substituted");
            }

            LayoutStep::Region {
                name,
                collection,
                item_prefix,
                heading,
                drop_empty,
            } => {
                let items = collection_fields(*collection, candidate, layout, today, item_prefix);
                let spec = RegionSpec {
                    name,
                    item_prefix,
                    heading: heading.as_deref(),
                    drop_empty: *drop_empty,
                };
                match replicate_region(&mut template, spec, &items, layout.dialect) {
                    Ok(Replication::Expanded {
                        copies,
                        headings_removed,
                    }) => debug!(region = %name, copies, headings_removed, "Region expanded"),
                    Ok(Replication::MarkerMissing) => diagnostics.push(Diagnostic::warning(format!(
                        "region [{name}] is not present in template {}",
                        layout.template
                    ))),
                    Err(e) => {
                        warn!(format = %layout.id, "Skipping region: {e}");
                        diagnostics.push(Diagnostic::error(e.to_string()));
                    }
                }
            }

            LayoutStep::Table {
                marker,
                collection,
                item_prefix,
                drop_empty,
            } => {
                let rows = collection_fields(*collection, candidate, layout, today, item_prefix);
                let spec = TableSpec {
                    marker,
                    item_prefix,
                    drop_empty: *drop_empty,
                };
                match fill_table(&mut template, spec, &rows, layout.dialect) {
                    Ok(appended) => debug!(marker = %marker, appended, "Table filled"),
                    Err(e) => {
                        warn!(format = %layout.id, "Skipping table: {e}");
                        diagnostics.push(Diagnostic::warning(e.to_string()));
                    }
                }
            }

            LayoutStep::CollapseSection { label, placeholder } => {
                if collapse_empty_section(&mut template, label, placeholder.as_deref()) {
                    debug!(label, "Collapsed empty section");
                }
            }

            LayoutStep::Cleanup => {
                let removed = remove_markers(&mut template);
                debug!(removed, "Removed leftover markers");
            }
        }
    }

    info!(
        format = %layout.id,
        candidate = %candidate.id,
        diagnostics = diagnostics.len(),
        "Document generated"
    );

    Ok(Generated {
        document: template,
        diagnostics,
    })
}

/// Applies the layout's value rewrites: unknown filler and bullet lists.
fn finish_fields(mut fields: FieldMap, layout: &TemplateLayout) -> FieldMap {
    if layout.blank_unknown {
        fields.blank_matching(UNKNOWN_VALUE);
    }
    for path in &layout.bullets {
        fields.bulletize(path);
    }
    fields
}

fn item_fields(source: &dyn FieldSource, prefix: &str, layout: &TemplateLayout) -> FieldMap {
    finish_fields(FieldMap::resolve_prefixed(source, prefix), layout)
}

/// One field map per collection item, in input order.
fn collection_fields(
    collection: Collection,
    candidate: &Candidate,
    layout: &TemplateLayout,
    today: NaiveDate,
    prefix: &str,
) -> Vec<FieldMap> {
    let locale: Locale = layout.locale;

    let educations = |additional: Option<bool>| -> Vec<FieldMap> {
        candidate
            .educations
            .iter()
            .filter(|e| additional.is_none_or(|a| e.is_additional == a))
            .map(|education| item_fields(&EducationFields { education }, prefix, layout))
            .collect()
    };
    let works = |list: Vec<&Work>| -> Vec<FieldMap> {
        list.into_iter()
            .map(|work| item_fields(&WorkFields { work, locale, today }, prefix, layout))
            .collect()
    };

    match collection {
        Collection::Educations => educations(Some(false)),
        Collection::AdditionalEducations => educations(Some(true)),
        Collection::AllEducations => educations(None),
        Collection::Works => works(candidate.works.iter().collect()),
        Collection::RecentWorks => {
            let mut recent: Vec<&Work> = candidate.works.iter().collect();
            recent.sort_by_key(|w| Reverse(w.end.unwrap_or(NaiveDate::MAX)));
            works(recent)
        }
        Collection::SkillCategories => candidate
            .skill_categories(&layout.uncategorized_label)
            .iter()
            .map(|category| item_fields(category, prefix, layout))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{io, Container};
    use crate::formats::LayoutRegistry;
    use crate::placeholder::token::scan;
    use crate::placeholder::Dialect;
    use crate::template::cleanup::is_marker_text;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn full_candidate() -> Candidate {
        serde_json::from_value(serde_json::json!({
            "first_name": "Иван",
            "last_name": "Петров",
            "middle_name": "Сергеевич",
            "stack": "Backend",
            "location": "Россия, Казань",
            "about": "Люблю распределённые системы.",
            "phone": "+7 900 111-22-33",
            "contacts": [{ "kind": "email", "value": "ivan@example.com" }],
            "languages": ["Русский", "English B2"],
            "date_of_birth": "1992-11-02",
            "time_zone": 3,
            "all_experience": "8 лет",
            "staff": { "grade": "Senior", "stack": "Rust" },
            "skills": [
                { "value": "Rust", "category": "Языки", "order": 0 },
                { "value": "Kafka", "category": "Брокеры", "order": 1 },
                { "value": "Docker", "order": 2 }
            ],
            "educations": [
                { "title": "Прикладная математика", "organization": "КФУ", "result": "Магистр", "year": 2015, "description": "Диплом с отличием" },
                { "title": "Rust for professionals", "organization": "Stepik", "year": 2020, "description": "Курс", "is_additional": true }
            ],
            "works": [
                {
                    "title": "Платёжный шлюз", "position": "Tech Lead",
                    "start": "2021-02-01", "end": "2023-06-30",
                    "description": "Процессинг платежей", "tasks": "Архитектура",
                    "results": "x2 RPS", "team": "6 человек", "tools": "Rust, Kafka"
                },
                {
                    "title": "Биржевой терминал", "position": "Senior",
                    "start": "2023-07-01",
                    "description": "Котировки", "tasks": "Low latency",
                    "results": "p99 < 5ms", "team": "4 человека", "tools": "Rust, Redis"
                }
            ]
        }))
        .unwrap()
    }

    const BUNDLED: [&str; 7] = [
        "mosbirja",
        "bk",
        "itfb",
        "stratosphere",
        "digimatics",
        "godigital",
        "sspsoft",
    ];

    fn bundled_template(id: &str) -> Document {
        let bytes: &[u8] = match id {
            "mosbirja" => include_bytes!("../../templates/mosbirja.docx"),
            "bk" => include_bytes!("../../templates/bk.docx"),
            "itfb" => include_bytes!("../../templates/itfb.docx"),
            "stratosphere" => include_bytes!("../../templates/stratosphere.docx"),
            "digimatics" => include_bytes!("../../templates/digimatics.docx"),
            "godigital" => include_bytes!("../../templates/godigital.docx"),
            "sspsoft" => include_bytes!("../../templates/sspsoft.docx"),
            other => panic!("no bundled template {other}"),
        };
        io::from_bytes(bytes).unwrap().document
    }

    fn all_text(doc: &Document) -> Vec<String> {
        doc.paragraphs().map(|p| p.text()).collect()
    }

    fn generate_builtin(id: &str, candidate: &Candidate) -> Generated {
        let registry = LayoutRegistry::builtin().unwrap();
        let layout = registry.get(id).unwrap();
        generate(bundled_template(id), layout, candidate, today()).unwrap()
    }

    #[test]
    fn test_no_recognized_placeholders_or_markers_remain() {
        let candidate = full_candidate();
        for id in BUNDLED {
            let generated = generate_builtin(id, &candidate);
            assert!(generated.diagnostics.is_empty(), "{id}: {:?}", generated.diagnostics);

            for text in all_text(&generated.document) {
                for dialect in [Dialect::Angle, Dialect::Brace] {
                    assert!(scan(&text, dialect).is_empty(), "{id}: leftover token in {text:?}");
                }
                assert!(!is_marker_text(&text), "{id}: leftover marker {text:?}");
            }
        }
    }

    #[test]
    fn test_mosbirja_content() {
        let generated = generate_builtin("mosbirja", &full_candidate());
        let text = all_text(&generated.document);

        assert_eq!(text[0], "Петров Иван Сергеевич");
        assert!(text.contains(&"Backend, Senior".to_string()));
        assert!(text.contains(&"Дата формирования: 05 марта 2024".to_string()));
        assert!(text.contains(&"Брокеры".to_string()));
        assert!(text.contains(&"Прочее".to_string()));
        assert!(text.contains(&"февраль 2021 - июнь 2023".to_string()));
        assert!(text.contains(&"июль 2023 - по настоящее время".to_string()));

        let first = text.iter().position(|t| t == "Платёжный шлюз").unwrap();
        let second = text.iter().position(|t| t == "Биржевой терминал").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_bk_contacts_line_and_empty_contacts() {
        let generated = generate_builtin("bk", &full_candidate());
        assert!(all_text(&generated.document).contains(
            &"E-mail / номер телефона: ivan@example.com, +7 900 111-22-33".to_string()
        ));

        let mut candidate = full_candidate();
        candidate.contacts.clear();
        candidate.phone = None;
        let generated = generate_builtin("bk", &candidate);
        let text = all_text(&generated.document);
        assert_eq!(text[2], "");
        assert!(!text.iter().any(|t| t.contains("E-mail")));
    }

    #[test]
    fn test_bk_empty_collections_drop_sections() {
        let mut candidate = full_candidate();
        candidate.educations.retain(|e| !e.is_additional);
        candidate.skills.clear();
        let generated = generate_builtin("bk", &candidate);
        let text = all_text(&generated.document);

        assert!(text.contains(&"Образование".to_string()));
        assert!(!text.contains(&"Курсы".to_string()));
        assert!(!text.contains(&"Навыки".to_string()));
    }

    #[test]
    fn test_itfb_blanks_unknown_values_and_swaps_location() {
        let mut candidate = full_candidate();
        candidate.stack = Some(UNKNOWN_VALUE.to_string());
        let generated = generate_builtin("itfb", &candidate);
        let text = all_text(&generated.document);

        assert_eq!(text[0], "Иван П.");
        assert_eq!(text[1], "");
        assert_eq!(text[2], "Казань, Россия");
        assert!(!text.iter().any(|t| t.contains(UNKNOWN_VALUE)));
    }

    #[test]
    fn test_template_defects_become_diagnostics() {
        let registry = LayoutRegistry::builtin().unwrap();
        let layout = registry.get("mosbirja").unwrap();
        let template = Document::from_lines(&["{FullName}", "[Educations]", "{Education.Name}"]);

        let generated = generate(template, layout, &full_candidate(), today()).unwrap();

        let severities: Vec<Severity> = generated.diagnostics.iter().map(|d| d.severity).collect();
        // missing table, unclosed Educations, missing Works
        assert_eq!(
            severities,
            vec![Severity::Warning, Severity::Error, Severity::Warning]
        );
        assert_eq!(generated.document.lines()[0], "Петров Иван Сергеевич");
    }

    #[test]
    fn test_bundled_templates_survive_encoding() {
        let candidate = full_candidate();
        for id in BUNDLED {
            let generated = generate_builtin(id, &candidate);
            let bytes = io::Template::from_document(generated.document.clone())
                .to_bytes()
                .unwrap();
            let reread = io::from_bytes(&bytes).unwrap().document;
            assert_eq!(all_text(&reread), all_text(&generated.document), "{id}");
        }
    }

    #[test]
    fn test_stratosphere_drops_labels_of_blank_work_fields() {
        let mut candidate = full_candidate();
        let work = &mut candidate.works[0];
        work.position = None;
        work.description = None;
        work.tasks = None;
        work.tools = None;

        let generated = generate_builtin("stratosphere", &candidate);
        let text = all_text(&generated.document);

        assert!(text.contains(&"Период февраль 2021 - июнь 2023".to_string()));
        assert_eq!(text.iter().filter(|t| t.starts_with("Роль ")).count(), 1);
        assert!(text.contains(&"Роль Senior".to_string()));
        assert!(!text.iter().any(|t| t.trim() == "Описание проекта" || t.trim() == "Стек"));
    }

    #[test]
    fn test_bk_drops_rows_of_blank_work_fields() {
        let mut candidate = full_candidate();
        candidate.works[1].team = None;

        let generated = generate_builtin("bk", &candidate);
        let text = all_text(&generated.document);
        let team_rows = text.iter().filter(|t| *t == "Команда проекта").count();
        assert_eq!(team_rows, 1);
    }

    #[test]
    fn test_dash_lines_become_bullets() {
        let mut candidate = full_candidate();
        candidate.works[0].tasks = Some("- Архитектура\n\n  - Ревью кода\nМентор".to_string());

        let generated = generate_builtin("bk", &candidate);
        assert!(all_text(&generated.document)
            .contains(&"•  Архитектура\n•  Ревью кода\nМентор".to_string()));

        // layouts without a bullet list keep the text as written
        let generated = generate_builtin("godigital", &candidate);
        assert!(all_text(&generated.document)
            .contains(&"Задачи:\n- Архитектура\n\n  - Ревью кода\nМентор".to_string()));
    }

    #[test]
    fn test_digimatics_lists_recent_work_first() {
        let generated = generate_builtin("digimatics", &full_candidate());
        let text = all_text(&generated.document);

        assert!(text.contains(&"Иван".to_string()));
        assert!(text.contains(&"Senior, Rust".to_string()));
        assert!(text.contains(&"2015".to_string()));
        assert!(text.contains(&"Прикладная математика".to_string()));

        let ongoing = text.iter().position(|t| t == "Senior").unwrap();
        let finished = text.iter().position(|t| t == "Tech Lead").unwrap();
        assert!(ongoing < finished);
    }

    #[test]
    fn test_digimatics_collapses_empty_sections() {
        let mut candidate = full_candidate();
        candidate.location = None;
        candidate.educations.clear();
        candidate.languages.clear();

        let generated = generate_builtin("digimatics", &candidate);
        let text = all_text(&generated.document);

        assert!(!text.contains(&"Location".to_string()));
        assert!(!text.contains(&"Education".to_string()));
        assert!(!text.contains(&"Language".to_string()));
        assert!(text.contains(&"Technology Stack".to_string()));
        assert!(generated.diagnostics.is_empty(), "{:?}", generated.diagnostics);
    }

    #[test]
    fn test_godigital_header_labels() {
        let generated = generate_builtin("godigital", &full_candidate());
        let text = all_text(&generated.document);
        assert!(text.contains(&"Петров Иван Сергеевич".to_string()));
        assert!(text.contains(&"Профессиональный опыт: 8 лет".to_string()));
        assert!(text.contains(&"Локация: Россия, Казань".to_string()));
        assert!(text.contains(&"Грейд: Senior".to_string()));

        let mut candidate = full_candidate();
        candidate.location = None;
        candidate.staff = None;
        let generated = generate_builtin("godigital", &candidate);
        let text = all_text(&generated.document);
        assert!(!text.iter().any(|t| t.starts_with("Локация") || t.starts_with("Грейд")));
    }

    #[test]
    fn test_sspsoft_content_and_empty_skills() {
        let generated = generate_builtin("sspsoft", &full_candidate());
        let text = all_text(&generated.document);
        assert!(text.contains(&"Возраст: 31".to_string()));
        assert!(text.contains(&"GMT+3 (Россия, Казань)".to_string()));
        assert!(text.contains(&"Другие навыки".to_string()));
        assert!(text.contains(&"февраль 2021 - июнь 2023 (2 года 5 месяцев)".to_string()));

        let mut candidate = full_candidate();
        candidate.skills.clear();
        let generated = generate_builtin("sspsoft", &candidate);
        let text = all_text(&generated.document);
        assert!(!text.contains(&"Технические навыки".to_string()));
        assert!(!text.iter().any(|t| t.contains("Stacks.Table")));
        assert!(generated.diagnostics.is_empty(), "{:?}", generated.diagnostics);
    }
}
