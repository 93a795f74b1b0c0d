//! Candidate CV model and the field views templates read from it.
//!
//! The serde structs mirror the CV JSON handed to `cvgen export`. Templates never
//! see them directly: `CandidateFields`, `EducationFields`, `WorkFields` and
//! `SkillCategory` register the placeholder names (`FirstName`, `Work.Period`, ...)
//! together with their rendered values.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::placeholder::{FieldAccess, FieldError, FieldSource, FieldValue};

// ────────────────────────────────────────────────────────────────────────────
// CV data
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
    /// `"Country, City"` as entered by recruiters.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub languages: Vec<String>,
    /// `yyyy-mm-dd`; kept as text because imported CVs are not always clean.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    /// Offset from GMT in hours.
    #[serde(default)]
    pub time_zone: Option<i8>,
    #[serde(default)]
    pub all_experience: Option<String>,
    #[serde(default)]
    pub staff: Option<Staff>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub educations: Vec<Education>,
    #[serde(default)]
    pub works: Vec<Work>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// `email`, `telegram`, ...
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Staff {
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub value: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub title: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    /// Courses and certificates rather than a degree.
    #[serde(default)]
    pub is_additional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    pub title: String,
    #[serde(default)]
    pub position: Option<String>,
    pub start: NaiveDate,
    /// `None` while the candidate is still on the project.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Option<String>,
    #[serde(default)]
    pub results: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub tools: Option<String>,
}

impl Candidate {
    /// Skills sorted by their explicit order; ties keep input order.
    pub fn ordered_skills(&self) -> Vec<&Skill> {
        let mut skills: Vec<&Skill> = self.skills.iter().collect();
        skills.sort_by_key(|s| s.order);
        skills
    }

    /// Groups skills by category in order of first appearance.
    pub fn skill_categories(&self, uncategorized_label: &str) -> Vec<SkillCategory> {
        let mut groups: Vec<SkillCategory> = Vec::new();
        for skill in self.ordered_skills() {
            let name = skill
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(uncategorized_label);
            match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.tools.push(skill.value.clone()),
                None => groups.push(SkillCategory {
                    name: name.to_string(),
                    tools: vec![skill.value.clone()],
                }),
            }
        }
        groups
    }

    pub fn full_name(&self) -> String {
        [
            Some(self.last_name.as_str()),
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dates
// ────────────────────────────────────────────────────────────────────────────

/// Language used for dates and fixed phrases in a generated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

const RU_MONTHS: [&str; 12] = [
    "январь", "февраль", "март", "апрель", "май", "июнь",
    "июль", "август", "сентябрь", "октябрь", "ноябрь", "декабрь",
];

const RU_MONTHS_GENITIVE: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня",
    "июля", "августа", "сентября", "октября", "ноября", "декабря",
];

impl Locale {
    /// `январь 2024` / `January 2024`.
    pub fn month_year(self, date: NaiveDate) -> String {
        match self {
            Locale::Ru => format!("{} {}", RU_MONTHS[date.month0() as usize], date.year()),
            Locale::En => date.format("%B %Y").to_string(),
        }
    }

    /// `05 марта 2024` / `05 March 2024`.
    pub fn long_date(self, date: NaiveDate) -> String {
        match self {
            Locale::Ru => format!(
                "{:02} {} {}",
                date.day(),
                RU_MONTHS_GENITIVE[date.month0() as usize],
                date.year()
            ),
            Locale::En => date.format("%d %B %Y").to_string(),
        }
    }

    pub fn present(self) -> &'static str {
        match self {
            Locale::Ru => "по настоящее время",
            Locale::En => "present",
        }
    }

    /// `1 год 3 месяца` / `1 year 3 months`; a zero part is omitted.
    pub fn duration(self, months: u32) -> String {
        let (years, months) = (months / 12, months % 12);
        let mut parts = Vec::new();
        match self {
            Locale::Ru => {
                if years > 0 {
                    parts.push(format!("{years} {}", ru_plural(years, "год", "года", "лет")));
                }
                if months > 0 || years == 0 {
                    parts.push(format!("{months} {}", ru_plural(months, "месяц", "месяца", "месяцев")));
                }
            }
            Locale::En => {
                if years > 0 {
                    parts.push(format!("{years} year{}", if years == 1 { "" } else { "s" }));
                }
                if months > 0 || years == 0 {
                    parts.push(format!("{months} month{}", if months == 1 { "" } else { "s" }));
                }
            }
        }
        parts.join(" ")
    }
}

fn ru_plural(n: u32, one: &'static str, few: &'static str, many: &'static str) -> &'static str {
    match (n % 10, n % 100) {
        (1, r) if r != 11 => one,
        (2..=4, r) if !(12..=14).contains(&r) => few,
        _ => many,
    }
}

/// Whole months between `start` and `end`, counting a started month as worked.
fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32 + 1;
    months.max(0) as u32
}

fn age_on(date_of_birth: &str, today: NaiveDate) -> Result<u32, FieldError> {
    let born = NaiveDate::parse_from_str(date_of_birth.trim(), "%Y-%m-%d")
        .map_err(|e| FieldError(format!("date of birth '{date_of_birth}' is not yyyy-mm-dd: {e}")))?;
    today
        .years_since(born)
        .ok_or_else(|| FieldError(format!("date of birth '{date_of_birth}' is in the future")))
}

/// `Country, City` → `City, Country`; anything else is returned unchanged.
pub fn location_special(location: &str) -> String {
    let parts: Vec<&str> = location.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [country, city] => format!("{city}, {country}"),
        _ => location.to_string(),
    }
}

fn gmt(offset: i8) -> String {
    if offset < 0 {
        format!("GMT{offset}")
    } else {
        format!("GMT+{offset}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field views
// ────────────────────────────────────────────────────────────────────────────

static NO_STAFF: Staff = Staff {
    grade: None,
    stack: None,
};

impl Staff {
    /// `Grade, Stack`, skipping whichever is missing.
    pub fn title(&self) -> String {
        [self.grade.as_deref(), self.stack.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FieldSource for Staff {
    fn fields(&self) -> Vec<(&'static str, FieldAccess<'_>)> {
        vec![
            ("Grade", Ok(FieldValue::optional(self.grade.as_deref()))),
            ("Stack", Ok(FieldValue::optional(self.stack.as_deref()))),
            ("Title", Ok(FieldValue::text(self.title()))),
        ]
    }
}

/// Root fields of a candidate as rendered for one export.
pub struct CandidateFields<'a> {
    pub cv: &'a Candidate,
    pub locale: Locale,
    pub today: NaiveDate,
}

impl FieldSource for CandidateFields<'_> {
    fn fields(&self) -> Vec<(&'static str, FieldAccess<'_>)> {
        let cv = self.cv;

        let mut contacts: Vec<String> = cv
            .contacts
            .iter()
            .map(|c| c.value.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if let Some(phone) = cv.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            contacts.push(phone.to_string());
        }

        let age = match cv.date_of_birth.as_deref() {
            Some(dob) => age_on(dob, self.today).map(|age| FieldValue::text(age.to_string())),
            None => Ok(FieldValue::Empty),
        };

        vec![
            ("Id", Ok(FieldValue::text(cv.id.to_string()))),
            ("FirstName", Ok(FieldValue::text(&cv.first_name))),
            ("LastName", Ok(FieldValue::text(&cv.last_name))),
            ("SurName", Ok(FieldValue::optional(cv.middle_name.as_deref()))),
            ("FullName", Ok(FieldValue::text(cv.full_name()))),
            ("Stack", Ok(FieldValue::optional(cv.stack.as_deref()))),
            ("Location", Ok(FieldValue::optional(cv.location.as_deref()))),
            (
                "LocationSpecial",
                Ok(FieldValue::optional(cv.location.as_deref().map(location_special))),
            ),
            ("About", Ok(FieldValue::optional(cv.about.as_deref()))),
            ("Phone", Ok(FieldValue::optional(cv.phone.as_deref()))),
            ("Contacts", Ok(FieldValue::List(contacts))),
            ("Languages", Ok(FieldValue::List(cv.languages.clone()))),
            (
                "Skills",
                Ok(FieldValue::List(
                    cv.ordered_skills().into_iter().map(|s| s.value.clone()).collect(),
                )),
            ),
            ("DateOfBirth", Ok(FieldValue::optional(cv.date_of_birth.as_deref()))),
            ("Age", age),
            ("TimeZone", Ok(FieldValue::optional(cv.time_zone.map(gmt)))),
            ("AllExperience", Ok(FieldValue::optional(cv.all_experience.as_deref()))),
            ("Staff", Ok(FieldValue::Object(cv.staff.as_ref().unwrap_or(&NO_STAFF)))),
            ("GeneratedOn", Ok(FieldValue::text(self.locale.long_date(self.today)))),
        ]
    }
}

pub struct EducationFields<'a> {
    pub education: &'a Education,
}

impl FieldSource for EducationFields<'_> {
    fn fields(&self) -> Vec<(&'static str, FieldAccess<'_>)> {
        let e = self.education;
        vec![
            ("Title", Ok(FieldValue::text(&e.title))),
            ("Name", Ok(FieldValue::text(&e.title))),
            ("Organization", Ok(FieldValue::optional(e.organization.as_deref()))),
            ("Result", Ok(FieldValue::optional(e.result.as_deref()))),
            ("Year", Ok(FieldValue::optional(e.year.map(|y| y.to_string())))),
            ("Description", Ok(FieldValue::optional(e.description.as_deref()))),
        ]
    }
}

pub struct WorkFields<'a> {
    pub work: &'a Work,
    pub locale: Locale,
    pub today: NaiveDate,
}

impl FieldSource for WorkFields<'_> {
    fn fields(&self) -> Vec<(&'static str, FieldAccess<'_>)> {
        let w = self.work;
        let start = self.locale.month_year(w.start);
        let end = w
            .end
            .map_or_else(|| self.locale.present().to_string(), |d| self.locale.month_year(d));
        let duration = w.duration.clone().unwrap_or_else(|| {
            self.locale
                .duration(months_between(w.start, w.end.unwrap_or(self.today)))
        });

        vec![
            ("Title", Ok(FieldValue::text(&w.title))),
            ("Name", Ok(FieldValue::text(&w.title))),
            ("Position", Ok(FieldValue::optional(w.position.as_deref()))),
            ("Period", Ok(FieldValue::text(format!("{start} - {end}")))),
            ("Start", Ok(FieldValue::text(start))),
            ("End", Ok(FieldValue::text(end))),
            ("Duration", Ok(FieldValue::text(duration))),
            ("Description", Ok(FieldValue::optional(w.description.as_deref()))),
            ("Tasks", Ok(FieldValue::optional(w.tasks.as_deref()))),
            ("Results", Ok(FieldValue::optional(w.results.as_deref()))),
            ("Result", Ok(FieldValue::optional(w.results.as_deref()))),
            ("Team", Ok(FieldValue::optional(w.team.as_deref()))),
            ("Tools", Ok(FieldValue::optional(w.tools.as_deref()))),
        ]
    }
}

/// Skills sharing one category; one templated table row each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCategory {
    pub name: String,
    pub tools: Vec<String>,
}

impl FieldSource for SkillCategory {
    fn fields(&self) -> Vec<(&'static str, FieldAccess<'_>)> {
        vec![
            ("Name", Ok(FieldValue::text(&self.name))),
            ("Tools", Ok(FieldValue::List(self.tools.clone()))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::FieldMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate() -> Candidate {
        serde_json::from_value(serde_json::json!({
            "first_name": "Анна",
            "last_name": "Смирнова",
            "middle_name": "Петровна",
            "stack": "Rust",
            "location": "Россия, Москва",
            "phone": "+7 900 000-00-00",
            "contacts": [{ "kind": "email", "value": "anna@example.com" }],
            "date_of_birth": "1990-05-20",
            "time_zone": 3,
            "staff": { "grade": "Senior" },
            "skills": [
                { "value": "PostgreSQL", "category": "Базы данных", "order": 2 },
                { "value": "Rust", "category": "Языки", "order": 0 },
                { "value": "Git", "order": 3 },
                { "value": "Go", "category": "Языки", "order": 1 }
            ],
            "works": [{ "title": "Биржа", "start": "2022-03-01" }]
        }))
        .unwrap()
    }

    #[test]
    fn test_root_fields() {
        let cv = candidate();
        let fields = FieldMap::resolve(&CandidateFields {
            cv: &cv,
            locale: Locale::Ru,
            today: date(2024, 3, 5),
        });

        assert_eq!(fields.lookup("FullName").as_deref(), Some("Смирнова Анна Петровна"));
        assert_eq!(fields.lookup("LocationSpecial").as_deref(), Some("Москва, Россия"));
        assert_eq!(fields.lookup("Contacts").as_deref(), Some("anna@example.com, +7 900 000-00-00"));
        assert_eq!(fields.lookup("Skills").as_deref(), Some("Rust, Go, PostgreSQL, Git"));
        assert_eq!(fields.lookup("Age").as_deref(), Some("33"));
        assert_eq!(fields.lookup("TimeZone").as_deref(), Some("GMT+3"));
        assert_eq!(fields.lookup("Staff.Grade").as_deref(), Some("Senior"));
        assert_eq!(fields.lookup("Staff.Stack").as_deref(), Some(""));
        assert_eq!(fields.lookup("Staff.Title").as_deref(), Some("Senior"));
        assert_eq!(fields.lookup("GeneratedOn").as_deref(), Some("05 марта 2024"));
    }

    #[test]
    fn test_staff_title_skips_missing_parts() {
        let staff = Staff {
            grade: Some("Middle".to_string()),
            stack: Some("Java".to_string()),
        };
        assert_eq!(staff.title(), "Middle, Java");
        assert_eq!(NO_STAFF.title(), "");
    }

    #[test]
    fn test_bad_date_of_birth_omits_age_only() {
        let mut cv = candidate();
        cv.date_of_birth = Some("20.05.1990".to_string());
        cv.staff = None;
        let fields = FieldMap::resolve(&CandidateFields {
            cv: &cv,
            locale: Locale::Ru,
            today: date(2024, 3, 5),
        });
        assert!(!fields.contains("Age"));
        assert!(fields.contains("FirstName"));
        assert_eq!(fields.lookup("Staff.Grade").as_deref(), Some(""));
    }

    #[test]
    fn test_location_special_needs_two_parts() {
        assert_eq!(location_special("Россия, Москва"), "Москва, Россия");
        assert_eq!(location_special("Москва"), "Москва");
        assert_eq!(location_special("a, b, c"), "a, b, c");
    }

    #[test]
    fn test_skill_categories_first_appearance() {
        let groups = candidate().skill_categories("Прочее");
        assert_eq!(
            groups,
            vec![
                SkillCategory { name: "Языки".into(), tools: vec!["Rust".into(), "Go".into()] },
                SkillCategory { name: "Базы данных".into(), tools: vec!["PostgreSQL".into()] },
                SkillCategory { name: "Прочее".into(), tools: vec!["Git".into()] },
            ]
        );
    }

    #[test]
    fn test_work_fields_ongoing() {
        let cv = candidate();
        let work = WorkFields {
            work: &cv.works[0],
            locale: Locale::Ru,
            today: date(2024, 3, 5),
        };
        let fields = FieldMap::resolve_prefixed(&work, "Work");
        assert_eq!(fields.lookup("Work.Start").as_deref(), Some("март 2022"));
        assert_eq!(fields.lookup("Work.End").as_deref(), Some("по настоящее время"));
        assert_eq!(fields.lookup("Work.Period").as_deref(), Some("март 2022 - по настоящее время"));
        assert_eq!(fields.lookup("Work.Duration").as_deref(), Some("2 года 1 месяц"));
    }

    #[test]
    fn test_english_dates() {
        assert_eq!(Locale::En.month_year(date(2021, 11, 1)), "November 2021");
        assert_eq!(Locale::En.duration(13), "1 year 1 month");
        assert_eq!(Locale::En.duration(0), "0 months");
        assert_eq!(Locale::Ru.duration(60), "5 лет");
        assert_eq!(Locale::Ru.duration(11), "11 месяцев");
    }
}
