//! Digest composition.
//!
//! Composition happens in two steps. [`compose`] turns classified tasks
//! into a [`Digest`] (ordered sections of entries). [`Digest::render`] is
//! the only place that knows about glyphs and line layout.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use crate::models::{Category, Classified, Task};
use crate::window::{due_label, due_local};

const RULE: &str = "===================================";
const DIVIDER: &str = "--------------------------------------";

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub category: Category,
    pub title: String,
    pub status: String,
    pub labels: Vec<String>,
    pub due_label: String,
    pub due_date: NaiveDate,
    pub weekday: String,
    pub link: String,
}

impl Entry {
    pub fn new(task: &Task, due_ms: i64, category: Category, now: &DateTime<Tz>) -> Self {
        let local = due_local(due_ms, &now.timezone());

        Entry {
            category,
            title: task.display_title().to_string(),
            status: task.display_status().to_string(),
            labels: task.labels.clone(),
            due_label: due_label(due_ms, now),
            due_date: local.date_naive(),
            weekday: local.format("%a").to_string(),
            link: task.link.clone(),
        }
    }

    /// Classified tasks always carry a due date; anything else yields no entry.
    pub fn from_task(task: &Task, category: Category, now: &DateTime<Tz>) -> Option<Self> {
        task.due_at.map(|ms| Entry::new(task, ms, category, now))
    }

    fn icon(&self) -> &'static str {
        match self.category {
            Category::Urgent => "🎓",
            _ => "📝",
        }
    }

    fn render(&self) -> String {
        let tags = if self.labels.is_empty() {
            "-".to_string()
        } else {
            self.labels
                .iter()
                .map(|l| format!("#{}", l))
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!(
            "{} {}\n   • Status: {}\n   • Tags: {}\n   • Due: {} ({} {})\n   • Link: <{}>",
            self.icon(),
            self.title,
            self.status,
            tags,
            self.due_label,
            self.due_date.format("%Y-%m-%d"),
            self.weekday,
            self.link
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Summary(String),
    Tasks {
        category: Category,
        window_days: u32,
        entries: Vec<Entry>,
    },
}

impl Section {
    fn render(&self) -> String {
        match self {
            Section::Summary(text) => format!("🤖 Summary\n{}", text),
            Section::Tasks {
                category,
                window_days,
                entries,
            } => {
                let heading = match category {
                    Category::Urgent => format!(
                        "📚 Upcoming Exams (next {} days) — [{} exams]",
                        window_days,
                        entries.len()
                    ),
                    _ => format!(
                        "🗓️ Work due Soon (next {} days) — [{} works]",
                        window_days,
                        entries.len()
                    ),
                };
                let body = if entries.is_empty() {
                    "   • None".to_string()
                } else {
                    entries.iter().map(Entry::render).collect::<Vec<_>>().join("\n\n")
                };
                format!("{}\n{}", heading, body)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub date: NaiveDate,
    pub total: usize,
    pub sections: Vec<Section>,
}

impl Digest {
    pub fn render(&self) -> String {
        let date = self.date.format("%Y-%m-%d");
        if self.total == 0 {
            return format!(
                "{RULE}\n📅 Daily Check ({date}) (0 works)\n- No tasks due soon.\n{RULE}"
            );
        }

        let body = self
            .sections
            .iter()
            .map(Section::render)
            .collect::<Vec<_>>()
            .join(&format!("\n{}\n", DIVIDER));

        format!(
            "{RULE}\n📅 Daily Check ({date}) ({} works)\n\n{}\n{RULE}",
            self.total,
            body.trim()
        )
    }
}

/// Builds the digest for one run. A summary is ignored when nothing is due.
pub fn compose(
    tasks: &Classified,
    now: &DateTime<Tz>,
    regular_days: u32,
    urgent_days: u32,
    summary: Option<&str>,
) -> Digest {
    let date = now.date_naive();
    if tasks.is_empty() {
        return Digest {
            date,
            total: 0,
            sections: Vec::new(),
        };
    }

    let mut sections = Vec::new();
    if let Some(text) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        sections.push(Section::Summary(text.to_string()));
    }
    sections.push(Section::Tasks {
        category: Category::Urgent,
        window_days: urgent_days,
        entries: tasks
            .urgent
            .iter()
            .filter_map(|t| Entry::from_task(t, Category::Urgent, now))
            .collect(),
    });
    sections.push(Section::Tasks {
        category: Category::Regular,
        window_days: regular_days,
        entries: tasks
            .regular
            .iter()
            .filter_map(|t| Entry::from_task(t, Category::Regular, now))
            .collect(),
    });

    Digest {
        date,
        total: tasks.total(),
        sections,
    }
}
