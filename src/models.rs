#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: Option<String>,
    pub due_at: Option<i64>, // epoch milliseconds
    pub status: Option<String>,
    pub labels: Vec<String>,
    pub link: String,
}

impl Task {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(no title)")
    }

    pub fn display_status(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    pub fn has_label(&self, marker: &str) -> bool {
        self.labels.iter().any(|l| l.to_lowercase() == marker.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Urgent,
    Regular,
    Excluded,
}

// Tasks that survived classification, each list sorted by due date
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub urgent: Vec<Task>,
    pub regular: Vec<Task>,
}

impl Classified {
    pub fn total(&self) -> usize {
        self.urgent.len() + self.regular.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Both categories merged and ordered by due date, ties keeping urgent first.
    pub fn combined(&self) -> Vec<(Category, &Task)> {
        let mut all: Vec<(Category, &Task)> = self
            .urgent
            .iter()
            .map(|t| (Category::Urgent, t))
            .chain(self.regular.iter().map(|t| (Category::Regular, t)))
            .collect();
        all.sort_by_key(|(_, t)| t.due_at);
        all
    }
}
