//! Due-date windows and task classification.
//!
//! A window runs from local midnight today through 23:59:59 local time
//! `days` days later. Both bounds are inclusive and compared in epoch
//! milliseconds, so tasks coming straight off the wire can be tested
//! without any timezone conversion.

use chrono::{DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::models::{Category, Classified, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_ms: i64,
    pub end_ms: i64,
    pub days: u32,
}

impl Window {
    pub fn days_ahead(now: &DateTime<Tz>, days: u32) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let last_day = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);

        let start = local_instant(
            &tz,
            today.and_hms_opt(0, 0, 0).unwrap_or_default(),
            Duration::minutes(1),
        );
        let end = local_instant(
            &tz,
            last_day.and_hms_opt(23, 59, 59).unwrap_or_default(),
            Duration::minutes(-1),
        );

        Window {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
            days,
        }
    }

    pub fn contains(&self, due_ms: i64) -> bool {
        self.start_ms <= due_ms && due_ms <= self.end_ms
    }

    /// Smallest window covering both, used to fetch once for two categories.
    pub fn union(&self, other: &Window) -> Window {
        Window {
            start_ms: self.start_ms.min(other.start_ms),
            end_ms: self.end_ms.max(other.end_ms),
            days: self.days.max(other.days),
        }
    }
}

/// Resolves a wall-clock time to an instant. Inside a DST gap it walks by
/// `step` to the nearest time that exists: forward for a window start,
/// backward for a window end.
fn local_instant(tz: &Tz, naive: NaiveDateTime, step: Duration) -> DateTime<Tz> {
    let mut wall = naive;
    // no real gap is longer than a day
    for _ in 0..=24 * 60 {
        match tz.from_local_datetime(&wall) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, latest) => {
                return if step > Duration::zero() { earliest } else { latest };
            }
            LocalResult::None => wall += step,
        }
    }
    tz.from_utc_datetime(&naive)
}

pub struct Classifier<'a> {
    pub marker: &'a str,
    pub regular: Window,
    pub urgent: Window,
}

impl<'a> Classifier<'a> {
    pub fn new(marker: &'a str, regular: Window, urgent: Window) -> Self {
        Classifier {
            marker,
            regular,
            urgent,
        }
    }

    pub fn is_urgent(&self, task: &Task) -> bool {
        task.has_label(self.marker)
    }

    /// A marked task is only ever tested against the urgent window.
    pub fn categorize(&self, task: &Task) -> Category {
        let Some(due) = task.due_at else {
            return Category::Excluded;
        };

        if self.is_urgent(task) {
            if self.urgent.contains(due) {
                Category::Urgent
            } else {
                Category::Excluded
            }
        } else if self.regular.contains(due) {
            Category::Regular
        } else {
            Category::Excluded
        }
    }

    pub fn classify(&self, tasks: Vec<Task>) -> Classified {
        let mut classified = Classified::default();
        let mut excluded = 0usize;

        for task in tasks {
            match self.categorize(&task) {
                Category::Urgent => classified.urgent.push(task),
                Category::Regular => classified.regular.push(task),
                Category::Excluded => excluded += 1,
            }
        }

        // sort_by_key is stable, so equal due dates keep fetch order
        classified.urgent.sort_by_key(|t| t.due_at);
        classified.regular.sort_by_key(|t| t.due_at);

        log::debug!(
            "classified {} urgent, {} regular, {} excluded",
            classified.urgent.len(),
            classified.regular.len(),
            excluded
        );
        classified
    }
}

pub fn due_local(due_ms: i64, tz: &Tz) -> DateTime<Tz> {
    match tz.timestamp_millis_opt(due_ms) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => tz.from_utc_datetime(&NaiveDateTime::default()),
    }
}

/// Whole calendar days from `now` to `due`, both read in `now`'s timezone.
pub fn days_until(due_ms: i64, now: &DateTime<Tz>) -> i64 {
    let due = due_local(due_ms, &now.timezone());
    i64::from(due.date_naive().num_days_from_ce()) - i64::from(now.date_naive().num_days_from_ce())
}

pub fn relative_label(delta_days: i64) -> String {
    match delta_days {
        d if d < 0 => format!("overdue ({}d)", d.abs()),
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d => format!("in {} days", d),
    }
}

pub fn due_label(due_ms: i64, now: &DateTime<Tz>) -> String {
    relative_label(days_until(due_ms, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Bangkok;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        Bangkok.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn task(title: &str, due: Option<DateTime<Tz>>, labels: &[&str]) -> Task {
        Task {
            id: title.to_lowercase(),
            title: Some(title.to_string()),
            due_at: due.map(|d| d.timestamp_millis()),
            status: Some("open".to_string()),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            link: format!("https://app.clickup.com/t/{}", title.to_lowercase()),
        }
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.display_title()).collect()
    }

    fn classifier(now: &DateTime<Tz>) -> Classifier<'static> {
        Classifier::new(
            "exam",
            Window::days_ahead(now, 7),
            Window::days_ahead(now, 14),
        )
    }

    #[test]
    fn window_spans_local_midnight_to_end_of_last_day() {
        let now = at(2024, 1, 1, 15, 30);
        let w = Window::days_ahead(&now, 7);
        assert_eq!(w.start_ms, at(2024, 1, 1, 0, 0).timestamp_millis());
        assert_eq!(
            w.end_ms,
            Bangkok.with_ymd_and_hms(2024, 1, 8, 23, 59, 59).unwrap().timestamp_millis()
        );
        assert!(w.contains(w.start_ms));
        assert!(w.contains(w.end_ms));
        assert!(!w.contains(w.start_ms - 1));
        assert!(!w.contains(w.end_ms + 1));
    }

    #[test]
    fn window_starts_after_a_midnight_dst_gap() {
        use chrono_tz::America::Santiago;

        // Chile skips 2023-09-03 00:00..01:00
        let now = Santiago.with_ymd_and_hms(2023, 9, 3, 12, 0, 0).unwrap();
        let w = Window::days_ahead(&now, 7);
        let first_hour = Santiago.with_ymd_and_hms(2023, 9, 3, 1, 0, 0).unwrap();
        assert_eq!(w.start_ms, first_hour.timestamp_millis());

        let yesterday_evening = Santiago.with_ymd_and_hms(2023, 9, 2, 21, 0, 0).unwrap();
        assert!(!w.contains(yesterday_evening.timestamp_millis()));
        assert!(w.contains(first_hour.timestamp_millis()));
    }

    #[test]
    fn union_takes_the_wider_bounds() {
        let now = at(2024, 1, 1, 9, 0);
        let regular = Window::days_ahead(&now, 7);
        let urgent = Window::days_ahead(&now, 14);
        assert_eq!(regular.union(&urgent), urgent);
        assert_eq!(urgent.union(&regular), urgent);
    }

    #[test]
    fn end_to_end_scenario_splits_by_marker_and_window() {
        let now = at(2024, 1, 1, 0, 0);
        let tasks = vec![
            task("A", Some(at(2024, 1, 2, 12, 0)), &[]),
            task("B", Some(at(2024, 1, 10, 12, 0)), &["exam"]),
            task("C", Some(at(2024, 2, 1, 12, 0)), &["exam"]),
        ];
        let out = classifier(&now).classify(tasks);
        assert_eq!(titles(&out.regular), vec!["A"]);
        assert_eq!(titles(&out.urgent), vec!["B"]);
        assert_eq!(out.total(), 2);
    }

    #[test]
    fn marked_task_outside_urgent_window_is_not_demoted() {
        let now = at(2024, 1, 1, 8, 0);
        let c = classifier(&now);
        let far_exam = task("Final", Some(at(2024, 1, 20, 9, 0)), &["exam"]);
        assert_eq!(c.categorize(&far_exam), Category::Excluded);
    }

    #[test]
    fn unmarked_task_uses_only_the_regular_window() {
        let now = at(2024, 1, 1, 8, 0);
        let c = classifier(&now);
        let inside = task("Essay", Some(at(2024, 1, 8, 23, 0)), &["homework"]);
        let beyond = task("Report", Some(at(2024, 1, 10, 9, 0)), &[]);
        assert_eq!(c.categorize(&inside), Category::Regular);
        assert_eq!(c.categorize(&beyond), Category::Excluded);
    }

    #[test]
    fn marker_match_ignores_case() {
        let now = at(2024, 1, 1, 8, 0);
        let c = classifier(&now);
        let t = task("Midterm", Some(at(2024, 1, 12, 9, 0)), &["EXAM"]);
        assert_eq!(c.categorize(&t), Category::Urgent);
        let partial = task("Quiz", Some(at(2024, 1, 12, 9, 0)), &["exams"]);
        assert_eq!(c.categorize(&partial), Category::Excluded);
    }

    #[test]
    fn tasks_without_due_date_are_always_excluded() {
        let now = at(2024, 1, 1, 8, 0);
        let c = classifier(&now);
        assert_eq!(c.categorize(&task("Someday", None, &[])), Category::Excluded);
        assert_eq!(c.categorize(&task("Exam?", None, &["exam"])), Category::Excluded);
    }

    #[test]
    fn overdue_tasks_fall_before_the_window() {
        let now = at(2024, 1, 5, 8, 0);
        let c = classifier(&now);
        let late = task("Late", Some(at(2024, 1, 4, 9, 0)), &["exam"]);
        assert_eq!(c.categorize(&late), Category::Excluded);
    }

    #[test]
    fn output_is_sorted_by_due_and_stable_on_ties() {
        let now = at(2024, 1, 1, 0, 0);
        let same = at(2024, 1, 3, 10, 0);
        let tasks = vec![
            task("Third", Some(at(2024, 1, 6, 10, 0)), &[]),
            task("First", Some(same), &[]),
            task("Second", Some(same), &[]),
            task("Zeta", Some(at(2024, 1, 13, 10, 0)), &["exam"]),
            task("Alpha", Some(at(2024, 1, 2, 10, 0)), &["exam"]),
        ];
        let out = classifier(&now).classify(tasks);
        assert_eq!(titles(&out.regular), vec!["First", "Second", "Third"]);
        assert_eq!(titles(&out.urgent), vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn relative_labels() {
        assert_eq!(relative_label(-2), "overdue (2d)");
        assert_eq!(relative_label(0), "today");
        assert_eq!(relative_label(1), "tomorrow");
        assert_eq!(relative_label(5), "in 5 days");
    }

    #[test]
    fn days_until_counts_calendar_days_not_hours() {
        let now = at(2024, 1, 1, 23, 0);
        let early_tomorrow = at(2024, 1, 2, 1, 0).timestamp_millis();
        assert_eq!(days_until(early_tomorrow, &now), 1);
        assert_eq!(due_label(early_tomorrow, &now), "tomorrow");

        let earlier_today = at(2024, 1, 1, 2, 0).timestamp_millis();
        assert_eq!(due_label(earlier_today, &now), "today");

        let two_days_ago = at(2023, 12, 30, 12, 0).timestamp_millis();
        assert_eq!(due_label(two_days_ago, &now), "overdue (2d)");
    }
}
