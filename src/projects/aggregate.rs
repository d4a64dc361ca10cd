//! Pure aggregation over project records: time spent, invoice totals, the
//! in-progress/completed partition and name search. No side effects; the
//! view-model feeds these from store snapshots.

use crate::db::models::{Project, ProjectDataset, ProjectView, WorkSession};
use crate::projects::ProjectError;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Duration of one session in milliseconds. A session whose end precedes
/// its start counts as zero, as does one still missing its end.
pub fn session_duration_ms(session: &WorkSession) -> u64 {
    match session.stopped_at {
        Some(stopped_at) => (stopped_at - session.started_at)
            .num_milliseconds()
            .max(0) as u64,
        None => 0,
    }
}

/// Total logged time for a project. `live_ms` is the elapsed time of a work
/// interval currently running on an open detail screen; it is UI state, not
/// storage, so the caller passes it in explicitly.
pub fn time_spent_ms(project: &Project, live_ms: Option<u64>) -> u64 {
    let logged: u64 = project.sessions.iter().map(session_duration_ms).sum();
    logged.saturating_add(live_ms.unwrap_or(0))
}

pub fn time_spent_hours(project: &Project, live_ms: Option<u64>) -> f64 {
    time_spent_ms(project, live_ms) as f64 / MS_PER_HOUR
}

fn uninvoiced_ms(project: &Project) -> u64 {
    project
        .sessions
        .iter()
        .filter(|session| !session.invoiced)
        .map(session_duration_ms)
        .sum()
}

/// Hours not yet covered by an invoice.
pub fn uninvoiced_hours(project: &Project) -> f64 {
    uninvoiced_ms(project) as f64 / MS_PER_HOUR
}

/// The amount an invoice for this project would carry, at the given hourly
/// rate. Only sessions not yet invoiced contribute. A project with no
/// logged time has nothing to invoice; one whose time is all invoiced
/// already cannot be billed twice.
pub fn invoiced_amount(project: &Project, hourly_rate: f64) -> Result<f64, ProjectError> {
    if time_spent_ms(project, None) == 0 {
        return Err(ProjectError::NothingToInvoice);
    }

    let uninvoiced = uninvoiced_ms(project);
    if uninvoiced == 0 {
        return Err(ProjectError::AlreadyInvoiced);
    }

    Ok(uninvoiced as f64 / MS_PER_HOUR * hourly_rate)
}

/// Stable split into (in progress, completed). Every input project lands in
/// exactly one bucket and each bucket keeps the input order.
pub fn partition(projects: Vec<Project>) -> (Vec<Project>, Vec<Project>) {
    projects
        .into_iter()
        .partition(|project| !project.completed)
}

/// Case-insensitive substring match on name, restricted to non-completed
/// projects. An empty query returns every non-completed project.
pub fn search(projects: &[Project], query: &str) -> Vec<Project> {
    let needle = query.to_lowercase();
    projects
        .iter()
        .filter(|project| !project.completed)
        .filter(|project| project.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub fn project_view(project: &Project, live_ms: Option<u64>) -> ProjectView {
    ProjectView {
        id: project.id.clone(),
        name: project.name.clone(),
        time_spent_display: format!("{:.1} hours", time_spent_hours(project, live_ms)),
        completed: project.completed,
    }
}

/// Build the published dataset from a store snapshot. `live` carries the
/// tracked project's id and its pending+running milliseconds, so the list
/// reflects an interval that has not been persisted yet. The completed
/// section is omitted entirely (not just emptied) when nothing is
/// completed.
pub fn dataset(projects: Vec<Project>, live: Option<(&str, u64)>) -> ProjectDataset {
    let live_for = |project: &Project| match live {
        Some((id, ms)) if project.id == id => Some(ms),
        _ => None,
    };

    let (in_progress, completed) = partition(projects);
    let in_progress = in_progress
        .iter()
        .map(|project| project_view(project, live_for(project)))
        .collect();
    let completed: Vec<ProjectView> = completed
        .iter()
        .map(|project| project_view(project, live_for(project)))
        .collect();

    ProjectDataset {
        in_progress,
        completed: if completed.is_empty() {
            None
        } else {
            Some(completed)
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::models::{Project, WorkSession};

    fn project(name: &str, completed: bool) -> Project {
        let now = Utc::now();
        Project {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: None,
            completed,
            created_at: now,
            updated_at: now,
            sessions: Vec::new(),
        }
    }

    fn session(project_id: &str, hours: i64) -> WorkSession {
        let started = Utc::now();
        WorkSession {
            id: format!("{project_id}-{hours}"),
            project_id: project_id.to_string(),
            started_at: started,
            stopped_at: Some(started + Duration::hours(hours)),
            invoiced: false,
            created_at: started,
        }
    }

    #[test]
    fn project_without_sessions_has_zero_time() {
        let python = project("Python", false);
        assert_eq!(time_spent_ms(&python, None), 0);
        assert!(matches!(
            invoiced_amount(&python, 500.0),
            Err(ProjectError::NothingToInvoice)
        ));
    }

    #[test]
    fn time_spent_sums_session_durations() {
        let mut swift = project("Swift", false);
        swift.sessions.push(session(&swift.id, 2));
        swift.sessions.push(session(&swift.id, 3));

        assert_eq!(time_spent_hours(&swift, None), 5.0);
    }

    #[test]
    fn malformed_session_counts_as_zero_not_negative() {
        let mut swift = project("Swift", false);
        let mut backwards = session(&swift.id, 2);
        backwards.stopped_at = Some(backwards.started_at - Duration::hours(1));
        swift.sessions.push(backwards);
        swift.sessions.push(session(&swift.id, 3));

        assert_eq!(time_spent_hours(&swift, None), 3.0);
    }

    #[test]
    fn open_session_counts_as_zero() {
        let mut swift = project("Swift", false);
        let mut open = session(&swift.id, 2);
        open.stopped_at = None;
        swift.sessions.push(open);

        assert_eq!(time_spent_ms(&swift, None), 0);
    }

    #[test]
    fn live_addend_is_added_on_top_of_logged_time() {
        let mut swift = project("Swift", false);
        swift.sessions.push(session(&swift.id, 2));

        assert_eq!(time_spent_hours(&swift, Some(3_600_000)), 3.0);
    }

    #[test]
    fn invoiced_amount_applies_the_rate_to_uninvoiced_hours() {
        let mut swift = project("Swift", false);
        swift.sessions.push(session(&swift.id, 2));
        let mut billed = session(&swift.id, 3);
        billed.invoiced = true;
        swift.sessions.push(billed);

        let amount = invoiced_amount(&swift, 500.0).unwrap();
        assert_eq!(amount, 1000.0);
    }

    #[test]
    fn fully_invoiced_project_cannot_be_billed_again() {
        let mut swift = project("Swift", false);
        let mut billed = session(&swift.id, 2);
        billed.invoiced = true;
        swift.sessions.push(billed);

        assert!(matches!(
            invoiced_amount(&swift, 500.0),
            Err(ProjectError::AlreadyInvoiced)
        ));
    }

    #[test]
    fn partition_is_a_stable_total_split() {
        let input = vec![
            project("Python", false),
            project("Java", true),
            project("Swift", false),
            project("Rust", true),
        ];
        let total = input.len();

        let (in_progress, completed) = partition(input);

        assert_eq!(in_progress.len() + completed.len(), total);
        let names: Vec<&str> = in_progress.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Python", "Swift"]);
        let names: Vec<&str> = completed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Java", "Rust"]);
    }

    #[test]
    fn search_matches_substrings_case_insensitively() {
        let projects = vec![
            project("Freelance iOS", false),
            project("Backend", false),
            project("ios-widgets", false),
        ];

        let matches = search(&projects, "IOS");
        let names: Vec<&str> = matches.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Freelance iOS", "ios-widgets"]);
    }

    #[test]
    fn empty_query_returns_all_non_completed() {
        let projects = vec![
            project("Python", false),
            project("Java", true),
            project("Swift", false),
        ];

        assert_eq!(search(&projects, "").len(), 2);
    }

    #[test]
    fn search_never_returns_completed_projects() {
        let mut swift = project("Swift", false);
        swift.sessions.push(session(&swift.id, 2));
        swift.completed = true;

        assert!(search(&[swift], "Swift").is_empty());
    }

    #[test]
    fn completed_section_is_omitted_when_empty() {
        let data = dataset(vec![project("Python", false)], None);
        assert_eq!(data.in_progress.len(), 1);
        assert!(data.completed.is_none());
    }

    #[test]
    fn completed_section_appears_once_a_project_is_done() {
        let data = dataset(
            vec![project("Python", false), project("Java", true)],
            None,
        );
        assert_eq!(data.in_progress.len(), 1);
        assert_eq!(data.completed.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn dataset_applies_the_live_addend_to_the_tracked_project_only() {
        let mut swift = project("Swift", false);
        swift.sessions.push(session(&swift.id, 2));
        let python = project("Python", false);

        let data = dataset(vec![swift, python], Some(("swift", 3_600_000)));
        assert_eq!(data.in_progress[0].time_spent_display, "3.0 hours");
        assert_eq!(data.in_progress[1].time_spent_display, "0.0 hours");
    }
}
