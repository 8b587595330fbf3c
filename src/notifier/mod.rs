use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use tracing::{error, info};

use crate::validation::DATE_FORMAT;

pub mod mailer;

pub use mailer::{Mailer, SmtpMailer};

/// A task due tomorrow joined with its owner's address. Only owners with
/// notifications enabled are selected.
#[derive(Debug, Clone, FromRow)]
pub struct DueTask {
    pub email: String,
    pub description: String,
    pub deadline: Date,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
}

pub fn tomorrow() -> anyhow::Result<Date> {
    OffsetDateTime::now_utc()
        .date()
        .next_day()
        .context("calendar overflow computing tomorrow")
}

/// Read-only batch query over the shared store.
pub async fn due_tasks(db: &PgPool, deadline: Date) -> anyhow::Result<Vec<DueTask>> {
    let tasks = sqlx::query_as::<_, DueTask>(
        r#"
        SELECT u.email, t.description, t.deadline
        FROM tasks t
        JOIN users u ON u.id = t.user_id
        WHERE t.deadline = $1 AND u.notifications_enabled = TRUE
        ORDER BY u.email, t.id
        "#,
    )
    .bind(deadline)
    .fetch_all(db)
    .await
    .context("query tasks due tomorrow")?;
    Ok(tasks)
}

pub fn render_reminder(task: &DueTask) -> anyhow::Result<(String, String)> {
    let deadline = task.deadline.format(DATE_FORMAT)?;
    let subject = "Task due tomorrow".to_string();
    let body = format!(
        "<html>\n  <body>\n    <p>The following task is due tomorrow ({deadline}):</p>\n    \
         <p>{}</p>\n    <p>Have a nice day!</p>\n  </body>\n</html>\n",
        task.description
    );
    Ok((subject, body))
}

/// Sends one email per due task. A failed send is logged and skipped, never
/// retried in-run, and never aborts the rest of the batch.
pub async fn dispatch(mailer: &dyn Mailer, tasks: &[DueTask]) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for task in tasks {
        let (subject, body) = match render_reminder(task) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!(email = %task.email, error = %e, "failed to render reminder");
                summary.failed += 1;
                continue;
            }
        };
        match mailer.send(&task.email, &subject, body).await {
            Ok(()) => {
                info!(email = %task.email, "reminder sent");
                summary.sent += 1;
            }
            Err(e) => {
                error!(email = %task.email, error = %e, "failed to send reminder");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// One scheduled run: query, then dispatch. Store failures propagate so the
/// invoking platform sees a failed run and retries.
pub async fn run(db: &PgPool, mailer: &dyn Mailer) -> anyhow::Result<DispatchSummary> {
    let deadline = tomorrow()?;
    let tasks = due_tasks(db, deadline).await?;
    info!(due = tasks.len(), %deadline, "dispatching reminders");
    Ok(dispatch(mailer, &tasks).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::macros::date;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
        fail_for: Option<String>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: None,
            }
        }

        fn failing_for(address: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: Some(address.to_string()),
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, html_body: String) -> anyhow::Result<()> {
            if self.fail_for.as_deref() == Some(to) {
                anyhow::bail!("relay rejected recipient");
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), html_body));
            Ok(())
        }
    }

    fn due(email: &str, description: &str) -> DueTask {
        DueTask {
            email: email.into(),
            description: description.into(),
            deadline: date!(2025 - 03 - 01),
        }
    }

    #[tokio::test]
    async fn one_email_per_due_task() {
        let mailer = RecordingMailer::new();
        let tasks = vec![
            due("a@example.com", "Finish report"),
            due("a@example.com", "Book flights"),
            due("b@example.com", "Team meeting"),
        ];
        let summary = dispatch(&mailer, &tasks).await;
        assert_eq!(summary, DispatchSummary { sent: 3, failed: 0 });
        assert_eq!(mailer.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_recipient_does_not_abort_batch() {
        let mailer = RecordingMailer::failing_for("bad@example.com");
        let tasks = vec![
            due("bad@example.com", "Finish report"),
            due("ok@example.com", "Team meeting"),
        ];
        let summary = dispatch(&mailer, &tasks).await;
        assert_eq!(summary, DispatchSummary { sent: 1, failed: 1 });
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ok@example.com");
    }

    #[tokio::test]
    async fn empty_batch_sends_nothing() {
        let mailer = RecordingMailer::new();
        let summary = dispatch(&mailer, &[]).await;
        assert_eq!(summary, DispatchSummary::default());
    }

    #[test]
    fn reminder_body_names_task_and_deadline() {
        let (subject, body) = render_reminder(&due("a@example.com", "Finish report")).unwrap();
        assert_eq!(subject, "Task due tomorrow");
        assert!(body.contains("Finish report"));
        assert!(body.contains("2025-03-01"));
    }

    #[test]
    fn tomorrow_is_one_day_ahead() {
        let today = OffsetDateTime::now_utc().date();
        let next = tomorrow().unwrap();
        assert_eq!(next - today, time::Duration::days(1));
    }
}
