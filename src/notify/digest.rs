//! Plain-text alert body.

use chrono::NaiveDateTime;

use crate::pipeline::CycleResult;
use crate::utils::capitalize;

/// Rendered alert for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub subject: String,
    pub body: String,
    pub total_new: usize,
}

impl Digest {
    /// Render the new jobs of a cycle, or `None` when there are none.
    ///
    /// ```text
    /// ==================================================
    /// Total new jobs found: 2
    /// ==================================================
    ///
    /// Stripe - 2 new job(s)
    /// - Software Engineer -> https://stripe.com/jobs/listing/1
    /// ```
    pub fn from_cycle(new_jobs: &CycleResult, now: NaiveDateTime) -> Option<Self> {
        let total_new: usize = new_jobs.values().map(Vec::len).sum();
        if total_new == 0 {
            return None;
        }

        let banner = "=".repeat(50);
        let mut lines = vec![
            banner.clone(),
            format!("Total new jobs found: {}", total_new),
            banner,
            String::new(),
        ];

        for (source, jobs) in new_jobs.iter().filter(|(_, jobs)| !jobs.is_empty()) {
            lines.push(format!("{} - {} new job(s)", capitalize(source), jobs.len()));
            for job in jobs {
                let title = if job.title.is_empty() {
                    "Untitled"
                } else {
                    job.title.as_str()
                };
                lines.push(format!("- {} -> {}", title, job.link));
            }
            lines.push(String::new());
        }

        let plural = if total_new == 1 { "" } else { "s" };
        let subject = format!(
            "Job Alert ({} new job{}) - {}",
            total_new,
            plural,
            now.format("%Y-%m-%d %H:%M")
        );

        Some(Self {
            subject,
            body: lines.join("\n"),
            total_new,
        })
    }
}
