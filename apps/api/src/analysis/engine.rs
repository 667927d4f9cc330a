//! Scoring fan-out: scores every resume in a batch concurrently and joins the results.
//!
//! One tokio task per resume, no cap on width. Each task hands its outcome back
//! through its own `JoinHandle`; the handles are drained in input order by a single
//! loop, so results and ids follow input position regardless of completion order.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::analysis::prompts::{build_scoring_prompt, scoring_system};
use crate::analysis::scorer::{parse_reply, ScoreError, Scorer, ScorerReply};
use crate::models::analysis::{AnalysisResult, FailureStage, ItemFailure};
use crate::models::resume::ResumeRecord;

/// Results and per-item failures of one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<AnalysisResult>,
    pub failures: Vec<ItemFailure>,
}

#[derive(Clone)]
pub struct ScoringEngine {
    scorer: Arc<dyn Scorer>,
    call_timeout: Duration,
}

impl ScoringEngine {
    pub fn new(scorer: Arc<dyn Scorer>, call_timeout: Duration) -> Self {
        Self {
            scorer,
            call_timeout,
        }
    }

    /// Scores `resumes` against `job_description`.
    ///
    /// Never fails as a whole: a resume whose call errors, times out, or returns an
    /// unparseable reply is left out of `results` and listed in `failures`.
    pub async fn analyze(&self, job_description: &str, resumes: &[ResumeRecord]) -> BatchOutcome {
        if resumes.is_empty() {
            return BatchOutcome::default();
        }

        info!("Scoring {} resumes", resumes.len());
        let system = Arc::new(scoring_system());

        let handles: Vec<_> = resumes
            .iter()
            .map(|resume| {
                debug!("Resume {} has {} chars of text", resume.name, resume.text().len());
                trace!("Resume {} content: {}", resume.name, resume.text());

                let scorer = Arc::clone(&self.scorer);
                let system = Arc::clone(&system);
                let prompt = build_scoring_prompt(job_description, resume.text());
                let call_timeout = self.call_timeout;
                let name = resume.name.clone();

                tokio::spawn(async move {
                    score_one(scorer.as_ref(), &name, &prompt, &system, call_timeout).await
                })
            })
            .collect();

        let mut outcome = BatchOutcome::default();
        for (resume, handle) in resumes.iter().zip(handles) {
            let scored = handle
                .await
                .unwrap_or_else(|e| Err(ScoreError::TaskFailed(e.to_string())));

            match scored {
                Ok(reply) => {
                    let id = outcome.results.len() + 1;
                    outcome.results.push(to_result(id, resume, reply));
                }
                Err(e) => {
                    warn!("Dropping resume {} from batch: {e}", resume.name);
                    outcome
                        .failures
                        .push(ItemFailure::new(&resume.name, FailureStage::Scoring, e));
                }
            }
        }

        info!(
            "Scored {} of {} resumes ({} failed)",
            outcome.results.len(),
            resumes.len(),
            outcome.failures.len()
        );
        outcome
    }
}

async fn score_one(
    scorer: &dyn Scorer,
    name: &str,
    prompt: &str,
    system: &str,
    call_timeout: Duration,
) -> Result<ScorerReply, ScoreError> {
    let raw = tokio::time::timeout(call_timeout, scorer.complete(prompt, system))
        .await
        .map_err(|_| ScoreError::TimedOut(call_timeout))??;

    debug!("Raw scorer reply for {name}: {raw}");
    parse_reply(&raw)
}

fn to_result(id: usize, resume: &ResumeRecord, reply: ScorerReply) -> AnalysisResult {
    AnalysisResult {
        id: id.to_string(),
        name: resume.name.clone(),
        upload_date: resume.created_at,
        file_url: resume.url.clone(),
        match_percentage: reply.match_percentage,
        insights: reply.insights,
    }
}
