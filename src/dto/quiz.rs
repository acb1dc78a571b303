use std::time::Duration;

use serde::Serialize;
use serde_with::{DurationSecondsWithFrac, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{QuizSummaryEntity, ResultEntity},
    dto::format_system_time,
    state::session::SessionReport,
};

/// Quiz list item returned to its author.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizSummary {
    pub id: Uuid,
    pub title: String,
    pub question_count: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<QuizSummaryEntity> for QuizSummary {
    fn from(entity: QuizSummaryEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            question_count: entity.question_count,
            created_at: format_system_time(entity.created_at),
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub user_id: i64,
    pub correct: u32,
    pub wrong: u32,
    pub missed: u32,
    pub total: u32,
    pub finished_at: String,
}

impl LeaderboardEntry {
    pub fn ranked(results: Vec<ResultEntity>) -> Vec<Self> {
        results
            .into_iter()
            .enumerate()
            .map(|(index, result)| Self {
                rank: index + 1,
                user_id: result.user_id,
                correct: result.correct,
                wrong: result.wrong,
                missed: result.missed,
                total: result.total,
                finished_at: format_system_time(result.finished_at),
            })
            .collect()
    }
}

/// Final score of a play-through as pushed to the chat.
#[serde_as]
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionReportDto {
    pub session_id: Uuid,
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub answered: u32,
    pub missed: u32,
    /// Wall-clock duration of the session, in seconds.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    #[schema(value_type = f64)]
    pub elapsed_secs: Duration,
    pub aborted: bool,
}

impl From<&SessionReport> for SessionReportDto {
    fn from(report: &SessionReport) -> Self {
        Self {
            session_id: report.session_id,
            quiz_id: report.quiz_id,
            quiz_title: report.quiz_title.clone(),
            total: report.total,
            correct: report.correct,
            wrong: report.wrong,
            answered: report.answered,
            missed: report.missed,
            elapsed_secs: report.elapsed,
            aborted: report.aborted,
        }
    }
}
