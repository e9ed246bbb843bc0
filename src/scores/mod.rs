// Topic scores — scoring-run ingestion and corpus-gated aggregation.

pub mod aggregate;
pub mod models;

pub use aggregate::{
    score_curve, scores_by_date, scores_by_speech, topic_names, DateIndexedScores, SpeechScores,
};
pub use models::{read_scoring_runs, ScoringRun, TopicScoreRow, TopicScores};
