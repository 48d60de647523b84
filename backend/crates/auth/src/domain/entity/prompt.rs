//! Prompt Entity
//!
//! Instructions handed to the AI analysis and generation pipelines. Admins
//! curate them; users pick among the active ones of a kind.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    Analysis,
    Generation,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Analysis => "analysis",
            PromptKind::Generation => "generation",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(PromptKind::Analysis),
            "generation" => Ok(PromptKind::Generation),
            _ => Err(AuthError::InvalidInput(
                "Type must be either \"analysis\" or \"generation\"".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: PromptKind,
    pub prompt_text: String,
    /// Offered to users for selection
    #[serde(default)]
    pub is_active: bool,
    /// At most one per kind
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Prompts start inactive and non-default
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrompt {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: PromptKind,
    pub prompt_text: String,
    pub tags: Vec<String>,
    pub created_by: String,
}

/// One run of a prompt, as recorded by the AI pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptUsage {
    pub id: String,
    pub prompt_id: String,
    pub success: bool,
    /// Milliseconds
    #[serde(default)]
    pub processing_time: Option<f64>,
    /// `positive` or `negative`
    #[serde(default)]
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromptUsage {
    pub prompt_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptAnalytics {
    pub prompt_id: String,
    pub total_uses: u64,
    pub success_rate: f64,
    pub avg_processing_time: f64,
    pub positive_feedback: u64,
    pub negative_feedback: u64,
    /// Positive over negative; 0 without negative feedback
    pub feedback_ratio: f64,
    pub last_30_days_uses: u64,
}

impl PromptAnalytics {
    /// Aggregate the usage rows of one prompt; all zeros when there are none
    pub fn from_usage(prompt_id: &str, usage: &[PromptUsage], now: DateTime<Utc>) -> Self {
        let mut analytics = PromptAnalytics {
            prompt_id: prompt_id.to_string(),
            ..Default::default()
        };
        if usage.is_empty() {
            return analytics;
        }

        let total = usage.len() as f64;
        let timed: Vec<f64> = usage.iter().filter_map(|u| u.processing_time).collect();
        let since = now - Duration::days(30);

        analytics.total_uses = usage.len() as u64;
        analytics.success_rate = usage.iter().filter(|u| u.success).count() as f64 / total;
        if !timed.is_empty() {
            analytics.avg_processing_time = timed.iter().sum::<f64>() / timed.len() as f64;
        }
        analytics.positive_feedback = count_feedback(usage, "positive");
        analytics.negative_feedback = count_feedback(usage, "negative");
        if analytics.negative_feedback > 0 {
            analytics.feedback_ratio =
                analytics.positive_feedback as f64 / analytics.negative_feedback as f64;
        }
        analytics.last_30_days_uses = usage.iter().filter(|u| u.created_at > since).count() as u64;
        analytics
    }
}

fn count_feedback(usage: &[PromptUsage], feedback: &str) -> u64 {
    usage
        .iter()
        .filter(|u| u.feedback.as_deref() == Some(feedback))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(success: bool, time: Option<f64>, feedback: Option<&str>, days_ago: i64) -> PromptUsage {
        let now = Utc::now();
        PromptUsage {
            id: "prompt_usage:u".into(),
            prompt_id: "ai_prompt:p".into(),
            success,
            processing_time: time,
            feedback: feedback.map(str::to_string),
            created_at: now - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("analysis".parse::<PromptKind>().unwrap(), PromptKind::Analysis);
        assert_eq!("generation".parse::<PromptKind>().unwrap(), PromptKind::Generation);
        assert!("Analysis".parse::<PromptKind>().is_err());
        assert!("".parse::<PromptKind>().is_err());
    }

    #[test]
    fn test_analytics_without_usage() {
        let analytics = PromptAnalytics::from_usage("ai_prompt:p", &[], Utc::now());
        assert_eq!(analytics.prompt_id, "ai_prompt:p");
        assert_eq!(analytics.total_uses, 0);
        assert_eq!(analytics.success_rate, 0.0);
        assert_eq!(analytics.feedback_ratio, 0.0);
    }

    #[test]
    fn test_analytics_aggregates() {
        let rows = vec![
            usage(true, Some(100.0), Some("positive"), 1),
            usage(true, Some(300.0), Some("positive"), 2),
            usage(false, None, Some("negative"), 40),
            usage(true, None, None, 45),
        ];
        let analytics = PromptAnalytics::from_usage("ai_prompt:p", &rows, Utc::now());

        assert_eq!(analytics.total_uses, 4);
        assert_eq!(analytics.success_rate, 0.75);
        assert_eq!(analytics.avg_processing_time, 200.0);
        assert_eq!(analytics.positive_feedback, 2);
        assert_eq!(analytics.negative_feedback, 1);
        assert_eq!(analytics.feedback_ratio, 2.0);
        assert_eq!(analytics.last_30_days_uses, 2);
    }

    #[test]
    fn test_ratio_without_negative_feedback() {
        let rows = vec![usage(true, None, Some("positive"), 0)];
        let analytics = PromptAnalytics::from_usage("ai_prompt:p", &rows, Utc::now());
        assert_eq!(analytics.feedback_ratio, 0.0);
    }
}
