//! Advisory service contract and wire payload.
//!
//! The transport (an LLM backend in the original deployment) is left to
//! the [`Advisor`] implementor; this module owns the payload format, the
//! canned fallbacks used when no advice is available, and the request
//! assembly helpers.

use crate::error::AdvisoryError;
use crate::game::memory::{CoachingMemory, MemoryUpdate};
use crate::oracle::PlayedMove;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One predicted opponent reply with its follow-up line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpponentLine {
    #[serde(rename = "move")]
    pub mv: String,
    pub evaluation: String,
    pub probability: String,
    pub continuation: Vec<String>,
}

/// Coaching analysis for the position in front of the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoachingAnalysis {
    pub best_move: String,
    pub explanation: String,
    pub position_evaluation: String,
    pub recommended_continuation: Vec<String>,
    pub opponent_response_tree: Vec<OpponentLine>,
    pub tactical_alerts: Vec<String>,
    pub memory_update: MemoryUpdate,
}

impl CoachingAnalysis {
    /// A payload without a recommended move or an explanation carries
    /// nothing the player can act on; the orchestrator treats it like a
    /// failed advisory call.
    pub fn is_usable(&self) -> bool {
        !self.best_move.trim().is_empty() && !self.explanation.trim().is_empty()
    }
}

/// What the advisory service sees: the position after the opponent's
/// reply, the full move history, the rolling coaching memory and the
/// opponent's last move (absent for the opening request).
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub fen: String,
    pub move_history: Vec<String>,
    pub memory: CoachingMemory,
    pub last_move: Option<PlayedMove>,
}

impl AnalysisRequest {
    /// The move history as the coaching prompt presents it: numbered
    /// move pairs, `1. e4 e5 2. Nf3`.
    pub fn history_text(&self) -> String {
        format_move_history(&self.move_history)
    }
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<CoachingAnalysis, AdvisoryError>;
}

/// Advisor for builds without a coaching backend. Every request fails,
/// which the orchestrator degrades into the canned fallback analysis.
pub struct OfflineAdvisor;

#[async_trait]
impl Advisor for OfflineAdvisor {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<CoachingAnalysis, AdvisoryError> {
        Err(AdvisoryError::Unavailable(
            "no advisory backend configured".to_string(),
        ))
    }
}

/// Parses an advisory reply. Tolerates markdown code fences around the
/// JSON body; requires `bestMove` and `explanation`.
pub fn parse_payload(text: &str) -> Result<CoachingAnalysis, AdvisoryError> {
    let cleaned = text
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string();
    let analysis: CoachingAnalysis = serde_json::from_str(&cleaned)
        .map_err(|e| AdvisoryError::Malformed(e.to_string()))?;
    if !analysis.is_usable() {
        return Err(AdvisoryError::Malformed(
            "missing bestMove or explanation".to_string(),
        ));
    }
    Ok(analysis)
}

fn format_move_history(sans: &[String]) -> String {
    if sans.is_empty() {
        return "Game just started - no moves yet.".to_string();
    }
    sans.chunks(2)
        .enumerate()
        .map(|(i, pair)| match pair {
            [white, black] => format!("{}. {white} {black}", i + 1),
            [white] => format!("{}. {white}", i + 1),
            _ => String::new(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canned analysis used whenever the advisory service fails or returns
/// an unusable payload. Keyed on the number of half-moves played so the
/// opening advice stays concrete.
pub fn fallback_analysis(move_count: usize) -> CoachingAnalysis {
    if move_count == 0 {
        return CoachingAnalysis {
            best_move: "e4".to_string(),
            explanation: "King's Pawn Opening - the most popular first move. It stakes a claim in \
                          the center and opens lines for the queen and king's bishop."
                .to_string(),
            position_evaluation: "Equal starting position".to_string(),
            recommended_continuation: vec!["e5".into(), "Nf3".into(), "d4".into()],
            opponent_response_tree: vec![OpponentLine {
                mv: "e5".to_string(),
                evaluation: "Most common reply, also fighting for the center".to_string(),
                probability: "high".to_string(),
                continuation: vec!["Nf3".into(), "Nc6".into(), "Bb5".into()],
            }],
            tactical_alerts: vec![
                "No immediate tactics from the start - focus on development".to_string()
            ],
            memory_update: MemoryUpdate::default(),
        };
    }

    if move_count == 2 {
        return CoachingAnalysis {
            best_move: "Nf3".to_string(),
            explanation: "Develop the knight toward the center: it attacks e5, develops a piece \
                          and prepares castling."
                .to_string(),
            position_evaluation: "Equal position".to_string(),
            recommended_continuation: vec!["Nc6".into(), "Bb5".into()],
            opponent_response_tree: Vec::new(),
            tactical_alerts: vec![
                "Keep developing - aim to castle within the next few moves".to_string()
            ],
            memory_update: MemoryUpdate::default(),
        };
    }

    CoachingAnalysis {
        best_move: "Continue developing".to_string(),
        explanation: "Coaching unavailable. Follow the principles: control the center, develop \
                      knights and bishops, castle the king, connect the rooks."
            .to_string(),
        position_evaluation: "Analysis unavailable".to_string(),
        recommended_continuation: Vec::new(),
        opponent_response_tree: Vec::new(),
        tactical_alerts: vec!["Coaching unavailable - play solid chess".to_string()],
        memory_update: MemoryUpdate::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_fenced_payload() {
        let text = r#"```json
{
  "bestMove": "Nf3",
  "explanation": "Develops and eyes e5.",
  "positionEvaluation": "Equal",
  "recommendedContinuation": ["Nc6"],
  "opponentResponseTree": [
    {"move": "Nc6", "evaluation": "solid", "probability": "high", "continuation": ["Bb5"]}
  ],
  "tacticalAlerts": [],
  "memoryUpdate": {"strategicThemes": ["develop quickly"]}
}
```"#;
        let analysis = parse_payload(text).expect("parses");
        assert_eq!(analysis.best_move, "Nf3");
        assert_eq!(analysis.opponent_response_tree[0].mv, "Nc6");
        assert_eq!(
            analysis.memory_update.strategic_themes,
            vec!["develop quickly".to_string()]
        );
    }

    #[test]
    fn missing_best_move_is_malformed() {
        let text = r#"{"explanation": "something"}"#;
        assert!(matches!(
            parse_payload(text),
            Err(AdvisoryError::Malformed(_))
        ));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            parse_payload("the engine is on fire"),
            Err(AdvisoryError::Malformed(_))
        ));
    }

    fn request(sans: &[&str]) -> AnalysisRequest {
        AnalysisRequest {
            fen: String::new(),
            move_history: sans.iter().map(|s| s.to_string()).collect(),
            memory: CoachingMemory::empty(),
            last_move: None,
        }
    }

    #[test]
    fn history_formatting_pairs_moves() {
        assert_eq!(
            request(&[]).history_text(),
            "Game just started - no moves yet."
        );
        assert_eq!(
            request(&["e4", "e5", "Nf3"]).history_text(),
            "1. e4 e5 2. Nf3"
        );
    }

    #[test]
    fn fallbacks_match_the_game_phase() {
        assert_eq!(fallback_analysis(0).best_move, "e4");
        assert_eq!(fallback_analysis(2).best_move, "Nf3");
        assert!(fallback_analysis(14).is_usable());
    }
}
