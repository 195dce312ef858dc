use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

pub const STRATEGIC_THEMES_CAP: usize = 10;
pub const PRIOR_ADVICE_CAP: usize = 15;
pub const TACTICAL_FOCUS_CAP: usize = 10;
pub const POSITION_EVOLUTION_CAP: usize = 20;

/// One remembered position with the coach's verdict on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSnapshot {
    pub ply: u32,
    pub fen: String,
    pub evaluation: String,
}

/// Partial memory fields returned by the advisory service, merged into
/// the session's [`CoachingMemory`] after each successful analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryUpdate {
    pub strategic_themes: Vec<String>,
    pub prior_advice: Vec<String>,
    pub tactical_focus: Vec<String>,
    pub position_evolution: Vec<EvolutionNote>,
}

/// Evolution entries in a memory update only carry the verdict; the
/// session fills in the ply and position when it records the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvolutionNote {
    pub evaluation: String,
}

/// Rolling coaching memory: four independently bounded sequences.
/// Overflow always evicts the oldest entries; the most recent survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingMemory {
    pub strategic_themes: VecDeque<String>,
    pub prior_advice: VecDeque<String>,
    pub tactical_focus: VecDeque<String>,
    pub position_evolution: VecDeque<PositionSnapshot>,
    pub last_updated: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn push_capped<T>(list: &mut VecDeque<T>, items: impl IntoIterator<Item = T>, cap: usize) {
    list.extend(items);
    while list.len() > cap {
        list.pop_front();
    }
}

impl CoachingMemory {
    pub fn empty() -> Self {
        Self {
            strategic_themes: VecDeque::new(),
            prior_advice: VecDeque::new(),
            tactical_focus: VecDeque::new(),
            position_evolution: VecDeque::new(),
            last_updated: now_millis(),
        }
    }

    /// Appends the update's fields and the new position snapshot, then
    /// truncates every list back to its cap.
    pub fn merge(&mut self, update: &MemoryUpdate, snapshot: PositionSnapshot) {
        push_capped(
            &mut self.strategic_themes,
            update.strategic_themes.iter().cloned(),
            STRATEGIC_THEMES_CAP,
        );
        push_capped(
            &mut self.prior_advice,
            update.prior_advice.iter().cloned(),
            PRIOR_ADVICE_CAP,
        );
        push_capped(
            &mut self.tactical_focus,
            update.tactical_focus.iter().cloned(),
            TACTICAL_FOCUS_CAP,
        );
        push_capped(
            &mut self.position_evolution,
            std::iter::once(snapshot),
            POSITION_EVOLUTION_CAP,
        );
        self.last_updated = now_millis();
    }

    pub fn is_empty(&self) -> bool {
        self.strategic_themes.is_empty()
            && self.prior_advice.is_empty()
            && self.tactical_focus.is_empty()
            && self.position_evolution.is_empty()
    }
}

impl Default for CoachingMemory {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(ply: u32) -> PositionSnapshot {
        PositionSnapshot {
            ply,
            fen: format!("fen-{ply}"),
            evaluation: format!("eval-{ply}"),
        }
    }

    #[test]
    fn lists_never_exceed_their_caps() {
        let mut memory = CoachingMemory::empty();
        for round in 0..30u32 {
            let update = MemoryUpdate {
                strategic_themes: vec![format!("theme-{round}")],
                prior_advice: vec![format!("advice-{round}a"), format!("advice-{round}b")],
                tactical_focus: vec![format!("tactic-{round}")],
                position_evolution: Vec::new(),
            };
            memory.merge(&update, snapshot(round));
        }
        assert_eq!(memory.strategic_themes.len(), STRATEGIC_THEMES_CAP);
        assert_eq!(memory.prior_advice.len(), PRIOR_ADVICE_CAP);
        assert_eq!(memory.tactical_focus.len(), TACTICAL_FOCUS_CAP);
        assert_eq!(memory.position_evolution.len(), POSITION_EVOLUTION_CAP);
    }

    #[test]
    fn overflow_keeps_the_most_recent_entries_in_order() {
        let mut memory = CoachingMemory::empty();
        for round in 0..12u32 {
            let update = MemoryUpdate {
                strategic_themes: vec![format!("theme-{round}")],
                ..MemoryUpdate::default()
            };
            memory.merge(&update, snapshot(round));
        }
        let themes: Vec<_> = memory.strategic_themes.iter().cloned().collect();
        let expected: Vec<_> = (2..12u32).map(|r| format!("theme-{r}")).collect();
        assert_eq!(themes, expected);
        assert_eq!(memory.position_evolution.back(), Some(&snapshot(11)));
    }

    #[test]
    fn merge_bumps_the_timestamp() {
        let mut memory = CoachingMemory::empty();
        let before = memory.last_updated;
        memory.merge(&MemoryUpdate::default(), snapshot(1));
        assert!(memory.last_updated >= before);
    }

    #[test]
    fn serde_uses_camel_case() {
        let memory = CoachingMemory::empty();
        let json = serde_json::to_value(&memory).expect("serializes");
        assert!(json.get("strategicThemes").is_some());
        assert!(json.get("lastUpdated").is_some());
    }
}
