//! Token-budget conversation window

use advisor_core::Turn;

/// The suffix of a room's history that fits the token budget
///
/// Built newest-first until adding the next older turn would exceed the
/// budget, then presented in chronological order. Recomputed on every read.
#[derive(Debug, Clone)]
pub struct ConversationWindow {
    turns: Vec<Turn>,
    token_budget: usize,
}

impl ConversationWindow {
    /// Compute a window over a chronological history
    pub fn from_history(history: &[Turn], token_budget: usize) -> Self {
        let mut total = 0usize;
        let mut included = Vec::new();

        for turn in history.iter().rev() {
            if total + turn.token_count > token_budget {
                break;
            }
            total += turn.token_count;
            included.push(turn.clone());
        }
        included.reverse();

        Self {
            turns: included,
            token_budget,
        }
    }

    pub fn empty(token_budget: usize) -> Self {
        Self {
            turns: Vec::new(),
            token_budget,
        }
    }

    /// Included turns in chronological order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Sum of the included turns' token counts
    pub fn token_total(&self) -> usize {
        self.turns.iter().map(|t| t.token_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::TurnRole;

    fn turn_with_tokens(content: &str, tokens: usize) -> Turn {
        let mut turn = Turn::new(TurnRole::User, content);
        turn.token_count = tokens;
        turn
    }

    #[test]
    fn test_budget_never_exceeded() {
        let history: Vec<Turn> = (0..10)
            .map(|i| turn_with_tokens(&format!("tin {}", i), 10))
            .collect();

        for budget in [0, 5, 10, 25, 35, 100, 1000] {
            let window = ConversationWindow::from_history(&history, budget);
            assert!(
                window.token_total() <= budget,
                "budget {} exceeded: {}",
                budget,
                window.token_total()
            );
        }
    }

    #[test]
    fn test_window_is_chronological_suffix() {
        let history: Vec<Turn> = (0..6)
            .map(|i| turn_with_tokens(&format!("tin {}", i), 10))
            .collect();

        // budget fits exactly the last three turns
        let window = ConversationWindow::from_history(&history, 30);
        let contents: Vec<&str> = window.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["tin 3", "tin 4", "tin 5"]);
    }

    #[test]
    fn test_partial_fit_stops_before_overflow() {
        let history = vec![
            turn_with_tokens("cũ và dài", 100),
            turn_with_tokens("mới", 10),
        ];
        let window = ConversationWindow::from_history(&history, 50);
        assert_eq!(window.len(), 1);
        assert_eq!(window.turns()[0].content, "mới");
    }

    #[test]
    fn test_oversized_newest_turn_yields_empty_window() {
        let history = vec![turn_with_tokens("quá dài", 500)];
        let window = ConversationWindow::from_history(&history, 100);
        assert!(window.is_empty());
        assert_eq!(window.token_total(), 0);
    }

    #[test]
    fn test_full_history_fits_generous_budget() {
        let history: Vec<Turn> = (0..4)
            .map(|i| turn_with_tokens(&format!("tin {}", i), 5))
            .collect();
        let window = ConversationWindow::from_history(&history, 1000);
        assert_eq!(window.len(), 4);
    }
}
