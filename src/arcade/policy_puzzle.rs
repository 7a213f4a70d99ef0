use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::arcade::{ArcadeError, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceCategory {
    Problem,
    Policy,
    Outcome,
}

impl PieceCategory {
    pub const ALL: [PieceCategory; 3] = [Self::Problem, Self::Policy, Self::Outcome];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Problem => "Problem",
            Self::Policy => "Policy",
            Self::Outcome => "Outcome",
        }
    }
}

pub struct Piece {
    pub category: PieceCategory,
    pub text: &'static str,
    pub correct: bool,
}

pub struct Round {
    pub title: &'static str,
    pub prompt: &'static str,
    pub pieces: &'static [Piece],
}

const fn piece(category: PieceCategory, text: &'static str, correct: bool) -> Piece {
    Piece {
        category,
        text,
        correct,
    }
}

use PieceCategory::{Outcome, Policy, Problem};

pub static ROUNDS: &[Round] = &[
    Round {
        title: "Housing",
        prompt: "Families are spending more than half their income on rent.",
        pieces: &[
            piece(Problem, "Too few homes are built near jobs and transit", true),
            piece(Problem, "People prefer to commute long distances", false),
            piece(Problem, "Rents are set by the weather", false),
            piece(Policy, "Legalize apartments near transit stations", true),
            piece(Policy, "Ban new construction for ten years", false),
            piece(Policy, "Raise minimum parking requirements", false),
            piece(Outcome, "More homes, slower rent growth", true),
            piece(Outcome, "Fewer homes, faster rent growth", false),
            piece(Outcome, "No change to anything", false),
        ],
    },
    Round {
        title: "Health",
        prompt: "Rural residents drive hours to reach a clinic.",
        pieces: &[
            piece(Problem, "Clinics cannot recruit staff to rural areas", true),
            piece(Problem, "Rural residents never get sick", false),
            piece(Problem, "Roads are too smooth", false),
            piece(Policy, "Loan forgiveness for clinicians who serve rural areas", true),
            piece(Policy, "Close the remaining rural clinics", false),
            piece(Policy, "Require in-person visits for all prescriptions", false),
            piece(Outcome, "Shorter travel times to care", true),
            piece(Outcome, "Longer waits in emergency rooms", false),
            piece(Outcome, "Clinics relocate to cities", false),
        ],
    },
    Round {
        title: "Climate",
        prompt: "Summer heat waves are sending more people to hospital.",
        pieces: &[
            piece(Problem, "Dense neighborhoods lack shade and green space", true),
            piece(Problem, "Thermometers read too high", false),
            piece(Problem, "Too many trees block the wind", false),
            piece(Policy, "Fund street trees and cooling centers", true),
            piece(Policy, "Pave over neighborhood parks", false),
            piece(Policy, "Cut public library hours in summer", false),
            piece(Outcome, "Fewer heat-related hospital visits", true),
            piece(Outcome, "Hotter streets at night", false),
            piece(Outcome, "Higher cooling bills for everyone", false),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleStatus {
    Playing,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// Not exactly one piece in each category
    Incomplete,
    Incorrect { wrong: Vec<PieceCategory> },
    Correct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPuzzle {
    round: usize,
    score: u32,
    attempts: u32,
    selected: Vec<usize>,
    status: PuzzleStatus,
    feedback: Option<Feedback>,
}

impl Default for PolicyPuzzle {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyPuzzle {
    pub fn new() -> Self {
        Self {
            round: 0,
            score: 0,
            attempts: 0,
            selected: Vec::new(),
            status: PuzzleStatus::Playing,
            feedback: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn status(&self) -> PuzzleStatus {
        self.status
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn round_number(&self) -> usize {
        self.round + 1
    }

    pub fn current_round(&self) -> Option<&'static Round> {
        match self.status {
            PuzzleStatus::Playing => ROUNDS.get(self.round),
            PuzzleStatus::Complete => None,
        }
    }

    pub fn is_selected(&self, piece: usize) -> bool {
        self.selected.contains(&piece)
    }

    fn round_piece(&self, index: usize) -> Result<&'static Piece, ArcadeError> {
        self.current_round()
            .ok_or(ArcadeError::GameOver)?
            .pieces
            .get(index)
            .ok_or_else(|| ArcadeError::InvalidMove(format!("no piece {}", index)))
    }

    /// Toggle a piece. Selecting a second piece in a category replaces the first.
    pub fn select(&mut self, index: usize) -> Result<(), ArcadeError> {
        let category = self.round_piece(index)?.category;
        self.feedback = None;

        if let Some(pos) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(pos);
            return Ok(());
        }

        let round = self.current_round().ok_or(ArcadeError::GameOver)?;
        self.selected
            .retain(|&i| round.pieces.get(i).map(|p| p.category) != Some(category));
        self.selected.push(index);
        Ok(())
    }

    /// Score the current selection. One correct piece from each of the three
    /// categories earns a point and advances to the next round.
    pub fn check(&mut self) -> Result<Feedback, ArcadeError> {
        let round = self.current_round().ok_or(ArcadeError::GameOver)?;

        let categories: HashSet<PieceCategory> = self
            .selected
            .iter()
            .filter_map(|&i| round.pieces.get(i))
            .map(|p| p.category)
            .collect();
        if self.selected.len() != PieceCategory::ALL.len()
            || categories.len() != PieceCategory::ALL.len()
        {
            self.feedback = Some(Feedback::Incomplete);
            return Ok(Feedback::Incomplete);
        }

        self.attempts = self.attempts.saturating_add(1);
        let wrong: Vec<PieceCategory> = self
            .selected
            .iter()
            .filter_map(|&i| round.pieces.get(i))
            .filter(|p| !p.correct)
            .map(|p| p.category)
            .collect();

        let feedback = if wrong.is_empty() {
            self.score += 1;
            self.round += 1;
            self.selected.clear();
            if self.round >= ROUNDS.len() {
                self.status = PuzzleStatus::Complete;
            }
            Feedback::Correct
        } else {
            self.selected
                .retain(|&i| round.pieces.get(i).is_some_and(|p| p.correct));
            Feedback::Incorrect { wrong }
        };

        self.feedback = Some(feedback.clone());
        Ok(feedback)
    }
}

impl GameState for PolicyPuzzle {
    fn validate(&self) -> Result<(), ArcadeError> {
        let complete = self.status == PuzzleStatus::Complete;
        if self.round > ROUNDS.len() || (self.round == ROUNDS.len()) != complete {
            return Err(ArcadeError::Corrupt("round out of range".into()));
        }
        if self.score as usize != self.round {
            return Err(ArcadeError::Corrupt("score does not match round".into()));
        }
        // Every point costs at least one checked attempt
        if self.attempts < self.score {
            return Err(ArcadeError::Corrupt("fewer attempts than points".into()));
        }
        if let Some(round) = ROUNDS.get(self.round) {
            if self.selected.iter().any(|&i| i >= round.pieces.len()) {
                return Err(ArcadeError::Corrupt("unknown piece".into()));
            }
        } else if !self.selected.is_empty() {
            return Err(ArcadeError::Corrupt("selection after completion".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correct_indices(round: usize) -> Vec<usize> {
        ROUNDS[round]
            .pieces
            .iter()
            .enumerate()
            .filter(|(_, p)| p.correct)
            .map(|(i, _)| i)
            .collect()
    }

    fn wrong_index(round: usize, category: PieceCategory) -> usize {
        ROUNDS[round]
            .pieces
            .iter()
            .position(|p| p.category == category && !p.correct)
            .unwrap()
    }

    #[test]
    fn every_round_has_one_correct_piece_per_category() {
        for round in ROUNDS {
            for category in PieceCategory::ALL {
                let correct = round
                    .pieces
                    .iter()
                    .filter(|p| p.category == category && p.correct)
                    .count();
                assert_eq!(correct, 1, "{} / {:?}", round.title, category);
            }
        }
    }

    #[test]
    fn correct_selection_scores_exactly_one() {
        let mut game = PolicyPuzzle::new();
        for i in correct_indices(0) {
            game.select(i).unwrap();
        }
        assert_eq!(game.check().unwrap(), Feedback::Correct);
        assert_eq!(game.score(), 1);
        assert_eq!(game.round_number(), 2);
        assert_eq!(game.status(), PuzzleStatus::Playing);
    }

    #[test]
    fn three_correct_rounds_complete_the_game() {
        let mut game = PolicyPuzzle::new();
        for round in 0..ROUNDS.len() {
            for i in correct_indices(round) {
                game.select(i).unwrap();
            }
            game.check().unwrap();
        }
        assert_eq!(game.score(), 3);
        assert_eq!(game.status(), PuzzleStatus::Complete);
        assert!(matches!(game.check(), Err(ArcadeError::GameOver)));
        assert!(matches!(game.select(0), Err(ArcadeError::GameOver)));
    }

    #[test]
    fn incomplete_selection_does_not_score_or_count() {
        let mut game = PolicyPuzzle::new();
        let correct = correct_indices(0);
        game.select(correct[0]).unwrap();
        game.select(correct[1]).unwrap();
        assert_eq!(game.check().unwrap(), Feedback::Incomplete);
        assert_eq!(game.score(), 0);
        assert_eq!(game.attempts(), 0);
    }

    #[test]
    fn selecting_same_category_replaces_previous_piece() {
        let mut game = PolicyPuzzle::new();
        let wrong = wrong_index(0, Problem);
        let right = correct_indices(0)[0];
        game.select(wrong).unwrap();
        game.select(right).unwrap();
        assert!(game.is_selected(right));
        assert!(!game.is_selected(wrong));
    }

    #[test]
    fn selecting_twice_deselects() {
        let mut game = PolicyPuzzle::new();
        game.select(0).unwrap();
        game.select(0).unwrap();
        assert!(!game.is_selected(0));
    }

    #[test]
    fn wrong_piece_reports_category_and_keeps_correct_ones() {
        let mut game = PolicyPuzzle::new();
        let correct = correct_indices(0);
        let wrong_policy = wrong_index(0, Policy);
        game.select(correct[0]).unwrap();
        game.select(wrong_policy).unwrap();
        game.select(correct[2]).unwrap();

        assert_eq!(
            game.check().unwrap(),
            Feedback::Incorrect {
                wrong: vec![Policy]
            }
        );
        assert_eq!(game.score(), 0);
        assert_eq!(game.attempts(), 1);
        assert!(game.is_selected(correct[0]));
        assert!(!game.is_selected(wrong_policy));
        assert!(game.is_selected(correct[2]));
    }

    #[test]
    fn out_of_range_piece_is_invalid() {
        let mut game = PolicyPuzzle::new();
        assert!(matches!(game.select(99), Err(ArcadeError::InvalidMove(_))));
    }

    #[test]
    fn validate_rejects_inconsistent_states() {
        let mut game = PolicyPuzzle::new();
        assert!(game.validate().is_ok());
        game.score = 2;
        assert!(game.validate().is_err());

        let mut game = PolicyPuzzle::new();
        game.selected = vec![42];
        assert!(game.validate().is_err());

        let mut game = PolicyPuzzle::new();
        game.round = ROUNDS.len();
        game.score = ROUNDS.len() as u32;
        game.attempts = ROUNDS.len() as u32;
        assert!(game.validate().is_err(), "complete round needs complete status");
        game.status = PuzzleStatus::Complete;
        assert!(game.validate().is_ok());
    }

    #[test]
    fn attempts_cannot_fall_below_score() {
        let mut game = PolicyPuzzle::new();
        for i in correct_indices(0) {
            game.select(i).unwrap();
        }
        game.check().unwrap();
        game.attempts = 0;
        assert!(matches!(game.validate(), Err(ArcadeError::Corrupt(_))));
    }

    #[test]
    fn attempt_counter_saturates_on_carried_state() {
        let raw = format!(
            r#"{{"round":0,"score":0,"attempts":{},"selected":{:?},"status":"playing","feedback":null}}"#,
            u32::MAX,
            correct_indices(0)
        );
        let mut game: PolicyPuzzle = crate::arcade::decode(&raw).unwrap();
        assert_eq!(game.check().unwrap(), Feedback::Correct);
        assert_eq!(game.attempts(), u32::MAX);
        assert_eq!(game.score(), 1);
        assert!(game.validate().is_ok());
    }
}
