//! Arcade pages. Game state travels in a hidden `state` field; every POST
//! decodes it, applies one move, and renders the next state.

use askama::Template;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::arcade::budget::{BudgetGame, BudgetStatus, Resource, TURN_CAP};
use crate::arcade::debate::{card_by_id, DebateGame, Verdict, ROUNDS as DEBATE_ROUNDS};
use crate::arcade::policy_puzzle::{
    Feedback, PieceCategory, PolicyPuzzle, ROUNDS as PUZZLE_ROUNDS,
};
use crate::arcade::{self, ArcadeError, GameInfo, GameState, GAMES};
use crate::error::AppResult;
use crate::routes::chrome::Chrome;
use crate::routes::Html;
use crate::state::AppState;

const RESTORE_FAILED: &str = "We couldn't restore your game, so a new one has started.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/arcade", get(index))
        .route("/arcade/policy-puzzle", get(puzzle_page).post(puzzle_move))
        .route("/arcade/budget", get(budget_page).post(budget_move))
        .route("/arcade/debate", get(debate_page).post(debate_move))
}

/// Decode the carried state, starting over when it is missing or tampered with.
fn restore<T: GameState>(raw: &str, fresh: impl FnOnce() -> T) -> (T, String) {
    match arcade::decode(raw) {
        Ok(game) => (game, String::new()),
        Err(e) => {
            tracing::debug!("Discarding game state: {}", e);
            (fresh(), RESTORE_FAILED.to_string())
        }
    }
}

fn move_notice(result: Result<(), ArcadeError>) -> String {
    match result {
        Ok(()) => String::new(),
        Err(e) => e.to_string(),
    }
}

// -- Index --

#[derive(Template)]
#[template(path = "pages/arcade_index.html")]
pub struct ArcadeIndexTemplate {
    pub chrome: Chrome,
    pub games: &'static [GameInfo],
}

pub async fn index(chrome: Chrome) -> Response {
    Html(ArcadeIndexTemplate {
        chrome,
        games: GAMES,
    })
    .into_response()
}

// -- Policy puzzle --

pub struct PieceView {
    pub index: usize,
    pub text: &'static str,
    pub selected: bool,
}

pub struct PieceColumn {
    pub label: &'static str,
    pub pieces: Vec<PieceView>,
}

#[derive(Template)]
#[template(path = "pages/arcade_puzzle.html")]
pub struct PuzzleTemplate {
    pub chrome: Chrome,
    pub state: String,
    pub round_number: usize,
    pub total_rounds: usize,
    pub round_title: &'static str,
    pub prompt: &'static str,
    pub score: u32,
    pub attempts: u32,
    pub complete: bool,
    pub columns: Vec<PieceColumn>,
    pub feedback: String,
    pub feedback_class: &'static str,
    pub notice: String,
}

#[derive(Deserialize)]
pub struct PuzzleForm {
    #[serde(default)]
    pub state: String,
    pub piece: Option<usize>,
    pub check: Option<String>,
    pub restart: Option<String>,
}

fn puzzle_feedback(game: &PolicyPuzzle) -> (String, &'static str) {
    match game.feedback() {
        None => (String::new(), ""),
        Some(Feedback::Incomplete) => (
            "Pick exactly one piece from each column.".to_string(),
            "info",
        ),
        Some(Feedback::Incorrect { wrong }) => {
            let labels: Vec<&str> = wrong.iter().map(PieceCategory::label).collect();
            (
                format!("Not quite. Take another look at: {}.", labels.join(", ")),
                "error",
            )
        }
        Some(Feedback::Correct) if game.current_round().is_none() => (
            "Correct! You solved every round.".to_string(),
            "success",
        ),
        Some(Feedback::Correct) => ("Correct! On to the next round.".to_string(), "success"),
    }
}

fn puzzle_template(chrome: Chrome, game: &PolicyPuzzle, notice: String) -> AppResult<PuzzleTemplate> {
    let round = game.current_round();
    let columns = match round {
        Some(round) => PieceCategory::ALL
            .iter()
            .map(|&category| PieceColumn {
                label: category.label(),
                pieces: round
                    .pieces
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.category == category)
                    .map(|(index, p)| PieceView {
                        index,
                        text: p.text,
                        selected: game.is_selected(index),
                    })
                    .collect(),
            })
            .collect(),
        None => Vec::new(),
    };
    let (feedback, feedback_class) = puzzle_feedback(game);

    Ok(PuzzleTemplate {
        chrome,
        state: arcade::encode(game)?,
        round_number: game.round_number().min(PUZZLE_ROUNDS.len()),
        total_rounds: PUZZLE_ROUNDS.len(),
        round_title: round.map(|r| r.title).unwrap_or_default(),
        prompt: round.map(|r| r.prompt).unwrap_or_default(),
        score: game.score(),
        attempts: game.attempts(),
        complete: round.is_none(),
        columns,
        feedback,
        feedback_class,
        notice,
    })
}

pub async fn puzzle_page(chrome: Chrome) -> AppResult<Response> {
    let game = PolicyPuzzle::new();
    Ok(Html(puzzle_template(chrome, &game, String::new())?).into_response())
}

pub async fn puzzle_move(chrome: Chrome, Form(form): Form<PuzzleForm>) -> AppResult<Response> {
    let (mut game, mut notice) = restore(&form.state, PolicyPuzzle::new);

    if notice.is_empty() {
        if form.restart.is_some() {
            game = PolicyPuzzle::new();
        } else if let Some(piece) = form.piece {
            notice = move_notice(game.select(piece));
        } else if form.check.is_some() {
            notice = move_notice(game.check().map(|_| ()));
        }
    }

    Ok(Html(puzzle_template(chrome, &game, notice)?).into_response())
}

// -- Campaign budget --

pub struct ResourceView {
    pub label: &'static str,
    pub value: i32,
}

pub struct ChoiceView {
    pub index: usize,
    pub label: &'static str,
    pub effects: String,
}

#[derive(Template)]
#[template(path = "pages/arcade_budget.html")]
pub struct BudgetTemplate {
    pub chrome: Chrome,
    pub state: String,
    pub turn: usize,
    pub turn_cap: usize,
    pub resources: Vec<ResourceView>,
    pub scenario_title: &'static str,
    pub prompt: &'static str,
    pub choices: Vec<ChoiceView>,
    pub over: bool,
    pub outcome: String,
    pub notice: String,
}

#[derive(Deserialize)]
pub struct BudgetForm {
    #[serde(default)]
    pub state: String,
    pub choice: Option<usize>,
    pub restart: Option<String>,
}

fn signed(value: i32) -> String {
    if value > 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

fn budget_template(chrome: Chrome, game: &BudgetGame, notice: String) -> AppResult<BudgetTemplate> {
    let scenario = game.scenario();
    let resources = game.resources();
    let choices = scenario
        .map(|s| {
            s.choices
                .iter()
                .enumerate()
                .map(|(index, c)| ChoiceView {
                    index,
                    label: c.label,
                    effects: Resource::ALL
                        .iter()
                        .filter(|&&r| c.deltas.get(r) != 0)
                        .map(|&r| format!("{} {}", r.label(), signed(c.deltas.get(r))))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect()
        })
        .unwrap_or_default();
    let outcome = match game.status() {
        BudgetStatus::Playing => String::new(),
        BudgetStatus::Depleted { resource } => format!(
            "You ran out of {}. The campaign is over.",
            resource.label().to_lowercase()
        ),
        BudgetStatus::Completed { score } => {
            format!("Campaign complete! Final score: {}.", score)
        }
    };

    Ok(BudgetTemplate {
        chrome,
        state: arcade::encode(game)?,
        turn: (game.turn() + 1).min(TURN_CAP),
        turn_cap: TURN_CAP,
        resources: Resource::ALL
            .iter()
            .map(|&r| ResourceView {
                label: r.label(),
                value: resources.get(r),
            })
            .collect(),
        scenario_title: scenario.map(|s| s.title).unwrap_or_default(),
        prompt: scenario.map(|s| s.prompt).unwrap_or_default(),
        choices,
        over: game.is_over(),
        outcome,
        notice,
    })
}

pub async fn budget_page(chrome: Chrome) -> AppResult<Response> {
    let game = BudgetGame::new();
    Ok(Html(budget_template(chrome, &game, String::new())?).into_response())
}

pub async fn budget_move(chrome: Chrome, Form(form): Form<BudgetForm>) -> AppResult<Response> {
    let (mut game, mut notice) = restore(&form.state, BudgetGame::new);

    if notice.is_empty() {
        if form.restart.is_some() {
            game = BudgetGame::new();
        } else if let Some(choice) = form.choice {
            notice = move_notice(game.choose(choice).map(|_| ()));
        }
    }

    Ok(Html(budget_template(chrome, &game, notice)?).into_response())
}

// -- Evidence debate --

pub struct CardView {
    pub id: u8,
    pub title: &'static str,
    pub kind: &'static str,
    pub strength: u32,
}

pub struct ExchangeView {
    pub player_card: String,
    pub opponent_card: String,
    pub player_points: u32,
    pub opponent_points: u32,
}

#[derive(Template)]
#[template(path = "pages/arcade_debate.html")]
pub struct DebateTemplate {
    pub chrome: Chrome,
    pub state: String,
    pub round: usize,
    pub rounds: usize,
    pub hand: Vec<CardView>,
    pub exchanges: Vec<ExchangeView>,
    pub player_score: u32,
    pub opponent_score: u32,
    pub over: bool,
    pub verdict: &'static str,
    pub notice: String,
}

#[derive(Deserialize)]
pub struct DebateForm {
    #[serde(default)]
    pub state: String,
    pub card: Option<u8>,
    pub restart: Option<String>,
}

fn describe_card(id: u8) -> String {
    card_by_id(id)
        .map(|c| format!("{} ({}, {})", c.title, c.kind.label(), c.strength))
        .unwrap_or_default()
}

fn debate_template(chrome: Chrome, game: &DebateGame, notice: String) -> AppResult<DebateTemplate> {
    let (player_score, opponent_score) = game.scores();
    let verdict = match game.verdict() {
        None => "",
        Some(Verdict::Win) => "You won the debate!",
        Some(Verdict::Loss) => "Your opponent won this time.",
        Some(Verdict::Draw) => "The debate ended in a draw.",
    };

    Ok(DebateTemplate {
        chrome,
        state: arcade::encode(game)?,
        round: (game.round() + 1).min(DEBATE_ROUNDS),
        rounds: DEBATE_ROUNDS,
        hand: game
            .player_hand()
            .map(|c| CardView {
                id: c.id,
                title: c.title,
                kind: c.kind.label(),
                strength: c.strength,
            })
            .collect(),
        exchanges: game
            .exchanges()
            .iter()
            .map(|x| ExchangeView {
                player_card: describe_card(x.player_card),
                opponent_card: describe_card(x.opponent_card),
                player_points: x.player_points,
                opponent_points: x.opponent_points,
            })
            .collect(),
        player_score,
        opponent_score,
        over: game.verdict().is_some(),
        verdict,
        notice,
    })
}

fn new_debate() -> DebateGame {
    DebateGame::new(rand::random())
}

pub async fn debate_page(chrome: Chrome) -> AppResult<Response> {
    let game = new_debate();
    Ok(Html(debate_template(chrome, &game, String::new())?).into_response())
}

pub async fn debate_move(chrome: Chrome, Form(form): Form<DebateForm>) -> AppResult<Response> {
    let (mut game, mut notice) = restore(&form.state, new_debate);

    if notice.is_empty() {
        if form.restart.is_some() {
            game = new_debate();
        } else if let Some(card) = form.card {
            notice = move_notice(game.play(card).map(|_| ()));
        }
    }

    Ok(Html(debate_template(chrome, &game, notice)?).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_starts_over_on_tampered_state() {
        let (game, notice) = restore("{\"round\":9}", PolicyPuzzle::new);
        assert_eq!(game, PolicyPuzzle::new());
        assert_eq!(notice, RESTORE_FAILED);
    }

    #[test]
    fn restore_keeps_valid_state() {
        let mut game = BudgetGame::new();
        game.choose(1).unwrap();
        let raw = arcade::encode(&game).unwrap();
        let (restored, notice) = restore(&raw, BudgetGame::new);
        assert_eq!(restored, game);
        assert!(notice.is_empty());
    }

    #[test]
    fn budget_choices_describe_effects() {
        let game = BudgetGame::new();
        let page = budget_template(Chrome::default(), &game, String::new()).unwrap();
        assert_eq!(page.choices[0].effects, "Funds -25, Public support +15");
        assert_eq!(page.turn, 1);
    }

    #[test]
    fn puzzle_feedback_names_wrong_columns() {
        let pieces = PUZZLE_ROUNDS[0].pieces;
        let pick = |category: PieceCategory, correct: bool| {
            pieces
                .iter()
                .position(|p| p.category == category && p.correct == correct)
                .unwrap()
        };

        let mut game = PolicyPuzzle::new();
        game.select(pick(PieceCategory::Problem, false)).unwrap();
        game.select(pick(PieceCategory::Policy, true)).unwrap();
        game.select(pick(PieceCategory::Outcome, true)).unwrap();
        game.check().unwrap();

        let (text, class) = puzzle_feedback(&game);
        assert_eq!(class, "error");
        assert_eq!(text, "Not quite. Take another look at: Problem.");
    }
}
