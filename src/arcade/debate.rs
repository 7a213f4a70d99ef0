use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::arcade::{ArcadeError, GameState};

pub const HAND_SIZE: usize = 5;
pub const ROUNDS: usize = HAND_SIZE;
pub const COUNTER_BONUS: u32 = 2;
pub const VARIETY_BONUS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Statistic,
    Testimony,
    Precedent,
    Expert,
}

impl EvidenceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Statistic => "Statistic",
            Self::Testimony => "Testimony",
            Self::Precedent => "Precedent",
            Self::Expert => "Expert",
        }
    }

    /// Statistic > Testimony > Expert > Precedent > Statistic.
    pub fn counters(&self, other: EvidenceKind) -> bool {
        matches!(
            (self, other),
            (Self::Statistic, Self::Testimony)
                | (Self::Testimony, Self::Expert)
                | (Self::Expert, Self::Precedent)
                | (Self::Precedent, Self::Statistic)
        )
    }
}

#[derive(Debug)]
pub struct Card {
    pub id: u8,
    pub kind: EvidenceKind,
    pub strength: u32,
    pub title: &'static str,
}

const fn card(id: u8, kind: EvidenceKind, strength: u32, title: &'static str) -> Card {
    Card {
        id,
        kind,
        strength,
        title,
    }
}

use EvidenceKind::{Expert, Precedent, Statistic, Testimony};

pub static DECK: [Card; 20] = [
    card(0, Statistic, 5, "Census poverty figures"),
    card(1, Statistic, 4, "Eviction filing rates"),
    card(2, Statistic, 3, "Transit ridership survey"),
    card(3, Statistic, 2, "Emergency room wait times"),
    card(4, Statistic, 1, "Single-county poll"),
    card(5, Testimony, 5, "Nurse on a double shift"),
    card(6, Testimony, 4, "Tenant facing eviction"),
    card(7, Testimony, 3, "Small business owner"),
    card(8, Testimony, 2, "Commuter's story"),
    card(9, Testimony, 1, "Anonymous forum post"),
    card(10, Precedent, 5, "Neighboring state's reform"),
    card(11, Precedent, 4, "Successful city pilot"),
    card(12, Precedent, 3, "Prior ballot measure"),
    card(13, Precedent, 2, "Overseas program"),
    card(14, Precedent, 1, "Decades-old ruling"),
    card(15, Expert, 5, "Public health researcher"),
    card(16, Expert, 4, "Housing economist"),
    card(17, Expert, 3, "Retired judge"),
    card(18, Expert, 2, "Urban planner"),
    card(19, Expert, 1, "Think-tank blogger"),
];

pub fn card_by_id(id: u8) -> Option<&'static Card> {
    DECK.get(usize::from(id))
}

/// Points a card earns when played against `against`, given the kind of the
/// same side's previous card.
pub fn points(card: &Card, against: &Card, previous: Option<EvidenceKind>) -> u32 {
    let mut total = card.strength;
    if card.kind.counters(against.kind) {
        total += COUNTER_BONUS;
    }
    if previous.is_some_and(|kind| kind != card.kind) {
        total += VARIETY_BONUS;
    }
    total
}

/// Highest strength wins; ties go to the lower id.
fn strongest(cards: impl Iterator<Item = &'static Card>) -> Option<&'static Card> {
    cards.max_by(|a, b| a.strength.cmp(&b.strength).then(b.id.cmp(&a.id)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub player_card: u8,
    pub opponent_card: u8,
    pub player_points: u32,
    pub opponent_points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateGame {
    seed: u64,
    player_hand: Vec<u8>,
    opponent_hand: Vec<u8>,
    exchanges: Vec<Exchange>,
    player_score: u32,
    opponent_score: u32,
    verdict: Option<Verdict>,
}

impl DebateGame {
    /// Shuffle the deck with `seed` and deal a hand to each side.
    pub fn new(seed: u64) -> Self {
        let mut ids: Vec<u8> = DECK.iter().map(|c| c.id).collect();
        ids.shuffle(&mut StdRng::seed_from_u64(seed));
        let opponent_hand = ids[HAND_SIZE..HAND_SIZE * 2].to_vec();
        ids.truncate(HAND_SIZE);

        Self {
            seed,
            player_hand: ids,
            opponent_hand,
            exchanges: Vec::new(),
            player_score: 0,
            opponent_score: 0,
            verdict: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn player_hand(&self) -> impl Iterator<Item = &'static Card> + '_ {
        self.player_hand.iter().filter_map(|&id| card_by_id(id))
    }

    pub fn opponent_cards_left(&self) -> usize {
        self.opponent_hand.len()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn round(&self) -> usize {
        self.exchanges.len()
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.player_score, self.opponent_score)
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    fn previous_kinds(&self) -> (Option<EvidenceKind>, Option<EvidenceKind>) {
        match self.exchanges.last() {
            Some(last) => (
                card_by_id(last.player_card).map(|c| c.kind),
                card_by_id(last.opponent_card).map(|c| c.kind),
            ),
            None => (None, None),
        }
    }

    /// The opponent answers with its strongest card that counters `played`,
    /// falling back to its strongest card overall.
    fn opponent_reply(&self, played: &Card) -> Option<&'static Card> {
        let hand = || self.opponent_hand.iter().filter_map(|&id| card_by_id(id));
        strongest(hand().filter(|c| c.kind.counters(played.kind))).or_else(|| strongest(hand()))
    }

    /// Play card `id` from the player's hand and resolve the exchange.
    pub fn play(&mut self, id: u8) -> Result<Exchange, ArcadeError> {
        if self.verdict.is_some() {
            return Err(ArcadeError::GameOver);
        }
        let position = self
            .player_hand
            .iter()
            .position(|&held| held == id)
            .ok_or_else(|| ArcadeError::InvalidMove(format!("card {} is not in hand", id)))?;
        let played = card_by_id(id)
            .ok_or_else(|| ArcadeError::InvalidMove(format!("unknown card {}", id)))?;
        let reply = self
            .opponent_reply(played)
            .ok_or_else(|| ArcadeError::Corrupt("opponent has no cards".into()))?;

        let (player_prev, opponent_prev) = self.previous_kinds();
        let exchange = Exchange {
            player_card: played.id,
            opponent_card: reply.id,
            player_points: points(played, reply, player_prev),
            opponent_points: points(reply, played, opponent_prev),
        };

        self.player_hand.remove(position);
        self.opponent_hand.retain(|&held| held != reply.id);
        self.player_score += exchange.player_points;
        self.opponent_score += exchange.opponent_points;
        self.exchanges.push(exchange);

        if self.exchanges.len() >= ROUNDS {
            self.verdict = Some(match self.player_score.cmp(&self.opponent_score) {
                std::cmp::Ordering::Greater => Verdict::Win,
                std::cmp::Ordering::Less => Verdict::Loss,
                std::cmp::Ordering::Equal => Verdict::Draw,
            });
        }
        Ok(exchange)
    }
}

impl GameState for DebateGame {
    /// Re-deal from the seed and replay the player's cards.
    fn validate(&self) -> Result<(), ArcadeError> {
        let mut replay = DebateGame::new(self.seed);
        for exchange in &self.exchanges {
            replay
                .play(exchange.player_card)
                .map_err(|e| ArcadeError::Corrupt(e.to_string()))?;
        }
        if replay != *self {
            return Err(ArcadeError::Corrupt("state does not match replay".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn counter_cycle_is_one_directional() {
        let kinds = [Statistic, Testimony, Precedent, Expert];
        for a in kinds {
            assert!(!a.counters(a));
            let beaten: Vec<_> = kinds.iter().filter(|&&b| a.counters(b)).collect();
            assert_eq!(beaten.len(), 1, "{:?} should counter exactly one kind", a);
            assert!(!beaten[0].counters(a));
        }
    }

    #[test]
    fn deck_ids_match_positions() {
        for (i, card) in DECK.iter().enumerate() {
            assert_eq!(usize::from(card.id), i);
            assert!((1..=5).contains(&card.strength));
        }
    }

    #[test]
    fn deal_is_seeded_and_disjoint() {
        let a = DebateGame::new(42);
        let b = DebateGame::new(42);
        assert_eq!(a, b);

        let mut seen = HashSet::new();
        for id in a.player_hand.iter().chain(a.opponent_hand.iter()) {
            assert!(seen.insert(*id), "card {} dealt twice", id);
        }
        assert_eq!(seen.len(), HAND_SIZE * 2);
    }

    #[test]
    fn scoring_adds_counter_and_variety_bonuses() {
        let stat = &DECK[1];
        let testimony = &DECK[6];
        assert_eq!(points(stat, testimony, None), 4 + COUNTER_BONUS);
        assert_eq!(
            points(stat, testimony, Some(Expert)),
            4 + COUNTER_BONUS + VARIETY_BONUS
        );
        assert_eq!(points(testimony, stat, Some(Testimony)), 4);
    }

    #[test]
    fn opponent_prefers_a_counter() {
        let mut game = DebateGame::new(1);
        game.opponent_hand = vec![0, 5, 10];
        // Testimony is countered by Statistic
        let reply = game.opponent_reply(&DECK[7]).unwrap();
        assert_eq!(reply.id, 0);
        // nothing counters Precedent except Expert, which is not held
        let reply = game.opponent_reply(&DECK[12]).unwrap();
        assert_eq!(reply.strength, 5);
        assert_eq!(reply.id, 0);
    }

    #[test]
    fn full_game_reaches_a_verdict() {
        let mut game = DebateGame::new(7);
        while game.verdict().is_none() {
            let next = game.player_hand().next().unwrap().id;
            game.play(next).unwrap();
        }
        assert_eq!(game.round(), ROUNDS);
        assert_eq!(game.opponent_cards_left(), 0);

        let (player, opponent) = game.scores();
        let expected = match player.cmp(&opponent) {
            std::cmp::Ordering::Greater => Verdict::Win,
            std::cmp::Ordering::Less => Verdict::Loss,
            std::cmp::Ordering::Equal => Verdict::Draw,
        };
        assert_eq!(game.verdict(), Some(expected));
        assert!(matches!(game.play(0), Err(ArcadeError::GameOver)));
    }

    #[test]
    fn playing_a_card_not_in_hand_is_rejected() {
        let mut game = DebateGame::new(3);
        let foreign = game.opponent_hand[0];
        assert!(matches!(game.play(foreign), Err(ArcadeError::InvalidMove(_))));
        assert_eq!(game.round(), 0);
    }

    #[test]
    fn validate_rejects_inflated_scores() {
        let mut game = DebateGame::new(11);
        let first = game.player_hand[0];
        game.play(first).unwrap();
        assert!(game.validate().is_ok());

        game.player_score += 10;
        assert!(game.validate().is_err());
    }
}
