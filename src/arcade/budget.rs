use serde::{Deserialize, Serialize};

use crate::arcade::{ArcadeError, GameState};

pub const TURN_CAP: usize = 8;
pub const START_LEVEL: i32 = 50;
pub const MIN_LEVEL: i32 = 0;
pub const MAX_LEVEL: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Funds,
    Support,
    Capacity,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Self::Funds, Self::Support, Self::Capacity];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Funds => "Funds",
            Self::Support => "Public support",
            Self::Capacity => "Volunteer capacity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub funds: i32,
    pub support: i32,
    pub capacity: i32,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            funds: START_LEVEL,
            support: START_LEVEL,
            capacity: START_LEVEL,
        }
    }
}

impl Resources {
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Funds => self.funds,
            Resource::Support => self.support,
            Resource::Capacity => self.capacity,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Funds => &mut self.funds,
            Resource::Support => &mut self.support,
            Resource::Capacity => &mut self.capacity,
        }
    }

    /// Apply deltas, pinning every level to `[MIN_LEVEL, MAX_LEVEL]`.
    pub fn apply(&mut self, deltas: &Deltas) {
        for resource in Resource::ALL {
            let slot = self.slot(resource);
            *slot = (*slot + deltas.get(resource)).clamp(MIN_LEVEL, MAX_LEVEL);
        }
    }

    pub fn first_depleted(&self) -> Option<Resource> {
        Resource::ALL
            .into_iter()
            .find(|&r| self.get(r) <= MIN_LEVEL)
    }

    pub fn total(&self) -> i32 {
        self.funds + self.support + self.capacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deltas {
    pub funds: i32,
    pub support: i32,
    pub capacity: i32,
}

impl Deltas {
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Funds => self.funds,
            Resource::Support => self.support,
            Resource::Capacity => self.capacity,
        }
    }
}

pub struct Choice {
    pub label: &'static str,
    pub deltas: Deltas,
}

pub struct Scenario {
    pub title: &'static str,
    pub prompt: &'static str,
    pub choices: &'static [Choice],
}

const fn choice(label: &'static str, funds: i32, support: i32, capacity: i32) -> Choice {
    Choice {
        label,
        deltas: Deltas {
            funds,
            support,
            capacity,
        },
    }
}

pub static SCENARIOS: [Scenario; TURN_CAP] = [
    Scenario {
        title: "Launch",
        prompt: "How do you announce the campaign?",
        choices: &[
            choice("Paid ad buy", -25, 15, 0),
            choice("Volunteer canvass", 0, 10, -20),
            choice("Press release only", -5, 5, 0),
        ],
    },
    Scenario {
        title: "Fundraising",
        prompt: "A donor offers a large gift with strings attached.",
        choices: &[
            choice("Accept it", 35, -20, 0),
            choice("Decline and run a small-donor drive", 10, 10, -15),
        ],
    },
    Scenario {
        title: "Coalition",
        prompt: "A neighborhood group wants to partner.",
        choices: &[
            choice("Co-host events", -10, 10, 15),
            choice("Stay independent", 0, -5, 0),
        ],
    },
    Scenario {
        title: "Opposition",
        prompt: "An opinion column attacks the proposal.",
        choices: &[
            choice("Publish a detailed rebuttal", -5, 10, -10),
            choice("Ignore it", 0, -15, 0),
            choice("Rally supporters to write letters", 0, 15, -20),
        ],
    },
    Scenario {
        title: "Research",
        prompt: "Commission a study of the policy's impact?",
        choices: &[
            choice("Fund the study", -30, 20, 0),
            choice("Use existing data", 0, 5, -5),
        ],
    },
    Scenario {
        title: "Burnout",
        prompt: "Volunteers are exhausted after a long month.",
        choices: &[
            choice("Hire a part-time organizer", -25, 0, 25),
            choice("Pause outreach for a week", 0, -10, 20),
            choice("Push through", 0, 5, -25),
        ],
    },
    Scenario {
        title: "Hearing",
        prompt: "The council schedules a public hearing.",
        choices: &[
            choice("Pack the room", -5, 20, -20),
            choice("Submit written testimony", 0, 5, -5),
        ],
    },
    Scenario {
        title: "Final push",
        prompt: "One week before the vote.",
        choices: &[
            choice("Door-knocking blitz", -10, 15, -25),
            choice("Digital ads", -30, 15, 0),
            choice("Hold steady", 0, 0, 0),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BudgetStatus {
    Playing,
    Depleted { resource: Resource },
    Completed { score: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetGame {
    turn: usize,
    resources: Resources,
    history: Vec<usize>,
    status: BudgetStatus,
}

impl Default for BudgetGame {
    fn default() -> Self {
        Self::new()
    }
}

impl BudgetGame {
    pub fn new() -> Self {
        Self {
            turn: 0,
            resources: Resources::default(),
            history: Vec::new(),
            status: BudgetStatus::Playing,
        }
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn resources(&self) -> Resources {
        self.resources
    }

    pub fn status(&self) -> BudgetStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != BudgetStatus::Playing
    }

    pub fn scenario(&self) -> Option<&'static Scenario> {
        if self.is_over() {
            return None;
        }
        SCENARIOS.get(self.turn)
    }

    /// Take the choice at `index` for the current scenario.
    pub fn choose(&mut self, index: usize) -> Result<BudgetStatus, ArcadeError> {
        let scenario = self.scenario().ok_or(ArcadeError::GameOver)?;
        let choice = scenario
            .choices
            .get(index)
            .ok_or_else(|| ArcadeError::InvalidMove(format!("no choice {}", index)))?;

        self.resources.apply(&choice.deltas);
        self.turn += 1;
        self.history.push(index);

        self.status = match self.resources.first_depleted() {
            Some(resource) => BudgetStatus::Depleted { resource },
            None if self.turn >= TURN_CAP => BudgetStatus::Completed {
                score: self.resources.total(),
            },
            None => BudgetStatus::Playing,
        };
        Ok(self.status)
    }
}

impl GameState for BudgetGame {
    /// Replays the recorded choices; the carried state must match the replay.
    fn validate(&self) -> Result<(), ArcadeError> {
        let mut replay = BudgetGame::new();
        for &index in &self.history {
            replay
                .choose(index)
                .map_err(|e| ArcadeError::Corrupt(e.to_string()))?;
        }
        if replay != *self {
            return Err(ArcadeError::Corrupt("state does not match history".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_bounds(r: &Resources) -> bool {
        Resource::ALL
            .iter()
            .all(|&res| (MIN_LEVEL..=MAX_LEVEL).contains(&r.get(res)))
    }

    #[test]
    fn apply_clamps_to_bounds() {
        let mut r = Resources {
            funds: 95,
            support: 3,
            capacity: 50,
        };
        r.apply(&Deltas {
            funds: 30,
            support: -10,
            capacity: 0,
        });
        assert_eq!(r.funds, 100);
        assert_eq!(r.support, 0);
        assert_eq!(r.capacity, 50);
    }

    #[test]
    fn every_path_stays_in_bounds() {
        // Exhaustively walk every sequence of choices
        fn walk(game: BudgetGame) {
            assert!(in_bounds(&game.resources()));
            let Some(scenario) = game.scenario() else {
                return;
            };
            for i in 0..scenario.choices.len() {
                let mut next = game.clone();
                next.choose(i).unwrap();
                walk(next);
            }
        }
        walk(BudgetGame::new());
    }

    #[test]
    fn playing_to_the_cap_completes() {
        let mut game = BudgetGame::new();
        // always take the option with the smallest total cost
        while let Some(scenario) = game.scenario() {
            let safest = scenario
                .choices
                .iter()
                .enumerate()
                .max_by_key(|(_, c)| {
                    Resource::ALL
                        .iter()
                        .map(|&r| c.deltas.get(r).min(0))
                        .sum::<i32>()
                })
                .map(|(i, _)| i)
                .unwrap();
            game.choose(safest).unwrap();
        }
        assert_eq!(game.turn(), TURN_CAP);
        assert!(matches!(game.status(), BudgetStatus::Completed { .. }));
        assert!(matches!(game.choose(0), Err(ArcadeError::GameOver)));
    }

    #[test]
    fn reaching_zero_ends_the_game() {
        let mut game = BudgetGame::new();
        game.resources.capacity = 15;
        let status = game.choose(1).unwrap(); // volunteer canvass: -20 capacity
        assert_eq!(
            status,
            BudgetStatus::Depleted {
                resource: Resource::Capacity
            }
        );
        assert_eq!(game.resources().capacity, 0);
        assert!(game.is_over());
        assert!(game.scenario().is_none());
    }

    #[test]
    fn same_choices_give_same_outcome() {
        let picks = [2, 1, 0, 0, 1, 1, 1, 2];
        let play = || {
            let mut game = BudgetGame::new();
            for &p in &picks {
                if game.choose(p).is_err() {
                    break;
                }
            }
            game
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn invalid_choice_is_rejected_without_side_effects() {
        let mut game = BudgetGame::new();
        assert!(matches!(game.choose(7), Err(ArcadeError::InvalidMove(_))));
        assert_eq!(game, BudgetGame::new());
    }

    #[test]
    fn validate_detects_tampering() {
        let mut game = BudgetGame::new();
        game.choose(0).unwrap();
        assert!(game.validate().is_ok());

        game.resources.funds = 100;
        assert!(game.validate().is_err());
    }
}
