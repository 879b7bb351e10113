//! Gamification counters and the mascot's reaction to each turn.

pub const XP_PER_ANSWER: u32 = 10;
pub const XP_PER_LEVEL: u32 = 100;
pub const MILESTONE_EVERY: u32 = 5;
pub const STREAK_CELEBRATION: u32 = 3;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MascotMood {
    #[default]
    Happy,
    Thinking,
    Celebrating,
    Encouraging,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Celebration {
    LevelUp { level: u32 },
    Milestone { correct_answers: u32 },
    Streak { streak: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressState {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub streak: u32,
    pub level: u32,
    pub experience: u32,
}

impl Default for ProgressState {
    fn default() -> Self {
        ProgressState {
            total_questions: 0,
            correct_answers: 0,
            streak: 0,
            level: 1,
            experience: 0,
        }
    }
}

impl ProgressState {
    pub fn record_attempt(&mut self) {
        self.total_questions += 1;
    }

    /// Advance counters for an answered turn and report what to celebrate.
    pub fn record_success(&mut self) -> Option<Celebration> {
        self.correct_answers += 1;
        self.streak += 1;
        self.experience += XP_PER_ANSWER;

        let mut leveled_up = false;
        while self.experience >= XP_PER_LEVEL {
            self.experience -= XP_PER_LEVEL;
            self.level += 1;
            leveled_up = true;
        }

        if leveled_up {
            Some(Celebration::LevelUp { level: self.level })
        } else if self.correct_answers % MILESTONE_EVERY == 0 {
            Some(Celebration::Milestone {
                correct_answers: self.correct_answers,
            })
        } else if self.streak >= STREAK_CELEBRATION {
            Some(Celebration::Streak {
                streak: self.streak,
            })
        } else {
            None
        }
    }

    /// Per-thread counters go back to zero; level and experience carry over.
    pub fn reset_thread(&mut self) {
        self.total_questions = 0;
        self.correct_answers = 0;
        self.streak = 0;
    }

    /// Percentage of attempted questions that were answered
    pub fn accuracy(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        self.correct_answers * 100 / self.total_questions
    }

    pub fn level_title(&self) -> &'static str {
        match self.level {
            0..=3 => "Math Explorer",
            4..=6 => "Math Wizard",
            7..=9 => "Math Master",
            _ => "Math Legend",
        }
    }
}
