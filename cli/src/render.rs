use tutor_core::progress::XP_PER_LEVEL;
use tutor_core::{
    Celebration, ChatBackend, MascotMood, MessageRole, ProgressState, SubmitError,
    TurnController, TurnOutcome,
};

const TERMINAL_WIDTH: usize = 80;

fn mascot_face(mood: MascotMood) -> &'static str {
    match mood {
        MascotMood::Happy => "🦉",
        MascotMood::Thinking => "🤔",
        MascotMood::Celebrating => "🎉",
        MascotMood::Encouraging => "💪",
    }
}

pub fn status_bar<B: ChatBackend>(controller: &TurnController<B>, signed_in: bool) {
    let progress = controller.progress();
    let mut status = format!(
        " {} Level {} {} • {}/{} XP • streak {} ",
        mascot_face(controller.mascot()),
        progress.level,
        progress.level_title(),
        progress.experience,
        XP_PER_LEVEL,
        progress.streak,
    );
    if !signed_in {
        status.push_str("• signed out ");
    }
    if let Some(handle) = controller.selected_image() {
        status.push_str(&format!("• 📎 {} ", handle));
    }
    let padding = TERMINAL_WIDTH.saturating_sub(status.chars().count() + 2);
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;

    println!("┌{}┐", "─".repeat(TERMINAL_WIDTH - 2));
    println!("│{}{}{}│", " ".repeat(left_pad), status, " ".repeat(right_pad));
    println!("└{}┘", "─".repeat(TERMINAL_WIDTH - 2));
}

pub fn conversation<B: ChatBackend>(controller: &TurnController<B>) {
    for message in controller.conversation().messages() {
        match message.role() {
            MessageRole::Assistant => println!("Math Buddy: {}", message.text()),
            MessageRole::User => match message.image() {
                Some(handle) => println!("You: {} [{}]", message.text(), handle),
                None => println!("You: {}", message.text()),
            },
        }
    }
}

pub fn turn<B: ChatBackend>(
    controller: &TurnController<B>,
    result: Result<TurnOutcome, SubmitError>,
) {
    match result {
        Ok(TurnOutcome::Answered { reply, celebration }) => {
            println!("Math Buddy: {}", reply);
            if let Some(celebration) = celebration {
                println!("{}", celebrate(celebration));
            }
        }
        Ok(TurnOutcome::Failed { message, .. }) => {
            println!("Math Buddy {}: {}", mascot_face(controller.mascot()), message);
        }
        Err(e) => {
            println!("{}", e);
            return;
        }
    }

    if let Some(suggestions) = controller.suggestions() {
        println!();
        println!("Try asking:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("  /s {}  {}", i + 1, suggestion);
        }
    }
}

fn celebrate(celebration: Celebration) -> String {
    match celebration {
        Celebration::LevelUp { level } => format!("🎉 Level up! You reached level {}!", level),
        Celebration::Milestone { correct_answers } => {
            format!("🏆 Amazing! {} questions answered!", correct_answers)
        }
        Celebration::Streak { streak } => format!("🔥 {} in a row! You're on fire!", streak),
    }
}

pub fn progress(progress: &ProgressState) {
    println!("{} (level {})", progress.level_title(), progress.level);
    println!("  Experience: {}/{}", progress.experience, XP_PER_LEVEL);
    println!("  Questions:  {}", progress.total_questions);
    println!("  Answered:   {}", progress.correct_answers);
    println!("  Accuracy:   {}%", progress.accuracy());
    println!("  Streak:     {}", progress.streak);
}
