//! Exercise catalog and workout plan builder.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{PlanGoal, PlanRequest, push_numbered};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exercise {
    pub name: &'static str,
    pub instructions: &'static str,
    pub equipment: &'static str,
}

const fn ex(name: &'static str, instructions: &'static str, equipment: &'static str) -> Exercise {
    Exercise {
        name,
        instructions,
        equipment,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 3] = [Self::Chest, Self::Back, Self::Legs];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chest => "Chest",
            Self::Back => "Back",
            Self::Legs => "Legs",
        }
    }

    pub fn exercises(&self) -> &'static [Exercise] {
        match self {
            Self::Chest => CHEST,
            Self::Back => BACK,
            Self::Legs => LEGS,
        }
    }
}

static CHEST: &[Exercise] = &[
    ex("Push-ups", "Start in plank position, lower body, push back up", "None"),
    ex("Chest Press", "Lie on bench, press weights up from chest", "Dumbbells"),
    ex("Incline Push-ups", "Hands on elevated surface, perform push-ups", "Bench/Chair"),
];

static BACK: &[Exercise] = &[
    ex("Pull-ups", "Hang from bar, pull body up until chin over bar", "Pull-up bar"),
    ex("Bent-over Rows", "Bend at waist, pull weights to chest", "Dumbbells"),
    ex("Superman", "Lie face down, lift chest and legs off ground", "None"),
];

static LEGS: &[Exercise] = &[
    ex("Squats", "Feet shoulder-width apart, lower hips, return to standing", "None"),
    ex("Lunges", "Step forward, lower back knee, return to start", "None"),
    ex("Deadlifts", "Feet hip-width apart, lift weight keeping back straight", "Dumbbells"),
];

pub static CARDIO: &[Exercise] = &[
    ex("Running", "30-45 minutes moderate pace", "None"),
    ex("Jump Rope", "15-20 minutes with rest intervals", "Jump rope"),
    ex("High Knees", "30 seconds on, 30 seconds rest, repeat 10 times", "None"),
];

pub static FLEXIBILITY: &[Exercise] = &[
    ex("Cat-Cow Stretch", "On hands and knees, arch and round spine", "None"),
    ex("Downward Dog", "Hands and feet on ground, form inverted V", "None"),
    ex("Child's Pose", "Kneel, sit back on heels, stretch arms forward", "None"),
];

pub const SAFETY_HEADING: &str = "**Safety notes**:";

fn lines_for<'a>(exercises: impl IntoIterator<Item = &'a Exercise>) -> Vec<(&'a str, &'a str)> {
    exercises
        .into_iter()
        .map(|e| (e.name, e.instructions))
        .collect()
}

/// Build a workout plan. Always ends with the safety section.
pub fn build_plan<R: Rng + ?Sized>(request: &PlanRequest, rng: &mut R) -> String {
    let mut lines = vec![
        format!("**Personal workout plan** (goal: {})", request.goal),
        format!("**Suggested duration**: {} minutes", request.duration_minutes),
        format!("**Level**: {}", request.level),
        String::new(),
    ];

    match request.goal {
        PlanGoal::WeightLoss => weight_loss(&mut lines, rng),
        PlanGoal::MuscleGain => muscle_gain(&mut lines, rng),
        PlanGoal::Endurance => endurance(&mut lines),
        PlanGoal::General => general(&mut lines, rng),
    }

    lines.push(String::new());
    lines.push(SAFETY_HEADING.to_string());
    lines.push("- Warm up for 5-10 minutes before exercising".to_string());
    lines.push("- Stretch and cool down afterwards".to_string());
    lines.push("- Stop immediately if you feel pain or discomfort".to_string());
    lines.push("- Consider guidance from a qualified trainer".to_string());
    lines.join("\n")
}

fn weight_loss<R: Rng + ?Sized>(lines: &mut Vec<String>, rng: &mut R) {
    lines.push("**Weight loss plan**".to_string());
    lines.push(String::new());

    lines.push("**Cardio (3-4 times a week)**:".to_string());
    push_numbered(lines, 1, lines_for(CARDIO.choose_multiple(rng, 2)));
    lines.push(String::new());

    let strength: Vec<&Exercise> = MuscleGroup::ALL
        .iter()
        .filter_map(|g| g.exercises().choose(rng))
        .collect();
    lines.push("**Strength (2-3 times a week)**:".to_string());
    push_numbered(lines, 1, lines_for(strength));
}

fn muscle_gain<R: Rng + ?Sized>(lines: &mut Vec<String>, rng: &mut R) {
    lines.push("**Muscle gain plan**".to_string());
    lines.push(String::new());
    lines.push("**Strength (4-5 times a week)**:".to_string());

    let mut n = 1;
    for group in MuscleGroup::ALL {
        lines.push(format!("**{} training:**", group.name()));
        n = push_numbered(lines, n, lines_for(group.exercises().choose_multiple(rng, 2)));
        lines.push(String::new());
    }
}

fn endurance(lines: &mut Vec<String>) {
    lines.push("**Endurance plan**".to_string());
    lines.push(String::new());
    lines.push("**Endurance training (4-5 times a week)**:".to_string());
    push_numbered(lines, 1, lines_for(CARDIO));
}

fn general<R: Rng + ?Sized>(lines: &mut Vec<String>, rng: &mut R) {
    lines.push("**General fitness plan**".to_string());
    lines.push(String::new());
    lines.push("**Weekly schedule**:".to_string());
    lines.push("Mon/Wed/Fri: strength".to_string());
    lines.push("Tue/Thu: cardio".to_string());
    lines.push("Sat: flexibility".to_string());
    lines.push("Sun: rest".to_string());
    lines.push(String::new());

    lines.push("**Recommended exercises**:".to_string());
    let mut picks: Vec<&Exercise> = MuscleGroup::ALL
        .iter()
        .filter_map(|g| g.exercises().choose(rng))
        .collect();
    picks.extend(CARDIO.choose_multiple(rng, 2));
    picks.extend(FLEXIBILITY.choose_multiple(rng, 2));
    push_numbered(lines, 1, lines_for(picks));
}
