//! Wellness tips and stress-relief techniques.

use rand::Rng;
use rand::seq::SliceRandom;

pub static TIPS: &[&str] = &[
    "Deep breathing: spend 5-10 minutes a day breathing slowly to unwind",
    "Mindfulness: notice your thoughts and feelings without judging them",
    "Gratitude: write down three things you are grateful for each day",
    "Move your body: aerobic exercise releases endorphins and lifts your mood",
    "Sleep well: 7-9 hours of sleep helps keep your mood steady",
    "Stay connected: keep in touch with friends and family",
    "Manage your time: plan your day to avoid piling on pressure",
    "Hobbies: make room for activities you enjoy",
    "Go outside: time in nature and sunlight improves mood",
    "Learn to say no: set boundaries so you don't overcommit",
];

pub static TECHNIQUES: &[&str] = &[
    "Progressive muscle relaxation: tense and release each muscle group from toes to head",
    "4-7-8 breathing: inhale for 4 seconds, hold for 7, exhale for 8",
    "Visualisation: picture yourself somewhere calm, like a beach or a forest",
    "Warm bath or foot soak: warm water helps muscles relax",
    "Music: put on something soothing and let your mind settle",
    "Journaling: write down your feelings to let off pressure",
    "Gentle yoga: combine simple poses with slow breathing",
    "Aromatherapy: scents such as lavender can help you relax",
    "Unplug: give yourself some time offline without interruptions",
];

pub const TIP_COUNT: usize = 3;
pub const TECHNIQUE_COUNT: usize = 2;
pub const REMINDER_HEADING: &str = "**Important reminders:**";

pub fn build_advice<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut lines = vec![
        "**Wellness guidance**".to_string(),
        String::new(),
        "**Tips for today:**".to_string(),
    ];
    for (i, tip) in TIPS.choose_multiple(rng, TIP_COUNT).enumerate() {
        lines.push(format!("{}. {tip}", i + 1));
    }

    lines.push(String::new());
    lines.push("**Stress relief techniques:**".to_string());
    for (i, technique) in TECHNIQUES.choose_multiple(rng, TECHNIQUE_COUNT).enumerate() {
        lines.push(format!("{}. {technique}", i + 1));
    }

    lines.push(String::new());
    lines.push(REMINDER_HEADING.to_string());
    lines.push(
        "- If low mood lasts more than two weeks, consider talking to a mental health professional"
            .to_string(),
    );
    lines.push("- Mental health matters as much as physical health".to_string());
    lines.push("- Everyone is different; find what works for you".to_string());
    lines.join("\n")
}
