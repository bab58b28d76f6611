//! Nutrition strategies and meal suggestions.

use crate::catalog::{PlanGoal, PlanRequest};

pub struct Strategy {
    pub title: &'static str,
    pub principles: &'static [&'static str],
    /// `(meal, suggestion)` pairs.
    pub meals: &'static [(&'static str, &'static str)],
}

static WEIGHT_LOSS: Strategy = Strategy {
    title: "Weight loss nutrition strategy",
    principles: &[
        "Create a calorie deficit of 300-500 kcal a day",
        "Eat more protein to preserve muscle",
        "Choose high-fibre foods to stay full longer",
        "Limit refined sugar and processed food",
    ],
    meals: &[
        ("Breakfast", "Oats with fruit and nuts, or wholegrain toast with eggs and milk"),
        ("Lunch", "Lean meat or fish with vegetables and brown rice or wholegrain noodles"),
        ("Dinner", "Steamed egg or tofu with plenty of vegetables and a small portion of grains"),
        ("Snack", "An apple, yoghurt, or a small handful of nuts"),
    ],
};

static MUSCLE_GAIN: Strategy = Strategy {
    title: "Muscle gain nutrition strategy",
    principles: &[
        "Eat a calorie surplus of 300-500 kcal a day",
        "Aim for 1.6-2.2 g of protein per kg of body weight",
        "Eat enough carbohydrates to fuel training",
        "Get 20-30% of calories from healthy fats",
    ],
    meals: &[
        ("Breakfast", "Eggs, wholegrain toast, milk, and a banana"),
        ("Pre-workout", "Banana with oats for energy"),
        ("Post-workout", "Protein shake with fruit to aid recovery"),
        ("Lunch", "Chicken breast with brown rice, vegetables, and avocado"),
        ("Dinner", "Fish with sweet potato and leafy greens"),
    ],
};

static GENERAL_HEALTH: Strategy = Strategy {
    title: "Healthy eating strategy",
    principles: &[
        "Eat a balanced and varied diet",
        "Keep portions moderate",
        "Eat plenty of fresh fruit and vegetables",
        "Drink enough water",
    ],
    meals: &[
        ("Breakfast", "Whole grains with protein and fruit"),
        ("Lunch", "Lean meat with vegetables and whole grains"),
        ("Dinner", "Fish with vegetables and a small portion of grains"),
        ("Snack", "Nuts, fruit, or yoghurt"),
    ],
};

pub const HYDRATION_LINE: &str = "**Hydration**: 8-10 cups of water a day";
pub const SAFETY_LINE: &str =
    "**Note**: if you have a medical condition, consult a registered dietitian";

pub fn strategy_for(goal: PlanGoal) -> &'static Strategy {
    match goal {
        PlanGoal::WeightLoss => &WEIGHT_LOSS,
        PlanGoal::MuscleGain => &MUSCLE_GAIN,
        PlanGoal::Endurance | PlanGoal::General => &GENERAL_HEALTH,
    }
}

pub fn build_plan(request: &PlanRequest) -> String {
    let strategy = strategy_for(request.goal);
    let mut lines = vec![
        "**Personal nutrition plan**".to_string(),
        String::new(),
        format!("**{}**", strategy.title),
        String::new(),
        "**Principles:**".to_string(),
    ];
    for (i, principle) in strategy.principles.iter().enumerate() {
        lines.push(format!("{}. {principle}", i + 1));
    }

    lines.push(String::new());
    lines.push("**Daily meal suggestions:**".to_string());
    for (meal, suggestion) in strategy.meals {
        lines.push(format!("**{meal}**: {suggestion}"));
    }

    if let Some(prefs) = request.dietary_preferences.as_deref().filter(|p| !p.is_empty()) {
        lines.push(String::new());
        lines.push(format!("**Your preferences**: {prefs}"));
    }

    lines.push(String::new());
    lines.push(HYDRATION_LINE.to_string());
    lines.push(SAFETY_LINE.to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muscle_gain_lists_all_meals() {
        let request = PlanRequest {
            goal: PlanGoal::MuscleGain,
            ..Default::default()
        };
        let plan = build_plan(&request);
        assert!(plan.contains("Muscle gain nutrition strategy"));
        assert_eq!(plan.matches("**Pre-workout**").count(), 1);
        assert!(plan.contains(HYDRATION_LINE));
        assert!(plan.ends_with(SAFETY_LINE));
        assert!(!plan.contains("Your preferences"));
    }

    #[test]
    fn preferences_line_when_present() {
        let request = PlanRequest {
            dietary_preferences: Some("vegan".into()),
            ..Default::default()
        };
        let plan = build_plan(&request);
        assert!(plan.contains("Healthy eating strategy"));
        assert!(plan.contains("**Your preferences**: vegan"));
    }
}
