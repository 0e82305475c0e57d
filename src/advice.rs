//! Reasons and recommendation text, driven by ordered rule tables.
//!
//! Each table is walked top to bottom. Reason groups contribute at most one
//! sentence each (first matching rule wins); recommendation tables collect
//! every matching rule and keep the first few.

use crate::features::{near_popular_plane, near_sso};
use crate::risk::HIGH_FROM;
use crate::types::{FeatureVector, OrbitParameters, RiskLevel, ScoredOption};

pub const MAX_REASONS: usize = 3;
const MAX_TIPS: usize = 2;
const MAX_ACTIONS: usize = 3;

/// What the rules look at: the requested orbit, its features and its risk.
#[derive(Debug, Clone, Copy)]
pub struct Assessment {
    pub params: OrbitParameters,
    pub feats: FeatureVector,
    pub risk: f64,
}

impl Assessment {
    fn alt_in(&self, lo: f64, hi: f64) -> bool {
        (lo..=hi).contains(&self.params.altitude_km)
    }
}

pub struct Rule {
    pub when: fn(&Assessment) -> bool,
    pub text: &'static str,
}

// ---------- Reasons ----------

const CONGESTION_REASONS: &[Rule] = &[
    Rule {
        when: |a| a.feats.congestion >= 0.75,
        text: "High orbital congestion in the selected altitude shell.",
    },
    Rule {
        when: |a| a.feats.congestion >= 0.50,
        text: "Orbital congestion is above average at this altitude.",
    },
];

const ALTITUDE_REASONS: &[Rule] = &[
    Rule {
        when: |a| a.alt_in(530.0, 580.0),
        text: "Altitude is close to the dense LEO shell (~550 km) where many active satellites operate.",
    },
    Rule {
        when: |a| a.alt_in(590.0, 640.0),
        text: "The 600-640 km range often carries crossing traffic and medium-to-high mission density.",
    },
];

const INCLINATION_REASONS: &[Rule] = &[
    Rule {
        when: |a| near_sso(a.params.inclination_deg),
        text: "Inclination is close to SSO (97-99°): these orbits cross often and are crowded.",
    },
    Rule {
        when: |a| near_popular_plane(a.params.inclination_deg),
        text: "Inclination is close to a popular plane (~53°), which raises the chance of crossings.",
    },
];

const VELOCITY_REASONS: &[Rule] = &[
    Rule {
        when: |a| a.feats.relative_velocity >= 7.9,
        text: "Estimated relative velocity is elevated: crossing trajectories make close approaches riskier.",
    },
    Rule {
        when: |a| a.feats.relative_velocity >= 7.7,
        text: "Estimated relative velocity is slightly above average, which adds risk at high density.",
    },
];

pub const REASON_GROUPS: &[&[Rule]] = &[
    CONGESTION_REASONS,
    ALTITUDE_REASONS,
    INCLINATION_REASONS,
    VELOCITY_REASONS,
];

const FALLBACK_REASON: &str =
    "This combination of parameters raises the chance of crossing other orbital planes.";

pub fn compose_reasons(a: &Assessment) -> Vec<String> {
    let mut reasons: Vec<String> = REASON_GROUPS
        .iter()
        .filter_map(|group| group.iter().find(|r| (r.when)(a)))
        .map(|r| r.text.to_string())
        .collect();

    if reasons.is_empty() && a.risk >= HIGH_FROM {
        reasons.push(FALLBACK_REASON.to_string());
    }
    reasons.truncate(MAX_REASONS);
    reasons
}

// ---------- Recommendation ----------

pub const MEDIUM_TIPS: &[Rule] = &[
    Rule {
        when: |a| a.feats.congestion >= 0.5,
        text: "shift the altitude by 20-60 km into a less congested shell",
    },
    Rule {
        when: |a| near_sso(a.params.inclination_deg),
        text: "avoid the exact SSO center (try ±0.5-1.5°)",
    },
    Rule {
        when: |a| a.feats.relative_velocity >= 7.7,
        text: "reduce plane crossings with a small inclination change",
    },
];

const MEDIUM_DEFAULT: &str = "locally optimize altitude/inclination around the current values";

pub const HIGH_ACTIONS: &[Rule] = &[
    Rule {
        when: |a| a.feats.congestion >= 0.75 || a.alt_in(530.0, 580.0),
        text: "change the altitude by 30-100 km to leave the dense shell",
    },
    Rule {
        when: |a| near_sso(a.params.inclination_deg) || near_popular_plane(a.params.inclination_deg),
        text: "adjust the inclination by 0.5-2° to reduce crossings",
    },
    Rule {
        when: |a| a.feats.relative_velocity >= 7.9,
        text: "prefer parameters with lower relative velocity (less crossing traffic)",
    },
];

const HIGH_DEFAULT: &str = "revisit the orbit parameters and perform an extended search for safe combinations";

const LOW_TEXT: &str = "Risk is low. The orbit looks acceptable. \
Conjunction screening is still recommended, along with a small maneuver margin for the mission.";

const HIGH_CAVEAT: &str = "If the parameters cannot be changed, plan for active conjunction \
monitoring and a maneuver budget.";

fn collect(rules: &[Rule], a: &Assessment, limit: usize, fallback: &str) -> String {
    let picked: Vec<&str> = rules
        .iter()
        .filter(|r| (r.when)(a))
        .take(limit)
        .map(|r| r.text)
        .collect();
    if picked.is_empty() {
        fallback.to_string()
    } else {
        picked.join(", ")
    }
}

/// Text for the requested orbit. `best` is the top alternative, if the search
/// produced one; without it the text makes no alternative reference.
pub fn compose_recommendation(a: &Assessment, level: RiskLevel, best: Option<&ScoredOption>) -> String {
    match level {
        RiskLevel::Low => LOW_TEXT.to_string(),
        RiskLevel::Medium => {
            let tips = collect(MEDIUM_TIPS, a, MAX_TIPS, MEDIUM_DEFAULT);
            let mut text = format!(
                "Risk is medium. The orbit is feasible, but lowering the risk is advisable. Best step: {}.",
                tips
            );
            if let Some(b) = best {
                text.push_str(&format!(
                    " By the system's estimate, a safer option right now is {} km / {}°.",
                    b.altitude, b.inclination
                ));
            }
            text
        }
        RiskLevel::High => {
            let actions = collect(HIGH_ACTIONS, a, MAX_ACTIONS, HIGH_DEFAULT);
            let mut text = format!(
                "Risk is high. Do NOT lock in the current orbit as final without adjustments. \
                 Recommended actions: {}.",
                actions
            );
            if let Some(b) = best {
                text.push_str(&format!(
                    " Safer option by calculation: {} km / {}° (normalized risk {:.1}%).",
                    b.altitude,
                    b.inclination,
                    b.risk_score * 100.0
                ));
            }
            text.push(' ');
            text.push_str(HIGH_CAVEAT);
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Factors;

    fn assess(alt: f64, inc: f64, congestion: f64, relative_velocity: f64, risk: f64) -> Assessment {
        Assessment {
            params: OrbitParameters::new(alt, inc),
            feats: FeatureVector { congestion, relative_velocity },
            risk,
        }
    }

    fn best() -> ScoredOption {
        ScoredOption {
            altitude: 470.0,
            inclination: 94.5,
            risk_score: 0.2341,
            note: "lower congestion".to_string(),
            factors: Factors { congestion: 0.3, relative_velocity: 7.6 },
        }
    }

    #[test]
    fn test_reasons_in_precedence_order_and_capped() {
        let a = assess(550.0, 97.5, 0.95, 7.95, 0.9);
        let r = compose_reasons(&a);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0], CONGESTION_REASONS[0].text);
        assert_eq!(r[1], ALTITUDE_REASONS[0].text);
        assert_eq!(r[2], INCLINATION_REASONS[0].text);
    }

    #[test]
    fn test_each_group_fires_once() {
        let a = assess(1000.0, 53.0, 0.6, 7.8, 0.5);
        let r = compose_reasons(&a);
        assert_eq!(
            r,
            vec![
                CONGESTION_REASONS[1].text.to_string(),
                INCLINATION_REASONS[1].text.to_string(),
                VELOCITY_REASONS[1].text.to_string(),
            ]
        );
    }

    #[test]
    fn test_crossing_band_reason() {
        let a = assess(620.0, 30.0, 0.3, 7.5, 0.2);
        assert_eq!(compose_reasons(&a), vec![ALTITUDE_REASONS[1].text.to_string()]);
    }

    #[test]
    fn test_fallback_only_when_high_and_silent() {
        let high = assess(1000.0, 30.0, 0.2, 7.5, 0.66);
        assert_eq!(compose_reasons(&high), vec![FALLBACK_REASON.to_string()]);
        let medium = assess(1000.0, 30.0, 0.2, 7.5, 0.65);
        assert!(compose_reasons(&medium).is_empty());
    }

    #[test]
    fn test_low_text_has_no_numbers() {
        let a = assess(800.0, 20.0, 0.18, 7.8, 0.1);
        let t = compose_recommendation(&a, RiskLevel::Low, Some(&best()));
        assert_eq!(t, LOW_TEXT);
        assert!(!t.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_medium_tips_capped_at_two() {
        let a = assess(700.0, 97.0, 0.55, 7.75, 0.5);
        let t = compose_recommendation(&a, RiskLevel::Medium, Some(&best()));
        assert!(t.contains(MEDIUM_TIPS[0].text));
        assert!(t.contains(MEDIUM_TIPS[1].text));
        assert!(!t.contains(MEDIUM_TIPS[2].text));
        assert!(t.contains("470 km / 94.5°"));
    }

    #[test]
    fn test_medium_default_tip() {
        let a = assess(1000.0, 30.0, 0.2, 7.5, 0.5);
        let t = compose_recommendation(&a, RiskLevel::Medium, Some(&best()));
        assert!(t.contains(MEDIUM_DEFAULT));
    }

    #[test]
    fn test_high_references_best_with_percentage() {
        let a = assess(550.0, 97.5, 1.0, 7.45, 0.97);
        let t = compose_recommendation(&a, RiskLevel::High, Some(&best()));
        assert!(t.contains(HIGH_ACTIONS[0].text));
        assert!(t.contains(HIGH_ACTIONS[1].text));
        assert!(!t.contains(HIGH_ACTIONS[2].text));
        assert!(t.contains("470 km / 94.5° (normalized risk 23.4%)"));
        assert!(t.ends_with(HIGH_CAVEAT));
    }

    #[test]
    fn test_high_default_action_and_caveat() {
        let a = assess(1000.0, 30.0, 0.2, 7.5, 0.9);
        let t = compose_recommendation(&a, RiskLevel::High, Some(&best()));
        assert!(t.contains(HIGH_DEFAULT));
        assert!(t.ends_with(HIGH_CAVEAT));
    }

    #[test]
    fn test_missing_best_drops_alternative_sentence() {
        let a = assess(550.0, 97.5, 1.0, 7.45, 0.97);
        let high = compose_recommendation(&a, RiskLevel::High, None);
        assert!(!high.contains("Safer option"));
        assert!(high.ends_with(HIGH_CAVEAT));
        let medium = compose_recommendation(&a, RiskLevel::Medium, None);
        assert!(!medium.contains("safer option"));
    }
}
