//! The per-team stats widget: the [`Stats`] document and its rendering into a
//! four-row label/value grid.

use serde::Deserialize;
use serde_json::Value;

/// The teams whose widgets are shown when the project doesn't list any.
pub const DEFAULT_TEAMS: [&str; 2] = ["dolphins", "wizards"];

/// A team's latest-game summary. Every field is an opaque display value (a
/// string or a number); nothing is validated.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Stats {
    #[serde(default)]
    pub opponent: Value,

    #[serde(default)]
    pub team_score: Value,

    #[serde(default)]
    pub opp_score: Value,

    #[serde(default)]
    pub key_stat: Value,

    #[serde(default)]
    pub notes: Value,
}

impl Stats {
    pub fn parse(input: &str) -> serde_json::Result<Stats> {
        serde_json::from_str(input)
    }

    /// Renders the widget body.
    pub fn render(&self) -> String {
        let rows = [
            ("Opponent:", display(&self.opponent)),
            (
                "Score:",
                format!("{}–{}", display(&self.team_score), display(&self.opp_score)),
            ),
            ("Key stat:", display(&self.key_stat)),
            ("Notes:", display(&self.notes)),
        ];

        let mut html = String::from(r#"<div class="stats-grid">"#);
        for (label, value) in rows.iter() {
            html.push_str(&format!(
                r#"<div class="stats-label">{}</div><div>{}</div>"#,
                label, value
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// Appended to a team identifier to name its widget's region.
pub const REGION_SUFFIX: &str = "-stats";

/// The region of the page that holds `team`'s widget.
pub fn region_id(team: &str) -> String {
    format!("{}{}", team, REGION_SUFFIX)
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
