use serde::{Deserialize, Serialize};

use crate::sync::Category;

/// Relationship scores. `conf` gates everything: without it there is no
/// total and no category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default)]
    pub conf: Option<f64>,
    #[serde(default)]
    pub emo: Option<f64>,
    #[serde(default)]
    pub ene: Option<f64>,
    #[serde(default)]
    pub est: Option<f64>,
    #[serde(default)]
    pub rep: Option<f64>,
}

impl Scores {
    /// `(emo + ene + est + rep) * (1 + conf)`, missing dimensions count as 0.
    pub fn total(&self) -> Option<f64> {
        let conf = self.conf?;
        let sum: f64 = [self.emo, self.ene, self.est, self.rep]
            .iter()
            .map(|v| v.unwrap_or(0.0))
            .sum();
        let total = sum * (1.0 + conf);
        total.is_finite().then_some(total)
    }

    pub fn category(&self) -> Option<Category> {
        let conf = self.conf?;
        let total = self.total().unwrap_or(0.0);

        let category = if conf == -2.0 {
            Category::Maintenance
        } else if conf == 2.0 {
            Category::Heart
        } else if conf == 1.5 {
            Category::Building
        } else if conf == 1.0 {
            Category::Green
        } else if conf == 0.5 {
            Category::UnderConstruction
        } else if conf == -1.0 {
            Category::Red
        } else if total > 0.0 {
            Category::Yellow
        } else {
            Category::White
        };
        Some(category)
    }
}
