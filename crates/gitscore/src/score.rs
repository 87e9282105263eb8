//! Contribution score arithmetic.
//!
//! The score of one repository is `round(RIS * (CQS + PPB))`:
//!
//! - RIS, repository importance: `log2(stars + 1) * 2 + log2(forks + 1) * 1.5 + contributors * 0.5`
//! - CQS, contribution quality: `commits * 2 + additions / 100`
//! - PPB, production participation bonus: `production_commits * 5`

use serde::{Deserialize, Serialize};

/// Inputs for one repository.
///
/// Serializes with camelCase keys, the shape the on-chain scoring contract
/// takes as input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoMetrics {
    pub stars: u64,
    pub forks: u64,
    pub contributors: u64,
    pub commits_by_user: u64,
    pub total_additions: u64,
    /// Commits touching `src/` or `lib/`.
    pub production_commits: u64,
}

/// Score components for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContributionScore {
    pub ris: f64,
    pub cqs: f64,
    pub ppb: f64,
    #[serde(rename = "final")]
    pub final_score: u64,
}

pub fn repository_importance(stars: u64, forks: u64, contributors: u64) -> f64 {
    (stars as f64 + 1.0).log2() * 2.0 + (forks as f64 + 1.0).log2() * 1.5 + contributors as f64 * 0.5
}

pub fn contribution_quality(commits: u64, additions: u64) -> f64 {
    commits as f64 * 2.0 + additions as f64 / 100.0
}

pub fn production_bonus(production_commits: u64) -> f64 {
    production_commits as f64 * 5.0
}

impl RepoMetrics {
    pub fn score(&self) -> ContributionScore {
        let ris = repository_importance(self.stars, self.forks, self.contributors);
        let cqs = contribution_quality(self.commits_by_user, self.total_additions);
        let ppb = production_bonus(self.production_commits);

        ContributionScore {
            ris,
            cqs,
            ppb,
            final_score: (ris * (cqs + ppb)).round() as u64,
        }
    }
}
