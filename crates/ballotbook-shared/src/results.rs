use serde::{Deserialize, Serialize};

/// One party's share of a results group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyTally {
    pub party_id: i64,
    pub party_name: String,
    pub party_short_name: String,
    pub file_path: String,
    pub file_name: String,
    pub votes: i64,
    #[serde(default)]
    pub percentage: f64,
}

/// Fill in `percentage` for every tally and return the group total.
///
/// Every share is 0 when the group has no votes.
pub fn calculate_percentages(tallies: &mut [PartyTally]) -> i64 {
    let total: i64 = tallies.iter().map(|t| t.votes).sum();
    for tally in tallies.iter_mut() {
        tally.percentage = if total > 0 {
            tally.votes as f64 / total as f64 * 100.0
        } else {
            0.0
        };
    }
    total
}

/// Highest vote count first, party id breaking ties.
pub fn sort_by_votes(tallies: &mut [PartyTally]) {
    tallies.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.party_id.cmp(&b.party_id)));
}
