//! Drill-through reporting over pre-aggregated results rows.
//!
//! The results view already carries, on every (constituency, party) row, the
//! party's vote at each geographic level. Building a level therefore means
//! grouping rows by that level's location and taking the maximum of the
//! matching vote column per party; no summing happens here.
//!
//! Levels, from the top:
//! - **national**: party totals for the whole evaluation
//! - **division**: one group per division
//! - **district**: one group per district inside a division
//! - **constituency**: one group per seat inside a district

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{LABEL_DIVISIONS, LABEL_VIEW_CONSTITUENCIES, LABEL_VIEW_DISTRICTS};
use crate::results::{calculate_percentages, sort_by_votes, PartyTally};

/// One row of the results view: a party's standing in one constituency,
/// plus that party's pre-aggregated totals at the enclosing levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastResultRow {
    pub election_evaluation_id: i64,
    pub evaluation_name: String,
    pub party_id: i64,
    pub party_name: String,
    pub party_symbol_name: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub division_id: i64,
    pub division_name: String,
    pub division_name_en: Option<String>,
    pub district_id: i64,
    pub district_name: String,
    pub district_name_en: Option<String>,
    pub constituency_id: i64,
    pub constituency_name: String,
    pub seat_number: Option<String>,
    pub national_party_vote: i64,
    pub division_party_vote: i64,
    pub district_party_vote: i64,
    pub seat_party_vote: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillLevel {
    National,
    Division,
    District,
    Constituency,
}

/// Query-string parameters of a drill-through request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DrillQuery {
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub division_id: Option<i64>,
    #[serde(default)]
    pub district_id: Option<i64>,
}

impl DrillQuery {
    pub fn level(&self) -> DrillLevel {
        if self.view.as_deref() == Some("divisions") {
            return DrillLevel::Division;
        }
        match (self.division_id, self.district_id) {
            (Some(_), Some(_)) => DrillLevel::Constituency,
            (Some(_), None) => DrillLevel::District,
            _ => DrillLevel::National,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub name: String,
    pub url: Option<String>,
}

impl Breadcrumb {
    fn link(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    fn current(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }
}

/// Results for one location at the division, district or constituency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGroup {
    pub location_id: i64,
    pub heading: String,
    pub total_votes: i64,
    pub parties: Vec<PartyTally>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drilldown_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drilldown_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrillResults {
    Parties(Vec<PartyTally>),
    Groups(Vec<LocationGroup>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillThroughReport {
    pub election_evaluation_id: i64,
    pub evaluation_name: String,
    pub drill_level: DrillLevel,
    pub results: DrillResults,
    pub breadcrumb: Vec<Breadcrumb>,
    pub back_url: Option<String>,
    /// Only reported at the national level.
    pub total_votes: Option<i64>,
}

/// Build the report for `query` from every results row of one evaluation.
///
/// `base_path` is the path the report is served under; drill-down and
/// breadcrumb links are relative query strings appended to it.
pub fn build_report(
    election_evaluation_id: i64,
    rows: &[PastResultRow],
    query: &DrillQuery,
    base_path: &str,
) -> DrillThroughReport {
    let evaluation_name = rows
        .first()
        .map(|r| r.evaluation_name.clone())
        .unwrap_or_else(|| format!("Election {election_evaluation_id}"));

    let level = query.level();
    let mut total_votes = None;

    let (results, breadcrumb, back_url) = match level {
        DrillLevel::National => {
            let mut parties = aggregate_parties(rows.iter(), |r| r.national_party_vote);
            total_votes = Some(calculate_percentages(&mut parties));
            (
                DrillResults::Parties(parties),
                vec![Breadcrumb::current(evaluation_name.clone())],
                None,
            )
        }
        DrillLevel::Division => {
            let groups = group_by_location(
                rows.iter(),
                |r| (r.division_id, r.division_name.as_str()),
                |r| r.division_party_vote,
            )
            .into_iter()
            .map(|g| {
                let mut group = g.into_group();
                group.drilldown_url = Some(format!("{base_path}?division_id={}", group.location_id));
                group.drilldown_text = Some(LABEL_VIEW_DISTRICTS.to_string());
                group
            })
            .collect();
            (
                DrillResults::Groups(groups),
                vec![
                    Breadcrumb::link(evaluation_name.clone(), base_path),
                    Breadcrumb::current(LABEL_DIVISIONS),
                ],
                Some(base_path.to_string()),
            )
        }
        DrillLevel::District => {
            let division_id = query.division_id.unwrap_or_default();
            let filtered: Vec<&PastResultRow> =
                rows.iter().filter(|r| r.division_id == division_id).collect();
            let division_label = filtered
                .first()
                .map(|r| bilingual_label(&r.division_name, r.division_name_en.as_deref()))
                .unwrap_or_default();

            let groups = group_by_location(
                filtered.iter().copied(),
                |r| (r.district_id, r.district_name.as_str()),
                |r| r.district_party_vote,
            )
            .into_iter()
            .map(|g| {
                let mut group = g.into_group();
                group.drilldown_url = Some(format!(
                    "{base_path}?division_id={division_id}&district_id={}",
                    group.location_id
                ));
                group.drilldown_text = Some(LABEL_VIEW_CONSTITUENCIES.to_string());
                group
            })
            .collect();
            (
                DrillResults::Groups(groups),
                vec![
                    Breadcrumb::link(evaluation_name.clone(), base_path),
                    Breadcrumb::link(LABEL_DIVISIONS, format!("{base_path}?view=divisions")),
                    Breadcrumb::current(division_label),
                ],
                Some(format!("{base_path}?view=divisions")),
            )
        }
        DrillLevel::Constituency => {
            let division_id = query.division_id.unwrap_or_default();
            let district_id = query.district_id.unwrap_or_default();
            let filtered: Vec<&PastResultRow> = rows
                .iter()
                .filter(|r| r.division_id == division_id && r.district_id == district_id)
                .collect();
            let (division_label, district_label) = filtered
                .first()
                .map(|r| {
                    (
                        bilingual_label(&r.division_name, r.division_name_en.as_deref()),
                        bilingual_label(&r.district_name, r.district_name_en.as_deref()),
                    )
                })
                .unwrap_or_default();

            let groups = group_by_location(
                filtered.iter().copied(),
                |r| (r.constituency_id, r.constituency_name.as_str()),
                |r| r.seat_party_vote,
            )
            .into_iter()
            .map(|g| {
                let heading = match g.first.seat_number.as_deref() {
                    Some(seat) if !seat.is_empty() => Some(format!("{seat} — {}", g.name)),
                    _ => None,
                };
                let mut group = g.into_group();
                if let Some(heading) = heading {
                    group.heading = heading;
                }
                group
            })
            .collect();
            (
                DrillResults::Groups(groups),
                vec![
                    Breadcrumb::link(evaluation_name.clone(), base_path),
                    Breadcrumb::link(LABEL_DIVISIONS, format!("{base_path}?view=divisions")),
                    Breadcrumb::link(division_label, format!("{base_path}?division_id={division_id}")),
                    Breadcrumb::current(district_label),
                ],
                Some(format!("{base_path}?division_id={division_id}")),
            )
        }
    };

    DrillThroughReport {
        election_evaluation_id,
        evaluation_name,
        drill_level: level,
        results,
        breadcrumb,
        back_url,
        total_votes,
    }
}

struct Grouped<'a> {
    id: i64,
    name: String,
    first: &'a PastResultRow,
    parties: Vec<PartyTally>,
}

impl Grouped<'_> {
    fn into_group(self) -> LocationGroup {
        let mut parties = self.parties;
        let total_votes = calculate_percentages(&mut parties);
        LocationGroup {
            location_id: self.id,
            heading: self.name,
            total_votes,
            parties,
            drilldown_url: None,
            drilldown_text: None,
        }
    }
}

fn group_by_location<'a, I, K, V>(rows: I, key: K, votes_of: V) -> Vec<Grouped<'a>>
where
    I: Iterator<Item = &'a PastResultRow>,
    K: Fn(&'a PastResultRow) -> (i64, &'a str),
    V: Fn(&PastResultRow) -> i64 + Copy,
{
    let mut buckets: BTreeMap<i64, Vec<&'a PastResultRow>> = BTreeMap::new();
    for row in rows {
        buckets.entry(key(row).0).or_default().push(row);
    }

    let mut groups: Vec<Grouped<'a>> = buckets
        .into_iter()
        .map(|(id, members)| {
            let first = members[0];
            Grouped {
                id,
                name: key(first).1.to_string(),
                first,
                parties: aggregate_parties(members.into_iter(), votes_of),
            }
        })
        .collect();

    groups.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    groups
}

fn aggregate_parties<'a, I, V>(rows: I, votes_of: V) -> Vec<PartyTally>
where
    I: Iterator<Item = &'a PastResultRow>,
    V: Fn(&PastResultRow) -> i64,
{
    let mut by_party: BTreeMap<i64, PartyTally> = BTreeMap::new();
    for row in rows {
        let votes = votes_of(row);
        by_party
            .entry(row.party_id)
            .and_modify(|t| t.votes = t.votes.max(votes))
            .or_insert_with(|| PartyTally {
                party_id: row.party_id,
                party_name: row.party_name.clone(),
                party_short_name: row.party_symbol_name.clone().unwrap_or_default(),
                file_path: row.file_path.clone().unwrap_or_default(),
                file_name: row.file_name.clone().unwrap_or_default(),
                votes,
                percentage: 0.0,
            });
    }

    let mut tallies: Vec<PartyTally> = by_party.into_values().collect();
    sort_by_votes(&mut tallies);
    tallies
}

fn bilingual_label(native: &str, english: Option<&str>) -> String {
    match english {
        Some(en) if !en.is_empty() => format!("{native} ({en})"),
        _ => native.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two divisions, three districts, four seats, two parties.
    fn fixture() -> Vec<PastResultRow> {
        // (division, district, constituency, seat, party, seat votes)
        let seats = [
            (1, 10, 100, "১", 1, 40),
            (1, 10, 100, "১", 2, 60),
            (1, 11, 110, "২", 1, 25),
            (1, 11, 110, "২", 2, 5),
            (2, 20, 200, "৩", 1, 10),
            (2, 20, 200, "৩", 2, 30),
            (2, 20, 201, "", 1, 15),
            (2, 20, 201, "", 2, 15),
        ];

        let seat_total = |filter: &dyn Fn(i64, i64, i64) -> bool, party: i64| -> i64 {
            seats
                .iter()
                .filter(|s| s.4 == party && filter(s.0, s.1, s.2))
                .map(|s| s.5)
                .sum()
        };

        seats
            .iter()
            .map(|&(div, dist, cons, seat, party, votes)| PastResultRow {
                election_evaluation_id: 3,
                evaluation_name: "সংসদ নির্বাচন".to_string(),
                party_id: party,
                party_name: format!("দল {party}"),
                party_symbol_name: Some(format!("প্রতীক {party}")),
                file_path: None,
                file_name: Some(format!("party{party}.png")),
                division_id: div,
                division_name: format!("বিভাগ {div}"),
                division_name_en: Some(format!("Division {div}")),
                district_id: dist,
                district_name: format!("জেলা {dist}"),
                district_name_en: if dist == 20 { None } else { Some(format!("District {dist}")) },
                constituency_id: cons,
                constituency_name: format!("আসন {cons}"),
                seat_number: if seat.is_empty() { None } else { Some(seat.to_string()) },
                national_party_vote: seat_total(&|_, _, _| true, party),
                division_party_vote: seat_total(&|d, _, _| d == div, party),
                district_party_vote: seat_total(&|_, d, _| d == dist, party),
                seat_party_vote: votes,
            })
            .collect()
    }

    fn groups(report: &DrillThroughReport) -> &[LocationGroup] {
        match &report.results {
            DrillResults::Groups(g) => g,
            DrillResults::Parties(_) => panic!("expected groups"),
        }
    }

    #[test]
    fn test_level_dispatch() {
        let q = |view: Option<&str>, div: Option<i64>, dist: Option<i64>| DrillQuery {
            view: view.map(str::to_string),
            division_id: div,
            district_id: dist,
        };
        assert_eq!(q(None, None, None).level(), DrillLevel::National);
        assert_eq!(q(Some("divisions"), Some(1), Some(2)).level(), DrillLevel::Division);
        assert_eq!(q(None, Some(1), None).level(), DrillLevel::District);
        assert_eq!(q(None, Some(1), Some(10)).level(), DrillLevel::Constituency);
        assert_eq!(q(None, None, Some(10)).level(), DrillLevel::National);
    }

    #[test]
    fn test_national_votes_sum_to_total() {
        let rows = fixture();
        let report = build_report(3, &rows, &DrillQuery::default(), "/past-results/3/");

        assert_eq!(report.drill_level, DrillLevel::National);
        assert_eq!(report.evaluation_name, "সংসদ নির্বাচন");
        assert_eq!(report.back_url, None);

        let DrillResults::Parties(parties) = &report.results else {
            panic!("expected parties");
        };
        let sum: i64 = parties.iter().map(|p| p.votes).sum();
        assert_eq!(Some(sum), report.total_votes);
        assert_eq!(sum, 200);

        // Party 2 leads nationally: 60 + 5 + 30 + 15 = 110.
        assert_eq!(parties[0].party_id, 2);
        assert_eq!(parties[0].votes, 110);
        assert_eq!(parties[0].party_short_name, "প্রতীক 2");
        assert!((parties[0].percentage - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_division_level_groups() {
        let rows = fixture();
        let query = DrillQuery {
            view: Some("divisions".into()),
            ..Default::default()
        };
        let report = build_report(3, &rows, &query, "/p/3/");
        let groups = groups(&report);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].heading, "বিভাগ 1");
        assert_eq!(groups[0].total_votes, 130);
        assert_eq!(groups[0].drilldown_url.as_deref(), Some("/p/3/?division_id=1"));
        assert_eq!(groups[1].total_votes, 70);
        assert_eq!(report.total_votes, None);
        assert_eq!(report.back_url.as_deref(), Some("/p/3/"));
        assert_eq!(report.breadcrumb.len(), 2);
        assert_eq!(report.breadcrumb[1].url, None);
    }

    #[test]
    fn test_district_level_filters_division() {
        let rows = fixture();
        let query = DrillQuery {
            division_id: Some(1),
            ..Default::default()
        };
        let report = build_report(3, &rows, &query, "/p/3/");
        let groups = groups(&report);

        assert_eq!(report.drill_level, DrillLevel::District);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].location_id, 10);
        assert_eq!(
            groups[0].drilldown_url.as_deref(),
            Some("/p/3/?division_id=1&district_id=10")
        );
        assert_eq!(groups[1].parties[0].party_id, 1);
        assert_eq!(report.breadcrumb[2].name, "বিভাগ 1 (Division 1)");
        assert_eq!(report.back_url.as_deref(), Some("/p/3/?view=divisions"));
    }

    #[test]
    fn test_constituency_level_headings() {
        let rows = fixture();
        let query = DrillQuery {
            division_id: Some(2),
            district_id: Some(20),
            ..Default::default()
        };
        let report = build_report(3, &rows, &query, "/p/3/");
        let groups = groups(&report);

        assert_eq!(report.drill_level, DrillLevel::Constituency);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].heading, "৩ — আসন 200");
        assert_eq!(groups[0].drilldown_url, None);
        assert_eq!(groups[1].heading, "আসন 201");
        // Tied seat: equal shares.
        assert!((groups[1].parties[0].percentage - 50.0).abs() < 1e-9);
        // District without an English name keeps the native label only.
        assert_eq!(report.breadcrumb[3].name, "জেলা 20");
        assert_eq!(report.back_url.as_deref(), Some("/p/3/?division_id=2"));
    }

    #[test]
    fn test_unknown_evaluation_falls_back() {
        let report = build_report(42, &[], &DrillQuery::default(), "/p/42/");
        assert_eq!(report.evaluation_name, "Election 42");
        assert_eq!(report.total_votes, Some(0));
        assert_eq!(report.results, DrillResults::Parties(Vec::new()));
    }

    #[test]
    fn test_report_serializes_flat_results() {
        let rows = fixture();
        let report = build_report(3, &rows, &DrillQuery::default(), "/p/3/");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["drill_level"], "national");
        assert!(json["results"].is_array());
        assert_eq!(json["results"][0]["votes"], 110);
    }
}
