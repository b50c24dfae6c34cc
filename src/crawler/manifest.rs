//! Area manifest resolution
//!
//! The manifest is a script that fills two sparse 2-D arrays:
//!
//! ```text
//! secAreaID[0][0]='1';secAreaID[0][1]='2';
//! secAreaName[0][0]='CityA';secAreaName[0][1]='DistrictA';
//! ```
//!
//! Row `i` is a group, column `0` is the group header and every other column
//! is a leaf area whose division is the header's name.

use crate::crawler::fetcher::DocumentFetcher;
use crate::{HarvestError, ManifestError};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// One entry of the manifest index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Area {
    /// Identifier substituted into the page template
    pub id: String,

    /// Display name, used as the district of extracted records
    pub name: String,

    /// Name of the group header; empty for headers themselves
    pub division: String,
}

/// Two-level index of areas: group index -> member index -> area
///
/// Every group is guaranteed to contain its header at member index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestIndex {
    groups: BTreeMap<usize, BTreeMap<usize, Area>>,
}

impl ManifestIndex {
    /// Looks up the area at `[group][member]`
    pub fn get(&self, group: usize, member: usize) -> Option<&Area> {
        self.groups.get(&group)?.get(&member)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Iterates over group headers in group order
    pub fn headers(&self) -> impl Iterator<Item = &Area> {
        self.groups.values().filter_map(|members| members.get(&0))
    }

    /// Iterates over every leaf area (member index != 0) in index order
    pub fn leaves(&self) -> impl Iterator<Item = &Area> {
        self.groups.values().flat_map(|members| {
            members
                .iter()
                .filter(|(member, _)| **member != 0)
                .map(|(_, area)| area)
        })
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Consumes the index, returning the leaf areas in index order
    pub fn into_leaves(self) -> Vec<Area> {
        self.groups
            .into_values()
            .flat_map(|members| {
                members
                    .into_iter()
                    .filter(|(member, _)| *member != 0)
                    .map(|(_, area)| area)
            })
            .collect()
    }
}

fn area_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"secAreaID\[(\d+)\]\[(\d+)\]='((?:[^'\\]|\\.)*)';")
            .expect("area id regex is valid")
    })
}

fn area_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"secAreaName\[(\d+)\]\[(\d+)\]='((?:[^'\\]|\\.)*)';")
            .expect("area name regex is valid")
    })
}

fn coordinate(caps: &Captures<'_>) -> Result<(usize, usize), ManifestError> {
    let parse = |raw: &str| {
        raw.parse::<usize>()
            .map_err(|_| ManifestError::InvalidIndex(raw.to_string()))
    };
    Ok((parse(&caps[1])?, parse(&caps[2])?))
}

/// Resolves backslash escapes in a single-quoted script literal
fn unescape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses manifest text into an index
///
/// Identifiers are read first; names are read second and may reference
/// only coordinates the identifier pass created. Divisions are inherited
/// after all names are known, so a member may be named before its header.
/// Text without any identifier assignment yields an empty index.
///
/// # Errors
///
/// * `ManifestError::MissingGroupHeader` - a group has no `[i][0]` identifier
/// * `ManifestError::UnknownArea` - a name targets an unindexed coordinate
pub fn parse_manifest(text: &str) -> Result<ManifestIndex, ManifestError> {
    let mut groups: BTreeMap<usize, BTreeMap<usize, Area>> = BTreeMap::new();

    for caps in area_id_pattern().captures_iter(text) {
        let (group, member) = coordinate(&caps)?;
        groups.entry(group).or_default().insert(
            member,
            Area {
                id: unescape_literal(&caps[3]),
                ..Area::default()
            },
        );
    }

    if let Some(group) = groups
        .iter()
        .find(|(_, members)| !members.contains_key(&0))
        .map(|(group, _)| *group)
    {
        return Err(ManifestError::MissingGroupHeader { group });
    }

    for caps in area_name_pattern().captures_iter(text) {
        let (group, member) = coordinate(&caps)?;
        let area = groups
            .get_mut(&group)
            .and_then(|members| members.get_mut(&member))
            .ok_or(ManifestError::UnknownArea { group, member })?;
        area.name = unescape_literal(&caps[3]);
    }

    for members in groups.values_mut() {
        let division = members
            .get(&0)
            .map(|header| header.name.clone())
            .unwrap_or_default();
        for (_, area) in members.iter_mut().filter(|(member, _)| **member != 0) {
            area.division = division.clone();
        }
    }

    Ok(ManifestIndex { groups })
}

/// Fetches and parses the manifest at `locator`
///
/// Any failure here is fatal to the run: without a complete index there is
/// no job set to submit.
pub async fn resolve_manifest(
    fetcher: &dyn DocumentFetcher,
    locator: &str,
) -> Result<ManifestIndex, HarvestError> {
    tracing::info!("Resolving manifest from {}", locator);
    let body = fetcher.fetch_manifest(locator).await?;
    let index = parse_manifest(&String::from_utf8_lossy(&body))?;
    if index.group_count() == 0 {
        tracing::warn!("Manifest at {} contains no areas", locator);
    }
    tracing::info!(
        "Manifest resolved: {} groups, {} leaf areas",
        index.group_count(),
        index.leaf_count()
    );
    Ok(index)
}
