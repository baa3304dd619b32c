//! Channel sequence patterns.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{AdImpression, Channel, SearchQuery};

/// Shape of a customer's merged search/display sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencePattern {
    /// Started on display, ended on search.
    DisplayToSearch,
    /// Started on search, ended on display.
    SearchToDisplay,
    /// More than twice as many searches as impressions.
    SearchDominant,
    /// More than twice as many impressions as searches.
    DisplayDominant,
    BalancedInteraction,
    NoPattern,
}

impl SequencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisplayToSearch => "display_to_search",
            Self::SearchToDisplay => "search_to_display",
            Self::SearchDominant => "search_dominant",
            Self::DisplayDominant => "display_dominant",
            Self::BalancedInteraction => "balanced_interaction",
            Self::NoPattern => "no_pattern",
        }
    }
}

impl fmt::Display for SequencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a channel sequence.
///
/// Dominance (strictly more than 2×) is checked before the start/end shape,
/// so a long run of one channel reads as dominant even if the other channel
/// appears at an end.
pub fn classify_sequence(sequence: &[Channel]) -> SequencePattern {
    let (Some(first), Some(last)) = (sequence.first(), sequence.last()) else {
        return SequencePattern::NoPattern;
    };
    let searches = sequence.iter().filter(|c| **c == Channel::Search).count();
    let displays = sequence.len() - searches;

    if searches > displays * 2 {
        SequencePattern::SearchDominant
    } else if displays > searches * 2 {
        SequencePattern::DisplayDominant
    } else if *first == Channel::Display && *last == Channel::Search {
        SequencePattern::DisplayToSearch
    } else if *first == Channel::Search && *last == Channel::Display {
        SequencePattern::SearchToDisplay
    } else {
        SequencePattern::BalancedInteraction
    }
}

/// Merge search and display touchpoints into one chronological channel list.
///
/// On equal timestamps, display precedes search.
pub fn merge_sequence(queries: &[SearchQuery], impressions: &[AdImpression]) -> Vec<Channel> {
    let mut timed: Vec<_> = impressions
        .iter()
        .map(|imp| (imp.timestamp, Channel::Display))
        .chain(queries.iter().map(|q| (q.timestamp, Channel::Search)))
        .collect();
    timed.sort_by_key(|(timestamp, _)| *timestamp);
    timed.into_iter().map(|(_, channel)| channel).collect()
}

/// Count adjacent channel pairs, keyed `<from>_to_<to>`.
pub fn count_transitions(sequence: &[Channel]) -> BTreeMap<String, usize> {
    let mut transitions = BTreeMap::new();
    for pair in sequence.windows(2) {
        *transitions
            .entry(format!("{}_to_{}", pair[0], pair[1]))
            .or_insert(0) += 1;
    }
    transitions
}

/// Most frequent channel; `None` for an empty sequence or a tie.
pub fn dominant_channel(sequence: &[Channel]) -> Option<Channel> {
    let searches = sequence.iter().filter(|c| **c == Channel::Search).count();
    let displays = sequence.len() - searches;
    match searches.cmp(&displays) {
        std::cmp::Ordering::Greater => Some(Channel::Search),
        std::cmp::Ordering::Less => Some(Channel::Display),
        std::cmp::Ordering::Equal => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Channel::{Display as D, Search as S};

    #[test]
    fn display_then_searches_is_display_to_search() {
        assert_eq!(classify_sequence(&[D, S, S]), SequencePattern::DisplayToSearch);
    }

    #[test]
    fn three_searches_one_display_is_search_dominant() {
        assert_eq!(
            classify_sequence(&[S, S, S, D]),
            SequencePattern::SearchDominant
        );
    }

    #[test]
    fn dominance_wins_over_display_start_and_search_end() {
        assert_eq!(
            classify_sequence(&[D, S, S, S]),
            SequencePattern::SearchDominant
        );
        assert_eq!(
            classify_sequence(&[S, D, D, D]),
            SequencePattern::DisplayDominant
        );
    }

    #[test]
    fn exactly_double_is_not_dominant() {
        assert_eq!(classify_sequence(&[S, S, D]), SequencePattern::SearchToDisplay);
        assert_eq!(
            classify_sequence(&[D, S, D, D, S, D]),
            SequencePattern::BalancedInteraction
        );
        assert_eq!(
            classify_sequence(&[D, S, D, D, S, D, D]),
            SequencePattern::DisplayDominant
        );
    }

    #[test]
    fn empty_sequence_has_no_pattern() {
        assert_eq!(classify_sequence(&[]), SequencePattern::NoPattern);
        assert_eq!(dominant_channel(&[]), None);
    }

    #[test]
    fn transitions_count_adjacent_pairs() {
        let transitions = count_transitions(&[S, D, S, S]);
        assert_eq!(transitions["search_to_display"], 1);
        assert_eq!(transitions["display_to_search"], 1);
        assert_eq!(transitions["search_to_search"], 1);
        assert!(!transitions.contains_key("display_to_display"));
    }

    #[test]
    fn dominant_channel_by_count() {
        assert_eq!(dominant_channel(&[S, D, D]), Some(Channel::Display));
        assert_eq!(dominant_channel(&[S, D]), None);
    }

    #[test]
    fn pattern_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SequencePattern::DisplayToSearch).unwrap(),
            r#""display_to_search""#
        );
        assert_eq!(SequencePattern::NoPattern.to_string(), "no_pattern");
    }
}
