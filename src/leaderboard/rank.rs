use serde::Serialize;

/// Decoration for a leaderboard position. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankBadge {
    Gold,
    Silver,
    Bronze,
    Fourth,
    Fifth,
    Plain,
}

impl RankBadge {
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => RankBadge::Gold,
            2 => RankBadge::Silver,
            3 => RankBadge::Bronze,
            4 => RankBadge::Fourth,
            5 => RankBadge::Fifth,
            _ => RankBadge::Plain,
        }
    }

    /// Medal glyph for the podium; other ranks show their number.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            RankBadge::Gold => Some("🥇"),
            RankBadge::Silver => Some("🥈"),
            RankBadge::Bronze => Some("🥉"),
            _ => None,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            RankBadge::Gold => "rank-gold",
            RankBadge::Silver => "rank-silver",
            RankBadge::Bronze => "rank-bronze",
            RankBadge::Fourth => "rank-fourth",
            RankBadge::Fifth => "rank-fifth",
            RankBadge::Plain => "rank-plain",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badges_by_rank() {
        assert_eq!(RankBadge::for_rank(1).marker(), Some("🥇"));
        assert_eq!(RankBadge::for_rank(3).marker(), Some("🥉"));
        assert_eq!(RankBadge::for_rank(4), RankBadge::Fourth);
        assert_eq!(RankBadge::for_rank(5).css_class(), "rank-fifth");
        assert_eq!(RankBadge::for_rank(6), RankBadge::Plain);
        assert_eq!(RankBadge::for_rank(120).marker(), None);
    }
}
