//! Format resolver.
//!
//! Pure template substitution: scans a filename or caption for
//! season/episode/quality markers and fills the user's template tokens.
//! No state, no I/O — same inputs always produce the same output.
//!
//! Recognized template tokens (literal, case-sensitive):
//! - `[SE.NUM]` - season number, zero-padded to two digits
//! - `[EP.NUM]` - episode number, zero-padded to two digits
//! - `[QUALITY]` - quality marker as it appeared in the source text
//!
//! Tokens with no detected value are left in the output untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Season token in user templates.
pub const SEASON_TOKEN: &str = "[SE.NUM]";
/// Episode token in user templates.
pub const EPISODE_TOKEN: &str = "[EP.NUM]";
/// Quality token in user templates.
pub const QUALITY_TOKEN: &str = "[QUALITY]";

/// `S02E05`, `s2.e5`, `S02 E05` and friends.
static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,3})[\s._-]*E(\d{1,3})\b").unwrap());

/// `Season 2 Episode 5` spelled out.
static SEASON_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bSeason[\s._-]*(\d{1,3})[\s._-]*Episode[\s._-]*(\d{1,3})\b").unwrap()
});

/// Lone `E05` / `EP05` with no season in sight.
static EPISODE_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:EP|E)[\s._-]*(\d{1,3})\b").unwrap());

/// `480p` / `720p` / `1080p` / `2160p` / `4K`.
static QUALITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{3,4}p|[24]k)\b").unwrap());

/// Values extracted from a filename or caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detected {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Quality marker with its original casing.
    pub quality: Option<String>,
}

/// Scan `text` for season/episode/quality markers.
///
/// When several patterns match, the leftmost occurrence wins.
pub fn detect(text: &str) -> Detected {
    let mut detected = Detected::default();

    // Season-bearing patterns compete by match position.
    let compact = SEASON_EPISODE.captures(text);
    let spelled = SEASON_WORDS.captures(text);

    let winner = match (&compact, &spelled) {
        (Some(a), Some(b)) => {
            if a.get(0).map(|m| m.start()) <= b.get(0).map(|m| m.start()) {
                compact.as_ref()
            } else {
                spelled.as_ref()
            }
        }
        (Some(_), None) => compact.as_ref(),
        (None, Some(_)) => spelled.as_ref(),
        (None, None) => None,
    };

    if let Some(caps) = winner {
        detected.season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        detected.episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
    } else if let Some(caps) = EPISODE_ONLY.captures(text) {
        detected.episode = caps.get(1).and_then(|m| m.as_str().parse().ok());
    }

    if let Some(caps) = QUALITY.captures(text) {
        detected.quality = caps.get(1).map(|m| m.as_str().to_string());
    }

    detected
}

/// Episode number alone, used as the sequence sort key.
pub fn detect_episode(text: &str) -> Option<u32> {
    detect(text).episode
}

/// Substitute detected values into `template`.
///
/// `fallback_quality` is used when the source text carries no quality
/// marker of its own. Tokens that still have no value stay literal.
pub fn resolve(template: &str, source_text: &str, fallback_quality: Option<&str>) -> String {
    let detected = detect(source_text);
    let mut out = template.to_string();

    if let Some(season) = detected.season {
        out = out.replace(SEASON_TOKEN, &format!("{:02}", season));
    }
    if let Some(episode) = detected.episode {
        out = out.replace(EPISODE_TOKEN, &format!("{:02}", episode));
    }
    let quality = detected.quality.as_deref().or(fallback_quality);
    if let Some(quality) = quality {
        out = out.replace(QUALITY_TOKEN, quality);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_compact_season_episode() {
        let out = resolve(
            "Naruto S[SE.NUM]-E[EP.NUM] [QUALITY]",
            "naruto.S02E05.1080p.mkv",
            None,
        );
        assert_eq!(out, "Naruto S02-E05 1080p");
    }

    #[test]
    fn unresolved_tokens_stay_literal() {
        let out = resolve(
            "Naruto S[SE.NUM]-E[EP.NUM] [QUALITY]",
            "random_clip.mp4",
            None,
        );
        assert_eq!(out, "Naruto S[SE.NUM]-E[EP.NUM] [QUALITY]");
    }

    #[test]
    fn resolves_spelled_out_season() {
        let out = resolve(
            "[SE.NUM]x[EP.NUM]",
            "Show Season 1 Episode 9 final.mkv",
            None,
        );
        assert_eq!(out, "01x09");
    }

    #[test]
    fn resolves_lone_episode_marker() {
        assert_eq!(resolve("Ep [EP.NUM]", "show EP12 720p.mkv", None), "Ep 12");
        assert_eq!(detect_episode("E07.mkv"), Some(7));
        assert_eq!(detect_episode("plain_movie.mkv"), None);
    }

    #[test]
    fn leftmost_pattern_wins() {
        // The compact marker appears before the spelled-out one.
        let d = detect("intro S03E01 then Season 9 Episode 9");
        assert_eq!(d.season, Some(3));
        assert_eq!(d.episode, Some(1));

        let d = detect("Season 9 Episode 9 then S03E01");
        assert_eq!(d.season, Some(9));
        assert_eq!(d.episode, Some(9));
    }

    #[test]
    fn quality_case_is_preserved() {
        assert_eq!(detect("show.e01.4K.mkv").quality.as_deref(), Some("4K"));
        assert_eq!(detect("show.e01.720p.mkv").quality.as_deref(), Some("720p"));
    }

    #[test]
    fn fallback_quality_used_when_source_has_none() {
        let out = resolve("[QUALITY] rip", "random_clip.mp4", Some("480p"));
        assert_eq!(out, "480p rip");

        // Source quality takes precedence over the fallback.
        let out = resolve("[QUALITY] rip", "clip.1080p.mp4", Some("480p"));
        assert_eq!(out, "1080p rip");
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let a = resolve("S[SE.NUM]E[EP.NUM]", "x.S01E02.mkv", Some("720p"));
        let b = resolve("S[SE.NUM]E[EP.NUM]", "x.S01E02.mkv", Some("720p"));
        assert_eq!(a, b);
        assert_eq!(a, "S01E02");
    }
}
