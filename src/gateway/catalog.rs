//! Vehicle-type catalog and missing-text parsing.
//!
//! The service reports shortfalls as free text ("Benötigte Fahrzeuge:
//! 1 LF, 2 RTW"). Parsing happens client-side against a fixed catalog of
//! type descriptors, so both helpers live here rather than on the wire.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn requirement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*[x×]?\s*(.+)$").unwrap())
}

/// Extract the required vehicle-type descriptors from a missing-resource
/// text, in the order they appear. A leading count expands into that many
/// entries, so "2 RTW" yields `["RTW", "RTW"]` and each entry matches
/// exactly one vehicle during dispatch.
pub fn parse_missing_text(missing_text: &str) -> Vec<String> {
    // The requirement list follows the last colon, if any
    // ("Benötigte Fahrzeuge: 1 LF, 2 RTW").
    let list = missing_text
        .rsplit_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(missing_text);

    let mut required = Vec::new();
    for fragment in list.split(',') {
        let fragment = fragment.trim().trim_end_matches('.');
        if fragment.is_empty() {
            continue;
        }
        let (count, descriptor) = match requirement_re().captures(fragment) {
            Some(caps) => {
                let count: usize = caps[1].parse().unwrap_or(1);
                (count.max(1), caps[2].trim().to_string())
            }
            None => (1, fragment.to_string()),
        };
        for _ in 0..count {
            required.push(descriptor.clone());
        }
    }
    required
}

/// Resolve a vehicle-type descriptor into the set of matching type ids.
///
/// Descriptors are matched case-insensitively; some requirement texts name
/// a class ("Löschfahrzeuge") that several concrete types satisfy. Unknown
/// descriptors resolve to the empty set, which dispatch records as an
/// unfillable requirement.
pub fn type_ids_for(descriptor: &str) -> HashSet<u64> {
    let key = descriptor.trim().to_uppercase();
    let ids: &[u64] = match key.as_str() {
        "LF" | "LF 20" | "LF 10" | "LÖSCHFAHRZEUG" | "LÖSCHFAHRZEUGE" => &[0, 1, 17, 30],
        "DLK" | "DLK 23" | "DREHLEITER" => &[2],
        "ELW" | "ELW 1" => &[3],
        "ELW 2" => &[12],
        "RW" | "RÜSTWAGEN" => &[4],
        "GW-A" | "GW-ATEMSCHUTZ" => &[5],
        "GW-ÖL" => &[9],
        "GW-MESS" | "GW-MESSTECHNIK" => &[13],
        "RTW" | "RETTUNGSWAGEN" => &[6],
        "NEF" | "NOTARZT" => &[7],
        "RTH" => &[14],
        "FUSTW" | "STREIFENWAGEN" => &[8],
        "GEFKW" => &[15],
        _ => &[],
    };
    ids.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_prefix_and_counts() {
        let text = "Benötigte Fahrzeuge: 1 LF, 2 RTW";
        assert_eq!(parse_missing_text(text), vec!["LF", "RTW", "RTW"]);
    }

    #[test]
    fn test_parse_without_counts() {
        assert_eq!(parse_missing_text("DLK, ELW"), vec!["DLK", "ELW"]);
    }

    #[test]
    fn test_parse_multiplier_notation() {
        assert_eq!(parse_missing_text("3x LF"), vec!["LF", "LF", "LF"]);
    }

    #[test]
    fn test_parse_empty_fragments_skipped() {
        assert_eq!(parse_missing_text("LF, , RTW,"), vec!["LF", "RTW"]);
    }

    #[test]
    fn test_type_ids_case_insensitive() {
        assert_eq!(type_ids_for("rtw"), type_ids_for("RTW"));
        assert!(type_ids_for("RTW").contains(&6));
    }

    #[test]
    fn test_class_descriptor_matches_several_types() {
        let ids = type_ids_for("Löschfahrzeuge");
        assert!(ids.len() > 1);
        assert!(ids.contains(&0));
    }

    #[test]
    fn test_unknown_descriptor_is_empty() {
        assert!(type_ids_for("Mondfahrzeug").is_empty());
    }
}
