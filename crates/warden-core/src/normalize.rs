//! Guess and name normalization.
//!
//! All comparisons between chat text and answer sets happen on the id form
//! produced by [`to_id`]: lowercase, alphanumerics only. On top of that,
//! [`guess_matches`] implements the forme equivalence rule: a "mega" or
//! "primal" token may appear as a prefix or a suffix of a guess and still
//! match an answer stored in its `Mega X` / `Primal X` form.

/// Folds a raw string to its id form: lowercase, alphanumeric characters
/// only. `"Mega Charizard-X!"` becomes `"megacharizardx"`.
pub fn to_id(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Forme prefixes that are treated as order-insensitive in guesses.
const FORME_PREFIXES: [&str; 2] = ["mega", "primal"];

/// Splits an id into `(forme, base)` if it starts or ends with a known
/// forme token and the remainder is non-empty.
fn split_forme(id: &str) -> Option<(&'static str, &str)> {
    for prefix in FORME_PREFIXES {
        if let Some(base) = id.strip_prefix(prefix) {
            if !base.is_empty() {
                return Some((prefix, base));
            }
        }
        if let Some(base) = id.strip_suffix(prefix) {
            if !base.is_empty() {
                return Some((prefix, base));
            }
        }
    }
    None
}

/// Whether a raw guess matches a stored answer.
///
/// Exact id equality always matches. Otherwise, if both sides carry the
/// same forme token (prefix or suffix), their bases are compared — so
/// `"charizard mega"` matches an answer stored as `"Mega Charizard"`.
/// A bare base name does not match a forme answer.
pub fn guess_matches(guess: &str, answer: &str) -> bool {
    let g = to_id(guess);
    let a = to_id(answer);
    if g.is_empty() {
        return false;
    }
    if g == a {
        return true;
    }
    match (split_forme(&g), split_forme(&a)) {
        (Some((gf, gb)), Some((af, ab))) => gf == af && gb == ab,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_id_strips_and_folds() {
        assert_eq!(to_id("Mr. Mime"), "mrmime");
        assert_eq!(to_id("  FARFETCH'D "), "farfetchd");
        assert_eq!(to_id("Porygon-Z"), "porygonz");
        assert_eq!(to_id("!!!"), "");
    }

    #[test]
    fn test_exact_match_after_folding() {
        assert!(guess_matches("pikachu", "Pikachu"));
        assert!(guess_matches(" Pika chu ", "Pikachu"));
        assert!(!guess_matches("raichu", "Pikachu"));
    }

    #[test]
    fn test_empty_guess_never_matches() {
        assert!(!guess_matches("", "Pikachu"));
        assert!(!guess_matches("?!", "Pikachu"));
    }

    #[test]
    fn test_mega_prefix_and_suffix_forms_match() {
        assert!(guess_matches("megacharizard", "Mega Charizard"));
        assert!(guess_matches("charizardmega", "Mega Charizard"));
        assert!(guess_matches("Charizard-Mega", "Mega Charizard"));
    }

    #[test]
    fn test_primal_forms_match_symmetrically() {
        assert!(guess_matches("primalkyogre", "Primal Kyogre"));
        assert!(guess_matches("kyogreprimal", "Primal Kyogre"));
    }

    #[test]
    fn test_bare_base_does_not_match_forme_answer() {
        assert!(!guess_matches("charizard", "Mega Charizard"));
        assert!(!guess_matches("kyogre", "Primal Kyogre"));
    }

    #[test]
    fn test_forme_token_alone_is_not_a_match() {
        assert!(!guess_matches("mega", "Mega Charizard"));
    }

    #[test]
    fn test_mismatched_forme_tokens_do_not_match() {
        assert!(!guess_matches("primalcharizard", "Mega Charizard"));
    }
}
