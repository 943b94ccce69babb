//! Default basis-name canonicalization.

use crate::ports::BasisNormalizer;

/// Lowercases basis names and maps the "no basis" spellings to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBasisNormalizer;

impl BasisNormalizer for DefaultBasisNormalizer {
    fn prepare_basis(&self, basis: Option<&str>) -> Option<String> {
        let basis = basis?.trim();
        if basis.is_empty() || basis.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(basis.to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases() {
        assert_eq!(
            DefaultBasisNormalizer.prepare_basis(Some("CC-pVDZ")),
            Some("cc-pvdz".to_string())
        );
    }

    #[test]
    fn test_empty_and_none_spellings() {
        let b = DefaultBasisNormalizer;
        assert_eq!(b.prepare_basis(None), None);
        assert_eq!(b.prepare_basis(Some("")), None);
        assert_eq!(b.prepare_basis(Some("None")), None);
        assert_eq!(b.prepare_basis(Some("  ")), None);
    }
}
