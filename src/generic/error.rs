//! Errors reported by generic optic derivation.
//!
//! Derivation fails loudly and early: every error is produced while an
//! optic is being built, never while one is being used. A successfully
//! derived optic performs no selector resolution at use time.

/// Why a generic optic could not be derived for a selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeriveError {
    /// No field or constructor with the requested name exists anywhere
    /// in the type's shape.
    SelectorNotFound {
        /// Name of the type the selector was resolved against.
        type_name: &'static str,
        /// The selector as written.
        selector: String,
    },

    /// A positional selector was zero, exceeded the field count of
    /// some alternative, or pointed at something other than a direct
    /// field. Positions are 1-based.
    InvalidPosition {
        /// Name of the type the selector was resolved against.
        type_name: &'static str,
        /// The requested position.
        position: usize,
    },

    /// A constructor carries more fields than the supported payload
    /// tuple width.
    ///
    /// An explicit optic registered for the selector is not subject to
    /// this limit; register one to work with wider constructors.
    ArityUnsupported {
        /// Name of the sum type.
        type_name: &'static str,
        /// Name of the oversized constructor.
        constructor: &'static str,
        /// The constructor's field count.
        arity: usize,
    },

    /// The field exists in some but not all constructors, so a total
    /// lens cannot be derived. An affine optic for the same selector
    /// is still derivable.
    PartialField {
        /// Name of the sum type.
        type_name: &'static str,
        /// The selector as written.
        selector: String,
        /// Constructors in which the field is absent.
        missing: Vec<&'static str>,
    },

    /// The selector resolved, but the focused field's type does not
    /// match the requested focus type.
    FocusMismatch {
        /// Name of the type the selector was resolved against.
        type_name: &'static str,
        /// The selector as written.
        selector: String,
        /// Name of the requested focus type.
        expected: &'static str,
        /// Name of the type actually found at the focus.
        found: &'static str,
    },
}

impl std::fmt::Display for DeriveError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectorNotFound {
                type_name,
                selector,
            } => write!(
                formatter,
                "no field or constructor `{selector}` in `{type_name}`"
            ),
            Self::InvalidPosition {
                type_name,
                position,
            } => write!(
                formatter,
                "position {position} is not a valid 1-based field position in every \
                 constructor of `{type_name}`"
            ),
            Self::ArityUnsupported {
                type_name,
                constructor,
                arity,
            } => write!(
                formatter,
                "constructor `{constructor}` of `{type_name}` has {arity} fields, more than \
                 the {max} supported for derived prisms; register an explicit prism for it",
                max = crate::generic::synth::MAX_PAYLOAD_ARITY,
            ),
            Self::PartialField {
                type_name,
                selector,
                missing,
            } => write!(
                formatter,
                "field `{selector}` of `{type_name}` is absent in constructor(s) {}; \
                 derive an affine optic instead of a lens",
                missing.join(", "),
            ),
            Self::FocusMismatch {
                type_name,
                selector,
                expected,
                found,
            } => write!(
                formatter,
                "selector `{selector}` of `{type_name}` focuses a `{found}`, \
                 not the requested `{expected}`"
            ),
        }
    }
}

impl std::error::Error for DeriveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_selector_and_type() {
        let error = DeriveError::SelectorNotFound {
            type_name: "Human",
            selector: "wings".to_owned(),
        };
        let message = error.to_string();
        assert!(message.contains("wings"));
        assert!(message.contains("Human"));
    }

    #[test]
    fn test_partial_field_lists_missing_constructors() {
        let error = DeriveError::PartialField {
            type_name: "Mammal",
            selector: "whiskers".to_owned(),
            missing: vec!["Dog", "Horse"],
        };
        let message = error.to_string();
        assert!(message.contains("Dog, Horse"));
    }

    #[test]
    fn test_arity_unsupported_suggests_registration() {
        let error = DeriveError::ArityUnsupported {
            type_name: "Wide",
            constructor: "Six",
            arity: 6,
        };
        assert!(error.to_string().contains("register an explicit prism"));
    }
}
