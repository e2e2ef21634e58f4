//! Selector parsing and path resolution over shapes.
//!
//! Resolution walks a type's [`Shape`] once, at derivation time, and
//! produces a [`PathTree`]: for each top-level alternative of the type,
//! either the index path leading to the focused field or a description
//! of why the field is absent there. Accessors are compiled from the
//! tree afterwards; nothing is resolved again at use time.
//!
//! Name lookup is depth-first and left-biased: the first field carrying
//! the requested name wins, in declaration order, recursing into
//! anonymous nested products (flattened fields) along the way. When the
//! same name exists in several places, the leftmost occurrence is
//! silently chosen.

use smallvec::SmallVec;

use crate::generic::error::DeriveError;
use crate::generic::shape::{FieldShape, Shape};

/// A parsed selector: what to focus within a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// A field, by declared name.
    Field(String),
    /// A direct field, by 1-based position.
    Position(usize),
    /// A sum-type constructor, by declared name.
    Constructor(String),
}

impl Selector {
    /// Parses selector text.
    ///
    /// A leading underscore marks a constructor (`"_Dog"`), all-digit
    /// text is a 1-based position (`"1"`), and anything else is a
    /// field name.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if let Some(constructor) = text.strip_prefix('_') {
            return Self::Constructor(constructor.to_owned());
        }
        if !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit()) {
            return Self::Position(text.parse().unwrap_or(0));
        }
        Self::Field(text.to_owned())
    }

    /// The selector as written, for diagnostics.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Field(name) => name.clone(),
            Self::Position(position) => position.to_string(),
            Self::Constructor(name) => format!("_{name}"),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.display())
    }
}

/// Index steps from an alternative's fields down to the focus.
///
/// Each step selects a product child by position; nested steps arise
/// from flattened fields.
pub type Path = SmallVec<[usize; 8]>;

/// Why a selector has no focus within one alternative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Absence {
    /// No field with the requested name in this alternative.
    FieldMissing,
    /// The requested position exceeds this alternative's field count.
    PositionOutOfRange,
    /// A constructor selector, and this is one of the other
    /// constructors.
    OtherVariant,
}

/// Resolution outcome for one top-level alternative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathArm {
    /// Constructor name, or `None` for the single alternative of a
    /// product type.
    pub variant: Option<&'static str>,
    /// The path to the focus, or why there is none here.
    pub outcome: Result<Path, Absence>,
}

/// Per-alternative resolution outcomes for one selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTree {
    /// One arm per top-level alternative, in declaration order.
    pub arms: Vec<PathArm>,
}

impl PathTree {
    /// Whether the focus exists in every alternative.
    #[must_use]
    pub fn is_total(&self) -> bool {
        self.arms.iter().all(|arm| arm.outcome.is_ok())
    }

    /// Names of constructors in which the focus is absent.
    #[must_use]
    pub fn missing_variants(&self) -> Vec<&'static str> {
        self.arms
            .iter()
            .filter(|arm| arm.outcome.is_err())
            .filter_map(|arm| arm.variant)
            .collect()
    }
}

/// Resolves a selector against a shape.
///
/// Produces one [`PathArm`] per top-level alternative. Fails only when
/// the selector has no focus anywhere: a name found in no alternative,
/// a position invalid in some alternative, or an unknown constructor.
/// Partial presence (found in some alternatives, absent in others) is
/// not an error here; the caller decides whether to require totality.
pub fn resolve(
    type_name: &'static str,
    shape: &Shape,
    selector: &Selector,
) -> Result<PathTree, DeriveError> {
    match selector {
        Selector::Field(name) => resolve_field(type_name, shape, name),
        Selector::Position(position) => resolve_position(type_name, shape, *position),
        Selector::Constructor(name) => resolve_constructor(type_name, shape, name),
    }
}

fn alternatives(shape: &Shape) -> Vec<(Option<&'static str>, &Shape)> {
    match shape {
        Shape::Sum(variants) => variants
            .iter()
            .map(|variant| (Some(variant.name), &variant.fields))
            .collect(),
        other => vec![(None, other)],
    }
}

fn resolve_field(
    type_name: &'static str,
    shape: &Shape,
    name: &str,
) -> Result<PathTree, DeriveError> {
    let arms: Vec<PathArm> = alternatives(shape)
        .into_iter()
        .map(|(variant, fields)| PathArm {
            variant,
            outcome: find_named(fields, name).ok_or(Absence::FieldMissing),
        })
        .collect();

    if arms.iter().all(|arm| arm.outcome.is_err()) {
        return Err(DeriveError::SelectorNotFound {
            type_name,
            selector: name.to_owned(),
        });
    }
    Ok(PathTree { arms })
}

/// Depth-first, left-biased search for a named field. Recurses into
/// anonymous nested products so flattened fields resolve by name; named
/// children that do not match are not entered.
fn find_named(fields: &Shape, name: &str) -> Option<Path> {
    let Shape::Product(children) = fields else {
        return None;
    };
    for (index, child) in children.iter().enumerate() {
        if child.name == Some(name) {
            let mut path = Path::new();
            path.push(index);
            return Some(path);
        }
        if child.name.is_none()
            && let Some(mut nested) = find_named(&child.shape, name)
        {
            nested.insert(0, index);
            return Some(nested);
        }
    }
    None
}

fn resolve_position(
    type_name: &'static str,
    shape: &Shape,
    position: usize,
) -> Result<PathTree, DeriveError> {
    if position == 0 {
        return Err(DeriveError::InvalidPosition {
            type_name,
            position,
        });
    }

    let mut arms = Vec::new();
    for (variant, fields) in alternatives(shape) {
        let children: &[FieldShape] = match fields {
            Shape::Product(children) => children,
            _ => &[],
        };
        // Positions address direct leaf fields only; a position that
        // overruns any alternative, or lands on the anonymous nested
        // product of a flattened field, is rejected outright.
        let is_leaf = children
            .get(position - 1)
            .is_some_and(|child| matches!(child.shape, Shape::Leaf(_)));
        if !is_leaf {
            return Err(DeriveError::InvalidPosition {
                type_name,
                position,
            });
        }
        let mut path = Path::new();
        path.push(position - 1);
        arms.push(PathArm {
            variant,
            outcome: Ok(path),
        });
    }
    Ok(PathTree { arms })
}

fn resolve_constructor(
    type_name: &'static str,
    shape: &Shape,
    name: &str,
) -> Result<PathTree, DeriveError> {
    let Shape::Sum(variants) = shape else {
        return Err(DeriveError::SelectorNotFound {
            type_name,
            selector: format!("_{name}"),
        });
    };

    let mut found = false;
    let arms: Vec<PathArm> = variants
        .iter()
        .map(|variant| {
            let matches = variant.name == name;
            found |= matches;
            PathArm {
                variant: Some(variant.name),
                outcome: if matches {
                    Ok(Path::new())
                } else {
                    Err(Absence::OtherVariant)
                },
            }
        })
        .collect();

    if !found {
        return Err(DeriveError::SelectorNotFound {
            type_name,
            selector: format!("_{name}"),
        });
    }
    Ok(PathTree { arms })
}
