//! Size limits for client-supplied filter trees.
//!
//! The compilers recurse over the tree without any bound. Callers that accept
//! filters from the network check them against `FilterLimits` first. The
//! measurement itself is iterative, so an adversarial tree cannot exhaust the
//! stack while being measured.

use super::condition::ConditionTree;

/// Upper bounds on the shape of a filter tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterLimits {
    /// Maximum nesting depth. A single leaf has depth 1.
    pub max_depth: usize,
    /// Maximum number of nodes, combinators included.
    pub max_nodes: usize,
}

/// Error returned when a filter tree exceeds its limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterLimitError {
    TooDeep { limit: usize },
    TooLarge { limit: usize },
}

impl std::fmt::Display for FilterLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooDeep { limit } => write!(f, "filter is nested deeper than {limit} levels"),
            Self::TooLarge { limit } => write!(f, "filter has more than {limit} conditions"),
        }
    }
}

impl std::error::Error for FilterLimitError {}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_nodes: Self::DEFAULT_MAX_NODES,
        }
    }
}

impl FilterLimits {
    pub const DEFAULT_MAX_DEPTH: usize = 32;
    pub const DEFAULT_MAX_NODES: usize = 512;

    /// Check a tree against these limits.
    ///
    /// Stops walking as soon as a limit is exceeded.
    pub fn check<C: ConditionTree>(&self, root: &C) -> Result<(), FilterLimitError> {
        let mut stack = vec![(root, 1_usize)];
        let mut nodes = 0_usize;

        while let Some((node, depth)) = stack.pop() {
            nodes += 1;
            if nodes > self.max_nodes {
                return Err(FilterLimitError::TooLarge {
                    limit: self.max_nodes,
                });
            }
            if depth > self.max_depth {
                return Err(FilterLimitError::TooDeep {
                    limit: self.max_depth,
                });
            }
            if let Some(children) = node.children() {
                stack.extend(children.iter().map(|child| (child, depth + 1)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{BookCondition, Equality};

    fn tag(value: &str) -> BookCondition {
        BookCondition::Tag(Equality::Is(value.to_owned()))
    }

    fn nested(depth: usize) -> BookCondition {
        (1..depth).fold(tag("x"), |inner, _| BookCondition::AllOf(vec![inner]))
    }

    #[test]
    fn test_leaf_is_within_limits() {
        assert!(FilterLimits::default().check(&tag("a")).is_ok());
    }

    #[test]
    fn test_depth_limit_is_inclusive() {
        let limits = FilterLimits {
            max_depth: 4,
            max_nodes: 100,
        };
        assert!(limits.check(&nested(4)).is_ok());
        assert_eq!(
            limits.check(&nested(5)),
            Err(FilterLimitError::TooDeep { limit: 4 })
        );
    }

    #[test]
    fn test_node_limit() {
        let limits = FilterLimits {
            max_depth: 10,
            max_nodes: 3,
        };
        let wide = BookCondition::AnyOf(vec![tag("a"), tag("b"), tag("c")]);
        assert_eq!(
            limits.check(&wide),
            Err(FilterLimitError::TooLarge { limit: 3 })
        );
        let narrow = BookCondition::AnyOf(vec![tag("a"), tag("b")]);
        assert!(limits.check(&narrow).is_ok());
    }

    #[test]
    fn test_very_deep_tree_is_rejected_without_recursion() {
        let limits = FilterLimits::default();
        let deep = nested(5_000);
        let result = limits.check(&deep);
        assert!(matches!(result, Err(FilterLimitError::TooDeep { .. })));
        // Unwind the chain by hand so freeing the tree does not recurse.
        let mut current = deep;
        while let BookCondition::AllOf(mut children) = current {
            current = children.pop().unwrap_or_else(|| tag("end"));
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            FilterLimitError::TooDeep { limit: 3 }.to_string(),
            "filter is nested deeper than 3 levels"
        );
        assert_eq!(
            FilterLimitError::TooLarge { limit: 9 }.to_string(),
            "filter has more than 9 conditions"
        );
    }
}
