//! Name collision handling for paste.

/// Supplies replacement names when a pasted holder collides with a sibling.
pub trait NameResolver {
    /// Proposes a new name for `proposed`, which is already in `taken`.
    ///
    /// Returning `None` abandons the whole paste.
    fn resolve(&mut self, proposed: &str, taken: &[String]) -> Option<String>;
}

impl<F> NameResolver for F
where
    F: FnMut(&str, &[String]) -> Option<String>,
{
    fn resolve(&mut self, proposed: &str, taken: &[String]) -> Option<String> {
        self(proposed, taken)
    }
}

/// Abandons on the first collision.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbandonOnCollision;

impl NameResolver for AbandonOnCollision {
    fn resolve(&mut self, _proposed: &str, _taken: &[String]) -> Option<String> {
        None
    }
}

/// Appends ` (2)`, ` (3)`, ... until the name is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedCopies;

impl NameResolver for NumberedCopies {
    fn resolve(&mut self, proposed: &str, taken: &[String]) -> Option<String> {
        let base = strip_copy_suffix(proposed);
        (2..=taken.len() + 2)
            .map(|n| format!("{base} ({n})"))
            .find(|candidate| !taken.iter().any(|name| name == candidate))
    }
}

fn strip_copy_suffix(name: &str) -> &str {
    let Some(open) = name.rfind(" (") else {
        return name;
    };
    let suffix = &name[open + 2..];
    match suffix.strip_suffix(')') {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            &name[..open]
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::{AbandonOnCollision, NameResolver, NumberedCopies};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn numbered_copies_skips_taken_suffixes() {
        let taken = names(&["A", "A (2)"]);
        assert_eq!(
            NumberedCopies.resolve("A", &taken),
            Some("A (3)".to_string())
        );
        assert_eq!(
            NumberedCopies.resolve("A (2)", &taken),
            Some("A (3)".to_string())
        );
    }

    #[test]
    fn closures_and_abandon_resolver() {
        let mut calls = 0;
        let mut resolver = |proposed: &str, _taken: &[String]| {
            calls += 1;
            Some(format!("{proposed}-copy"))
        };
        assert_eq!(resolver.resolve("B", &[]), Some("B-copy".to_string()));
        assert_eq!(calls, 1);
        assert_eq!(AbandonOnCollision.resolve("B", &names(&["B"])), None);
    }
}
