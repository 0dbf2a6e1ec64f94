#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Returns the identifier next to `current` in `ids`, by list position only.
///
/// `ids` is not assumed to be sorted; what "next" means is decided by the
/// caller's ordering. Returns `None` when `current` is absent or sits at the
/// boundary in `direction`.
pub fn adjacent<'a, S: AsRef<str>>(
    current: &str,
    ids: &'a [S],
    direction: Direction,
) -> Option<&'a str> {
    let idx = ids.iter().position(|id| id.as_ref() == current)?;
    let neighbor = match direction {
        Direction::Prev => idx.checked_sub(1)?,
        Direction::Next => idx + 1,
    };
    ids.get(neighbor).map(AsRef::as_ref)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Neighbors {
    pub fn resolve<S: AsRef<str>>(current: &str, ids: &[S]) -> Self {
        Self {
            prev: adjacent(current, ids, Direction::Prev).map(str::to_owned),
            next: adjacent(current, ids, Direction::Next).map(str::to_owned),
        }
    }
}
