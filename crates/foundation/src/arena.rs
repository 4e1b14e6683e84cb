/// Append-only arena. Indices stay valid for the arena's lifetime.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, v: T) -> usize {
        self.items.push(v);
        self.items.len() - 1
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates items in allocation order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &T)> + '_ {
        self.items.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn alloc_returns_stable_indices() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!((a, b), (0, 1));
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.get(2), None);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn iterates_in_allocation_order() {
        let mut arena = Arena::new();
        arena.alloc(10);
        arena.alloc(20);
        let got: Vec<_> = arena.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(got, vec![(0, 10), (1, 20)]);
    }
}
