use std::ops::Range;

/// Neighbor lists indexed by symmetry copy, then by asymmetric-unit atom.
///
/// `neighbors(s, i)` holds the atoms `j` of copy `s` within cutoff plus buffer of atom `i` of
/// the asymmetric unit. Within copy 0 each unordered pair is stored once, in the list of
/// whichever atom found it first; pairs against symmetry mates are directed and never merged.
///
/// Equality compares the stored neighbors only, not which builder filled them.
#[derive(Debug, Clone, Default)]
pub struct VerletLists {
    lists: Vec<Vec<Vec<usize>>>,
    stamp: Option<ListStamp>,
}

/// Identifies the builder and the commit that last filled a [`VerletLists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListStamp {
    pub builder: u64,
    pub generation: u64,
}

impl PartialEq for VerletLists {
    fn eq(&self, other: &Self) -> bool {
        self.lists == other.lists
    }
}

impl Eq for VerletLists {}

impl VerletLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(symmetry_count: usize, atom_count: usize) -> Self {
        Self {
            lists: vec![vec![Vec::new(); atom_count]; symmetry_count],
            stamp: None,
        }
    }

    pub fn symmetry_count(&self) -> usize {
        self.lists.len()
    }

    pub fn atom_count(&self) -> usize {
        self.lists.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.total_pairs() == 0
    }

    #[inline]
    pub fn neighbors(&self, symmetry: usize, atom: usize) -> &[usize] {
        &self.lists[symmetry][atom]
    }

    /// All per-atom lists of one symmetry copy.
    pub fn copy(&self, symmetry: usize) -> &[Vec<usize>] {
        &self.lists[symmetry]
    }

    pub fn pair_count(&self, symmetry: usize) -> usize {
        self.lists[symmetry].iter().map(Vec::len).sum()
    }

    pub fn total_pairs(&self) -> usize {
        (0..self.symmetry_count()).map(|s| self.pair_count(s)).sum()
    }

    /// `(i, j)` for every stored neighbor of copy `symmetry`, in list order.
    pub fn iter_pairs(&self, symmetry: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lists[symmetry]
            .iter()
            .enumerate()
            .flat_map(|(i, neighbors)| neighbors.iter().map(move |&j| (i, j)))
    }

    pub(crate) fn ensure_shape(&mut self, symmetry_count: usize, atom_count: usize) {
        if self.symmetry_count() != symmetry_count || self.atom_count() != atom_count {
            *self = Self::with_shape(symmetry_count, atom_count);
        }
    }

    #[inline]
    pub(crate) fn set(&mut self, symmetry: usize, atom: usize, neighbors: Vec<usize>) {
        self.lists[symmetry][atom] = neighbors;
    }

    pub(crate) fn stamp(&self) -> Option<ListStamp> {
        self.stamp
    }

    pub(crate) fn set_stamp(&mut self, stamp: ListStamp) {
        self.stamp = Some(stamp);
    }
}

/// One searched sub-cell of an atom's pair search and the slice of its neighbor list that
/// came from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub cell: usize,
    pub start: usize,
    pub end: usize,
}

impl CellSpan {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Per-atom, per-searched-sub-cell partition of a [`VerletLists`], in search order. Spans of
/// searched sub-cells with no partners are kept, so `spans(s, i).len()` is the number of
/// sub-cells visited for atom `i` in copy `s`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellNeighborLists {
    spans: Vec<Vec<Vec<CellSpan>>>,
}

impl CellNeighborLists {
    pub(crate) fn with_shape(symmetry_count: usize, atom_count: usize) -> Self {
        Self {
            spans: vec![vec![Vec::new(); atom_count]; symmetry_count],
        }
    }

    pub fn spans(&self, symmetry: usize, atom: usize) -> &[CellSpan] {
        &self.spans[symmetry][atom]
    }

    /// Neighbors of `atom` grouped by the sub-cell they were found in.
    pub fn neighbors_by_cell<'a>(
        &'a self,
        lists: &'a VerletLists,
        symmetry: usize,
        atom: usize,
    ) -> impl Iterator<Item = (usize, &'a [usize])> + 'a {
        let neighbors = lists.neighbors(symmetry, atom);
        self.spans(symmetry, atom)
            .iter()
            .map(move |span| (span.cell, &neighbors[span.range()]))
    }

    pub(crate) fn set(&mut self, symmetry: usize, atom: usize, spans: Vec<CellSpan>) {
        self.spans[symmetry][atom] = spans;
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> *const Vec<Vec<CellSpan>> {
        self.spans.as_ptr()
    }
}
