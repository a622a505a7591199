use std::fmt;
use std::time::Duration;

/// Statistics of one completed rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub cutoff: f64,
    pub assignment_time: Duration,
    pub search_time: Duration,
    pub symmetry_count: usize,
    /// Pairs stored in the asymmetric-unit lists.
    pub asymmetric_pairs: usize,
    /// Pairs stored against all symmetry mates together.
    pub mate_pairs: usize,
    /// How many times a worker pair buffer had to double.
    pub buffer_growths: usize,
}

impl BuildReport {
    pub fn total_time(&self) -> Duration {
        self.assignment_time + self.search_time
    }

    pub fn total_pairs(&self) -> usize {
        self.asymmetric_pairs + self.mate_pairs
    }

    /// Pairs in the whole unit cell implied by symmetry. Each asymmetric-unit pair recurs in
    /// every copy; each mate pair is shared by two copies.
    pub fn unit_cell_pairs(&self) -> f64 {
        let n_symm = self.symmetry_count as f64;
        self.asymmetric_pairs as f64 * n_symm + self.mate_pairs as f64 * (n_symm * 0.5)
    }

    /// Unit-cell pairs per pair actually enumerated. `1.0` for an empty list.
    pub fn speedup(&self) -> f64 {
        match self.total_pairs() {
            0 => 1.0,
            enumerated => self.unit_cell_pairs() / enumerated as f64,
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " The cutoff is {} angstroms.", self.cutoff)?;
        writeln!(
            f,
            " Assignment to cells:    {:8.3}",
            self.assignment_time.as_secs_f64()
        )?;
        writeln!(
            f,
            " Atom-Cell Verlet lists: {:8.3}",
            self.search_time.as_secs_f64()
        )?;
        writeln!(
            f,
            " Total:                  {:8.3} (sec)",
            self.total_time().as_secs_f64()
        )?;
        write!(
            f,
            " Neighbors in the asymmetric unit: {:12}",
            self.asymmetric_pairs
        )?;
        if self.symmetry_count > 1 {
            writeln!(f)?;
            writeln!(f, " Neighbors in symmetry mates:      {:12}", self.mate_pairs)?;
            writeln!(
                f,
                " Neighbors in the unit cell:       {:12}",
                self.unit_cell_pairs() as usize
            )?;
            write!(f, " Space group speed up factor:      {:12.3}", self.speedup())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn report(symmetry_count: usize, asymmetric_pairs: usize, mate_pairs: usize) -> BuildReport {
        BuildReport {
            cutoff: 9.0,
            assignment_time: Duration::from_millis(2),
            search_time: Duration::from_millis(5),
            symmetry_count,
            asymmetric_pairs,
            mate_pairs,
            buffer_growths: 0,
        }
    }

    #[test]
    fn speedup_follows_symmetry() {
        let stats = report(4, 100, 300);
        assert_relative_eq!(stats.unit_cell_pairs(), 1000.0);
        assert_relative_eq!(stats.speedup(), 2.5);
        assert_eq!(stats.total_time(), Duration::from_millis(7));
    }

    #[test]
    fn p1_has_no_speedup() {
        assert_relative_eq!(report(1, 42, 0).speedup(), 1.0);
        assert_relative_eq!(report(1, 0, 0).speedup(), 1.0);
    }

    #[test]
    fn summary_lists_mates_only_with_symmetry() {
        let p1 = report(1, 42, 0).to_string();
        assert!(p1.contains("Assignment to cells"));
        assert!(p1.contains("Neighbors in the asymmetric unit"));
        assert!(!p1.contains("symmetry mates"));

        let p212121 = report(4, 100, 300).to_string();
        assert!(p212121.contains("Neighbors in symmetry mates"));
        assert!(p212121.contains("2.500"));
    }
}
