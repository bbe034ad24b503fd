use std::fmt::{self, Debug, Display};

/// Structure to store matches of one query row
pub struct Hits {
    /// (Target row, Score)
    pub list: Vec<(usize, f64)>,
}

impl Hits {
    /// Create a new Hits instance
    pub fn new(list: Vec<(usize, f64)>) -> Self {
        Hits { list }
    }

    /// Sort results by descending score
    /// Ties keep target order
    pub fn sort_by_score(&mut self) -> &mut Self {
        // Remove NaN scores
        self.list.retain(|(_, s)| !s.is_nan());
        self.list.sort_by(|a, b| b.1.total_cmp(&a.1));
        self
    }

    pub fn best(&self) -> Option<(usize, f64)> {
        self.list.first().copied()
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // Pretty print with alternate formatting: each hit on a new line
            writeln!(f, "Hits [")?;
            for (target, score) in &self.list {
                writeln!(f, "    {}: {:.6}", target, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

impl Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, (target, score)) in self.list.iter().enumerate() {
            writeln!(f, "{:>3}. target {:<6} {:.4}", rank + 1, target, score)?;
        }
        Ok(())
    }
}
