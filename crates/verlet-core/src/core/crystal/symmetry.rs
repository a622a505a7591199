use super::CrystalError;
use nalgebra::{Matrix3, Vector3};

/// A crystallographic symmetry operator acting on fractional coordinates:
/// `x' = R * x + t`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymOp {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl SymOp {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    fn from_diagonal(signs: [f64; 3], translation: [f64; 3]) -> Self {
        Self::new(
            Matrix3::from_diagonal(&Vector3::from(signs)),
            Vector3::from(translation),
        )
    }

    #[inline]
    pub fn apply(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * frac + self.translation
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == Matrix3::identity() && self.translation == Vector3::zeros()
    }
}

/// A space group, represented by its list of symmetry operators. The first operator is
/// always the identity, so symmetry copy 0 is the asymmetric unit itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceGroup {
    name: String,
    operators: Vec<SymOp>,
}

impl SpaceGroup {
    pub fn new(name: &str, operators: Vec<SymOp>) -> Result<Self, CrystalError> {
        match operators.first() {
            Some(op) if op.is_identity() => Ok(Self {
                name: name.to_string(),
                operators,
            }),
            _ => Err(CrystalError::MissingIdentity(name.to_string())),
        }
    }

    pub fn p1() -> Self {
        Self {
            name: "P1".to_string(),
            operators: vec![SymOp::identity()],
        }
    }

    pub fn p_1() -> Self {
        Self {
            name: "P-1".to_string(),
            operators: vec![
                SymOp::identity(),
                SymOp::from_diagonal([-1.0, -1.0, -1.0], [0.0, 0.0, 0.0]),
            ],
        }
    }

    /// P 1 21 1, unique axis b.
    pub fn p21() -> Self {
        Self {
            name: "P21".to_string(),
            operators: vec![
                SymOp::identity(),
                SymOp::from_diagonal([-1.0, 1.0, -1.0], [0.0, 0.5, 0.0]),
            ],
        }
    }

    pub fn p212121() -> Self {
        Self {
            name: "P212121".to_string(),
            operators: vec![
                SymOp::identity(),
                SymOp::from_diagonal([-1.0, -1.0, 1.0], [0.5, 0.0, 0.5]),
                SymOp::from_diagonal([-1.0, 1.0, -1.0], [0.0, 0.5, 0.5]),
                SymOp::from_diagonal([1.0, -1.0, -1.0], [0.5, 0.5, 0.0]),
            ],
        }
    }

    /// Looks up a built-in space group. Whitespace is ignored, so both `"P212121"` and
    /// `"P 21 21 21"` are accepted.
    pub fn from_name(name: &str) -> Result<Self, CrystalError> {
        let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_ascii_uppercase().as_str() {
            "P1" => Ok(Self::p1()),
            "P-1" => Ok(Self::p_1()),
            "P21" | "P1211" => Ok(Self::p21()),
            "P212121" => Ok(Self::p212121()),
            _ => Err(CrystalError::UnknownSpaceGroup(name.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operators(&self) -> &[SymOp] {
        &self.operators
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl Default for SpaceGroup {
    fn default() -> Self {
        Self::p1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn built_in_groups_start_with_identity() {
        for group in [
            SpaceGroup::p1(),
            SpaceGroup::p_1(),
            SpaceGroup::p21(),
            SpaceGroup::p212121(),
        ] {
            assert!(group.operators()[0].is_identity(), "{}", group.name());
        }
    }

    #[test]
    fn from_name_ignores_whitespace_and_case() {
        assert_eq!(SpaceGroup::from_name("P 21 21 21").unwrap().len(), 4);
        assert_eq!(SpaceGroup::from_name("p-1").unwrap().len(), 2);
        assert_eq!(SpaceGroup::from_name("P 1 21 1").unwrap().name(), "P21");
    }

    #[test]
    fn from_name_rejects_unknown_groups() {
        assert!(matches!(
            SpaceGroup::from_name("Fm-3m"),
            Err(CrystalError::UnknownSpaceGroup(_))
        ));
    }

    #[test]
    fn new_requires_identity_first() {
        let ops = vec![SymOp::from_diagonal([-1.0, -1.0, -1.0], [0.0; 3])];
        assert!(matches!(
            SpaceGroup::new("bad", ops),
            Err(CrystalError::MissingIdentity(_))
        ));
    }

    #[test]
    fn screw_axis_translates_along_b() {
        let group = SpaceGroup::p21();
        let op = &group.operators()[1];
        let moved = op.apply(&Vector3::new(0.1, 0.2, 0.3));
        assert_relative_eq!(moved.x, -0.1);
        assert_relative_eq!(moved.y, 0.7);
        assert_relative_eq!(moved.z, -0.3);
    }
}
