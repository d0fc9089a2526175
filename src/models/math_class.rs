use super::quiz::Difficulty;

/// Courses a student can pick when requesting a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathClass {
    AlgebraOne,
    Geometry,
    AlgebraTwo,
    Trigonometry,
    PreCalculus,
}

impl MathClass {
    pub const ALL: [MathClass; 5] = [
        MathClass::AlgebraOne,
        MathClass::Geometry,
        MathClass::AlgebraTwo,
        MathClass::Trigonometry,
        MathClass::PreCalculus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MathClass::AlgebraOne => "Algebra I",
            MathClass::Geometry => "Geometry",
            MathClass::AlgebraTwo => "Algebra II",
            MathClass::Trigonometry => "Trigonometry",
            MathClass::PreCalculus => "Pre-Calculus",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn topics(&self) -> &'static [&'static str] {
        match self {
            MathClass::AlgebraOne => &[
                "Linear Equations",
                "Polynomials",
                "Factoring",
                "Systems of Equations",
                "Inequalities",
            ],
            MathClass::Geometry => &[
                "Area and Perimeter",
                "Triangles",
                "Circles",
                "Volume",
                "Coordinate Geometry",
            ],
            MathClass::AlgebraTwo => &[
                "Quadratic Functions",
                "Exponential Functions",
                "Logarithms",
                "Rational Functions",
                "Complex Numbers",
            ],
            MathClass::Trigonometry => &[
                "Trigonometric Functions",
                "Unit Circle",
                "Identities",
                "Law of Sines",
                "Law of Cosines",
            ],
            MathClass::PreCalculus => &[
                "Polynomial Functions",
                "Sequences and Series",
                "Conic Sections",
                "Matrices",
                "Limits",
            ],
        }
    }

    /// Skills expected of a question at the given level for this course.
    pub fn guidelines(&self, difficulty: Difficulty) -> &'static [&'static str] {
        use Difficulty::*;
        match (self, difficulty) {
            (MathClass::AlgebraOne, Easy) => &[
                "One-step linear equations (2x = 10)",
                "Simple substitution (if x = 3, find 2x + 1)",
                "Basic polynomial addition/subtraction",
                "Simple factoring (x^2 + 5x + 6)",
                "Single-variable inequalities (x > 5)",
            ],
            (MathClass::AlgebraOne, Medium) => &[
                "Two-step linear equations with fractions",
                "Systems of equations by substitution",
                "Polynomial multiplication (distributive property)",
                "Factoring trinomials with leading coefficient other than 1",
                "Compound inequalities",
            ],
            (MathClass::AlgebraOne, Hard) => &[
                "Multi-step equations with variables on both sides",
                "Systems with no solution or infinite solutions",
                "Complex polynomial operations",
                "Factoring by grouping",
                "Absolute value inequalities",
            ],
            (MathClass::Geometry, Easy) => &[
                "Area of basic shapes (square, rectangle, triangle)",
                "Perimeter calculations",
                "Basic angle relationships",
                "Simple coordinate geometry (distance between points)",
                "Volume of rectangular prisms",
            ],
            (MathClass::Geometry, Medium) => &[
                "Area of complex shapes (trapezoids, parallelograms)",
                "Pythagorean theorem applications",
                "Circle area and circumference",
                "Coordinate geometry with slopes",
                "Surface area calculations",
            ],
            (MathClass::Geometry, Hard) => &[
                "Composite figure area/volume problems",
                "Geometric proofs and reasoning",
                "Complex coordinate geometry transformations",
                "Circle theorems and arc length",
                "3D geometry and spatial reasoning",
            ],
            (MathClass::AlgebraTwo, Easy) => &[
                "Evaluating quadratic functions at given points",
                "Simple exponential growth (2^x)",
                "Basic logarithm evaluation (log base 10 of 100)",
                "Simple rational function evaluation",
                "Basic complex number arithmetic",
            ],
            (MathClass::AlgebraTwo, Medium) => &[
                "Solving quadratic equations by factoring",
                "Exponential equations (3^x = 27)",
                "Logarithm properties and equations",
                "Rational function simplification",
                "Complex number operations",
            ],
            (MathClass::AlgebraTwo, Hard) => &[
                "Quadratic formula with complex solutions",
                "Exponential modeling problems",
                "Change of base formula and applications",
                "Rational inequalities",
                "Complex number graphing and polar form",
            ],
            (MathClass::Trigonometry, Easy) => &[
                "Basic trig ratios in right triangles",
                "Unit circle values at special angles",
                "Simple trig function evaluation",
                "Basic angle conversions (degrees/radians)",
                "Simple trig equations",
            ],
            (MathClass::Trigonometry, Medium) => &[
                "Trig functions of general angles",
                "Basic trig identities applications",
                "Law of Sines with one triangle",
                "Amplitude and period of trig functions",
                "Inverse trig function evaluation",
            ],
            (MathClass::Trigonometry, Hard) => &[
                "Complex trig identity proofs",
                "Law of Cosines applications",
                "Trig function transformations",
                "Multiple angle formulas",
                "Trig equations with multiple solutions",
            ],
            (MathClass::PreCalculus, Easy) => &[
                "Polynomial function evaluation",
                "Simple sequence identification",
                "Basic matrix operations",
                "Simple limit evaluation",
                "Conic section identification",
            ],
            (MathClass::PreCalculus, Medium) => &[
                "Polynomial division and remainder theorem",
                "Arithmetic/geometric sequence formulas",
                "Matrix multiplication",
                "Limit laws application",
                "Conic section equations",
            ],
            (MathClass::PreCalculus, Hard) => &[
                "Polynomial function analysis and graphing",
                "Series convergence and sum",
                "Matrix determinants and inverses",
                "Complex limits and continuity",
                "Conic section transformations",
            ],
        }
    }
}
